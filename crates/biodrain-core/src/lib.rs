//! Nature-inspired drainage decision engine.
//!
//! Given a site (a point with a radius, or a corridor segment with a
//! half-width) and the environmental measurements around it, the engine
//! scores flood risk, picks one of seven biomimetic network archetypes,
//! and sizes the primary conduit.
//!
//! ```ignore
//! use std::sync::Arc;
//! use biodrain_core::{evaluate, EngineConfig, Providers, SiteSnapshot};
//!
//! let snapshot = SiteSnapshot::from_json_str(&json)?;
//! let providers = Providers::single(Arc::new(snapshot.measurements));
//! let result = evaluate(&snapshot.request, &providers, &EngineConfig::default())?;
//! ```

pub mod acquire;
pub mod config;
pub mod engine;
pub mod error;
pub mod factors;
pub mod geometry;
pub mod hydraulic;
pub mod rainfall;
pub mod risk;
pub mod sample;
pub mod topology;
pub mod water_gate;

pub use acquire::snapshot::{RecordedMeasurements, SiteSnapshot};
pub use acquire::{Capability, Provider, ProviderError, Providers, SourceChain};
pub use config::EngineConfig;
pub use engine::{evaluate, AnalysisRequest, AnalysisResult, Assessment, DrainageEngine};
pub use error::{Error, Result};
pub use geometry::{Coordinate, SiteDefinition, SiteFootprint};
pub use risk::FloodRiskLevel;
pub use topology::Topology;
