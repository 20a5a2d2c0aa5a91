//! Interaction ledger and verdict engine for fire/detonation conformance runs.
//!
//! This crate provides:
//! - Run configuration: enabled checks, field policy, timeouts
//! - A per-class ledger of event decode outcomes with pairing predicates
//! - A federate ambassador that queues interactions and tracks object instances
//! - The staged verdict engine rendering PASS, FAILED or INCONCLUSIVE
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use volley_core::{FederateAmbassador, Federation, TestConfig, TestParams, VerdictEngine};
//! use volley_schema::{SchemaSource, TypeResolver, XmlSchemaSource};
//!
//! # fn federation() -> Arc<dyn Federation> { unimplemented!() }
//! let config = TestConfig::load("config.json")?;
//! let params = TestParams::load("params.json")?;
//! let urls = params.url_strings();
//! let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
//! let resolver = TypeResolver::new(XmlSchemaSource.load(&urls)?);
//!
//! let (ambassador, queue) = FederateAmbassador::new();
//! let engine = VerdictEngine::new(config, params, resolver, ambassador, queue, federation())?;
//! let report = engine.run();
//! println!("{}", report.verdict);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`VerdictEngine`] - Runs the stages and produces a [`RunReport`]
//! - [`InteractionRecord`] - Per-class ledger of events
//! - [`FederateAmbassador`] - Callback sink shared with the federation
//! - [`Federation`] - Requests the engine makes of the federation

#![deny(missing_docs)]

/// Federation callback sink.
pub mod ambassador;
/// Test configuration and parameters.
pub mod config;
/// The staged verdict engine.
pub mod engine;
/// Error types for configuration, federation and engine setup.
pub mod errors;
/// Correlation identifier of fire and detonation events.
pub mod event_id;
/// Federation collaborator seam.
pub mod federation;
/// Named field decoders.
pub mod field_decoders;
/// Received interactions and discovered objects.
pub mod interaction;
/// Per-class event ledger.
pub mod ledger;
/// Typed RPR warfare values.
pub mod types;
/// Verdicts, stages and run reports.
pub mod verdict;

pub use ambassador::FederateAmbassador;
pub use config::{FieldPolicy, FieldSelector, TestConfig, TestParams, Timeout};
pub use engine::{Track, VerdictEngine, MUNITION_DETONATION, WEAPON_FIRE};
pub use errors::{ConfigError, EngineError, FederationError};
pub use event_id::EventIdentifier;
pub use federation::Federation;
pub use field_decoders::{FieldDecoderBindings, FieldDecoderRegistry, TypedValue};
pub use interaction::{DiscoveredObject, FieldMap, ReceivedInteraction};
pub use ledger::{DecodeContext, EventAudit, FieldOutcome, FieldValue, InteractionRecord};
pub use types::{
    DetonationResultCode, EntityKind, EntityType, FuseType, MunitionDomain, VelocityVector,
    WarheadType, WorldLocation,
};
pub use verdict::{RunReport, Stage, StageOutcome, StageStatus, Verdict};
