//! Engine module for discovering and driving the external conversion engine.
//!
//! The engine is a GPSBabel-compatible program. This module knows how to
//! find it, ask it which formats and devices it supports, build argument
//! vectors for it and run it while streaming its diagnostic output.
//!
//! # Example
//!
//! ```ignore
//! use trackbabel_core::engine::{CapabilityMode, Engine, EngineConfig};
//!
//! let engine = Engine::initialize(&EngineConfig::default()).await;
//! if !engine.is_available() {
//!     eprintln!("gpsbabel not installed");
//! }
//!
//! let required: CapabilityMode = "--r---".parse().unwrap();
//! for format in engine.registry().compatible_formats(&required) {
//!     println!("{}: {}", format.name, format.label);
//! }
//! ```

mod capabilities;
mod config;
mod discovery;
mod error;
mod invocation;
mod location;
mod registry;
mod runner;

pub use capabilities::{compatible, readable, CapabilityMode, Capable, MODE_CODE_LEN};
pub use config::EngineConfig;
pub use discovery::{discover_features, Engine};
pub use error::EngineError;
pub use invocation::{
    split_args, Invocation, InvocationBuilder, FEATURE_LISTING_FLAG, GPX_FORMAT,
};
pub use location::{EngineLocation, DEFAULT_ENGINE_NAME, UNBUFFER_NAME};
pub use registry::{
    DeviceDescriptor, FormatDescriptor, FormatRegistry, LineOutcome, DEVICE_LABEL_MAX_CHARS,
};
pub use runner::{
    ProcessRunner, ProgressEvent, ProgressSink, RunOutcome, RunningEngine, DIAG_LINE_CHUNK,
};
