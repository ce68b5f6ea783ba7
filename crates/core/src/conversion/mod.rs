//! Conversion module for loading layers through the engine and exporting
//! them again.
//!
//! Each operation stages its intermediate data in temp files, runs the
//! engine (or a shell pipeline, or a download) and hands the result to a
//! [`LayerCodec`]. Progress is streamed through an optional
//! [`ProgressSink`](crate::engine::ProgressSink).

mod error;
mod orchestrator;
mod staging;
mod traits;
mod types;

pub use error::{CodecError, ConversionError, ErrorKind};
pub use orchestrator::ConversionOrchestrator;
pub use staging::{StagedFile, Stager, StagingConfig};
pub use traits::{LayerCodec, TrackLayer};
pub use types::{
    ConversionRequest, ExportSelection, NativeFormat, ProcessOptions, GEOJSON_OSRM_ALIAS,
    GEOJSON_OSRM_FORMAT, KML_FORMAT,
};
