//! Core library for trackbabel: drives a GPSBabel-compatible engine to load
//! GPS data into layers and export layers to other formats and devices.

pub mod config;
pub mod conversion;
pub mod download;
pub mod engine;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use conversion::{
    CodecError, ConversionError, ConversionOrchestrator, ConversionRequest, ErrorKind,
    ExportSelection, LayerCodec, ProcessOptions, Stager, StagingConfig, TrackLayer,
};
pub use download::{DownloadConfig, DownloadOptions, Downloader, FetchError, HttpDownloader};
pub use engine::{
    CapabilityMode, DeviceDescriptor, Engine, EngineConfig, EngineError, EngineLocation,
    FormatDescriptor, FormatRegistry, ProgressEvent, ProgressSink, RunOutcome,
};
