//! Types for the conversion module.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;

use super::error::ConversionError;
use crate::download::DownloadOptions;
use crate::engine::GPX_FORMAT;

/// Input type decoded natively as KML.
pub const KML_FORMAT: &str = "kml";

/// Input type decoded natively as an OSRM GeoJSON route.
pub const GEOJSON_OSRM_FORMAT: &str = "viking-geojson-osrm";

/// Shorter spelling accepted for [`GEOJSON_OSRM_FORMAT`].
pub const GEOJSON_OSRM_ALIAS: &str = "geojson-osrm";

/// Formats read without going through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFormat {
    Gpx,
    Kml,
    GeoJsonOsrm,
}

impl NativeFormat {
    /// Picks the native decoder for downloaded input, if any.
    ///
    /// Unknown input types go through the engine. With no input type at all
    /// the data is assumed to be GPX, unless filters ask for the engine.
    pub fn for_download(input_format: Option<&str>, filters: Option<&str>) -> Option<Self> {
        match input_format {
            Some(GPX_FORMAT) => Some(Self::Gpx),
            Some(KML_FORMAT) => Some(Self::Kml),
            Some(GEOJSON_OSRM_FORMAT) | Some(GEOJSON_OSRM_ALIAS) => Some(Self::GeoJsonOsrm),
            Some(_) => None,
            None if filters.is_some() => None,
            None => Some(Self::Gpx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gpx => GPX_FORMAT,
            Self::Kml => KML_FORMAT,
            Self::GeoJsonOsrm => GEOJSON_OSRM_FORMAT,
        }
    }
}

/// A request to load data into a layer, in exactly one of three shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionRequest {
    /// Convert a local file with explicit engine arguments (`-i <format> ...`).
    Filter {
        engine_args: String,
        source: PathBuf,
        filters: Option<String>,
    },
    /// Run a shell command and convert its output.
    Shell {
        command: String,
        input_format: Option<String>,
    },
    /// Download a URL and convert it.
    Url {
        url: String,
        input_format: Option<String>,
        filters: Option<String>,
        download_options: Option<DownloadOptions>,
    },
}

/// Loosely populated conversion options, as produced by dialogs and files.
///
/// Converted into a [`ConversionRequest`] with the priority
/// url > engine arguments > shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    #[serde(default)]
    pub engine_args: Option<String>,
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub input_file_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filters: Option<String>,
    #[serde(default)]
    pub shell_command: Option<String>,
    #[serde(default)]
    pub download_options: Option<DownloadOptions>,
}

impl TryFrom<ProcessOptions> for ConversionRequest {
    type Error = ConversionError;

    fn try_from(options: ProcessOptions) -> Result<Self, Self::Error> {
        if let Some(url) = options.url {
            return Ok(Self::Url {
                url,
                input_format: options.input_file_type,
                filters: options.filters,
                download_options: options.download_options,
            });
        }
        if let Some(engine_args) = options.engine_args {
            let source = options.filename.ok_or_else(|| {
                ConversionError::malformed("engine arguments given without a source file")
            })?;
            return Ok(Self::Filter {
                engine_args,
                source,
                filters: options.filters,
            });
        }
        if let Some(command) = options.shell_command {
            return Ok(Self::Shell {
                command,
                input_format: options.input_file_type,
            });
        }
        Err(ConversionError::malformed(
            "no url, engine arguments or shell command given",
        ))
    }
}

/// Which kinds of data an engine export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSelection {
    pub tracks: bool,
    pub routes: bool,
    pub waypoints: bool,
}

impl Default for ExportSelection {
    fn default() -> Self {
        Self::ALL
    }
}

impl ExportSelection {
    pub const ALL: Self = Self {
        tracks: true,
        routes: true,
        waypoints: true,
    };

    /// Engine output arguments: `[-t] [-r] [-w] -o <format>[,<suboptions>]`.
    pub fn engine_args(&self, format: &str, suboptions: Option<&str>) -> String {
        let mut args = String::new();
        for (selected, flag) in [
            (self.tracks, "-t"),
            (self.routes, "-r"),
            (self.waypoints, "-w"),
        ] {
            if selected {
                args.push_str(flag);
                args.push(' ');
            }
        }
        let _ = write!(args, "-o {}", format);
        if let Some(suboptions) = suboptions.filter(|s| !s.is_empty()) {
            let _ = write!(args, ",{}", suboptions);
        }
        args
    }
}
