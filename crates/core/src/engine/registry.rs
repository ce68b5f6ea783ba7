//! Formats and devices supported by the engine, discovered from its feature listing.

use serde::Serialize;
use tracing::{debug, warn};

use super::capabilities::{compatible, readable, CapabilityMode, Capable};

/// Device labels longer than this are truncated.
pub const DEVICE_LABEL_MAX_CHARS: usize = 50;

/// Minimum number of tab-separated tokens in a recognized listing row.
const MIN_ROW_TOKENS: usize = 5;

/// A file format the engine can read and/or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Engine identifier passed to `-i`/`-o`, e.g. `"gpx"`.
    pub name: String,
    pub extension: String,
    /// Human-readable description.
    pub label: String,
    pub mode: CapabilityMode,
}

/// A device or serial protocol the engine can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub name: String,
    /// Human-readable description, at most [`DEVICE_LABEL_MAX_CHARS`] characters.
    pub label: String,
    pub mode: CapabilityMode,
}

impl Capable for FormatDescriptor {
    fn mode(&self) -> CapabilityMode {
        self.mode
    }
}

impl Capable for DeviceDescriptor {
    fn mode(&self) -> CapabilityMode {
        self.mode
    }
}

/// Outcome of feeding a single listing line to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Format,
    Device,
    /// Row kind not recognized; nothing recorded.
    Ignored,
    /// Recognized row kind with too few tokens; nothing recorded.
    Malformed,
}

/// Insertion-ordered lists of discovered formats and devices.
///
/// Built once at startup and read-only afterwards, so it can be shared freely
/// between concurrent conversions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatRegistry {
    formats: Vec<FormatDescriptor>,
    devices: Vec<DeviceDescriptor>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a complete feature listing.
    pub fn from_listing(listing: &str) -> Self {
        let mut registry = Self::new();
        for line in listing.lines() {
            registry.parse_line(line);
        }
        registry
    }

    /// Parses one feature listing line and records what it describes.
    ///
    /// Rows are tab separated: kind, capability code, identifier, extension
    /// (file rows only), label. Entries accumulate across calls.
    pub fn parse_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim_end_matches(['\r', '\n']);
        let tokens: Vec<&str> = line.split('\t').collect();

        let kind = tokens[0];
        if kind != "serial" && kind != "file" {
            return LineOutcome::Ignored;
        }
        if tokens.len() < MIN_ROW_TOKENS {
            warn!("Unexpected engine format string: {}", line);
            return LineOutcome::Malformed;
        }

        let mode = CapabilityMode::parse(tokens[1]);
        if kind == "serial" {
            let device = DeviceDescriptor {
                name: tokens[2].to_string(),
                label: tokens[4].chars().take(DEVICE_LABEL_MAX_CHARS).collect(),
                mode,
            };
            debug!("New engine device: {}, {} ({})", device.name, mode, tokens[1]);
            self.devices.push(device);
            LineOutcome::Device
        } else {
            let format = FormatDescriptor {
                name: tokens[2].to_string(),
                extension: tokens[3].to_string(),
                label: tokens[4].to_string(),
                mode,
            };
            debug!("New engine file format: {}, {} ({})", format.name, mode, tokens[1]);
            self.formats.push(format);
            LineOutcome::Format
        }
    }

    /// Whether the engine appears usable, judged by at least one device being known.
    pub fn is_available(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Looks up a format by engine identifier.
    pub fn format(&self, name: &str) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| f.name == name)
    }

    /// Looks up a device by engine identifier.
    pub fn device(&self, name: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Formats, in registration order, offering at least the `required` capabilities.
    pub fn compatible_formats<'a>(
        &'a self,
        required: &'a CapabilityMode,
    ) -> impl Iterator<Item = &'a FormatDescriptor> + 'a {
        compatible(&self.formats, required)
    }

    /// Devices, in registration order, offering at least the `required` capabilities.
    pub fn compatible_devices<'a>(
        &'a self,
        required: &'a CapabilityMode,
    ) -> impl Iterator<Item = &'a DeviceDescriptor> + 'a {
        compatible(&self.devices, required)
    }

    /// Formats, in registration order, with any read capability.
    pub fn readable_formats(&self) -> impl Iterator<Item = &FormatDescriptor> {
        readable(&self.formats)
    }
}
