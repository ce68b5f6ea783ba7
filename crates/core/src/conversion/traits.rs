//! Trait definitions for the conversion collaborators.

use async_trait::async_trait;
use std::path::Path;

use super::error::CodecError;

/// An in-memory collection of waypoints, tracks and routes that conversions
/// load into or export from.
pub trait TrackLayer: Send + Sync {
    /// Free-text description from the layer metadata.
    fn description(&self) -> Option<&str>;

    fn set_description(&mut self, description: String);
}

/// Reads staged artifacts into layers and writes layers out as GPX.
///
/// Decoders replace the layer's data on success and must leave it untouched
/// on failure.
#[async_trait]
pub trait LayerCodec: Send + Sync {
    type Layer: TrackLayer;
    type Track: Send + Sync;

    /// Decodes a GPX file. `base_dir` resolves relative links inside it.
    async fn decode_gpx(
        &self,
        layer: &mut Self::Layer,
        path: &Path,
        base_dir: &Path,
    ) -> Result<(), CodecError>;

    /// Decodes a KML file.
    async fn decode_kml(&self, layer: &mut Self::Layer, path: &Path) -> Result<(), CodecError>;

    /// Decodes a GeoJSON route as produced by OSRM.
    async fn decode_geojson_osrm(
        &self,
        layer: &mut Self::Layer,
        path: &Path,
    ) -> Result<(), CodecError>;

    /// Writes the layer, or only `track` when given, as GPX.
    async fn encode_gpx(
        &self,
        layer: &Self::Layer,
        path: &Path,
        track: Option<&Self::Track>,
        include_hidden: bool,
    ) -> Result<(), CodecError>;
}
