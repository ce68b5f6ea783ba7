//! Mock layer codec for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::conversion::{CodecError, LayerCodec, TrackLayer, GEOJSON_OSRM_FORMAT};

/// A layer that holds decoded data as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLayer {
    /// Contents of the last decoded file.
    pub content: Option<String>,
    /// Name of the decoder that produced `content`.
    pub decoded_as: Option<String>,
    /// Directory given to the GPX decoder for resolving links.
    pub base_dir: Option<std::path::PathBuf>,
    description: Option<String>,
}

impl MemoryLayer {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

impl TrackLayer for MemoryLayer {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }
}

/// Mock implementation of the LayerCodec trait.
///
/// Decoding reads the file verbatim into the layer. Encoding writes the
/// layer's content, or the track when one is given. Failures can be
/// injected for either direction.
#[derive(Debug, Default)]
pub struct MockCodec {
    /// If set, decoding fails with this reason.
    decode_error: Arc<RwLock<Option<String>>>,
    /// If set, encoding fails with this reason.
    encode_error: Arc<RwLock<Option<String>>>,
    encode_calls: AtomicUsize,
    /// `include_hidden` of each encode call.
    hidden_flags: Arc<RwLock<Vec<bool>>>,
}

impl MockCodec {
    /// Create a new mock codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every decode fail.
    pub async fn fail_decoding(&self, reason: impl Into<String>) {
        *self.decode_error.write().await = Some(reason.into());
    }

    /// Make every encode fail.
    pub async fn fail_encoding(&self, reason: impl Into<String>) {
        *self.encode_error.write().await = Some(reason.into());
    }

    /// Number of encode calls so far.
    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    /// `include_hidden` flags passed to encode, in call order.
    pub async fn hidden_flags(&self) -> Vec<bool> {
        self.hidden_flags.read().await.clone()
    }

    async fn decode(
        &self,
        format: &str,
        layer: &mut MemoryLayer,
        path: &Path,
    ) -> Result<(), CodecError> {
        if let Some(reason) = self.decode_error.read().await.as_ref() {
            return Err(CodecError::invalid(format, reason.clone()));
        }
        let content = tokio::fs::read_to_string(path).await?;
        layer.content = Some(content);
        layer.decoded_as = Some(format.to_string());
        Ok(())
    }
}

#[async_trait]
impl LayerCodec for MockCodec {
    type Layer = MemoryLayer;
    type Track = String;

    async fn decode_gpx(
        &self,
        layer: &mut MemoryLayer,
        path: &Path,
        base_dir: &Path,
    ) -> Result<(), CodecError> {
        self.decode("gpx", layer, path).await?;
        layer.base_dir = Some(base_dir.to_path_buf());
        Ok(())
    }

    async fn decode_kml(&self, layer: &mut MemoryLayer, path: &Path) -> Result<(), CodecError> {
        self.decode("kml", layer, path).await
    }

    async fn decode_geojson_osrm(
        &self,
        layer: &mut MemoryLayer,
        path: &Path,
    ) -> Result<(), CodecError> {
        self.decode(GEOJSON_OSRM_FORMAT, layer, path).await
    }

    async fn encode_gpx(
        &self,
        layer: &MemoryLayer,
        path: &Path,
        track: Option<&String>,
        include_hidden: bool,
    ) -> Result<(), CodecError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        self.hidden_flags.write().await.push(include_hidden);
        if let Some(reason) = self.encode_error.read().await.as_ref() {
            return Err(CodecError::Unsupported(reason.clone()));
        }
        let data = track
            .map(String::as_str)
            .or(layer.content.as_deref())
            .unwrap_or_default();
        tokio::fs::write(path, data).await?;
        Ok(())
    }
}
