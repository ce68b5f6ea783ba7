//! Layer and codec for the command line: documents are carried as raw text.

use async_trait::async_trait;
use std::convert::Infallible;
use std::path::Path;

use trackbabel_core::conversion::GEOJSON_OSRM_FORMAT;
use trackbabel_core::{CodecError, LayerCodec, TrackLayer};

/// Raw contents of a decoded file, tagged with the decoder that read it.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub format: Option<&'static str>,
    pub text: String,
    description: Option<String>,
}

impl Document {
    /// Reads a GPX file from disk.
    pub async fn load_gpx(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            format: Some("gpx"),
            text: tokio::fs::read_to_string(path).await?,
            description: None,
        })
    }

    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.text).await
    }
}

impl TrackLayer for Document {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }
}

/// Pass-through codec: decoding keeps the bytes, encoding writes them back.
#[derive(Debug, Default)]
pub struct PassThroughCodec;

impl PassThroughCodec {
    async fn read(
        &self,
        format: &'static str,
        layer: &mut Document,
        path: &Path,
    ) -> Result<(), CodecError> {
        let text = tokio::fs::read_to_string(path).await?;
        if text.trim().is_empty() {
            return Err(CodecError::invalid(format, "empty document"));
        }
        layer.text = text;
        layer.format = Some(format);
        Ok(())
    }
}

#[async_trait]
impl LayerCodec for PassThroughCodec {
    type Layer = Document;
    type Track = Infallible;

    async fn decode_gpx(
        &self,
        layer: &mut Document,
        path: &Path,
        _base_dir: &Path,
    ) -> Result<(), CodecError> {
        self.read("gpx", layer, path).await
    }

    async fn decode_kml(&self, layer: &mut Document, path: &Path) -> Result<(), CodecError> {
        self.read("kml", layer, path).await
    }

    async fn decode_geojson_osrm(
        &self,
        layer: &mut Document,
        path: &Path,
    ) -> Result<(), CodecError> {
        self.read(GEOJSON_OSRM_FORMAT, layer, path).await
    }

    async fn encode_gpx(
        &self,
        layer: &Document,
        path: &Path,
        _track: Option<&Infallible>,
        _include_hidden: bool,
    ) -> Result<(), CodecError> {
        match layer.format {
            Some("gpx") => {
                tokio::fs::write(path, &layer.text).await?;
                Ok(())
            }
            Some(other) => Err(CodecError::Unsupported(format!(
                "cannot write {} data as GPX",
                other
            ))),
            None => Err(CodecError::Unsupported("empty document".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gpx_round_trips_through_codec() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.gpx");
        let output = dir.path().join("out.gpx");
        std::fs::write(&input, "<gpx/>").unwrap();

        let codec = PassThroughCodec;
        let mut document = Document::default();
        codec.decode_gpx(&mut document, &input, dir.path()).await.unwrap();
        codec.encode_gpx(&document, &output, None, false).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "<gpx/>");
    }

    #[tokio::test]
    async fn test_kml_cannot_be_encoded_as_gpx() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.kml");
        std::fs::write(&input, "<kml/>").unwrap();

        let codec = PassThroughCodec;
        let mut document = Document::default();
        codec.decode_kml(&mut document, &input).await.unwrap();
        let err = codec
            .encode_gpx(&document, &dir.path().join("out.gpx"), None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.gpx");
        std::fs::write(&input, "").unwrap();

        let mut document = Document::default();
        let err = PassThroughCodec
            .decode_gpx(&mut document, &input, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::Invalid { .. }));
        assert!(document.format.is_none());
    }
}
