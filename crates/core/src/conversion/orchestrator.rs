//! Conversion orchestration: staging, engine runs and decoding.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::ConversionError;
use super::staging::{StagedFile, Stager};
use super::traits::{LayerCodec, TrackLayer};
use super::types::{ConversionRequest, ExportSelection, NativeFormat};
use crate::download::{DownloadOptions, Downloader};
use crate::engine::{Engine, EngineError, Invocation, ProgressSink, RunOutcome, GPX_FORMAT};

/// Marker that identifies OAuth-signed URLs.
const OAUTH_URL_MARKER: &str = "?oauth_consumer_key=";

/// Loads data into layers and exports layers through the engine.
///
/// Every operation stages its intermediate data in a fresh temp file that is
/// removed before the operation returns, whatever the outcome.
pub struct ConversionOrchestrator<C: LayerCodec, D: Downloader> {
    engine: Arc<Engine>,
    codec: Arc<C>,
    downloader: Arc<D>,
    stager: Stager,
    cancel: CancellationToken,
}

impl<C: LayerCodec, D: Downloader> Clone for ConversionOrchestrator<C, D> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            codec: Arc::clone(&self.codec),
            downloader: Arc::clone(&self.downloader),
            stager: self.stager.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: LayerCodec, D: Downloader> ConversionOrchestrator<C, D> {
    pub fn new(engine: Arc<Engine>, codec: Arc<C>, downloader: Arc<D>, stager: Stager) -> Self {
        Self {
            engine,
            codec,
            downloader,
            stager,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a copy whose engine runs stop when `cancel` is cancelled.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Token cancelling engine runs started by this orchestrator.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn stage(&self) -> Result<StagedFile, ConversionError> {
        self.stager.stage().map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            ConversionError::Staging(e)
        })
    }

    fn invocation(
        &self,
        build: impl FnOnce(&crate::engine::InvocationBuilder<'_>) -> Result<Invocation, EngineError>,
    ) -> Result<Invocation, ConversionError> {
        build(&self.engine.builder()).map_err(|e| {
            if matches!(e, EngineError::NotFound) {
                error!("gpsbabel not found in PATH");
            }
            ConversionError::from(e)
        })
    }

    async fn run(
        &self,
        invocation: &Invocation,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let outcome = self
            .engine
            .runner()
            .run(invocation, progress, &self.cancel)
            .await?;
        Ok(outcome)
    }

    async fn decode(
        &self,
        format: NativeFormat,
        layer: &mut C::Layer,
        staged: &StagedFile,
    ) -> Result<(), ConversionError> {
        let result = match format {
            NativeFormat::Gpx => {
                self.codec
                    .decode_gpx(layer, staged.path(), staged.dir())
                    .await
            }
            NativeFormat::Kml => self.codec.decode_kml(layer, staged.path()).await,
            NativeFormat::GeoJsonOsrm => {
                self.codec.decode_geojson_osrm(layer, staged.path()).await
            }
        };
        result.map_err(|source| {
            warn!("Failed to decode {} data: {}", format.name(), source);
            ConversionError::decode(format.name(), source)
        })
    }

    /// Runs the engine on a local file and loads the GPX it produces.
    ///
    /// `engine_args` must name the input type (`-i <format>`); `filters` are
    /// placed after the source. Without a target layer the engine still runs
    /// but nothing is decoded, which suits commands run for their side
    /// effects such as device operations.
    pub async fn convert_from_filter(
        &self,
        layer: Option<&mut C::Layer>,
        engine_args: &str,
        source: &Path,
        filters: Option<&str>,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let staged = self.stage()?;
        let invocation =
            self.invocation(|b| b.filter(engine_args, source, filters, staged.path()))?;

        let outcome = self.run(&invocation, progress).await?;
        if let Some(layer) = layer {
            self.decode(NativeFormat::Gpx, layer, &staged).await?;
        }
        Ok(outcome)
    }

    /// Runs `shell_command` and loads its output.
    ///
    /// With an input format the output is piped through the engine;
    /// otherwise it must already be GPX.
    pub async fn convert_from_shell_command(
        &self,
        layer: &mut C::Layer,
        shell_command: &str,
        input_format: Option<&str>,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let staged = self.stage()?;
        let invocation =
            self.invocation(|b| b.shell(shell_command, input_format, staged.path()))?;

        let outcome = self.run(&invocation, progress).await?;
        self.decode(NativeFormat::Gpx, layer, &staged).await?;
        Ok(outcome)
    }

    /// Downloads `url` and loads it into the layer.
    ///
    /// GPX, KML and OSRM GeoJSON are decoded directly, in which case
    /// `filters` are not applied and no progress is reported. Anything
    /// else goes through the engine.
    pub async fn convert_from_url(
        &self,
        layer: &mut C::Layer,
        url: &str,
        input_format: Option<&str>,
        filters: Option<&str>,
        progress: Option<&mut dyn ProgressSink>,
        download_options: Option<&DownloadOptions>,
    ) -> Result<RunOutcome, ConversionError> {
        let staged = self.stage()?;
        let defaults = DownloadOptions::default();
        let options = download_options.unwrap_or(&defaults);

        debug!(
            "Fetching {} (input type {:?}) with {}",
            url,
            input_format,
            self.downloader.name()
        );
        self.downloader
            .fetch(url, staged.path(), options)
            .await
            .map_err(|source| {
                warn!("Download of {} failed: {}", url, source);
                ConversionError::Fetch {
                    url: url.to_string(),
                    source,
                }
            })?;

        match NativeFormat::for_download(input_format, filters) {
            Some(format) => {
                if filters.is_some() {
                    debug!("Filters ignored for natively decoded {}", format.name());
                }
                self.decode(format, layer, &staged).await?;
                describe_with_oauth_url(layer, url);
                Ok(RunOutcome::without_child())
            }
            None => {
                let engine_args = input_format
                    .map(|format| format!("-i {}", format))
                    .unwrap_or_default();
                self.convert_from_filter(
                    Some(layer),
                    &engine_args,
                    staged.path(),
                    filters,
                    progress,
                )
                .await
            }
        }
    }

    /// Writes the layer (or one track of it) as GPX and has the engine
    /// convert that to `destination`.
    ///
    /// `engine_args` must name the output type (`-o <format>`);
    /// `destination` may be a file path or a device port.
    pub async fn convert_to(
        &self,
        layer: &C::Layer,
        track: Option<&C::Track>,
        engine_args: &str,
        destination: &str,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let staged = self.stage()?;
        let invocation = self.invocation(|b| b.export(staged.path(), engine_args, destination))?;

        if let Err(source) = self
            .codec
            .encode_gpx(layer, staged.path(), track, false)
            .await
        {
            error!("Error exporting to {}: {}", staged.path().display(), source);
            return Err(ConversionError::Export {
                path: staged.path().to_path_buf(),
                source,
            });
        }

        self.run(&invocation, progress).await
    }

    /// Runs engine filters over the layer's own data and replaces its
    /// contents with the result.
    pub async fn apply_filters(
        &self,
        layer: &mut C::Layer,
        filter_args: &str,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let source = self.stage()?;
        if let Err(e) = self
            .codec
            .encode_gpx(layer, source.path(), None, true)
            .await
        {
            error!("Error exporting to {}: {}", source.path().display(), e);
            return Err(ConversionError::Export {
                path: source.path().to_path_buf(),
                source: e,
            });
        }

        let engine_args = format!("-i {}", GPX_FORMAT);
        self.convert_from_filter(
            Some(layer),
            &engine_args,
            source.path(),
            Some(filter_args),
            progress,
        )
        .await
    }

    /// Exports the layer to `destination` in any format the engine writes.
    pub async fn export_with_engine(
        &self,
        layer: &C::Layer,
        destination: &str,
        format: &str,
        selection: ExportSelection,
        suboptions: Option<&str>,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        let engine_args = selection.engine_args(format, suboptions);
        info!("Exporting to {} as {}", destination, format);
        self.convert_to(layer, None, &engine_args, destination, progress)
            .await
    }

    /// Dispatches a request to the matching conversion.
    pub async fn process(
        &self,
        layer: &mut C::Layer,
        request: &ConversionRequest,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome, ConversionError> {
        match request {
            ConversionRequest::Url {
                url,
                input_format,
                filters,
                download_options,
            } => {
                self.convert_from_url(
                    layer,
                    url,
                    input_format.as_deref(),
                    filters.as_deref(),
                    progress,
                    download_options.as_ref(),
                )
                .await
            }
            ConversionRequest::Filter {
                engine_args,
                source,
                filters,
            } => {
                self.convert_from_filter(
                    Some(layer),
                    engine_args,
                    source,
                    filters.as_deref(),
                    progress,
                )
                .await
            }
            ConversionRequest::Shell {
                command,
                input_format,
            } => {
                self.convert_from_shell_command(layer, command, input_format.as_deref(), progress)
                    .await
            }
        }
    }
}

/// Uses an OAuth-signed URL as the layer description when it has none.
///
/// The marker may appear anywhere in the URL, compared case-insensitively,
/// since signed URLs carry it after the path. Only called once the download
/// decoded, so a failed conversion leaves the layer's metadata untouched too.
fn describe_with_oauth_url<L: TrackLayer>(layer: &mut L, url: &str) {
    if layer.description().is_some() {
        return;
    }
    if url
        .to_ascii_lowercase()
        .contains(&OAUTH_URL_MARKER.to_ascii_lowercase())
    {
        layer.set_description(url.to_string());
    }
}
