//! Conversion lifecycle integration tests.
//!
//! These tests drive the orchestrator against a shell script standing in for
//! gpsbabel: discovery -> staging -> engine run -> decode -> cleanup.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use trackbabel_core::{
    conversion::{ConversionRequest, ExportSelection, ProcessOptions},
    testing::{fixtures, MemoryLayer, MockCodec, MockDownloader},
    ConversionOrchestrator, Engine, EngineConfig, ErrorKind, ProgressEvent, Stager,
    StagingConfig, TrackLayer,
};

/// Test helper owning the fake engine, staging directory and mocks.
struct TestHarness {
    orchestrator: ConversionOrchestrator<MockCodec, MockDownloader>,
    downloader: Arc<MockDownloader>,
    staging_dir: TempDir,
    work_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_config(|config| config).await
    }

    async fn with_config(adjust: impl FnOnce(EngineConfig) -> EngineConfig) -> Self {
        let work_dir = TempDir::new().expect("Failed to create work dir");
        let staging_dir = TempDir::new().expect("Failed to create staging dir");
        let engine_path =
            fixtures::fake_engine(work_dir.path()).expect("Failed to write fake engine");

        let config = adjust(
            EngineConfig::with_path(engine_path)
                .with_shell("/bin/sh")
                .with_unbuffer(false),
        );
        let engine = Engine::initialize(&config).await;
        let downloader = Arc::new(MockDownloader::new());
        let orchestrator = ConversionOrchestrator::new(
            Arc::new(engine),
            Arc::new(MockCodec::new()),
            Arc::clone(&downloader),
            Stager::new(&StagingConfig::default().with_temp_dir(staging_dir.path())),
        );

        Self {
            orchestrator,
            downloader,
            staging_dir,
            work_dir,
        }
    }

    fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write input");
        path
    }

    fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path())
            .expect("Failed to read staging dir")
            .count()
    }
}

fn diagnostics(events: &[ProgressEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Diagnostic(line) => Some(line.as_str()),
            ProgressEvent::Done => None,
        })
        .collect()
}

fn assert_single_trailing_done(events: &[ProgressEvent]) {
    let done_count = events.iter().filter(|e| **e == ProgressEvent::Done).count();
    assert_eq!(done_count, 1, "events: {:?}", events);
    assert_eq!(events.last(), Some(&ProgressEvent::Done));
}

#[tokio::test]
async fn test_discovery_populates_registry() {
    let harness = TestHarness::new().await;
    let engine = harness.orchestrator.engine();

    assert!(engine.is_available());
    let registry = engine.registry();
    let names: Vec<_> = registry.formats().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["gpx", "kml", "nmea", "unicsv"]);
    assert_eq!(registry.devices().len(), 1);
    assert_eq!(registry.devices()[0].name, "garmin");

    let readable: Vec<_> = registry.readable_formats().map(|f| f.name.as_str()).collect();
    assert_eq!(readable, vec!["gpx", "kml", "nmea"]);
}

#[tokio::test]
async fn test_missing_engine_leaves_registry_empty() {
    let harness = TestHarness::with_config(|config| EngineConfig {
        path: PathBuf::from("/nonexistent/bin/gpsbabel"),
        ..config
    })
    .await;
    assert!(!harness.orchestrator.engine().is_available());

    let source = harness.write_input("in.nmea", "data");
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let err = harness
        .orchestrator
        .convert_from_filter(Some(&mut layer), "-i nmea", &source, None, Some(&mut sink))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Spawn);
    assert!(events.is_empty());
    assert!(layer.content.is_none());
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_convert_from_filter_streams_progress_and_decodes() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("in.nmea", fixtures::SAMPLE_GPX);
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let outcome = harness
        .orchestrator
        .convert_from_filter(
            Some(&mut layer),
            "-i nmea",
            &source,
            Some("-x simplify,count=10"),
            Some(&mut sink),
        )
        .await
        .unwrap();

    assert!(outcome.exited_cleanly());
    assert_eq!(layer.content.as_deref(), Some(fixtures::SAMPLE_GPX));
    assert_eq!(layer.decoded_as.as_deref(), Some("gpx"));
    assert_eq!(layer.base_dir.as_deref(), Some(harness.staging_dir.path()));

    assert_single_trailing_done(&events);
    let lines = diagnostics(&events);
    assert_eq!(lines.len(), 2);
    let expected_prefix = format!("args: -i nmea -f {} -x simplify,count=10 -o gpx -F ", source.display());
    assert!(lines[0].starts_with(&expected_prefix), "got {}", lines[0]);
    assert_eq!(lines[1], "done");
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_convert_from_filter_without_layer_runs_for_side_effects() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("in.gpx", fixtures::SAMPLE_GPX);

    let outcome = harness
        .orchestrator
        .convert_from_filter(None, "-i gpx", &source, None, None)
        .await
        .unwrap();
    assert_eq!(outcome.diagnostic_lines, 2);
    assert_eq!(outcome.last_line.as_deref(), Some("done"));
    assert_eq!(harness.orchestrator.codec().encode_calls(), 0);
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_shell_command_without_format_writes_stdout() {
    let harness = TestHarness::new().await;
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let outcome = harness
        .orchestrator
        .convert_from_shell_command(&mut layer, "echo test", None, Some(&mut sink))
        .await
        .unwrap();

    assert!(outcome.exited_cleanly());
    assert_eq!(layer.content.as_deref(), Some("test\n"));
    assert_eq!(events, vec![ProgressEvent::Done]);
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_shell_command_with_format_pipes_through_engine() {
    let harness = TestHarness::new().await;
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    harness
        .orchestrator
        .convert_from_shell_command(&mut layer, "printf 'nmea data'", Some("nmea"), Some(&mut sink))
        .await
        .unwrap();

    assert_eq!(layer.content.as_deref(), Some("nmea data"));
    assert_single_trailing_done(&events);
    let lines = diagnostics(&events);
    assert!(lines[0].starts_with("args: -i nmea -f - -o gpx -F "), "got {}", lines[0]);
}

#[tokio::test]
async fn test_url_with_engine_format_downloads_then_converts() {
    let harness = TestHarness::new().await;
    let url = "https://example.com/log.nmea";
    harness.downloader.set_body(url, "$GPGGA,...").await;
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let options = trackbabel_core::DownloadOptions::default().with_referer("https://example.com/");
    harness
        .orchestrator
        .convert_from_url(&mut layer, url, Some("nmea"), None, Some(&mut sink), Some(&options))
        .await
        .unwrap();

    assert_eq!(layer.content.as_deref(), Some("$GPGGA,..."));
    assert_single_trailing_done(&events);
    assert!(diagnostics(&events)[0].starts_with("args: -i nmea -f "));

    let fetches = harness.downloader.recorded_fetches().await;
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].url, url);
    assert_eq!(fetches[0].options, options);
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_url_with_filters_and_no_format_uses_engine() {
    let harness = TestHarness::new().await;
    let url = "https://example.com/unknown";
    harness.downloader.set_body(url, "payload").await;
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    harness
        .orchestrator
        .convert_from_url(&mut layer, url, None, Some("-x nuketypes,routes"), Some(&mut sink), None)
        .await
        .unwrap();

    assert_eq!(layer.content.as_deref(), Some("payload"));
    let lines = diagnostics(&events);
    assert!(lines[0].starts_with("args: -f "), "got {}", lines[0]);
    assert!(lines[0].contains(" -x nuketypes,routes -o gpx -F "));
}

#[tokio::test]
async fn test_url_gpx_is_decoded_natively() {
    let harness = TestHarness::new().await;
    let url = "https://example.com/track.gpx";
    harness.downloader.set_body(url, fixtures::SAMPLE_GPX).await;
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let outcome = harness
        .orchestrator
        .convert_from_url(&mut layer, url, None, None, Some(&mut sink), None)
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, None);
    assert_eq!(layer.content.as_deref(), Some(fixtures::SAMPLE_GPX));
    assert!(events.is_empty());
    assert_eq!(layer.description(), None);
}

#[tokio::test]
async fn test_convert_to_writes_destination() {
    let harness = TestHarness::new().await;
    let layer = MemoryLayer::with_content(fixtures::SAMPLE_GPX);
    let destination = harness.work_dir.path().join("out.kml");
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    harness
        .orchestrator
        .convert_to(
            &layer,
            None,
            "-o kml",
            &destination.to_string_lossy(),
            Some(&mut sink),
        )
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&destination).unwrap(),
        fixtures::SAMPLE_GPX
    );
    assert_single_trailing_done(&events);
    let lines = diagnostics(&events);
    assert!(lines[0].starts_with("args: -i gpx -f "));
    assert!(lines[0].ends_with(&format!("-o kml -F {}", destination.display())));
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_convert_to_single_track() {
    let harness = TestHarness::new().await;
    let layer = MemoryLayer::with_content("whole layer");
    let destination = harness.work_dir.path().join("track.gpx");

    harness
        .orchestrator
        .convert_to(
            &layer,
            Some(&"one track".to_string()),
            "-o gpx",
            &destination.to_string_lossy(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "one track");
}

#[tokio::test]
async fn test_export_with_engine_selection() {
    let harness = TestHarness::new().await;
    let layer = MemoryLayer::with_content(fixtures::SAMPLE_GPX);
    let destination = harness.work_dir.path().join("out.csv");
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let selection = ExportSelection {
        tracks: false,
        routes: false,
        waypoints: true,
    };
    harness
        .orchestrator
        .export_with_engine(
            &layer,
            &destination.to_string_lossy(),
            "unicsv",
            selection,
            Some("utc=0"),
            Some(&mut sink),
        )
        .await
        .unwrap();

    assert!(destination.exists());
    assert!(diagnostics(&events)[0].contains(" -w -o unicsv,utc=0 -F "));
}

#[tokio::test]
async fn test_apply_filters_replaces_layer_contents() {
    let harness = TestHarness::new().await;
    let mut layer = MemoryLayer::with_content("original");
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    harness
        .orchestrator
        .apply_filters(&mut layer, "-x nuketypes,waypoints", Some(&mut sink))
        .await
        .unwrap();

    assert_eq!(layer.content.as_deref(), Some("original"));
    assert_eq!(layer.decoded_as.as_deref(), Some("gpx"));
    assert_eq!(harness.orchestrator.codec().hidden_flags().await, vec![true]);
    let lines = diagnostics(&events);
    assert!(lines[0].starts_with("args: -i gpx -f "));
    assert!(lines[0].contains(" -x nuketypes,waypoints -o gpx -F "));
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_consecutive_conversions_clean_up() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("in.gpx", fixtures::SAMPLE_GPX);
    let mut destinations = Vec::new();

    for _ in 0..2 {
        let mut layer = MemoryLayer::default();
        let mut events = Vec::new();
        let mut sink = |e: ProgressEvent| events.push(e);
        harness
            .orchestrator
            .convert_from_filter(Some(&mut layer), "-i gpx", &source, None, Some(&mut sink))
            .await
            .unwrap();
        assert_eq!(layer.content.as_deref(), Some(fixtures::SAMPLE_GPX));
        assert_eq!(harness.staged_files(), 0);

        // The engine echoes its arguments, ending with `-F <staged destination>`
        let args = diagnostics(&events)[0].to_string();
        let destination = args
            .rsplit_once(" -F ")
            .map(|(_, path)| PathBuf::from(path))
            .expect("destination argument");
        assert_eq!(destination.parent(), Some(harness.staging_dir.path()));
        assert!(!destination.exists());
        destinations.push(destination);
    }

    assert_ne!(destinations[0], destinations[1]);
}

#[tokio::test]
async fn test_nonzero_exit_is_reported_not_failed() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("bad.gpx", "FAIL");
    let mut layer = MemoryLayer::default();
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let outcome = harness
        .orchestrator
        .convert_from_filter(Some(&mut layer), "-i gpx", &source, None, Some(&mut sink))
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(outcome.last_line.as_deref(), Some("error: bad input"));
    assert_single_trailing_done(&events);
}

#[tokio::test]
async fn test_nonzero_exit_fails_when_strict() {
    let harness =
        TestHarness::with_config(|config| config.with_strict_exit_status(true)).await;
    let source = harness.write_input("bad.gpx", "FAIL");
    let mut layer = MemoryLayer::default();

    let err = harness
        .orchestrator
        .convert_from_filter(Some(&mut layer), "-i gpx", &source, None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EngineFailed);
    assert!(layer.content.is_none());
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_decode_failure_reports_decode_error() {
    let harness = TestHarness::new().await;
    harness.orchestrator.codec().fail_decoding("not gpx").await;
    let mut layer = MemoryLayer::default();

    let err = harness
        .orchestrator
        .convert_from_shell_command(&mut layer, "echo nonsense", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(layer.content.is_none());
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_export_failure_skips_engine() {
    let harness = TestHarness::new().await;
    harness.orchestrator.codec().fail_encoding("read only").await;
    let layer = MemoryLayer::with_content("data");
    let destination = harness.work_dir.path().join("out.kml");
    let mut events = Vec::new();
    let mut sink = |e: ProgressEvent| events.push(e);

    let err = harness
        .orchestrator
        .convert_to(&layer, None, "-o kml", &destination.to_string_lossy(), Some(&mut sink))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Export);
    assert!(events.is_empty());
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_cancellation_kills_running_conversion() {
    let harness = TestHarness::new().await;
    let token = CancellationToken::new();
    let orchestrator = harness.orchestrator.with_cancellation(token.clone());
    let mut layer = MemoryLayer::default();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = orchestrator
        .convert_from_shell_command(&mut layer, "sleep 10", None, None)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(layer.content.is_none());
    assert_eq!(harness.staged_files(), 0);
}

#[tokio::test]
async fn test_timeout_stops_conversion() {
    let harness = TestHarness::with_config(|config| config.with_timeout(1)).await;
    let mut layer = MemoryLayer::default();

    let err = harness
        .orchestrator
        .convert_from_shell_command(&mut layer, "sleep 10", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TimedOut);
}

#[tokio::test]
async fn test_process_dispatches_requests() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("in.gpx", "from file");

    let request = ConversionRequest::try_from(ProcessOptions {
        engine_args: Some("-i gpx".to_string()),
        filename: Some(source.clone()),
        ..Default::default()
    })
    .unwrap();
    let mut layer = MemoryLayer::default();
    harness
        .orchestrator
        .process(&mut layer, &request, None)
        .await
        .unwrap();
    assert_eq!(layer.content.as_deref(), Some("from file"));

    let request = ConversionRequest::Shell {
        command: format!("cat {}", source.display()),
        input_format: None,
    };
    let mut layer = MemoryLayer::default();
    harness
        .orchestrator
        .process(&mut layer, &request, None)
        .await
        .unwrap();
    assert_eq!(layer.content.as_deref(), Some("from file"));
}

#[tokio::test]
async fn test_engine_shared_across_concurrent_conversions() {
    let harness = TestHarness::new().await;
    let source = harness.write_input("in.gpx", fixtures::SAMPLE_GPX);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = harness.orchestrator.clone();
            let source = source.clone();
            tokio::spawn(async move {
                let mut layer = MemoryLayer::default();
                orchestrator
                    .convert_from_filter(Some(&mut layer), "-i gpx", Path::new(&source), None, None)
                    .await
                    .map(|_| layer)
            })
        })
        .collect();

    for task in tasks {
        let layer = task.await.unwrap().unwrap();
        assert_eq!(layer.content.as_deref(), Some(fixtures::SAMPLE_GPX));
    }
    assert_eq!(harness.staged_files(), 0);
}
