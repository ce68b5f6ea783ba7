//! Subcommand handlers.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use trackbabel_core::{
    engine::Capable, CapabilityMode, Config, ConversionOrchestrator, DownloadOptions,
    ExportSelection, HttpDownloader, ProgressEvent, RunOutcome, SanitizedConfig, TrackLayer,
};

use crate::cli::{Command, ListArgs, SelectionArgs};
use crate::document::{Document, PassThroughCodec};

pub type Orchestrator = ConversionOrchestrator<PassThroughCodec, HttpDownloader>;

/// Prints engine diagnostics as they arrive.
fn print_progress(event: ProgressEvent) {
    if let ProgressEvent::Diagnostic(line) = event {
        eprintln!("{}", line);
    }
}

fn report(outcome: &RunOutcome) {
    if let Some(code) = outcome.exit_code.filter(|code| *code != 0) {
        warn!(
            "gpsbabel exited with code {}: {}",
            code,
            outcome.last_line.as_deref().unwrap_or("no output")
        );
    }
}

pub async fn execute(
    orchestrator: &Orchestrator,
    config: &Config,
    command: Command,
    json: bool,
) -> Result<()> {
    let mut progress = print_progress;

    match command {
        Command::Formats(args) => {
            let registry = orchestrator.engine().registry();
            let required = required_mode(&args);
            let formats: Vec<_> = registry.compatible_formats(&required).collect();
            if json {
                print_json(&formats)?;
            } else {
                for format in formats {
                    println!(
                        "{}",
                        listing_row(format, &format.name, &format.extension, &format.label)
                    );
                }
            }
        }
        Command::Devices(args) => {
            let registry = orchestrator.engine().registry();
            let required = required_mode(&args);
            let devices: Vec<_> = registry.compatible_devices(&required).collect();
            if json {
                print_json(&devices)?;
            } else {
                for device in devices {
                    println!("{}", listing_row(device, &device.name, "", &device.label));
                }
            }
        }
        Command::Import {
            source,
            input_type,
            target,
        } => {
            let mut document = Document::default();
            let engine_args = format!("-i {}", input_type);
            let outcome = orchestrator
                .convert_from_filter(
                    Some(&mut document),
                    &engine_args,
                    &source,
                    target.filters.as_deref(),
                    Some(&mut progress),
                )
                .await
                .with_context(|| format!("Failed to import {:?}", source))?;
            report(&outcome);
            save(&document, &target.output).await?;
        }
        Command::Shell {
            command,
            input_type,
            output,
        } => {
            let mut document = Document::default();
            let outcome = orchestrator
                .convert_from_shell_command(
                    &mut document,
                    &command,
                    input_type.as_deref(),
                    Some(&mut progress),
                )
                .await
                .context("Shell command conversion failed")?;
            report(&outcome);
            save(&document, &output).await?;
        }
        Command::Fetch {
            url,
            input_type,
            referer,
            target,
        } => {
            let mut options = DownloadOptions::default();
            if let Some(referer) = referer {
                options = options.with_referer(referer);
            }
            let mut document = Document::default();
            let outcome = orchestrator
                .convert_from_url(
                    &mut document,
                    &url,
                    input_type.as_deref(),
                    target.filters.as_deref(),
                    Some(&mut progress),
                    Some(&options),
                )
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            report(&outcome);
            if let Some(description) = document.description() {
                info!("Description: {}", description);
            }
            save(&document, &target.output).await?;
        }
        Command::Filter {
            source,
            filters,
            output,
        } => {
            let mut document = Document::load_gpx(&source)
                .await
                .with_context(|| format!("Failed to read {:?}", source))?;
            let outcome = orchestrator
                .apply_filters(&mut document, &filters, Some(&mut progress))
                .await
                .context("Filtering failed")?;
            report(&outcome);
            save(&document, output.as_ref().unwrap_or(&source)).await?;
        }
        Command::Export {
            source,
            destination,
            format,
            suboptions,
            selection,
        } => {
            let document = Document::load_gpx(&source)
                .await
                .with_context(|| format!("Failed to read {:?}", source))?;
            let outcome = orchestrator
                .export_with_engine(
                    &document,
                    &destination,
                    &format,
                    export_selection(&selection),
                    suboptions.as_deref(),
                    Some(&mut progress),
                )
                .await
                .with_context(|| format!("Failed to export to {}", destination))?;
            report(&outcome);
        }
        Command::Config => {
            print_json(&SanitizedConfig::from(config))?;
        }
    }

    Ok(())
}

fn required_mode(args: &ListArgs) -> CapabilityMode {
    args.mode
        .as_deref()
        .map(CapabilityMode::parse)
        .unwrap_or(CapabilityMode::NONE)
}

fn listing_row(item: &impl Capable, name: &str, extension: &str, label: &str) -> String {
    format!("{:<16} {} {:<8} {}", name, item.mode(), extension, label)
}

fn export_selection(args: &SelectionArgs) -> ExportSelection {
    if !(args.tracks || args.routes || args.waypoints) {
        return ExportSelection::ALL;
    }
    ExportSelection {
        tracks: args.tracks,
        routes: args.routes,
        waypoints: args.waypoints,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn save(document: &Document, path: &std::path::Path) -> Result<()> {
    document
        .save(path)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackbabel_core::FormatDescriptor;

    #[test]
    fn test_no_selection_flags_exports_everything() {
        let args = SelectionArgs {
            tracks: false,
            routes: false,
            waypoints: false,
        };
        assert_eq!(export_selection(&args), ExportSelection::ALL);

        let args = SelectionArgs {
            tracks: true,
            routes: false,
            waypoints: false,
        };
        let selection = export_selection(&args);
        assert!(selection.tracks);
        assert!(!selection.waypoints);
    }

    #[test]
    fn test_required_mode_defaults_to_none() {
        assert_eq!(required_mode(&ListArgs { mode: None }), CapabilityMode::NONE);
        let mode = required_mode(&ListArgs {
            mode: Some("--r---".to_string()),
        });
        assert!(mode.tracks_read);
        assert!(!mode.waypoints_read);
    }

    #[test]
    fn test_listing_row() {
        let format = FormatDescriptor {
            name: "gpx".to_string(),
            extension: "gpx".to_string(),
            label: "GPX XML".to_string(),
            mode: CapabilityMode::ALL,
        };
        let row = listing_row(&format, &format.name, &format.extension, &format.label);
        assert!(row.starts_with("gpx "));
        assert!(row.contains("rwrwrw"));
        assert!(row.ends_with("GPX XML"));
    }
}
