use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Convert GPS data between formats and devices with gpsbabel.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Configuration file. Falls back to `TRACKBABEL_CONFIG`, then built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print listings as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List file formats the engine supports.
    Formats(ListArgs),

    /// List devices the engine can talk to.
    Devices(ListArgs),

    /// Convert a local file to GPX.
    Import {
        /// Input file.
        source: PathBuf,

        /// Engine input type, e.g. `nmea`.
        #[arg(short = 'i', long)]
        input_type: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run a shell command and convert its output to GPX.
    Shell {
        command: String,

        /// Engine input type of the command's output. GPX when omitted.
        #[arg(short = 'i', long)]
        input_type: Option<String>,

        /// GPX file to write.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download a URL and convert it to GPX.
    Fetch {
        url: String,

        /// Input type: `gpx`, `kml`, `viking-geojson-osrm` (or `geojson-osrm`) or any engine type.
        #[arg(short = 'i', long)]
        input_type: Option<String>,

        /// `Referer` header to send.
        #[arg(long)]
        referer: Option<String>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run engine filters over a GPX file.
    Filter {
        /// GPX file, rewritten in place unless `--output` is given.
        source: PathBuf,

        /// Filter arguments, e.g. `-x simplify,count=100`.
        #[arg(allow_hyphen_values = true)]
        filters: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a GPX file to another format or a device.
    Export {
        /// GPX file to export.
        source: PathBuf,

        /// Destination file or device port.
        destination: String,

        /// Engine output type, e.g. `kml` or `garmin`.
        #[arg(short = 'o', long)]
        format: String,

        /// Format suboptions appended after a comma.
        #[arg(long)]
        suboptions: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show the effective configuration.
    Config,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only entries offering these capabilities, e.g. `--r---`.
    #[arg(long)]
    pub mode: Option<String>,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Engine filters applied after reading.
    #[arg(short = 'x', long, allow_hyphen_values = true)]
    pub filters: Option<String>,

    /// File to write the result to.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Which data to export. All of it when no flag is given.
#[derive(Debug, Args)]
pub struct SelectionArgs {
    #[arg(short = 't', long)]
    pub tracks: bool,

    #[arg(short = 'r', long)]
    pub routes: bool,

    #[arg(short = 'w', long)]
    pub waypoints: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let cli = Cli::parse_from([
            "trackbabel",
            "import",
            "log.nmea",
            "-i",
            "nmea",
            "-x",
            "-x simplify,count=10",
            "-o",
            "out.gpx",
        ]);
        match cli.command {
            Command::Import {
                source,
                input_type,
                target,
            } => {
                assert_eq!(source, PathBuf::from("log.nmea"));
                assert_eq!(input_type, "nmea");
                assert_eq!(target.filters.as_deref(), Some("-x simplify,count=10"));
                assert_eq!(target.output, PathBuf::from("out.gpx"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_selection() {
        let cli = Cli::parse_from([
            "trackbabel",
            "--json",
            "export",
            "in.gpx",
            "/dev/ttyUSB0",
            "-o",
            "garmin",
            "-t",
            "-w",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Export { selection, .. } => {
                assert!(selection.tracks);
                assert!(!selection.routes);
                assert!(selection.waypoints);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
