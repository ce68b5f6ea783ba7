//! Testing utilities and mock implementations of the conversion collaborators.
//!
//! These mocks let the conversion pipeline be exercised without real codecs
//! or network access. The engine itself is usually replaced by a small shell
//! script standing in for gpsbabel.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackbabel_core::testing::{MemoryLayer, MockCodec, MockDownloader};
//!
//! let downloader = MockDownloader::new();
//! downloader.set_body("https://example.com/a.gpx", "<gpx/>").await;
//!
//! let codec = MockCodec::new();
//! let mut layer = MemoryLayer::default();
//! // Run a conversion, then inspect layer.content
//! ```

mod mock_codec;
mod mock_downloader;

pub use mock_codec::{MemoryLayer, MockCodec};
pub use mock_downloader::{MockDownloader, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// A minimal GPX document with one waypoint.
    pub const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="trackbabel">
  <wpt lat="45.0" lon="7.0"><name>Start</name></wpt>
</gpx>
"#;

    /// A feature listing in the engine's `-^3` format.
    pub const FEATURE_LISTING: &str = "file\trw----\tgpx\tgpx\tGPX XML\n\
file\trw----\tkml\tkml\tGoogle Earth (Keyhole) Markup Language\n\
file\tr-r-r-\tnmea\tnmea\tNMEA 0183 sentences\n\
file\t-w-w-w\tunicsv\tcsv\tUniversal csv with field structure in first line\n\
serial\trwrwrw\tgarmin\t\tGarmin serial/USB protocol\n\
option\tgarmin\tsnlen\tLength of generated shortnames\tinteger\n";

    /// Writes an executable shell script standing in for the engine.
    ///
    /// The script answers `-^3` with [`FEATURE_LISTING`], and otherwise
    /// prints its arguments on stdout and copies the file after `-f` to the
    /// file after `-F`. Sources starting with `FAIL` make it exit with 1.
    #[cfg(unix)]
    pub fn fake_engine(dir: &Path) -> std::io::Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            r#"#!/bin/sh
if [ "$1" = "-^3" ]; then
  printf '%s' '{listing}'
  exit 0
fi
echo "args: $*"
src=""
dst=""
while [ $# -gt 0 ]; do
  case "$1" in
    -f) src="$2"; shift ;;
    -F) dst="$2"; shift ;;
  esac
  shift
done
if [ "$src" != "-" ] && grep -q '^FAIL' "$src"; then
  echo "error: bad input"
  exit 1
fi
if [ "$src" = "-" ]; then
  cat > "$dst"
else
  cat "$src" > "$dst"
fi
echo "done"
"#,
            listing = FEATURE_LISTING
        );
        let path = dir.join("gpsbabel");
        std::fs::write(&path, script)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }
}
