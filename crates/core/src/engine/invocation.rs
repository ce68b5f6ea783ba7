//! Builds concrete engine and shell invocations from conversion requests.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::EngineError;
use super::location::EngineLocation;

/// Engine identifier of the GPX reader/writer. Everything imported goes
/// through GPX so the injected GPX decoder can read the result.
pub const GPX_FORMAT: &str = "gpx";

/// Engine flag that prints the tab-separated feature listing.
pub const FEATURE_LISTING_FLAG: &str = "-^3";

/// A program plus its argument vector, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Splits user-supplied engine arguments on single spaces.
///
/// Empty tokens are dropped: some engine builds reject a blank argument,
/// which a stray double space would otherwise produce.
pub fn split_args(args: &str) -> impl Iterator<Item = &str> {
    args.split(' ').filter(|token| !token.is_empty())
}

/// Quotes a word for inclusion in a POSIX shell command line.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Assembles argument vectors for the engine and shell invocations.
#[derive(Debug, Clone, Copy)]
pub struct InvocationBuilder<'a> {
    location: &'a EngineLocation,
    shell: &'a Path,
}

impl<'a> InvocationBuilder<'a> {
    pub fn new(location: &'a EngineLocation, shell: &'a Path) -> Self {
        Self { location, shell }
    }

    /// Starts an engine command line, prefixed with unbuffer when available.
    fn engine_command(&self) -> Result<(PathBuf, Vec<String>), EngineError> {
        let engine = self.location.require_engine()?;
        Ok(match self.location.unbuffer() {
            Some(unbuffer) => (unbuffer.to_path_buf(), vec![path_arg(engine)]),
            None => (engine.to_path_buf(), Vec::new()),
        })
    }

    /// `engine -^3`: print supported formats and devices.
    pub fn list_features(&self) -> Result<Invocation, EngineError> {
        let (program, mut args) = self.engine_command()?;
        args.push(FEATURE_LISTING_FLAG.to_string());
        Ok(Invocation::new(program, args))
    }

    /// `engine <engine_args> -f <source> [<filters>] -o gpx -F <destination>`
    ///
    /// `engine_args` must name the input type (`-i <format>`).
    pub fn filter(
        &self,
        engine_args: &str,
        source: &Path,
        filters: Option<&str>,
        destination: &Path,
    ) -> Result<Invocation, EngineError> {
        let (program, mut args) = self.engine_command()?;
        args.extend(split_args(engine_args).map(String::from));
        args.push("-f".to_string());
        args.push(path_arg(source));
        if let Some(filters) = filters {
            args.extend(split_args(filters).map(String::from));
        }
        args.extend([
            "-o".to_string(),
            GPX_FORMAT.to_string(),
            "-F".to_string(),
            path_arg(destination),
        ]);
        Ok(Invocation::new(program, args))
    }

    /// `<shell> -c "<command> | engine -i <format> -f - -o gpx -F <destination>"`,
    /// or `<shell> -c "<command> > <destination>"` when no input format is given.
    ///
    /// Without an input format the engine is not involved at all and the
    /// command's output must already be GPX.
    pub fn shell(
        &self,
        shell_command: &str,
        input_format: Option<&str>,
        destination: &Path,
    ) -> Result<Invocation, EngineError> {
        let destination = shell_quote(&destination.to_string_lossy());
        let line = match input_format {
            Some(format) => {
                let engine = self.location.require_engine()?;
                format!(
                    "{} | {} -i {} -f - -o {} -F {}",
                    shell_command,
                    shell_quote(&engine.to_string_lossy()),
                    format,
                    GPX_FORMAT,
                    destination
                )
            }
            None => format!("{} > {}", shell_command, destination),
        };
        Ok(Invocation::new(self.shell, vec!["-c".to_string(), line]))
    }

    /// `engine -i gpx -f <source> <engine_args> -F <destination>`
    ///
    /// `engine_args` must name the output type (`-o <format>`); `destination`
    /// may be a file or a device port.
    pub fn export(
        &self,
        source: &Path,
        engine_args: &str,
        destination: &str,
    ) -> Result<Invocation, EngineError> {
        let (program, mut args) = self.engine_command()?;
        args.extend([
            "-i".to_string(),
            GPX_FORMAT.to_string(),
            "-f".to_string(),
            path_arg(source),
        ]);
        args.extend(split_args(engine_args).map(String::from));
        args.push("-F".to_string());
        args.push(destination.to_string());
        Ok(Invocation::new(program, args))
    }
}
