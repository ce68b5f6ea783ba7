//! Startup discovery of the engine and its supported features.

use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::invocation::InvocationBuilder;
use super::location::EngineLocation;
use super::registry::FormatRegistry;
use super::runner::{ProcessRunner, ProgressEvent};

/// Runs the engine's feature listing and parses it into a registry.
pub async fn discover_features(
    runner: &ProcessRunner,
    builder: &InvocationBuilder<'_>,
) -> Result<FormatRegistry, EngineError> {
    let invocation = builder.list_features()?;
    let mut registry = FormatRegistry::new();
    let mut sink = |event: ProgressEvent| {
        if let ProgressEvent::Diagnostic(line) = event {
            registry.parse_line(&line);
        }
    };
    runner
        .run(&invocation, Some(&mut sink), &CancellationToken::new())
        .await?;
    Ok(registry)
}

/// The located engine together with everything it reported it can do.
///
/// Built once at startup and immutable afterwards; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    location: EngineLocation,
    registry: FormatRegistry,
}

impl Engine {
    /// Assembles an engine from already known parts, without running anything.
    pub fn new(config: EngineConfig, location: EngineLocation, registry: FormatRegistry) -> Self {
        Self {
            config,
            location,
            registry,
        }
    }

    /// Locates the engine binaries and loads the feature listing.
    ///
    /// Never fails: a missing engine or a failed listing leaves the registry
    /// empty, which callers observe through [`Engine::is_available`].
    pub async fn initialize(config: &EngineConfig) -> Self {
        let location = EngineLocation::discover(config);
        Self::initialize_at(config.clone(), location).await
    }

    /// Loads the feature listing from an engine at a known location.
    pub async fn initialize_at(config: EngineConfig, location: EngineLocation) -> Self {
        let mut engine = Self::new(config, location, FormatRegistry::new());
        if engine.location.engine().is_none() {
            return engine;
        }

        let discovered = discover_features(&engine.runner(), &engine.builder()).await;
        match discovered {
            Ok(registry) => {
                info!(
                    formats = registry.formats().len(),
                    devices = registry.devices().len(),
                    "Engine features loaded"
                );
                engine.registry = registry;
            }
            Err(e) => warn!("Running engine to get features failed: {}", e),
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn location(&self) -> &EngineLocation {
        &self.location
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Whether the engine is usable, judged by at least one device being known.
    pub fn is_available(&self) -> bool {
        self.registry.is_available()
    }

    /// A runner honoring the configured timeout and exit status policy.
    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::from_config(&self.config)
    }

    /// An invocation builder for the located binaries and configured shell.
    pub fn builder(&self) -> InvocationBuilder<'_> {
        InvocationBuilder::new(&self.location, self.shell())
    }

    fn shell(&self) -> &Path {
        &self.config.shell
    }
}
