use anyhow::{Context, Result};
use renderer::{export_still, FixedTimeSource, Renderer, RendererConfig, Viewport, VsyncMode};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::settings::Settings;

pub fn run(cli: Cli) -> Result<()> {
    let (settings, settings_path) = Settings::load_or_default(cli.config.as_deref())
        .context("failed to load neonzoom settings")?;
    let config = resolve_config(&cli, &settings);

    initialise_tracing(config.diagnostics);
    match settings_path {
        Some(path) => tracing::debug!(path = %path.display(), "loaded settings"),
        None => tracing::debug!("no settings file; using defaults"),
    }

    if let Some(path) = cli.export.as_deref() {
        let (width, height) = config.surface_size;
        let viewport = Viewport::new(width, height)
            .context("export size must be greater than zero")?;
        let mut clock = FixedTimeSource::new(cli.time.unwrap_or(0.0));
        export_still(path, viewport, &mut clock)?;
        return Ok(());
    }

    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        vsync = ?config.vsync,
        diagnostics = config.diagnostics,
        "starting neonzoom"
    );
    let renderer = Renderer::new(config);
    renderer.run().context("renderer exited with an error")?;
    Ok(())
}

/// Folds command-line flags over file settings over built-in defaults.
pub fn resolve_config(cli: &Cli, settings: &Settings) -> RendererConfig {
    let defaults = RendererConfig::default();
    let surface_size = match cli.size {
        Some(size) => (size.width, size.height),
        None => (
            settings.width.unwrap_or(defaults.surface_size.0),
            settings.height.unwrap_or(defaults.surface_size.1),
        ),
    };
    let vsync = if cli.vsync || settings.vsync.unwrap_or(false) {
        VsyncMode::On
    } else {
        defaults.vsync
    };
    let diagnostics = cli.diagnostics || settings.diagnostics.unwrap_or(defaults.diagnostics);

    RendererConfig {
        surface_size,
        vsync,
        diagnostics,
        ..defaults
    }
}

fn initialise_tracing(diagnostics: bool) {
    let fallback = if diagnostics { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
