use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Startup step that failed while bringing the renderer up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    EventLoop,
    Window,
    Surface,
    Adapter,
    Device,
    SurfaceConfig,
    ShaderCompile,
    UniformLookup,
    Pipeline,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SetupStage::EventLoop => "creating the event loop",
            SetupStage::Window => "creating the window",
            SetupStage::Surface => "creating the rendering surface",
            SetupStage::Adapter => "selecting a GPU adapter",
            SetupStage::Device => "creating the GPU device",
            SetupStage::SurfaceConfig => "choosing the surface configuration",
            SetupStage::ShaderCompile => "compiling the fragment shader",
            SetupStage::UniformLookup => "resolving shader uniforms",
            SetupStage::Pipeline => "building the render pipeline",
        };
        f.write_str(label)
    }
}

/// Ways the renderer can fail.
///
/// A windowed run fails in setup or at present time; a headless still fails
/// with `Export`. All variants are terminal: the caller is expected to report
/// the error and exit.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("setup failed while {stage}: {source}")]
    Setup {
        stage: SetupStage,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to present frame: {0}")]
    Present(#[from] wgpu::SurfaceError),
    /// Headless still rendering; never raised by the windowed path.
    #[error("failed to export still to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl RenderError {
    pub fn setup(stage: SetupStage, source: impl Into<anyhow::Error>) -> Self {
        RenderError::Setup {
            stage,
            source: source.into(),
        }
    }

    pub fn export(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        RenderError::Export {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn stage(&self) -> Option<SetupStage> {
        match self {
            RenderError::Setup { stage, .. } => Some(*stage),
            RenderError::Present(_) | RenderError::Export { .. } => None,
        }
    }
}

/// Tags a fallible startup step with the stage it belongs to.
pub(crate) trait SetupContext<T> {
    fn during(self, stage: SetupStage) -> Result<T, RenderError>;
}

impl<T, E> SetupContext<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn during(self, stage: SetupStage) -> Result<T, RenderError> {
        self.map_err(|err| RenderError::setup(stage, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_names_the_stage() {
        let lookup: Result<(), anyhow::Error> = Err(anyhow::anyhow!("uniform `iTime` not found"));
        let err = lookup.during(SetupStage::UniformLookup).unwrap_err();
        assert_eq!(err.stage(), Some(SetupStage::UniformLookup));
        let message = err.to_string();
        assert!(message.contains("resolving shader uniforms"));
        assert!(message.contains("iTime"));
    }

    #[test]
    fn present_error_has_no_stage() {
        let err = RenderError::from(wgpu::SurfaceError::OutOfMemory);
        assert_eq!(err.stage(), None);
        assert!(err.to_string().starts_with("failed to present frame"));
    }

    #[test]
    fn export_error_is_not_a_setup_failure() {
        let err = RenderError::export("out/still.png", anyhow::anyhow!("disk full"));
        assert_eq!(err.stage(), None);
        let message = err.to_string();
        assert!(message.starts_with("failed to export still to out/still.png"));
        assert!(message.contains("disk full"));
        assert!(!message.contains("setup failed"));
    }
}
