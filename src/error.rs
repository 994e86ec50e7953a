//! Error types for voxel-optics

use thiserror::Error;

use crate::voxellation::VoxelIndex;

/// Failures of the optics core.
///
/// None of these ever escapes a single ray's color computation; the volume
/// turns them into sentinel colors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpticsError {
    #[error("shape transform is not invertible")]
    SingularTransform,

    #[error("degenerate metric tensor: {0}")]
    DegenerateTensor(String),

    #[error("no optical parameters configured for voxel {0}")]
    NotConfigured(VoxelIndex),

    #[error("invalid voxellation: {0}")]
    InvalidVoxellation(String),

    #[error("invalid optical parameter: {0}")]
    InvalidParameter(String),
}

/// Failures while loading or rendering a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scene: {0}")]
    Invalid(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Optics(#[from] OpticsError),
}

pub type Result<T> = std::result::Result<T, OpticsError>;
