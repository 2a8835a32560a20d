//! # Scene Error Types

use std::path::PathBuf;

use glint_core::EcsError;
use thiserror::Error;

/// Errors raised while building or extracting a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// An ECS operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// No entity has both a camera and a transform.
    #[error("no active camera: no entity has both a camera and a transform")]
    NoActiveCamera,

    /// The entity ceiling was reached while spawning.
    #[error("entity capacity exhausted")]
    CapacityExhausted,

    /// An OBJ document could not be parsed.
    #[error("obj line {line}: {message}")]
    Obj {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A mesh file could not be read.
    #[error("failed to read mesh {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
