//! # ECS Error Types
//!
//! All errors that can occur in ECS manager and configuration operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors raised by [`EcsManager`](crate::EcsManager) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity ID is out of range or its slot is free.
    #[error("invalid entity: {0}")]
    InvalidEntity(EntityId),

    /// The entity is live but does not have the requested component.
    #[error("{entity} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Type name of the requested component.
        component: &'static str,
    },

    /// The component type is already attached to the entity.
    #[error("{entity} already has a {component} component")]
    ComponentAlreadyAttached {
        /// The entity the component was attached to.
        entity: EntityId,
        /// Type name of the component.
        component: &'static str,
    },

    /// An entity's bitset and the component storages disagree.
    ///
    /// Never expected in correct operation.
    #[error("storage divergence on {entity}: bit and storage disagree for {component}")]
    StorageDivergence {
        /// The affected entity.
        entity: EntityId,
        /// Type name of the affected component.
        component: &'static str,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors raised while loading an [`EcsConfig`](crate::EcsConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid TOML for the expected schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
