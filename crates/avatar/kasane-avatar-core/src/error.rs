//! Error taxonomy for the avatar runtime.
//!
//! Load-time failures abort the load call and leave prior state untouched.
//! Per-frame failures are limited to renderer resource errors surfaced by
//! `draw`; parameter state committed before the failure stays valid.

use thiserror::Error;

/// Errors surfaced by [`crate::engine::Avatar`] operations.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// A decoded asset failed validation.
    #[error("asset load failed: {0}")]
    AssetLoad(String),

    /// An unknown parameter identifier was passed to get/set/add/multiply.
    #[error("unknown parameter '{0}'")]
    ParameterNotFound(String),

    /// A motion or expression name that was never registered.
    #[error("unknown {kind} '{name}'")]
    NameNotFound { kind: &'static str, name: String },

    /// A motion/expression operation before any definition was loaded.
    #[error("{0} subsystem used before any definition was loaded")]
    NotInitialized(&'static str),

    /// A play-mode integer outside the defined enumeration.
    #[error("invalid motion mode {0}")]
    InvalidMode(i32),

    /// The host renderer could not satisfy a resource request.
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

/// Errors reported by [`crate::renderer::Renderer`] implementations.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("mesh allocation failed: {0}")]
    MeshAllocation(String),

    #[error("stencil capacity exhausted after {0} passes")]
    StencilCapacity(u32),
}
