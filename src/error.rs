/*
 * Error Module
 *
 * Errors only surface at the edges: loading configuration, parsing user
 * input and building render resources. The per-frame simulation path never
 * returns an error; it clamps instead.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlockError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("unknown quality tier '{0}' (expected low, medium or high)")]
    UnknownQuality(String),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("mesh for '{species}' at detail {detail:?} could not be built: {reason}")]
    MeshBuild {
        species: String,
        detail: crate::lod::MeshDetail,
        reason: String,
    },
}
