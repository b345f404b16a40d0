//! Media layer coordination for immersive video sessions.
//!
//! Compositor layers are provisioned once their video sources are ready,
//! published ahead of the session's base layer, and decorated with a
//! controller-operated playback toolbar.

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod factory;
pub mod interaction;
pub mod progress;
pub mod raycast;
pub mod record;
pub mod registry;
pub mod scene;
pub mod session;

pub use bootstrap::{BootstrapStatus, CreatedLayer, LayerRequest, SessionBootstrap};
pub use config::{LayerConfig, Placement, SessionConfig, ToolbarConfig};
pub use factory::{LayerFactory, LayerOptions, PendingLayer};
pub use interaction::{InteractionMachine, InteractionState};
pub use progress::ProgressBar;
pub use raycast::{Hit, Ray};
pub use record::{LayerBehavior, MediaLayerRecord, ObjectRole};
pub use registry::{LayerName, LayerRegistry, VisibilityMap};
pub use scene::SceneGraph;
pub use session::MediaSession;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("invalid layer kind '{0}', expected 'quad' or 'equirect'")]
    InvalidLayerKind(String),
    #[error("reference space unavailable: {0}")]
    ReferenceSpaceUnavailable(String),
    #[error("compositor refused layer: {0}")]
    LayerConstruction(String),
    #[error("layer '{0}' configured more than once")]
    DuplicateLayer(LayerName),
}

pub type LayerResult<T> = Result<T, LayerError>;
