//! Host-facing interfaces for immersive sessions: reference spaces, compositor
//! layers, video sources and the scene graph, plus an in-process dummy host.

#![forbid(unsafe_code)]

pub mod dummy;
pub mod host;
pub mod types;

pub use host::{CompositorBinding, Scene, VideoSource, XrSession};
pub use types::{
    ControllerEvent, ControllerId, InputEvent, LayerHandle, LayerInit, LayerKind, NodeId, Parent,
    ReadyState, ReferenceSpace, ReferenceSpaceKind, StereoLayout, UnknownLayerKind,
    MAX_CONTROLLERS,
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XrError {
    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type XrResult<T> = Result<T, XrError>;
