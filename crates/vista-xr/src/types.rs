use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hand controllers tracked at once.
pub const MAX_CONTROLLERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u32); // 0 = left, 1 = right

impl ControllerId {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);

    /// Slot index, or `None` for controllers beyond [`MAX_CONTROLLERS`].
    pub fn slot(self) -> Option<usize> {
        let index = self.0 as usize;
        (index < MAX_CONTROLLERS).then_some(index)
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    SelectStart,
    SelectEnd,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub controller: ControllerId,
    pub kind: ControllerEvent,
}

impl InputEvent {
    pub fn select_start(controller: ControllerId) -> Self {
        Self {
            controller,
            kind: ControllerEvent::SelectStart,
        }
    }

    pub fn select_end(controller: ControllerId) -> Self {
        Self {
            controller,
            kind: ControllerEvent::SelectEnd,
        }
    }

    pub fn disconnected(controller: ControllerId) -> Self {
        Self {
            controller,
            kind: ControllerEvent::Disconnected,
        }
    }
}

/// Media readiness, ordered from nothing loaded to enough data to play through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    pub fn is_fully_loaded(self) -> bool {
        self >= ReadyState::HaveEnoughData
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    Viewer,
    #[default]
    Local,
    LocalFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpace {
    pub kind: ReferenceSpaceKind,
    pub id: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoLayout {
    #[default]
    Mono,
    StereoLeftRight,
    StereoTopBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Quad,
    Equirect,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Quad => "quad",
            LayerKind::Equirect => "equirect",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer kind '{0}'")]
pub struct UnknownLayerKind(pub String);

impl FromStr for LayerKind {
    type Err = UnknownLayerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quad" => Ok(LayerKind::Quad),
            "equirect" => Ok(LayerKind::Equirect),
            _ => Err(UnknownLayerKind(s.to_string())),
        }
    }
}

/// Opaque compositor layer id as consumed by the session render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u64);

/// Everything the compositor needs to construct a media layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerInit {
    pub space: ReferenceSpace,
    pub layout: StereoLayout,
    pub transform: Option<Mat4>,
    /// Quad extent in metres; ignored by equirect layers.
    pub size: Vec2,
    /// Sphere radius in metres; ignored by quad layers. Zero means infinite.
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Where a scene node hangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Root,
    Controller(ControllerId),
    Node(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_kind_parse() {
        assert_eq!("quad".parse::<LayerKind>(), Ok(LayerKind::Quad));
        assert_eq!("EQUIRECT".parse::<LayerKind>(), Ok(LayerKind::Equirect));
        assert_eq!(" quad ".parse::<LayerKind>(), Ok(LayerKind::Quad));
        assert_eq!(
            "cylinder".parse::<LayerKind>(),
            Err(UnknownLayerKind("cylinder".to_string()))
        );
        assert!("".parse::<LayerKind>().is_err());
        assert_eq!(
            UnknownLayerKind("cube".to_string()).to_string(),
            "unknown layer kind 'cube'"
        );
    }

    #[test]
    fn test_ready_state_threshold() {
        assert!(!ReadyState::HaveNothing.is_fully_loaded());
        assert!(!ReadyState::HaveFutureData.is_fully_loaded());
        assert!(ReadyState::HaveEnoughData.is_fully_loaded());
    }

    #[test]
    fn test_controller_slots() {
        assert_eq!(ControllerId::LEFT.slot(), Some(0));
        assert_eq!(ControllerId::RIGHT.slot(), Some(1));
        assert_eq!(ControllerId(2).slot(), None);
    }
}
