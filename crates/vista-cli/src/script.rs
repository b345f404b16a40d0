//! Scripted controller input for `vista simulate`.

use glam::{Mat4, Quat, Vec3};
use tracing::{info, warn};
use vista_layers::{LayerName, MediaSession, SceneGraph};
use vista_xr::{ControllerId, InputEvent, NodeId, Scene};

/// Controller positions, roughly at the user's hands.
const RIGHT_HAND: Vec3 = Vec3::new(0.2, 0.0, 0.0);
const LEFT_HAND: Vec3 = Vec3::new(-0.2, 0.0, 0.0);
/// Sideways carry speed while dragging, metres per frame.
const CARRY_STEP: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Select with nothing under the ray.
    EmptySelect,
    TogglePlay,
    /// Seek the equirect video to three quarters.
    Seek,
    Grab,
    Drop,
    Disconnect,
}

/// Frames after publication at which each step fires.
const STEPS: &[(u64, Step)] = &[
    (10, Step::EmptySelect),
    (40, Step::TogglePlay),
    (70, Step::TogglePlay),
    (100, Step::Seek),
    (130, Step::EmptySelect),
    (160, Step::Grab),
    (190, Step::Drop),
    (220, Step::Disconnect),
];

pub struct Script {
    published_at: Option<u64>,
    carrying: bool,
    left_pose: Mat4,
}

impl Script {
    pub fn new() -> Self {
        Self {
            published_at: None,
            carrying: false,
            left_pose: Mat4::from_translation(LEFT_HAND),
        }
    }

    pub fn on_published(&mut self, frame: u64) {
        self.published_at = Some(frame);
    }

    /// Frames after publication the whole script needs.
    pub fn length() -> u64 {
        STEPS.last().map(|(offset, _)| *offset + 1).unwrap_or(0)
    }

    /// Pose the controllers for `frame` and return the events to deliver.
    pub fn step(&mut self, frame: u64, media: &MediaSession, scene: &mut SceneGraph) -> Vec<InputEvent> {
        let Some(published_at) = self.published_at else {
            return Vec::new();
        };

        if self.carrying {
            self.left_pose = Mat4::from_translation(Vec3::X * CARRY_STEP) * self.left_pose;
            scene.set_controller_transform(ControllerId::LEFT, self.left_pose);
        }

        let offset = frame.saturating_sub(published_at);
        let Some((_, step)) = STEPS.iter().find(|(at, _)| *at == offset) else {
            return Vec::new();
        };
        info!("frame {}: {:?}", frame, step);

        match step {
            Step::EmptySelect => {
                aim(scene, ControllerId::RIGHT, RIGHT_HAND, RIGHT_HAND + Vec3::new(0.0, 5.0, 0.1));
                click(ControllerId::RIGHT)
            }
            Step::TogglePlay => {
                let Some(button) = media.layer(LayerName::Equirect).map(|layer| layer.toolbar().play_button) else {
                    return Vec::new();
                };
                aim_at(scene, ControllerId::RIGHT, RIGHT_HAND, button, Vec3::ZERO);
                click(ControllerId::RIGHT)
            }
            Step::Seek => {
                let Some(toolbar) = media.layer(LayerName::Equirect).map(|layer| layer.toolbar()) else {
                    return Vec::new();
                };
                let three_quarters = Vec3::new(toolbar.progress.width() / 4.0, 0.0, 0.0);
                aim_at(scene, ControllerId::RIGHT, RIGHT_HAND, toolbar.track, three_quarters);
                click(ControllerId::RIGHT)
            }
            Step::Grab => {
                let Some(overlay) = media.layer(LayerName::Quad).and_then(|layer| layer.overlay()) else {
                    warn!("no draggable quad layer to grab");
                    return Vec::new();
                };
                if let Some(pose) = aim_at(scene, ControllerId::LEFT, LEFT_HAND, overlay.node, Vec3::ZERO) {
                    self.left_pose = pose;
                }
                self.carrying = true;
                vec![InputEvent::select_start(ControllerId::LEFT)]
            }
            Step::Drop => {
                self.carrying = false;
                vec![InputEvent::select_end(ControllerId::LEFT)]
            }
            Step::Disconnect => {
                scene.clear_controller(ControllerId::LEFT);
                vec![InputEvent::disconnected(ControllerId::LEFT)]
            }
        }
    }
}

fn click(controller: ControllerId) -> Vec<InputEvent> {
    vec![InputEvent::select_start(controller), InputEvent::select_end(controller)]
}

fn aim(scene: &mut SceneGraph, controller: ControllerId, origin: Vec3, target: Vec3) -> Mat4 {
    let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, (target - origin).normalize_or_zero());
    let pose = Mat4::from_rotation_translation(rotation, origin);
    scene.set_controller_transform(controller, pose);
    pose
}

fn aim_at(
    scene: &mut SceneGraph,
    controller: ControllerId,
    origin: Vec3,
    node: NodeId,
    offset: Vec3,
) -> Option<Mat4> {
    let Some(world) = scene.world_transform(node) else {
        warn!("{:?} is not in the scene, {} keeps its pose", node, controller);
        return None;
    };
    Some(aim(scene, controller, origin, world.transform_point3(offset)))
}
