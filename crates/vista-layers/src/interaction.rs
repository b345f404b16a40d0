//! Controller interaction with the per-layer toolbars.
//!
//! Each (controller, layer) pair is in one of three states, derived from the
//! shared toolbar visibility map and the overlay's current carrier. Only
//! discrete controller events move between states; hovering merely moves the
//! intersection marker.

use tracing::{debug, warn};
use vista_xr::{CompositorBinding, ControllerEvent, ControllerId, InputEvent, Scene, MAX_CONTROLLERS};

use crate::raycast::{Hit, Ray};
use crate::registry::{LayerName, LayerRegistry, VisibilityMap};

/// Marker pull-back along the ray so it never z-fights the surface it marks.
pub const MARKER_OFFSET: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionState {
    Hidden,
    VisibleIdle,
    VisibleDragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ShowToolbar,
    HideToolbar,
    Intersect,
    IntersectAndAttach,
    DetachOverlay,
}

/// The transition table.
pub fn transition(
    state: InteractionState,
    event: ControllerEvent,
    hit: bool,
    draggable: bool,
) -> (InteractionState, Option<Effect>) {
    use ControllerEvent::*;
    use InteractionState::*;

    match (state, event) {
        (Hidden, SelectStart) => (VisibleIdle, Some(Effect::ShowToolbar)),
        (VisibleIdle, SelectStart) if !hit => (Hidden, Some(Effect::HideToolbar)),
        (VisibleIdle, SelectStart) if draggable => (VisibleDragging, Some(Effect::IntersectAndAttach)),
        (VisibleIdle, SelectStart) => (VisibleIdle, Some(Effect::Intersect)),
        (VisibleDragging, SelectEnd) => (VisibleIdle, Some(Effect::DetachOverlay)),
        (Hidden, Disconnected) => (Hidden, None),
        (_, Disconnected) => (Hidden, Some(Effect::HideToolbar)),
        (state, _) => (state, None),
    }
}

#[derive(Debug, Default)]
pub struct InteractionMachine {
    visibility: VisibilityMap,
    markers: [bool; MAX_CONTROLLERS],
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    /// Forget all visibility, as for freshly created layers.
    pub fn reset(&mut self) {
        self.visibility.reset();
    }

    pub fn has_marker(&self, controller: ControllerId) -> bool {
        controller.slot().is_some_and(|slot| self.markers[slot])
    }

    pub fn state(&self, controller: ControllerId, name: LayerName, registry: &LayerRegistry) -> InteractionState {
        if !self.visibility.get(name) {
            return InteractionState::Hidden;
        }
        let dragging = registry
            .get(name)
            .and_then(|record| record.dragged_by())
            .is_some_and(|carrier| carrier == controller);
        if dragging {
            InteractionState::VisibleDragging
        } else {
            InteractionState::VisibleIdle
        }
    }

    /// Apply one controller event to every layer, to completion.
    pub fn dispatch(
        &mut self,
        event: InputEvent,
        registry: &mut LayerRegistry,
        compositor: &dyn CompositorBinding,
        scene: &mut dyn Scene,
    ) {
        let controller = event.controller;
        if controller.slot().is_none() {
            warn!("ignoring {:?} from untracked {}", event.kind, controller);
            return;
        }

        let ray = scene.controller_transform(controller).and_then(Ray::from_controller);

        for name in LayerName::ALL {
            let state = self.state(controller, name, registry);
            let Some(record) = registry.get_mut(name) else {
                continue;
            };

            let hits: Vec<Hit> = match (event.kind, state, ray.as_ref()) {
                (ControllerEvent::SelectStart, InteractionState::VisibleIdle, Some(ray)) => {
                    record.intersect(ray, &*scene)
                }
                _ => Vec::new(),
            };

            // An overlay already carried by another controller is not up for grabs.
            let draggable = record.is_draggable() && record.dragged_by().is_none();
            let (next, effect) = transition(state, event.kind, !hits.is_empty(), draggable);
            let Some(effect) = effect else {
                continue;
            };
            debug!("{} {}: {:?} -> {:?} ({:?})", controller, name, state, next, effect);

            match effect {
                Effect::ShowToolbar => {
                    record.show_toolbar(scene);
                    self.visibility.set(name, true);
                }
                Effect::HideToolbar => {
                    record.hide_toolbar(scene);
                    self.visibility.set(name, false);
                }
                Effect::Intersect => record.on_intersect(&hits, compositor, scene),
                Effect::IntersectAndAttach => {
                    record.on_intersect(&hits, compositor, scene);
                    record.attach_overlay(controller, scene);
                }
                Effect::DetachOverlay => record.restore_overlay(scene),
            }
        }

        if event.kind == ControllerEvent::Disconnected {
            self.clear_marker(controller, scene);
        }
        if !self.visibility.any() {
            self.clear_markers(scene);
        }
    }

    /// Move each controller's marker to its nearest hit on a visible toolbar.
    pub fn update_markers(&mut self, registry: &LayerRegistry, scene: &mut dyn Scene) {
        if !self.visibility.any() {
            self.clear_markers(scene);
            return;
        }

        for slot in 0..MAX_CONTROLLERS {
            let controller = ControllerId(slot as u32);
            let Some(ray) = scene.controller_transform(controller).and_then(Ray::from_controller) else {
                continue;
            };
            let nearest = registry
                .iter()
                .filter(|record| self.visibility.get(record.name()))
                .filter_map(|record| record.intersect(&ray, &*scene).into_iter().next())
                .min_by(|a, b| a.distance.total_cmp(&b.distance));

            if let Some(hit) = nearest {
                scene.place_marker(controller, hit.point - ray.direction * MARKER_OFFSET);
                self.markers[slot] = true;
            }
        }
    }

    fn clear_marker(&mut self, controller: ControllerId, scene: &mut dyn Scene) {
        if let Some(slot) = controller.slot() {
            if self.markers[slot] {
                scene.remove_marker(controller);
                self.markers[slot] = false;
            }
        }
    }

    fn clear_markers(&mut self, scene: &mut dyn Scene) {
        for slot in 0..MAX_CONTROLLERS {
            self.clear_marker(ControllerId(slot as u32), scene);
        }
    }
}
