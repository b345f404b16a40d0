//! Session layout configuration, loaded from JSON.

use std::collections::HashSet;
use std::path::Path;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use vista_common::Error;
use vista_xr::{ReferenceSpaceKind, StereoLayout};

use crate::factory::LayerOptions;
use crate::registry::LayerName;

/// Rigid placement in metres, rotation as XYZ Euler angles in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl Placement {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            rotation: [0.0; 3],
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        let [rx, ry, rz] = self.rotation;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            rx.to_radians(),
            ry.to_radians(),
            rz.to_radians(),
        );
        Mat4::from_rotation_translation(rotation, Vec3::from_array(self.position))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    /// World placement of the toolbar group.
    pub placement: Placement,
    pub bar_width: f32,
    pub bar_height: f32,
    pub button_size: f32,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            placement: Placement::at(0.0, -0.5, -1.0),
            bar_width: 0.6,
            bar_height: 0.04,
            button_size: 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: LayerName,
    /// Compositor layer kind, "quad" or "equirect". Checked when the layer is created.
    pub kind: String,
    #[serde(default)]
    pub layout: StereoLayout,
    #[serde(default)]
    pub space: ReferenceSpaceKind,
    /// Fixed layer pose; quads default to the reference space origin.
    #[serde(default)]
    pub transform: Option<Placement>,
    /// Quad width and height in metres.
    #[serde(default = "default_quad_size")]
    pub size: [f32; 2],
    /// Equirect sphere radius in metres, 0 for infinite.
    #[serde(default)]
    pub radius: f32,
    /// Whether the quad can be grabbed and carried by a controller.
    #[serde(default)]
    pub draggable: bool,
    #[serde(default)]
    pub toolbar: ToolbarConfig,
}

fn default_quad_size() -> [f32; 2] {
    [1.6, 0.9]
}

impl LayerConfig {
    pub fn options(&self) -> LayerOptions {
        LayerOptions {
            space: self.space,
            layout: self.layout,
            transform: self.transform.map(|placement| placement.to_mat4()),
            size: Vec2::from_array(self.size),
            radius: self.radius,
        }
    }

    /// World pose of the layer surface, identity when unplaced.
    pub fn layer_transform(&self) -> Mat4 {
        self.transform
            .map(|placement| placement.to_mat4())
            .unwrap_or(Mat4::IDENTITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub layers: Vec<LayerConfig>,
}

impl Default for SessionConfig {
    /// 360° stereo backdrop plus a draggable stereo panel in front of the viewer.
    fn default() -> Self {
        Self {
            layers: vec![
                LayerConfig {
                    name: LayerName::Equirect,
                    kind: "equirect".to_string(),
                    layout: StereoLayout::StereoTopBottom,
                    space: ReferenceSpaceKind::Local,
                    transform: None,
                    size: default_quad_size(),
                    radius: 0.0,
                    draggable: false,
                    toolbar: ToolbarConfig {
                        placement: Placement::at(0.0, -0.6, -1.2),
                        ..ToolbarConfig::default()
                    },
                },
                LayerConfig {
                    name: LayerName::Quad,
                    kind: "quad".to_string(),
                    layout: StereoLayout::StereoLeftRight,
                    space: ReferenceSpaceKind::Local,
                    transform: Some(Placement::at(0.0, 0.3, -2.5)),
                    size: default_quad_size(),
                    radius: 0.0,
                    draggable: true,
                    toolbar: ToolbarConfig {
                        placement: Placement::at(0.0, -0.3, -2.4),
                        ..ToolbarConfig::default()
                    },
                },
            ],
        }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> vista_common::Result<Self> {
        let config: SessionConfig = vista_common::load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> vista_common::Result<()> {
        if self.layers.is_empty() {
            return Err(Error::config("at least one layer is required"));
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.name) {
                return Err(Error::config(format!("layer '{}' configured twice", layer.name)));
            }
            if layer.size.iter().any(|extent| !(*extent > 0.0)) {
                return Err(Error::config(format!("layer '{}' has an empty size", layer.name)));
            }
            if !(layer.radius >= 0.0) {
                return Err(Error::config(format!("layer '{}' has a negative radius", layer.name)));
            }
            let toolbar = &layer.toolbar;
            if !(toolbar.bar_width > 0.0 && toolbar.bar_height > 0.0 && toolbar.button_size > 0.0) {
                return Err(Error::config(format!(
                    "layer '{}' has a degenerate toolbar",
                    layer.name
                )));
            }
        }
        Ok(())
    }

    pub fn layer(&self, name: LayerName) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layers.len(), 2);
        assert!(config.layer(LayerName::Quad).unwrap().draggable);
        assert!(!config.layer(LayerName::Equirect).unwrap().draggable);
    }

    #[test]
    fn test_minimal_layer_uses_defaults() {
        let raw = r#"{ "layers": [ { "name": "quad", "kind": "quad" } ] }"#;
        let config: SessionConfig = serde_json::from_str(raw).unwrap();
        let layer = &config.layers[0];

        assert_eq!(layer.layout, StereoLayout::Mono);
        assert_eq!(layer.space, ReferenceSpaceKind::Local);
        assert_eq!(layer.size, [1.6, 0.9]);
        assert_eq!(layer.toolbar, ToolbarConfig::default());
        assert!(layer.transform.is_none());
    }

    #[test]
    fn test_kebab_case_enums() {
        let raw = r#"{ "layers": [ {
            "name": "equirect", "kind": "equirect",
            "layout": "stereo-top-bottom", "space": "local-floor"
        } ] }"#;
        let config: SessionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.layers[0].layout, StereoLayout::StereoTopBottom);
        assert_eq!(config.layers[0].space, ReferenceSpaceKind::LocalFloor);
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let mut config = SessionConfig::default();
        config.layers[1].name = LayerName::Equirect;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_degenerate_toolbar_rejected() {
        let mut config = SessionConfig::default();
        config.layers[0].toolbar.bar_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        vista_common::save_json(&path, &SessionConfig::default()).unwrap();

        let loaded = SessionConfig::load(&path).unwrap();
        assert_eq!(loaded, SessionConfig::default());
    }

    #[test]
    fn test_placement_rotation() {
        let placement = Placement {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 90.0, 0.0],
        };
        let m = placement.to_mat4();
        let forward = m.transform_vector3(Vec3::NEG_Z);
        assert_relative_eq!(forward.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-5);
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    }
}
