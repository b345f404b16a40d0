//! Layer names, the per-name record registry and shared toolbar visibility.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::MediaLayerRecord;

/// Logical name of a managed media layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    Equirect,
    Quad,
}

impl LayerName {
    pub const COUNT: usize = 2;
    pub const ALL: [LayerName; Self::COUNT] = [LayerName::Equirect, LayerName::Quad];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerName::Equirect => "equirect",
            LayerName::Quad => "quad",
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed slot per [`LayerName`].
pub struct LayerRegistry {
    slots: [Option<MediaLayerRecord>; LayerName::COUNT],
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store a record in its slot, returning any record it replaced.
    pub fn insert(&mut self, record: MediaLayerRecord) -> Option<MediaLayerRecord> {
        let index = record.name().index();
        self.slots[index].replace(record)
    }

    pub fn get(&self, name: LayerName) -> Option<&MediaLayerRecord> {
        self.slots[name.index()].as_ref()
    }

    pub fn get_mut(&mut self, name: LayerName) -> Option<&mut MediaLayerRecord> {
        self.slots[name.index()].as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaLayerRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MediaLayerRecord> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every record, in slot order.
    pub fn drain(&mut self) -> Vec<MediaLayerRecord> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Toolbar visibility per layer for the active session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityMap([bool; LayerName::COUNT]);

impl VisibilityMap {
    pub fn get(&self, name: LayerName) -> bool {
        self.0[name.index()]
    }

    pub fn set(&mut self, name: LayerName, visible: bool) {
        self.0[name.index()] = visible;
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|visible| *visible)
    }

    pub fn reset(&mut self) {
        self.0 = [false; LayerName::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_name_serde() {
        let name: LayerName = serde_json::from_str("\"quad\"").unwrap();
        assert_eq!(name, LayerName::Quad);
        assert_eq!(serde_json::to_string(&LayerName::Equirect).unwrap(), "\"equirect\"");
        assert!(serde_json::from_str::<LayerName>("\"cube\"").is_err());
    }

    #[test]
    fn test_visibility_map() {
        let mut map = VisibilityMap::default();
        assert!(!map.any());

        map.set(LayerName::Quad, true);
        assert!(map.get(LayerName::Quad));
        assert!(!map.get(LayerName::Equirect));
        assert!(map.any());

        map.reset();
        assert!(!map.any());
    }

    #[test]
    fn test_empty_registry() {
        let mut registry = LayerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(LayerName::Equirect).is_none());
        assert!(registry.drain().is_empty());
    }
}
