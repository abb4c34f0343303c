//! Weather-area hierarchy and place-name resolution.

use serde::Deserialize;
use std::collections::BTreeMap;

/// One node of the area hierarchy.
///
/// The document uses the same shape at every level, just with some fields
/// absent: top levels carry `children`, leaf municipalities a kana
/// reading, everything below the root a `parent` code.
#[derive(Debug, Clone, Deserialize)]
pub struct AreaNode {
    pub name: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub kana: Option<String>,
}

/// The full area document served by the weather host.
///
/// Levels nest top-down: centers > offices > class10s > class15s >
/// class20s, linked by `parent` codes.
#[derive(Debug, Clone, Deserialize)]
pub struct Area {
    pub centers: BTreeMap<String, AreaNode>,
    pub offices: BTreeMap<String, AreaNode>,
    pub class10s: BTreeMap<String, AreaNode>,
    pub class15s: BTreeMap<String, AreaNode>,
    pub class20s: BTreeMap<String, AreaNode>,
}

impl Area {
    /// Resolve a place name to the forecast path code.
    ///
    /// Matching is by name prefix, most specific level first:
    /// municipalities (class20s), then districts (class15s), then
    /// subdivisions (class10s). Whatever level matches, the returned code
    /// is the `parent` of the class10 ancestor, which is what the forecast
    /// endpoint is keyed by. Candidates with broken parent links are
    /// skipped.
    pub fn find_path_code(&self, place: &str) -> Option<String> {
        for node in self.class20s.values() {
            if !node.name.starts_with(place) {
                continue;
            }
            let path = self
                .class15s
                .get(&node.parent)
                .and_then(|class15| self.class10s.get(&class15.parent))
                .map(|class10| class10.parent.clone());
            if path.is_some() {
                return path;
            }
        }

        for node in self.class15s.values() {
            if !node.name.starts_with(place) {
                continue;
            }
            let path = self
                .class10s
                .get(&node.parent)
                .map(|class10| class10.parent.clone());
            if path.is_some() {
                return path;
            }
        }

        for node in self.class10s.values() {
            if node.name.starts_with(place) {
                return Some(node.parent.clone());
            }
        }

        None
    }
}
