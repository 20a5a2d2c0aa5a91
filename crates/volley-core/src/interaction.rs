use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw field payloads keyed by field name.
pub type FieldMap = BTreeMap<String, Vec<u8>>;

/// One interaction delivered by the federation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedInteraction {
    /// Interaction class name as delivered; may be qualified.
    pub class_name: String,
    /// Parameter payloads.
    pub fields: FieldMap,
    /// Wall-clock receipt time in milliseconds since the Unix epoch.
    pub received_at_ms: i64,
    /// Federation timestamp, when the sender supplied one.
    #[serde(default)]
    pub sent_time: Option<f64>,
}

impl ReceivedInteraction {
    /// Stamps a new interaction with the current time.
    pub fn now(class_name: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            class_name: class_name.into(),
            fields,
            received_at_ms: chrono::Utc::now().timestamp_millis(),
            sent_time: None,
        }
    }

    /// Payload of a field, looked up ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .get(name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }

    /// Whether this interaction belongs to `class`.
    pub fn is_class(&self, class: &str) -> bool {
        same_class(&self.class_name, class)
    }
}

/// An object instance the federation has announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredObject {
    /// Federation handle of the instance.
    pub handle: u64,
    /// Object class name as announced.
    pub class_name: String,
    /// Instance name.
    pub instance_name: String,
    /// Last reflected attribute values; `None` until the first reflection.
    pub attributes: Option<FieldMap>,
}

impl DiscoveredObject {
    /// Payload of a reflected attribute.
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .map(Vec::as_slice)
    }
}

const ROOTS: [&str; 2] = ["HLAinteractionRoot.", "HLAobjectRoot."];

/// Compares class names ignoring ASCII case and the root prefix.
pub fn same_class(a: &str, b: &str) -> bool {
    strip_root(a).eq_ignore_ascii_case(strip_root(b))
}

fn strip_root(name: &str) -> &str {
    let name = name.trim();
    ROOTS
        .iter()
        .find_map(|root| {
            name.get(..root.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(root))
                .map(|_| &name[root.len()..])
        })
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_compare_without_root() {
        assert!(same_class("HLAinteractionRoot.WeaponFire", "weaponfire"));
        assert!(same_class("HLAobjectRoot.HLAmanager.HLAfederate", "HLAmanager.HLAfederate"));
        assert!(!same_class("HLAobjectRoot.HLAmanager.HLAfederate", "HLAfederate"));
    }

    #[test]
    fn field_lookup_ignores_case() {
        let mut fields = FieldMap::new();
        fields.insert("EventIdentifier".into(), vec![1]);
        let interaction = ReceivedInteraction::now("WeaponFire", fields);
        assert_eq!(interaction.field("eventidentifier"), Some(&[1u8][..]));
        assert!(interaction.field("FuseType").is_none());
    }
}
