//! Records stored in a capture file.
//!
//! Each record is one federation callback, stamped with its offset from the
//! start of the recording. Field payloads are stored as lowercase hex.

use serde::{Deserialize, Serialize};
use std::fmt;
use volley_core::FieldMap;

/// One recorded federation callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum CaptureRecord {
    /// An interaction was received.
    Interaction {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Interaction class name.
        class_name: String,
        /// Parameter payloads.
        #[serde(with = "hex_fields", default)]
        fields: FieldMap,
        /// Federation timestamp supplied by the sender.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sent_time: Option<f64>,
    },
    /// An object instance was discovered.
    ObjectDiscovered {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Instance handle.
        handle: u64,
        /// Object class name.
        class_name: String,
        /// Instance name.
        instance_name: String,
    },
    /// Attribute values of a discovered instance were reflected.
    AttributesReflected {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Instance handle.
        handle: u64,
        /// Attribute payloads.
        #[serde(with = "hex_fields", default)]
        attributes: FieldMap,
    },
    /// An object instance was removed.
    ObjectRemoved {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Instance handle.
        handle: u64,
    },
    /// A federate joined the federation.
    FederateJoined {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Handle of the federate's management object.
        handle: u64,
        /// Federate name.
        federate_name: String,
        /// Federate type.
        #[serde(default)]
        federate_type: String,
        /// FOM module designators the federate joined with.
        #[serde(default)]
        fom_modules: Vec<String>,
    },
    /// A federate resigned.
    FederateResigned {
        /// Offset from replay start in milliseconds.
        at_ms: u64,
        /// Federate name.
        federate_name: String,
    },
}

impl CaptureRecord {
    /// Offset from replay start in milliseconds.
    pub fn at_ms(&self) -> u64 {
        match self {
            CaptureRecord::Interaction { at_ms, .. }
            | CaptureRecord::ObjectDiscovered { at_ms, .. }
            | CaptureRecord::AttributesReflected { at_ms, .. }
            | CaptureRecord::ObjectRemoved { at_ms, .. }
            | CaptureRecord::FederateJoined { at_ms, .. }
            | CaptureRecord::FederateResigned { at_ms, .. } => *at_ms,
        }
    }

    /// Record tag as stored in the file.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureRecord::Interaction { .. } => "interaction",
            CaptureRecord::ObjectDiscovered { .. } => "object_discovered",
            CaptureRecord::AttributesReflected { .. } => "attributes_reflected",
            CaptureRecord::ObjectRemoved { .. } => "object_removed",
            CaptureRecord::FederateJoined { .. } => "federate_joined",
            CaptureRecord::FederateResigned { .. } => "federate_resigned",
        }
    }

    /// Builds an interaction record.
    pub fn interaction(at_ms: u64, class_name: impl Into<String>, fields: FieldMap) -> Self {
        CaptureRecord::Interaction {
            at_ms,
            class_name: class_name.into(),
            fields,
            sent_time: None,
        }
    }
}

/// One-line summary used by listings.
impl fmt::Display for CaptureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureRecord::Interaction { class_name, fields, .. } => {
                write!(f, "{} ({} fields)", class_name, fields.len())
            }
            CaptureRecord::ObjectDiscovered {
                handle,
                class_name,
                instance_name,
                ..
            } => write!(f, "{} {} #{}", class_name, instance_name, handle),
            CaptureRecord::AttributesReflected { handle, attributes, .. } => {
                write!(f, "#{} ({} attributes)", handle, attributes.len())
            }
            CaptureRecord::ObjectRemoved { handle, .. } => write!(f, "#{}", handle),
            CaptureRecord::FederateJoined {
                federate_name,
                federate_type,
                ..
            } => write!(f, "{} type {}", federate_name, federate_type),
            CaptureRecord::FederateResigned { federate_name, .. } => f.write_str(federate_name),
        }
    }
}

mod hex_fields {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;
    use volley_core::FieldMap;

    pub fn serialize<S: Serializer>(fields: &FieldMap, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(fields.iter().map(|(name, bytes)| (name, hex::encode(bytes))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldMap, D::Error> {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(name, text)| {
                hex::decode(&text)
                    .map(|bytes| (name.clone(), bytes))
                    .map_err(|e| D::Error::custom(format!("field {}: {}", name, e)))
            })
            .collect()
    }
}
