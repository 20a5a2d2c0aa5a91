//! Named field decoders that override the schema decoder tree.
//!
//! A run configuration binds selectors (`Class.field` or bare `field`) to the
//! tags registered here. The field's declared type must still resolve; the
//! ledger then decodes with the binding instead of the resolved tree.

use crate::config::FieldSelector;
use crate::errors::ConfigError;
use crate::event_id::EventIdentifier;
use crate::types::{
    DetonationResultCode, EntityType, FuseType, VelocityVector, WarheadType, WorldLocation,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use volley_schema::codec::{decode_ascii_string, unicode_string_array};
use volley_schema::{ByteReader, DecodeError};

/// A value produced by a named field decoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// `EventIdentifierStruct`.
    EventIdentifier(EventIdentifier),
    /// `EntityTypeStruct` kind and domain.
    EntityType(EntityType),
    /// `FuseTypeEnum16`.
    FuseType(FuseType),
    /// `WarheadTypeEnum16`.
    WarheadType(WarheadType),
    /// `DetonationResultCodeEnum8`.
    DetonationResultCode(DetonationResultCode),
    /// `WorldLocationStruct`.
    WorldLocation(WorldLocation),
    /// `VelocityVectorStruct`.
    VelocityVector(VelocityVector),
    /// `RTIobjectId`, trimmed.
    ObjectId(String),
    /// Array of `HLAunicodeString`.
    Strings(Vec<String>),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::EventIdentifier(v) => write!(f, "{}", v),
            TypedValue::EntityType(v) => write!(f, "{}", v),
            TypedValue::FuseType(v) => write!(f, "{}", v),
            TypedValue::WarheadType(v) => write!(f, "{}", v),
            TypedValue::DetonationResultCode(v) => write!(f, "{}", v),
            TypedValue::WorldLocation(v) => write!(f, "{}", v),
            TypedValue::VelocityVector(v) => write!(f, "{}", v),
            TypedValue::ObjectId(v) => write!(f, "\"{}\"", v),
            TypedValue::Strings(v) => write!(f, "{:?}", v),
        }
    }
}

/// Signature of a named field decoder.
pub type FieldDecodeFn = fn(&[u8]) -> Result<TypedValue, DecodeError>;

fn event_identifier(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    EventIdentifier::decode(bytes).map(TypedValue::EventIdentifier)
}

fn entity_type(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    EntityType::decode(bytes).map(TypedValue::EntityType)
}

fn fuse_type(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    FuseType::decode(bytes).map(TypedValue::FuseType)
}

fn warhead_type(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    WarheadType::decode(bytes).map(TypedValue::WarheadType)
}

fn detonation_result(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    DetonationResultCode::decode(bytes).map(TypedValue::DetonationResultCode)
}

fn world_location(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    WorldLocation::decode(bytes).map(TypedValue::WorldLocation)
}

fn velocity_vector(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    VelocityVector::decode(bytes).map(TypedValue::VelocityVector)
}

fn object_id(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    let value = decode_ascii_string(&mut ByteReader::new(bytes))?;
    Ok(TypedValue::ObjectId(value.trim().to_string()))
}

fn string_array(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    unicode_string_array(bytes).map(TypedValue::Strings)
}

/// Tag of the built-in event identifier decoder.
pub const EVENT_IDENTIFIER_TAG: &str = "EventIdentifierStruct";

/// Tag of the built-in entity type decoder.
pub const ENTITY_TYPE_TAG: &str = "EntityTypeStruct";

/// Tag of the built-in object identifier decoder.
pub const OBJECT_ID_TAG: &str = "RTIobjectId";

/// Tag-to-decoder table.
#[derive(Debug, Clone, Default)]
pub struct FieldDecoderRegistry {
    entries: BTreeMap<String, FieldDecodeFn>,
}

impl FieldDecoderRegistry {
    /// A registry holding every built-in decoder.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(EVENT_IDENTIFIER_TAG, event_identifier);
        registry.register(ENTITY_TYPE_TAG, entity_type);
        registry.register("FuseTypeEnum16", fuse_type);
        registry.register("WarheadTypeEnum16", warhead_type);
        registry.register("DetonationResultCodeEnum8", detonation_result);
        registry.register("WorldLocationStruct", world_location);
        registry.register("VelocityVectorStruct", velocity_vector);
        registry.register(OBJECT_ID_TAG, object_id);
        registry.register("HLAunicodeStringArray", string_array);
        registry
    }

    /// Adds or replaces a decoder.
    pub fn register(&mut self, tag: impl Into<String>, decoder: FieldDecodeFn) {
        self.entries.insert(tag.into(), decoder);
    }

    /// Looks up a decoder by tag.
    pub fn get(&self, tag: &str) -> Option<FieldDecodeFn> {
        self.entries.get(tag).copied()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A decoder bound to a selector.
#[derive(Debug, Clone)]
pub struct BoundDecoder {
    /// Registry tag.
    pub tag: String,
    /// Decoder function.
    pub decode: FieldDecodeFn,
}

/// Selector-to-decoder bindings for one run.
#[derive(Debug, Clone, Default)]
pub struct FieldDecoderBindings {
    by_selector: HashMap<String, BoundDecoder>,
}

impl FieldDecoderBindings {
    /// Binds every `(selector, tag)` pair, failing on unknown tags.
    pub fn bind(
        registry: &FieldDecoderRegistry,
        pairs: &BTreeMap<FieldSelector, String>,
    ) -> Result<Self, ConfigError> {
        let mut by_selector = HashMap::with_capacity(pairs.len());
        for (selector, tag) in pairs {
            let decode = registry.get(tag).ok_or_else(|| ConfigError::UnknownDecoderTag {
                selector: selector.to_string(),
                tag: tag.clone(),
            })?;
            by_selector.insert(
                selector.to_string(),
                BoundDecoder {
                    tag: tag.clone(),
                    decode,
                },
            );
        }
        Ok(Self { by_selector })
    }

    /// The decoder for a field; `Class.field` beats a bare `field` binding.
    pub fn lookup(&self, class: &str, field: &str) -> Option<&BoundDecoder> {
        self.by_selector
            .get(&format!("{}.{}", class, field))
            .or_else(|| self.by_selector.get(field))
    }

    /// Whether no binding exists.
    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}
