//! Decoder trees and decoded values.

use crate::codec::{ByteReader, HlaCodec, PrimitiveCodec};
use crate::errors::DecodeError;
use serde::Serialize;
use std::fmt;

/// Basic data representations the resolver knows without a schema lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    /// `HLAfloat32BE`
    Float32BE,
    /// `HLAfloat64BE`
    Float64BE,
    /// `HLAoctet`
    Octet,
    /// `HLAASCIIchar`
    AsciiChar,
    /// `RTIobjectId`
    ObjectId,
    /// `RPRunsignedInteger16BE`
    UnsignedInteger16BE,
    /// `RPRunsignedInteger32BE`
    UnsignedInteger32BE,
}

impl PrimitiveKind {
    /// Every primitive, in lookup order.
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::Float32BE,
        PrimitiveKind::Float64BE,
        PrimitiveKind::Octet,
        PrimitiveKind::AsciiChar,
        PrimitiveKind::ObjectId,
        PrimitiveKind::UnsignedInteger16BE,
        PrimitiveKind::UnsignedInteger32BE,
    ];

    /// Name used for this primitive in schema documents.
    pub fn schema_name(self) -> &'static str {
        match self {
            PrimitiveKind::Float32BE => "HLAfloat32BE",
            PrimitiveKind::Float64BE => "HLAfloat64BE",
            PrimitiveKind::Octet => "HLAoctet",
            PrimitiveKind::AsciiChar => "HLAASCIIchar",
            PrimitiveKind::ObjectId => "RTIobjectId",
            PrimitiveKind::UnsignedInteger16BE => "RPRunsignedInteger16BE",
            PrimitiveKind::UnsignedInteger32BE => "RPRunsignedInteger32BE",
        }
    }

    /// Looks up a primitive by schema name, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.schema_name().eq_ignore_ascii_case(name))
    }
}

/// Executable decoder tree built from schema declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DecoderNode {
    /// A basic data representation.
    Primitive {
        /// Which primitive.
        kind: PrimitiveKind,
    },
    /// An enumerated or simple type standing for its representation.
    Alias {
        /// Declared type name.
        name: String,
        /// Representation decoder.
        inner: Box<DecoderNode>,
    },
    /// Ordered concatenation of fields.
    FixedRecord {
        /// Declared type name.
        name: String,
        /// Field decoders in declaration order.
        fields: Vec<DecoderNode>,
    },
    /// Octet discriminant selecting one alternative.
    VariantRecord {
        /// Declared type name.
        name: String,
        /// `(discriminant, decoder)` pairs in declaration order.
        alternatives: Vec<(u8, DecoderNode)>,
    },
    /// Variable-length array; the element count comes from the wire.
    ArrayOf {
        /// Declared type name.
        name: String,
        /// Element decoder.
        element: Box<DecoderNode>,
    },
}

impl DecoderNode {
    /// Decodes a complete value with the default HLA codec.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if `bytes` is empty or does not match the tree.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        self.decode_with(bytes, &HlaCodec)
    }

    /// Decodes a complete value with the given codec.
    pub fn decode_with(&self, bytes: &[u8], codec: &dyn PrimitiveCodec) -> Result<Value, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::UnexpectedEnd {
                offset: 0,
                needed: self.min_size(codec).max(1),
                available: 0,
            });
        }
        let mut reader = ByteReader::new(bytes);
        self.decode_from(&mut reader, codec)
    }

    /// Decodes one value at the reader position.
    pub fn decode_from(
        &self,
        reader: &mut ByteReader<'_>,
        codec: &dyn PrimitiveCodec,
    ) -> Result<Value, DecodeError> {
        match self {
            DecoderNode::Primitive { kind } => codec.decode_primitive(*kind, reader),
            DecoderNode::Alias { inner, .. } => inner.decode_from(reader, codec),
            DecoderNode::FixedRecord { fields, .. } => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    reader.align(field.octet_boundary(codec))?;
                    values.push(field.decode_from(reader, codec)?);
                }
                Ok(Value::Record(values))
            }
            DecoderNode::VariantRecord { alternatives, .. } => {
                let discriminant = reader.read_u8()?;
                let (_, alternative) = alternatives
                    .iter()
                    .find(|(d, _)| *d == discriminant)
                    .ok_or(DecodeError::UnknownDiscriminant {
                        value: discriminant,
                    })?;
                reader.align(alternative.octet_boundary(codec))?;
                Ok(Value::Variant {
                    discriminant,
                    value: Box::new(alternative.decode_from(reader, codec)?),
                })
            }
            DecoderNode::ArrayOf { element, .. } => {
                reader.align(4)?;
                let count = reader.read_count(element.min_size(codec))?;
                let boundary = element.octet_boundary(codec);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    reader.align(boundary)?;
                    items.push(element.decode_from(reader, codec)?);
                }
                Ok(Value::Array(items))
            }
        }
    }

    /// Octet boundary of the encoded value.
    pub fn octet_boundary(&self, codec: &dyn PrimitiveCodec) -> usize {
        match self {
            DecoderNode::Primitive { kind } => codec.octet_boundary(*kind),
            DecoderNode::Alias { inner, .. } => inner.octet_boundary(codec),
            DecoderNode::FixedRecord { fields, .. } => fields
                .iter()
                .map(|f| f.octet_boundary(codec))
                .max()
                .unwrap_or(1),
            DecoderNode::VariantRecord { alternatives, .. } => alternatives
                .iter()
                .map(|(_, a)| a.octet_boundary(codec))
                .max()
                .unwrap_or(1),
            DecoderNode::ArrayOf { element, .. } => element.octet_boundary(codec).max(4),
        }
    }

    /// Smallest number of bytes an encoded value occupies, ignoring padding.
    pub fn min_size(&self, codec: &dyn PrimitiveCodec) -> usize {
        match self {
            DecoderNode::Primitive { kind } => codec.min_size(*kind),
            DecoderNode::Alias { inner, .. } => inner.min_size(codec),
            DecoderNode::FixedRecord { fields, .. } => fields.iter().map(|f| f.min_size(codec)).sum(),
            DecoderNode::VariantRecord { alternatives, .. } => {
                1 + alternatives
                    .iter()
                    .map(|(_, a)| a.min_size(codec))
                    .min()
                    .unwrap_or(0)
            }
            DecoderNode::ArrayOf { .. } => 4,
        }
    }

    /// Declared name of the node; primitives report their schema name.
    pub fn type_name(&self) -> &str {
        match self {
            DecoderNode::Primitive { kind } => kind.schema_name(),
            DecoderNode::Alias { name, .. }
            | DecoderNode::FixedRecord { name, .. }
            | DecoderNode::VariantRecord { name, .. }
            | DecoderNode::ArrayOf { name, .. } => name,
        }
    }

    /// Multi-line rendering of the tree, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0, None);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize, label: Option<String>) {
        let indent = "  ".repeat(depth);
        let prefix = label.map(|l| format!("{} ", l)).unwrap_or_default();
        match self {
            DecoderNode::Primitive { kind } => {
                out.push_str(&format!("{}{}{}\n", indent, prefix, kind.schema_name()));
            }
            DecoderNode::Alias { name, inner } => {
                out.push_str(&format!("{}{}{} (alias)\n", indent, prefix, name));
                inner.render_into(out, depth + 1, None);
            }
            DecoderNode::FixedRecord { name, fields } => {
                out.push_str(&format!(
                    "{}{}{} (fixed record, {} fields)\n",
                    indent,
                    prefix,
                    name,
                    fields.len()
                ));
                for field in fields {
                    field.render_into(out, depth + 1, None);
                }
            }
            DecoderNode::VariantRecord { name, alternatives } => {
                out.push_str(&format!("{}{}{} (variant record)\n", indent, prefix, name));
                for (discriminant, alternative) in alternatives {
                    alternative.render_into(out, depth + 1, Some(format!("[{}]", discriminant)));
                }
            }
            DecoderNode::ArrayOf { name, element } => {
                out.push_str(&format!("{}{}{} (array)\n", indent, prefix, name));
                element.render_into(out, depth + 1, None);
            }
        }
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Single octet.
    Octet(u8),
    /// ASCII character.
    Char(char),
    /// Object identifier string.
    ObjectId(String),
    /// Unsigned 16-bit integer.
    Unsigned16(u16),
    /// Unsigned 32-bit integer.
    Unsigned32(u32),
    /// Fixed record fields in order.
    Record(Vec<Value>),
    /// Selected variant alternative.
    Variant {
        /// Discriminant read from the wire.
        discriminant: u8,
        /// Alternative value.
        value: Box<Value>,
    },
    /// Array elements.
    Array(Vec<Value>),
}

impl Value {
    /// Returns the octet if this is one.
    pub fn as_octet(&self) -> Option<u8> {
        match self {
            Value::Octet(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this is an object identifier.
    pub fn as_object_id(&self) -> Option<&str> {
        match self {
            Value::ObjectId(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the record fields if this is a record.
    pub fn as_record(&self) -> Option<&[Value]> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Octet(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::ObjectId(s) => write!(f, "\"{}\"", s),
            Value::Unsigned16(v) => write!(f, "{}", v),
            Value::Unsigned32(v) => write!(f, "{}", v),
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
            Value::Variant { discriminant, value } => write!(f, "<{}: {}>", discriminant, value),
            Value::Array(items) => {
                if !items.is_empty() && items.iter().all(|i| matches!(i, Value::Char(_))) {
                    let text: String = items
                        .iter()
                        .filter_map(|i| match i {
                            Value::Char(c) => Some(*c),
                            _ => None,
                        })
                        .collect();
                    return write!(f, "\"{}\"", text);
                }
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
