//! FOM schema loading, class lookup and decoder-tree resolution for Volley.
//!
//! This crate provides:
//! - A read-only document model for FOM modules, loaded from XML
//! - Class definition lookup for interactions and object classes
//! - Runtime resolution of declared data types into [`DecoderNode`] trees
//! - A replaceable primitive codec with the HLA big-endian layout as default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use volley_schema::{SchemaSource, TypeResolver, XmlSchemaSource};
//!
//! let documents = XmlSchemaSource.load(&["RPR-Warfare.xml"])?;
//! let resolver = TypeResolver::new(documents);
//!
//! let decoder = resolver.parameter_decoder("WeaponFire", "EventIdentifier")?;
//! let value = decoder.decode(&[0, 7, 0, 0, 0, 0, 0, 1, b'X'])?;
//! println!("EventIdentifier = {}", value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`TypeResolver`] - Resolve data type names against loaded documents
//! - [`ClassLocator`] - Find interaction and object class declarations
//! - [`DecoderNode`] - Executable decoder tree
//! - [`PrimitiveCodec`] - Seam for primitive wire layouts

#![deny(missing_docs)]

/// Primitive codec seam and the default HLA layout.
pub mod codec;
/// Decoder trees and decoded values.
pub mod decoder;
/// Schema document model and XML loading.
pub mod document;
/// Error types for loading, resolution and decoding.
pub mod errors;
/// Interaction and object class lookup.
pub mod locator;
/// Data type resolution.
pub mod resolver;

pub use codec::{ByteReader, HlaCodec, PrimitiveCodec};
pub use decoder::{DecoderNode, PrimitiveKind, Value};
pub use document::{SchemaDocument, SchemaNode, SchemaSource, XmlSchemaSource};
pub use errors::{DecodeError, ResolveError, SchemaError};
pub use locator::{ClassDefinition, ClassKind, ClassLocator, FieldDeclaration};
pub use resolver::TypeResolver;
