//! Data type resolution.
//!
//! A type name is resolved by trying, in order, the primitive table,
//! enumerated, simple, array, fixed record and variant record declarations.
//! Each strategy scans every document in load order and the first declaration
//! whose name matches (ignoring ASCII case) wins; a matching declaration that
//! cannot be completed fails the whole resolution rather than falling through
//! to the next strategy.

use crate::decoder::{DecoderNode, PrimitiveKind};
use crate::document::{SchemaDocument, SchemaNode};
use crate::errors::ResolveError;
use crate::locator::{ClassDefinition, ClassKind, ClassLocator};
use tracing::{debug, error, info};

/// Encoding a fixed record must declare.
pub const FIXED_RECORD_ENCODING: &str = "HLAfixedRecord";

/// Alternative type name meaning "no data".
pub const EMPTY_ALTERNATIVE: &str = "NA";

/// Where one kind of data type declaration lives inside `dataTypes`.
#[derive(Debug, Clone, Copy)]
struct DeclarationTable {
    group: &'static str,
    entry: &'static str,
    label: &'static str,
}

const ENUMERATED: DeclarationTable = DeclarationTable {
    group: "enumeratedDataTypes",
    entry: "enumeratedData",
    label: "enumerated",
};

const SIMPLE: DeclarationTable = DeclarationTable {
    group: "simpleDataTypes",
    entry: "simpleData",
    label: "simple",
};

const ARRAY: DeclarationTable = DeclarationTable {
    group: "arrayDataTypes",
    entry: "arrayData",
    label: "array",
};

const FIXED_RECORD: DeclarationTable = DeclarationTable {
    group: "fixedRecordDataTypes",
    entry: "fixedRecordData",
    label: "fixed record",
};

const VARIANT_RECORD: DeclarationTable = DeclarationTable {
    group: "variantRecordDataTypes",
    entry: "variantRecordData",
    label: "variant record",
};

/// Resolves declared data types into decoder trees.
///
/// The resolver owns its documents and never caches: every call walks the
/// documents again, so results always reflect first-match-wins order.
///
/// # Example
///
/// ```rust
/// use volley_schema::{SchemaDocument, SchemaNode, TypeResolver};
///
/// let root = SchemaNode::element("objectModel").with_child(
///     SchemaNode::element("dataTypes").with_child(
///         SchemaNode::element("simpleDataTypes").with_child(
///             SchemaNode::element("simpleData")
///                 .with_child(SchemaNode::leaf("name", "AngleDegrees"))
///                 .with_child(SchemaNode::leaf("representation", "HLAfloat32BE")),
///         ),
///     ),
/// );
/// let resolver = TypeResolver::new(vec![SchemaDocument::new("mem.xml", root)]);
/// let decoder = resolver.resolve("angledegrees")?;
/// assert_eq!(decoder.type_name(), "AngleDegrees");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TypeResolver {
    documents: Vec<SchemaDocument>,
}

impl TypeResolver {
    /// Creates a resolver over documents searched in the given order.
    pub fn new(documents: Vec<SchemaDocument>) -> Self {
        Self { documents }
    }

    /// The documents searched, in order.
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// A class locator over the same documents.
    pub fn locator(&self) -> ClassLocator<'_> {
        ClassLocator::new(&self.documents)
    }

    /// Resolves a type name into a decoder tree.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] means the name could not be resolved; the variant
    /// says why. Resolution failures are logged and never panic.
    pub fn resolve(&self, type_name: &str) -> Result<DecoderNode, ResolveError> {
        let mut chain = Vec::new();
        let result = self.resolve_inner(type_name, &mut chain);
        match &result {
            Ok(node) => debug!(type_name, resolved = node.type_name(), "data type resolved"),
            Err(e) => error!(type_name, error = %e, "resolving data type failed"),
        }
        result
    }

    /// Resolves the declared type of a class field.
    pub fn field_decoder(
        &self,
        kind: ClassKind,
        class_name: &str,
        field_name: &str,
    ) -> Result<DecoderNode, ResolveError> {
        let class = self.locator().find(kind, class_name)?;
        self.decoder_for_field(&class, field_name)
    }

    /// Resolves the declared type of a field of an already located class.
    pub fn decoder_for_field(
        &self,
        class: &ClassDefinition,
        field_name: &str,
    ) -> Result<DecoderNode, ResolveError> {
        let field = class.field(field_name).ok_or_else(|| ResolveError::NotFound {
            name: format!("{}.{}", class.name, field_name),
        })?;
        let data_type = field.declared_type()?;
        self.resolve(data_type)
    }

    /// Resolves the type of an interaction parameter.
    pub fn parameter_decoder(
        &self,
        interaction: &str,
        parameter: &str,
    ) -> Result<DecoderNode, ResolveError> {
        self.field_decoder(ClassKind::Interaction, interaction, parameter)
    }

    /// Resolves the type of an object attribute.
    pub fn attribute_decoder(&self, object: &str, attribute: &str) -> Result<DecoderNode, ResolveError> {
        self.field_decoder(ClassKind::Object, object, attribute)
    }

    fn resolve_inner(
        &self,
        type_name: &str,
        chain: &mut Vec<String>,
    ) -> Result<DecoderNode, ResolveError> {
        let name = type_name.trim();
        if chain.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(ResolveError::Cyclic { chain: cycle });
        }
        chain.push(name.to_string());
        let result = self.search(name, chain);
        chain.pop();
        result
    }

    fn search(&self, name: &str, chain: &mut Vec<String>) -> Result<DecoderNode, ResolveError> {
        if let Some(kind) = PrimitiveKind::lookup(name) {
            return Ok(DecoderNode::Primitive { kind });
        }
        for table in [ENUMERATED, SIMPLE] {
            if let Some(declaration) = self.find_declaration(table, name) {
                return self.resolve_alias(declaration, chain);
            }
        }
        if let Some(declaration) = self.find_declaration(ARRAY, name) {
            return self.resolve_array(declaration, chain);
        }
        if let Some(declaration) = self.find_declaration(FIXED_RECORD, name) {
            return self.resolve_fixed_record(declaration, chain);
        }
        if let Some(declaration) = self.find_declaration(VARIANT_RECORD, name) {
            return self.resolve_variant_record(declaration, chain);
        }
        Err(ResolveError::NotFound {
            name: name.to_string(),
        })
    }

    fn find_declaration(&self, table: DeclarationTable, name: &str) -> Option<&SchemaNode> {
        for document in &self.documents {
            let found = document
                .root()
                .find_descendant("dataTypes")
                .and_then(|data_types| data_types.child(table.group))
                .and_then(|group| group.children_by_tag(table.entry).find(|d| d.name_matches(name)));
            if let Some(declaration) = found {
                info!(type_name = name, uri = %document.uri(), "found as {} data type", table.label);
                return Some(declaration);
            }
        }
        None
    }

    fn resolve_alias(
        &self,
        declaration: &SchemaNode,
        chain: &mut Vec<String>,
    ) -> Result<DecoderNode, ResolveError> {
        let name = declared_name(declaration);
        let representation = single_leaf(declaration, "representation", &name)?;
        let inner = self.resolve_inner(representation, chain)?;
        Ok(DecoderNode::Alias {
            name,
            inner: Box::new(inner),
        })
    }

    fn resolve_array(
        &self,
        declaration: &SchemaNode,
        chain: &mut Vec<String>,
    ) -> Result<DecoderNode, ResolveError> {
        let name = declared_name(declaration);
        let element_type = single_leaf(declaration, "dataType", &name)?;
        let element = self.resolve_inner(element_type, chain)?;
        Ok(DecoderNode::ArrayOf {
            name,
            element: Box::new(element),
        })
    }

    fn resolve_fixed_record(
        &self,
        declaration: &SchemaNode,
        chain: &mut Vec<String>,
    ) -> Result<DecoderNode, ResolveError> {
        let name = declared_name(declaration);
        let encoding = declaration.leaf_text("encoding").unwrap_or("");
        if !encoding.eq_ignore_ascii_case(FIXED_RECORD_ENCODING) {
            error!(type_name = %name, encoding, "unknown encoding of fixed record");
            return Err(ResolveError::UnknownEncoding {
                name,
                encoding: encoding.to_string(),
            });
        }
        let mut fields = Vec::new();
        for field in declaration.children_by_tag("field") {
            let field_name = format!("{}.{}", name, field.name().unwrap_or("?"));
            let data_type = single_leaf(field, "dataType", &field_name)?;
            fields.push(self.resolve_inner(data_type, chain)?);
        }
        Ok(DecoderNode::FixedRecord { name, fields })
    }

    fn resolve_variant_record(
        &self,
        declaration: &SchemaNode,
        chain: &mut Vec<String>,
    ) -> Result<DecoderNode, ResolveError> {
        let name = declared_name(declaration);
        let declared: Vec<&SchemaNode> = declaration.children_by_tag("alternative").collect();
        if declared.len() > usize::from(u8::MAX) + 1 {
            return Err(ResolveError::TooManyAlternatives {
                name,
                count: declared.len(),
            });
        }
        let mut alternatives = Vec::with_capacity(declared.len());
        for (index, alternative) in declared.into_iter().enumerate() {
            let label = format!("{}.{}", name, alternative.name().unwrap_or("?"));
            let data_type = single_leaf(alternative, "dataType", &label)?;
            let decoder = if data_type.eq_ignore_ascii_case(EMPTY_ALTERNATIVE) {
                DecoderNode::FixedRecord {
                    name: EMPTY_ALTERNATIVE.to_string(),
                    fields: Vec::new(),
                }
            } else {
                self.resolve_inner(data_type, chain)?
            };
            // Positional discriminant; the declared enumerator values are not consulted.
            alternatives.push((index as u8, decoder));
        }
        Ok(DecoderNode::VariantRecord { name, alternatives })
    }
}

fn declared_name(declaration: &SchemaNode) -> String {
    declaration.name().unwrap_or("").to_string()
}

fn single_leaf<'a>(
    node: &'a SchemaNode,
    leaf: &'static str,
    owner: &str,
) -> Result<&'a str, ResolveError> {
    let mut leaves = node.children_by_tag(leaf);
    let first = leaves.next().ok_or_else(|| ResolveError::MissingLeaf {
        name: owner.to_string(),
        leaf,
    })?;
    let extra = leaves.count();
    if extra > 0 {
        return Err(ResolveError::Ambiguous {
            name: owner.to_string(),
            count: extra + 1,
        });
    }
    Ok(first.text())
}
