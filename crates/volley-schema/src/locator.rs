//! Interaction and object class lookup.

use crate::document::{SchemaDocument, SchemaNode};
use crate::errors::ResolveError;
use serde::Serialize;
use tracing::{debug, info, warn};

/// The two kinds of class a FOM declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    /// Interaction class, whose fields are parameters.
    Interaction,
    /// Object class, whose fields are attributes.
    Object,
}

impl ClassKind {
    fn container_tag(self) -> &'static str {
        match self {
            ClassKind::Interaction => "interactions",
            ClassKind::Object => "objects",
        }
    }

    fn class_tag(self) -> &'static str {
        match self {
            ClassKind::Interaction => "interactionClass",
            ClassKind::Object => "objectClass",
        }
    }

    fn field_tag(self) -> &'static str {
        match self {
            ClassKind::Interaction => "parameter",
            ClassKind::Object => "attribute",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ClassKind::Interaction => "interaction",
            ClassKind::Object => "object",
        }
    }
}

/// A parameter or attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDeclaration {
    name: String,
    data_types: Vec<String>,
}

impl FieldDeclaration {
    /// Creates a declaration with the given type leaves.
    pub fn new(name: impl Into<String>, data_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data_types,
        }
    }

    /// Field name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type name, when exactly one is declared.
    pub fn declared_type(&self) -> Result<&str, ResolveError> {
        match self.data_types.as_slice() {
            [single] => Ok(single),
            [] => Err(ResolveError::MissingLeaf {
                name: self.name.clone(),
                leaf: "dataType",
            }),
            many => Err(ResolveError::Ambiguous {
                name: self.name.clone(),
                count: many.len(),
            }),
        }
    }
}

/// A class declaration that carries the defining marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDefinition {
    /// Interaction or object.
    pub kind: ClassKind,
    /// Class name as declared.
    pub name: String,
    /// Document the definition was found in.
    pub source_uri: String,
    fields: Vec<FieldDeclaration>,
}

impl ClassDefinition {
    /// Declared fields in document order.
    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    /// Field names in document order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// `(field name, declared type name)` pairs in document order; fields
    /// without exactly one type leaf report an empty type.
    pub fn typed_fields(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .map(|f| (f.name(), f.declared_type().unwrap_or("")))
            .collect()
    }

    /// Looks up a field by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Finds class declarations across an ordered set of documents.
#[derive(Debug, Clone, Copy)]
pub struct ClassLocator<'a> {
    documents: &'a [SchemaDocument],
}

impl<'a> ClassLocator<'a> {
    /// Creates a locator over the documents, searched in order.
    pub fn new(documents: &'a [SchemaDocument]) -> Self {
        Self { documents }
    }

    /// Finds the defining declaration of an interaction class.
    pub fn find_interaction(&self, name: &str) -> Result<ClassDefinition, ResolveError> {
        self.find(ClassKind::Interaction, name)
    }

    /// Finds the defining declaration of an object class.
    pub fn find_object(&self, name: &str) -> Result<ClassDefinition, ResolveError> {
        self.find(ClassKind::Object, name)
    }

    /// Finds the defining declaration of a class.
    ///
    /// Names may be qualified (`BaseEntity.PhysicalEntity.Munition`); only the
    /// last segment is compared. A name match without a `sharing` element is a
    /// parentage reference and the search continues past it.
    pub fn find(&self, kind: ClassKind, name: &str) -> Result<ClassDefinition, ResolveError> {
        let simple = name.trim().rsplit('.').next().unwrap_or(name);
        for document in self.documents {
            if let Some(node) = self.search_document(document, kind, simple) {
                info!(
                    class = %simple,
                    uri = %document.uri(),
                    "{} definition found",
                    kind.label()
                );
                return Ok(ClassDefinition {
                    kind,
                    name: node.name().unwrap_or(simple).to_string(),
                    source_uri: document.uri().to_string(),
                    fields: fields_of(node, kind),
                });
            }
            debug!(class = %simple, uri = %document.uri(), "not defined in document");
        }
        warn!(class = %name, "{} class not found in any schema document", kind.label());
        Err(ResolveError::NotFound {
            name: name.to_string(),
        })
    }

    fn search_document(
        &self,
        document: &'a SchemaDocument,
        kind: ClassKind,
        name: &str,
    ) -> Option<&'a SchemaNode> {
        let container = document.root().find_descendant(kind.container_tag())?;
        for class in container.descendants_by_tag(kind.class_tag()) {
            if class.name().is_none() {
                warn!(uri = %document.uri(), "{} declaration without a name", kind.label());
                continue;
            }
            if !class.name_matches(name) {
                continue;
            }
            if class.child("sharing").is_some() {
                return Some(class);
            }
            debug!(class = %name, "parentage reference, not the defining declaration");
        }
        None
    }

    /// Field names of an interaction, in document order.
    pub fn parameter_names(&self, interaction: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.find_interaction(interaction)?.field_names())
    }

    /// Attribute names of an object class, in document order.
    pub fn attribute_names(&self, object: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.find_object(object)?.field_names())
    }
}

fn fields_of(class: &SchemaNode, kind: ClassKind) -> Vec<FieldDeclaration> {
    class
        .children_by_tag(kind.field_tag())
        .filter_map(|field| {
            let name = field.name()?;
            let data_types = field
                .children_by_tag("dataType")
                .map(|t| t.text().to_string())
                .collect();
            Some(FieldDeclaration::new(name, data_types))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(name: &str, data_type: &str) -> SchemaNode {
        SchemaNode::element("parameter")
            .with_child(SchemaNode::leaf("name", name))
            .with_child(SchemaNode::leaf("dataType", data_type))
    }

    fn document(uri: &str, classes: Vec<SchemaNode>) -> SchemaDocument {
        SchemaDocument::new(
            uri,
            SchemaNode::element("objectModel").with_child(
                SchemaNode::element("interactions").with_child(
                    SchemaNode::element("interactionClass")
                        .with_child(SchemaNode::leaf("name", "HLAinteractionRoot"))
                        .with_children(classes),
                ),
            ),
        )
    }

    #[test]
    fn unmarked_match_is_skipped_for_later_definition() {
        let reference = document(
            "base.xml",
            vec![SchemaNode::element("interactionClass").with_child(SchemaNode::leaf("name", "WeaponFire"))],
        );
        let defining = document(
            "warfare.xml",
            vec![SchemaNode::element("interactionClass")
                .with_child(SchemaNode::leaf("name", "WeaponFire"))
                .with_child(SchemaNode::leaf("sharing", "PublishSubscribe"))
                .with_child(parameter("EventIdentifier", "EventIdentifierStruct"))],
        );
        let docs = vec![reference, defining];
        let class = ClassLocator::new(&docs).find_interaction("weaponfire").unwrap();
        assert_eq!(class.source_uri, "warfare.xml");
        assert_eq!(class.typed_fields(), vec![("EventIdentifier", "EventIdentifierStruct")]);
    }

    #[test]
    fn missing_class_is_not_found() {
        let docs = vec![document("a.xml", vec![])];
        assert!(matches!(
            ClassLocator::new(&docs).find_interaction("WeaponFire"),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn field_with_two_types_is_ambiguous() {
        let field = FieldDeclaration::new("X", vec!["A".into(), "B".into()]);
        assert_eq!(
            field.declared_type(),
            Err(ResolveError::Ambiguous {
                name: "X".into(),
                count: 2
            })
        );
    }
}
