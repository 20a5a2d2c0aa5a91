//! Schema document model and XML loading.
//!
//! Documents are reduced to a plain tree of element nodes keyed by their local
//! tag name; namespaces, attributes and comments are dropped because FOM
//! modules carry all relevant data in element text.

use crate::errors::SchemaError;
use std::fs;
use tracing::{debug, info};

/// One element of a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    tag: String,
    text: String,
    children: Vec<SchemaNode>,
}

impl SchemaNode {
    /// Creates an element with no text and no children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Creates a leaf element carrying text.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Appends a child and returns the node, for building trees in place.
    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = SchemaNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Local tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Trimmed text content directly inside this element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Direct child elements in document order.
    pub fn children(&self) -> &[SchemaNode] {
        &self.children
    }

    /// Direct children with the given tag.
    pub fn children_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a SchemaNode> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Text of the first direct child with the given tag.
    pub fn leaf_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(SchemaNode::text)
    }

    /// All descendants with the given tag, depth first in document order.
    pub fn descendants_by_tag(&self, tag: &str) -> Vec<&SchemaNode> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    /// First descendant with the given tag.
    pub fn find_descendant(&self, tag: &str) -> Option<&SchemaNode> {
        for child in &self.children {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a SchemaNode>) {
        for child in &self.children {
            if child.tag == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }

    /// Value of the `name` leaf, if present.
    pub fn name(&self) -> Option<&str> {
        self.leaf_text("name")
    }

    /// Whether the `name` leaf equals `name`, ignoring ASCII case.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name()
            .map(|n| n.eq_ignore_ascii_case(name.trim()))
            .unwrap_or(false)
    }
}

/// A loaded schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    uri: String,
    root: SchemaNode,
}

impl SchemaDocument {
    /// Wraps a root node.
    pub fn new(uri: impl Into<String>, root: SchemaNode) -> Self {
        Self {
            uri: uri.into(),
            root,
        }
    }

    /// Location the document was loaded from.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Root element.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }
}

/// Source of schema documents.
pub trait SchemaSource {
    /// Loads one document per URI, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any document cannot be read or parsed, or
    /// if `uris` is empty.
    fn load(&self, uris: &[&str]) -> Result<Vec<SchemaDocument>, SchemaError>;
}

/// Loads FOM modules from XML files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSchemaSource;

impl XmlSchemaSource {
    /// Parses a document from an XML string.
    pub fn parse_str(uri: &str, xml: &str) -> Result<SchemaDocument, SchemaError> {
        let parsed = roxmltree::Document::parse(xml).map_err(|e| SchemaError::Parse {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let root = convert(parsed.root_element());
        Ok(SchemaDocument::new(uri, root))
    }
}

impl SchemaSource for XmlSchemaSource {
    fn load(&self, uris: &[&str]) -> Result<Vec<SchemaDocument>, SchemaError> {
        if uris.is_empty() {
            return Err(SchemaError::NoDocuments);
        }
        let mut documents = Vec::with_capacity(uris.len());
        for uri in uris {
            let xml = fs::read_to_string(uri).map_err(|source| SchemaError::Io {
                uri: uri.to_string(),
                source,
            })?;
            let document = Self::parse_str(uri, &xml)?;
            info!(uri = %uri, "loaded schema document");
            documents.push(document);
        }
        debug!(count = documents.len(), "schema documents ready");
        Ok(documents)
    }
}

fn convert(element: roxmltree::Node<'_, '_>) -> SchemaNode {
    let mut node = SchemaNode::element(element.tag_name().name());
    for child in element.children() {
        if child.is_element() {
            node.children.push(convert(child));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                node.text.push_str(text);
            }
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_namespace_and_keeps_order() {
        let xml = r#"<objectModel xmlns="http://standards.ieee.org/IEEE1516-2010">
            <interactions><interactionClass><name> WeaponFire </name></interactionClass></interactions>
            <dataTypes/>
        </objectModel>"#;
        let doc = XmlSchemaSource::parse_str("mem.xml", xml).unwrap();
        assert_eq!(doc.root().tag(), "objectModel");
        let tags: Vec<_> = doc.root().children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["interactions", "dataTypes"]);
        let class = doc.root().find_descendant("interactionClass").unwrap();
        assert!(class.name_matches("weaponfire"));
    }

    #[test]
    fn parse_rejects_malformed_xml() {
        let err = XmlSchemaSource::parse_str("bad.xml", "<objectModel>").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn load_requires_documents() {
        assert!(matches!(
            XmlSchemaSource.load(&[]),
            Err(SchemaError::NoDocuments)
        ));
    }

    #[test]
    fn descendants_are_depth_first() {
        let root = SchemaNode::element("a")
            .with_child(SchemaNode::element("x").with_child(SchemaNode::leaf("x", "inner")))
            .with_child(SchemaNode::leaf("x", "second"));
        let found: Vec<_> = root.descendants_by_tag("x").iter().map(|n| n.text().to_string()).collect();
        assert_eq!(found, vec!["", "inner", "second"]);
    }
}
