use thiserror::Error;

/// Errors raised while loading schema documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document could not be read.
    #[error("cannot read schema document {uri}: {source}")]
    Io {
        /// Location of the document.
        uri: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not well-formed XML.
    #[error("cannot parse schema document {uri}: {reason}")]
    Parse {
        /// Location of the document.
        uri: String,
        /// Parser message.
        reason: String,
    },
    /// No documents were supplied.
    #[error("no schema documents supplied")]
    NoDocuments,
}

/// Reasons a type or class could not be resolved.
///
/// Every variant means "not found" to callers of the resolver; the variant only
/// records why, so the caller can log it and pick a severity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No declaration with this name exists in any document.
    #[error("{name} is not declared in any schema document")]
    NotFound {
        /// Name that was searched for.
        name: String,
    },
    /// A fixed record declares an encoding other than `HLAfixedRecord`.
    #[error("fixed record {name} has unknown encoding '{encoding}'")]
    UnknownEncoding {
        /// Record name.
        name: String,
        /// Declared encoding.
        encoding: String,
    },
    /// A declaration carries more than one candidate type leaf.
    #[error("{name} declares {count} data types, expected exactly one")]
    Ambiguous {
        /// Owning declaration or field name.
        name: String,
        /// Number of type leaves found.
        count: usize,
    },
    /// A declaration is missing a mandatory leaf.
    #[error("{name} has no '{leaf}' element")]
    MissingLeaf {
        /// Owning declaration or field name.
        name: String,
        /// Missing leaf tag.
        leaf: &'static str,
    },
    /// The type graph loops back on itself.
    #[error("cyclic data type declaration: {}", chain.join(" -> "))]
    Cyclic {
        /// Resolution chain, ending with the repeated name.
        chain: Vec<String>,
    },
    /// A variant record has more alternatives than an octet discriminant can select.
    #[error("variant record {name} has {count} alternatives; at most 256 are supported")]
    TooManyAlternatives {
        /// Record name.
        name: String,
        /// Number of alternatives declared.
        count: usize,
    },
}

/// Errors raised when bytes do not match a decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before the value was complete.
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEnd {
        /// Read position.
        offset: usize,
        /// Bytes required.
        needed: usize,
        /// Bytes left.
        available: usize,
    },
    /// An element count on the wire is negative or larger than the data.
    #[error("invalid element count {count} at offset {offset}")]
    InvalidCount {
        /// Read position of the count.
        offset: usize,
        /// Count read from the wire.
        count: i64,
    },
    /// A variant discriminant selects no alternative.
    #[error("discriminant {value} selects no alternative")]
    UnknownDiscriminant {
        /// Discriminant read from the wire.
        value: u8,
    },
    /// Character data is not valid for its encoding.
    #[error("invalid character data: {0}")]
    InvalidText(String),
    /// The decoded value is outside its permitted set.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
