use thiserror::Error;

/// Configuration problems detected before any message is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A configuration file is not valid JSON for its schema.
    #[error("cannot parse {path}: {source}")]
    Json {
        /// File path, or `<inline>` for strings.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A mandatory field was configured as optional.
    #[error("{field} is always mandatory but has been configured as optional")]
    MandatoryFieldOptional {
        /// Offending field name.
        field: String,
    },
    /// Pairing was requested without both message classes under test.
    #[error("testForMatchingPair is set but only one of the warfare interactions is under test")]
    PairingNeedsBothClasses,
    /// The join or resign test is on but no SuT federate name is configured.
    #[error("testSutFederateJoin and testSutFederateResign need a non-empty sutFederateName")]
    MissingSutFederateName,
    /// A field selector is malformed.
    #[error("invalid field selector '{0}'")]
    InvalidSelector(String),
    /// A custom decoder tag is not registered.
    #[error("no field decoder registered as '{tag}' (configured for {selector})")]
    UnknownDecoderTag {
        /// Selector the decoder was configured for.
        selector: String,
        /// Unknown tag.
        tag: String,
    },
    /// No schema documents were configured.
    #[error("no urls were specified in the test parameters")]
    NoSchemaUrls,
    /// A configured schema document does not exist.
    #[error("url {0} was specified in the test parameters but cannot be resolved")]
    SchemaUrlNotFound(String),
    /// A duration setting is not a finite number of seconds.
    #[error("{name} must be a finite number of seconds, got {value}")]
    InvalidDuration {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Failures of the federation collaborator; always inconclusive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FederationError {
    /// The federation connection is gone.
    #[error("not connected to the federation")]
    NotConnected,
    /// An object instance is unknown to the federation.
    #[error("object instance {0} is not known")]
    ObjectNotKnown(String),
    /// Any other collaborator failure.
    #[error("federation error: {0}")]
    Internal(String),
}

/// Errors raised while preparing a run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration is invalid; fatal before any verdict.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The schema or federation cannot support the run; maps to an inconclusive verdict.
    #[error("setup failed: {0}")]
    Setup(String),
}
