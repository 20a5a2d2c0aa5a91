//! Run configuration.
//!
//! Two JSON documents drive a run: the test configuration (which checks are
//! enabled, field policy, decoder bindings) and the test parameters
//! (federation identity, timeouts, schema documents).

use crate::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Name of the correlation field carried by both warfare interactions.
pub const EVENT_IDENTIFIER_FIELD: &str = "EventIdentifier";

const SELECTOR_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_\-]*(\.[A-Za-z_][A-Za-z0-9_\-]*)*$";

/// A `field` or `Class.field` reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldSelector(String);

impl FieldSelector {
    /// Parses a selector, rejecting malformed names.
    pub fn parse(value: impl Into<String>) -> Result<Self, ConfigError> {
        let s = value.into().trim().to_string();
        let valid = Regex::new(SELECTOR_PATTERN)
            .map(|re| re.is_match(&s))
            .unwrap_or(false);
        if !valid {
            return Err(ConfigError::InvalidSelector(s));
        }
        Ok(Self(s))
    }

    /// The field part of the selector.
    pub fn field(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The class part, if the selector is qualified.
    pub fn class(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(class, _)| class)
    }

    /// The selector text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldSelector {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldSelector> for String {
    fn from(value: FieldSelector) -> Self {
        value.0
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which fields may be absent, and which may be present but empty.
#[derive(Debug, Clone, Default)]
pub struct FieldPolicy {
    optional: HashSet<String>,
    optionally_empty: HashSet<String>,
}

impl FieldPolicy {
    /// Builds a policy from selector lists.
    pub fn new<'a>(
        optional: impl IntoIterator<Item = &'a FieldSelector>,
        optionally_empty: impl IntoIterator<Item = &'a FieldSelector>,
    ) -> Self {
        Self {
            optional: optional.into_iter().map(|s| s.0.clone()).collect(),
            optionally_empty: optionally_empty.into_iter().map(|s| s.0.clone()).collect(),
        }
    }

    /// Whether the field may be absent from a message of `class`.
    pub fn is_optional(&self, class: &str, field: &str) -> bool {
        selected(&self.optional, class, field)
    }

    /// Whether the field may carry a zero-length payload.
    pub fn is_valid_when_empty(&self, class: &str, field: &str) -> bool {
        selected(&self.optionally_empty, class, field)
    }
}

fn selected(set: &HashSet<String>, class: &str, field: &str) -> bool {
    set.contains(field) || set.contains(&format!("{}.{}", class, field))
}

fn enabled() -> bool {
    true
}

/// Enabled checks and field policy for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    /// Wait for the SuT to join with the expected type and modules.
    #[serde(default = "enabled")]
    pub test_sut_federate_join: bool,
    /// Wait for the SuT to resign after the run.
    #[serde(default)]
    pub test_sut_federate_resign: bool,
    /// Validate `WeaponFire` messages.
    #[serde(default)]
    pub test_weapon_fire: bool,
    /// Validate `MunitionDetonation` messages.
    #[serde(default)]
    pub test_munition_detonation: bool,
    /// Check the munition object instance named by each message.
    #[serde(default)]
    pub test_munition_instance: bool,
    /// Require a prior fire for every detonation.
    #[serde(default = "enabled")]
    pub test_for_matching_pair: bool,
    /// Require the SuT to declare every configured schema module.
    #[serde(default = "enabled", rename = "testFOMs")]
    pub test_foms: bool,
    /// Fields that may be absent.
    #[serde(default)]
    pub optional_params: Vec<FieldSelector>,
    /// Fields that may be present with a zero-length payload.
    #[serde(default)]
    pub optionally_empty_params: Vec<FieldSelector>,
    /// Selector to field decoder tag.
    #[serde(default)]
    pub param_decoders: BTreeMap<FieldSelector, String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            test_sut_federate_join: true,
            test_sut_federate_resign: false,
            test_weapon_fire: false,
            test_munition_detonation: false,
            test_munition_instance: false,
            test_for_matching_pair: true,
            test_foms: true,
            optional_params: Vec::new(),
            optionally_empty_params: Vec::new(),
            param_decoders: BTreeMap::new(),
        }
    }
}

impl TestConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "test configuration loaded");
        Ok(config)
    }

    /// Checks the configuration against the parameters it will run with.
    pub fn validate(&self, params: &TestParams) -> Result<(), ConfigError> {
        if let Some(selector) = self
            .optional_params
            .iter()
            .find(|s| s.field() == EVENT_IDENTIFIER_FIELD)
        {
            return Err(ConfigError::MandatoryFieldOptional {
                field: selector.to_string(),
            });
        }
        if self.test_for_matching_pair && !(self.test_weapon_fire && self.test_munition_detonation) {
            return Err(ConfigError::PairingNeedsBothClasses);
        }
        if (self.test_sut_federate_join || self.test_sut_federate_resign)
            && params.sut_federate_name.trim().is_empty()
        {
            return Err(ConfigError::MissingSutFederateName);
        }
        debug!(
            optional = self.optional_params.len(),
            optionally_empty = self.optionally_empty_params.len(),
            decoders = self.param_decoders.len(),
            "test configuration valid"
        );
        Ok(())
    }

    /// The field policy this configuration describes.
    pub fn field_policy(&self) -> FieldPolicy {
        FieldPolicy::new(&self.optional_params, &self.optionally_empty_params)
    }
}

/// A wait bound; negative configured seconds mean no bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait until the condition holds.
    Forever,
    /// Wait at most this long. Zero has already expired, so the
    /// interaction wait drains nothing while membership polls still check
    /// once before giving up.
    After(Duration),
}

impl Timeout {
    /// Converts configured seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds < 0.0 {
            return Timeout::Forever;
        }
        Duration::try_from_secs_f64(seconds)
            .map(Timeout::After)
            .unwrap_or(Timeout::Forever)
    }

    /// Whether the wait that began at `started` is over.
    pub fn expired(&self, started: Instant) -> bool {
        match self {
            Timeout::Forever => false,
            Timeout::After(limit) => started.elapsed() >= *limit,
        }
    }

    /// Time left of the wait, if bounded.
    pub fn remaining(&self, started: Instant) -> Option<Duration> {
        match self {
            Timeout::Forever => None,
            Timeout::After(limit) => Some(limit.saturating_sub(started.elapsed())),
        }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::Forever => f.write_str("unbounded"),
            Timeout::After(limit) => write!(f, "{} ms", limit.as_millis()),
        }
    }
}

fn default_rti_host() -> String {
    "localhost".to_string()
}

fn default_federation_name() -> String {
    "TestFederation".to_string()
}

fn default_tc_federate_name() -> String {
    "TcWarfare".to_string()
}

/// Federation identity, timeouts and schema documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestParams {
    /// Host of the RTI.
    #[serde(default = "default_rti_host")]
    pub rti_host: String,
    /// Federation to join.
    #[serde(default = "default_federation_name")]
    pub federation_name: String,
    /// Name the test case federate joins with.
    #[serde(default = "default_tc_federate_name")]
    pub tc_federate_name: String,
    /// Name the SuT is expected to join with.
    #[serde(default)]
    pub sut_federate_name: String,
    /// Type the SuT is expected to join with.
    #[serde(default)]
    pub sut_federate_type: String,
    /// Seconds to wait for the SuT to join; negative waits forever.
    pub sut_federate_join_timeout: f64,
    /// Seconds to wait for the SuT to resign; negative waits forever.
    pub sut_federate_resign_timeout: f64,
    /// Seconds to wait for messages; negative waits forever.
    pub test_timeout: f64,
    /// Seconds between polls.
    pub sleep_time: f64,
    /// Schema documents, relative to the parameters file.
    #[serde(default)]
    pub urls: Vec<PathBuf>,
}

impl TestParams {
    /// Parses parameters from JSON text; relative urls resolve against `base_dir`.
    pub fn from_json(json: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: "<inline>".to_string(),
            source,
        })?;
        params.finish(base_dir)
    }

    /// Loads a parameters file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        let params: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let params = params.finish(path.parent())?;
        info!(path = %path.display(), urls = params.urls.len(), "test parameters loaded");
        Ok(params)
    }

    fn finish(mut self, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        check_duration("sutFederateJoinTimeout", self.sut_federate_join_timeout)?;
        check_duration("sutFederateResignTimeout", self.sut_federate_resign_timeout)?;
        check_duration("testTimeout", self.test_timeout)?;
        if !self.sleep_time.is_finite() || self.sleep_time < 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "sleepTime",
                value: self.sleep_time,
            });
        }
        if self.urls.is_empty() {
            return Err(ConfigError::NoSchemaUrls);
        }
        if let Some(base) = base_dir {
            self.urls = self
                .urls
                .into_iter()
                .map(|url| if url.is_relative() { base.join(url) } else { url })
                .collect();
        }
        if let Some(missing) = self.urls.iter().find(|url| !url.exists()) {
            return Err(ConfigError::SchemaUrlNotFound(missing.display().to_string()));
        }
        Ok(self)
    }

    /// Bound on waiting for the SuT to join.
    pub fn join_timeout(&self) -> Timeout {
        Timeout::from_seconds(self.sut_federate_join_timeout)
    }

    /// Bound on waiting for the SuT to resign.
    pub fn resign_timeout(&self) -> Timeout {
        Timeout::from_seconds(self.sut_federate_resign_timeout)
    }

    /// Bound on waiting for messages.
    pub fn test_timeout(&self) -> Timeout {
        Timeout::from_seconds(self.test_timeout)
    }

    /// Interval between polls.
    pub fn sleep_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_time).unwrap_or(Duration::ZERO)
    }

    /// Schema document paths as strings, in configured order.
    pub fn url_strings(&self) -> Vec<String> {
        self.urls.iter().map(|u| u.display().to_string()).collect()
    }

    /// File names of the configured schema documents; both separators count.
    pub fn schema_module_names(&self) -> Vec<String> {
        self.url_strings()
            .iter()
            .map(|url| module_name(url).to_string())
            .collect()
    }
}

/// Last path segment, splitting on either slash.
pub fn module_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn check_duration(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { name, value })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_documented_values() {
        let config = TestConfig::from_json("{}").unwrap();
        assert!(config.test_sut_federate_join);
        assert!(!config.test_sut_federate_resign);
        assert!(config.test_for_matching_pair);
        assert!(config.test_foms);
        assert!(!config.test_weapon_fire);
    }

    #[test]
    fn selectors_are_parsed_on_load() {
        let config = TestConfig::from_json(
            r#"{"optionalParams": ["WeaponFire.FuseType", "TargetObjectIdentifier"],
                "paramDecoders": {"FuseType": "FuseTypeEnum16"}}"#,
        )
        .unwrap();
        let policy = config.field_policy();
        assert!(policy.is_optional("WeaponFire", "FuseType"));
        assert!(!policy.is_optional("MunitionDetonation", "FuseType"));
        assert!(policy.is_optional("MunitionDetonation", "TargetObjectIdentifier"));
        assert!(!policy.is_valid_when_empty("WeaponFire", "FuseType"));

        assert!(TestConfig::from_json(r#"{"optionalParams": ["bad name"]}"#).is_err());
    }

    #[test]
    fn selector_parts() {
        let s = FieldSelector::parse("WeaponFire.FuseType").unwrap();
        assert_eq!(s.class(), Some("WeaponFire"));
        assert_eq!(s.field(), "FuseType");
        let bare = FieldSelector::parse("FuseType").unwrap();
        assert_eq!(bare.class(), None);
    }

    #[test]
    fn timeout_sentinels() {
        assert_eq!(Timeout::from_seconds(-1.0), Timeout::Forever);
        assert_eq!(Timeout::from_seconds(0.0), Timeout::After(Duration::ZERO));
        assert!(Timeout::After(Duration::ZERO).expired(Instant::now()));
        assert_eq!(Timeout::After(Duration::ZERO).remaining(Instant::now()), Some(Duration::ZERO));
        assert!(!Timeout::Forever.expired(Instant::now()));
    }

    #[test]
    fn module_name_splits_both_separators() {
        assert_eq!(module_name(r"C:\foms\RPR-Warfare_v2.0.xml"), "RPR-Warfare_v2.0.xml");
        assert_eq!(module_name("foms/RPR-Base_v2.0.xml"), "RPR-Base_v2.0.xml");
        assert_eq!(module_name("plain.xml"), "plain.xml");
    }
}
