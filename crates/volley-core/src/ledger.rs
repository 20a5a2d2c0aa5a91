//! Per-class record of received events and their decode outcomes.
//!
//! Every event is keyed by its [`EventIdentifier`]. For each one the ledger
//! partitions the class's declared fields into decoded, failed, missing and
//! optionally missing, and remembers when the event arrived. The pairing and
//! error predicates the verdict engine asserts are computed from this state.

use crate::config::FieldPolicy;
use crate::event_id::EventIdentifier;
use crate::field_decoders::{FieldDecoderBindings, TypedValue};
use crate::interaction::ReceivedInteraction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};
use volley_schema::{ClassDefinition, DecodeError, PrimitiveCodec, TypeResolver, Value};

/// A successfully decoded field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Decoded through the resolved decoder tree.
    Decoded(Value),
    /// Decoded by a bound field decoder.
    Typed(TypedValue),
    /// Present with a zero-length payload that is allowed to be empty.
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Decoded(v) => write!(f, "{}", v),
            FieldValue::Typed(v) => write!(f, "{}", v),
            FieldValue::Empty => f.write_str("<empty>"),
        }
    }
}

/// How one field of one event turned out.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// Decoded.
    Decoded(FieldValue),
    /// Present but could not be decoded; carries the reason.
    Failed(String),
    /// Absent and required.
    Missing,
    /// Absent and optional.
    OptionalMissing,
}

#[derive(Debug, Clone, Default)]
struct EventEntry {
    received_at_ms: Option<i64>,
    decoded: BTreeMap<String, FieldValue>,
    failed: BTreeMap<String, String>,
    missing: BTreeSet<String>,
    optional_missing: BTreeSet<String>,
}

impl EventEntry {
    fn is_erroneous(&self) -> bool {
        !self.failed.is_empty() || !self.missing.is_empty()
    }
}

/// What the ledger needs to decode one message.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Resolver over the loaded schema.
    pub resolver: &'a TypeResolver,
    /// Definition of the message's class.
    pub class: &'a ClassDefinition,
    /// Optional and optionally-empty fields.
    pub policy: &'a FieldPolicy,
    /// Decoders bound by configuration.
    pub bindings: &'a FieldDecoderBindings,
    /// Primitive codec for decoder trees.
    pub codec: &'a dyn PrimitiveCodec,
}

/// Decode outcomes of one event, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAudit {
    /// The event.
    pub event: EventIdentifier,
    /// Receipt time, milliseconds since the Unix epoch.
    pub received_at_ms: Option<i64>,
    /// Decoded fields with their rendered values.
    pub decoded: BTreeMap<String, String>,
    /// Failed fields with the failure reason.
    pub failed: BTreeMap<String, String>,
    /// Required fields that were absent.
    pub missing: Vec<String>,
    /// Optional fields that were absent.
    pub optional_missing: Vec<String>,
}

impl EventAudit {
    /// Whether this event has a failed or missing required field.
    pub fn is_erroneous(&self) -> bool {
        !self.failed.is_empty() || !self.missing.is_empty()
    }
}

/// Events received for one interaction class.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    class_name: String,
    expected_fields: Vec<String>,
    events: BTreeMap<EventIdentifier, EventEntry>,
}

impl InteractionRecord {
    /// Creates an empty record for a class and its declared fields.
    pub fn new(class_name: impl Into<String>, expected_fields: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            expected_fields,
            events: BTreeMap::new(),
        }
    }

    /// Class this record tracks.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Declared fields checked on every event.
    pub fn expected_fields(&self) -> &[String] {
        &self.expected_fields
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Records the receipt time of an event, creating it if needed.
    pub fn record_time(&mut self, id: &EventIdentifier, received_at_ms: i64) {
        let entry = self.events.entry(id.clone()).or_default();
        if entry.received_at_ms.is_some() {
            warn!(class = %self.class_name, event = %id, "event identifier seen again, time replaced");
        }
        entry.received_at_ms = Some(received_at_ms);
    }

    /// Records the outcome of one field of an event.
    pub fn record_outcome(&mut self, id: &EventIdentifier, field: &str, outcome: FieldOutcome) {
        let entry = self.events.entry(id.clone()).or_default();
        let field = field.to_string();
        match outcome {
            FieldOutcome::Decoded(value) => {
                entry.decoded.insert(field, value);
            }
            FieldOutcome::Failed(reason) => {
                entry.failed.insert(field, reason);
            }
            FieldOutcome::Missing => {
                entry.missing.insert(field);
            }
            FieldOutcome::OptionalMissing => {
                entry.optional_missing.insert(field);
            }
        }
    }

    /// Runs the update pass for one message.
    ///
    /// Every declared field is classified; the receipt time is recorded
    /// whatever the outcomes are.
    pub fn ingest(&mut self, id: &EventIdentifier, interaction: &ReceivedInteraction, ctx: &DecodeContext<'_>) {
        self.record_time(id, interaction.received_at_ms);
        for field in self.expected_fields.clone() {
            let outcome = classify_field(&self.class_name, &field, interaction.field(&field), ctx);
            match &outcome {
                FieldOutcome::Decoded(value) => debug!(class = %self.class_name, field = %field, value = %value, "decoded"),
                FieldOutcome::Failed(reason) => warn!(class = %self.class_name, field = %field, reason = %reason, "failed to decode"),
                FieldOutcome::Missing => warn!(class = %self.class_name, field = %field, "missing"),
                FieldOutcome::OptionalMissing => debug!(class = %self.class_name, field = %field, "optional field absent"),
            }
            self.record_outcome(id, &field, outcome);
        }
        for name in interaction.fields.keys() {
            if !self.expected_fields.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                debug!(class = %self.class_name, field = %name, "undeclared field ignored");
            }
        }
        info!(class = %self.class_name, event = %id, "event recorded");
    }

    /// Whether any event has a failed or missing required field.
    pub fn is_erroneous(&self) -> bool {
        self.events.values().any(EventEntry::is_erroneous)
    }

    /// Whether any event was issued by `issuer`.
    pub fn is_issuing_id_present(&self, issuer: &str) -> bool {
        self.events.keys().any(|id| id.issuer == issuer)
    }

    /// Whether an event from the same issuer has both a lower counter and an
    /// earlier receipt time than `candidate` at `time_ms`.
    pub fn is_prior_event_present(&self, candidate: &EventIdentifier, time_ms: i64) -> bool {
        self.events.iter().any(|(id, entry)| {
            id.same_issuer(candidate)
                && id.counter < candidate.counter
                && entry.received_at_ms.is_some_and(|t| t < time_ms)
        })
    }

    /// Recorded events with their receipt times.
    pub fn events_and_times(&self) -> impl Iterator<Item = (&EventIdentifier, i64)> {
        self.events
            .iter()
            .filter_map(|(id, entry)| entry.received_at_ms.map(|t| (id, t)))
    }

    /// Recorded event identifiers.
    pub fn events(&self) -> impl Iterator<Item = &EventIdentifier> {
        self.events.keys()
    }

    /// Decoded values of an event.
    pub fn decoded(&self, id: &EventIdentifier) -> Option<&BTreeMap<String, FieldValue>> {
        self.events.get(id).map(|e| &e.decoded)
    }

    /// Names of the failed fields of an event.
    pub fn failed(&self, id: &EventIdentifier) -> Vec<&str> {
        self.names(id, |e| e.failed.keys().map(String::as_str).collect())
    }

    /// Names of the missing required fields of an event.
    pub fn missing(&self, id: &EventIdentifier) -> Vec<&str> {
        self.names(id, |e| e.missing.iter().map(String::as_str).collect())
    }

    /// Names of the absent optional fields of an event.
    pub fn optional_missing(&self, id: &EventIdentifier) -> Vec<&str> {
        self.names(id, |e| e.optional_missing.iter().map(String::as_str).collect())
    }

    fn names<'a>(&'a self, id: &EventIdentifier, pick: impl Fn(&'a EventEntry) -> Vec<&'a str>) -> Vec<&'a str> {
        self.events.get(id).map(pick).unwrap_or_default()
    }

    /// Per-event decode outcomes in identifier order.
    pub fn audit(&self) -> Vec<EventAudit> {
        self.events
            .iter()
            .map(|(id, entry)| EventAudit {
                event: id.clone(),
                received_at_ms: entry.received_at_ms,
                decoded: entry
                    .decoded
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect(),
                failed: entry.failed.clone(),
                missing: entry.missing.iter().cloned().collect(),
                optional_missing: entry.optional_missing.iter().cloned().collect(),
            })
            .collect()
    }
}

fn classify_field(class: &str, field: &str, payload: Option<&[u8]>, ctx: &DecodeContext<'_>) -> FieldOutcome {
    let Some(bytes) = payload else {
        return if ctx.policy.is_optional(class, field) {
            FieldOutcome::OptionalMissing
        } else {
            FieldOutcome::Missing
        };
    };
    let decoder = match ctx.resolver.decoder_for_field(ctx.class, field) {
        Ok(decoder) => decoder,
        Err(e) => return FieldOutcome::Failed(format!("no decoder: {}", e)),
    };
    let decoded = match ctx.bindings.lookup(class, field) {
        Some(bound) => (bound.decode)(bytes)
            .map(FieldValue::Typed)
            .map_err(|e| describe(&bound.tag, e)),
        None => decoder
            .decode_with(bytes, ctx.codec)
            .map(FieldValue::Decoded)
            .map_err(|e| describe(decoder.type_name(), e)),
    };
    match decoded {
        Ok(value) => FieldOutcome::Decoded(value),
        Err(_) if bytes.is_empty() && ctx.policy.is_valid_when_empty(class, field) => {
            FieldOutcome::Decoded(FieldValue::Empty)
        }
        Err(reason) => FieldOutcome::Failed(reason),
    }
}

fn describe(decoder: &str, error: DecodeError) -> String {
    format!("{} decode failed: {}", decoder, error)
}
