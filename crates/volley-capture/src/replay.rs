//! Replaying a capture into a federate ambassador.
//!
//! [`ReplayFederation`] answers the engine's membership queries from the
//! federates the capture has joined so far, and answers attribute update
//! requests for their management objects the way the RTI would. The
//! [`Replayer`] thread delivers records at their recorded offsets.

use crate::errors::CaptureError;
use crate::record::CaptureRecord;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use volley_core::federation::{
    FEDERATE_NAME_ATTRIBUTE, FEDERATE_OBJECT_CLASS, FEDERATE_TYPE_ATTRIBUTE, FOM_MODULES_ATTRIBUTE,
};
use volley_core::{
    DiscoveredObject, FederateAmbassador, Federation, FederationError, FieldMap,
    ReceivedInteraction,
};
use volley_schema::codec::{encode_unicode_string, encode_unicode_string_array};

#[derive(Debug)]
struct JoinedFederate {
    handle: u64,
    attributes: FieldMap,
}

/// Federation backed by a recorded capture.
#[derive(Debug)]
pub struct ReplayFederation {
    ambassador: Arc<FederateAmbassador>,
    joined: RwLock<BTreeMap<String, JoinedFederate>>,
    update_requests: AtomicUsize,
}

impl ReplayFederation {
    /// Creates a federation with no joined federates.
    pub fn new(ambassador: Arc<FederateAmbassador>) -> Self {
        Self {
            ambassador,
            joined: RwLock::new(BTreeMap::new()),
            update_requests: AtomicUsize::new(0),
        }
    }

    /// Adds a federate and announces its management object.
    pub fn join(&self, handle: u64, federate_name: &str, federate_type: &str, fom_modules: &[String]) {
        let modules: Vec<&str> = fom_modules.iter().map(String::as_str).collect();
        let mut attributes = FieldMap::new();
        attributes.insert(FEDERATE_NAME_ATTRIBUTE.to_string(), encode_unicode_string(federate_name));
        attributes.insert(FEDERATE_TYPE_ATTRIBUTE.to_string(), encode_unicode_string(federate_type));
        attributes.insert(FOM_MODULES_ATTRIBUTE.to_string(), encode_unicode_string_array(&modules));

        info!(federate = federate_name, handle, "federate joined");
        self.joined
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(federate_name.to_string(), JoinedFederate { handle, attributes });
        self.ambassador
            .discover_object_instance(handle, FEDERATE_OBJECT_CLASS, federate_name);
    }

    /// Removes a federate and its management object.
    pub fn resign(&self, federate_name: &str) {
        let removed = self
            .joined
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(federate_name);
        match removed {
            Some(federate) => {
                info!(federate = federate_name, "federate resigned");
                self.ambassador.remove_object_instance(federate.handle);
            }
            None => debug!(federate = federate_name, "resign of unknown federate ignored"),
        }
    }

    /// Number of attribute update requests received.
    pub fn update_requests(&self) -> usize {
        self.update_requests.load(Ordering::SeqCst)
    }
}

impl Federation for ReplayFederation {
    fn is_federate_joined(&self, federate_name: &str) -> Result<bool, FederationError> {
        Ok(self
            .joined
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(federate_name))
    }

    fn request_attribute_update(
        &self,
        object: &DiscoveredObject,
        attributes: &[String],
    ) -> Result<(), FederationError> {
        self.update_requests.fetch_add(1, Ordering::SeqCst);
        let reflected: Option<FieldMap> = self
            .joined
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .find(|f| f.handle == object.handle)
            .map(|f| {
                f.attributes
                    .iter()
                    .filter(|(name, _)| attributes.iter().any(|a| a == *name))
                    .map(|(name, bytes)| (name.clone(), bytes.clone()))
                    .collect()
            });
        match reflected {
            Some(values) => self.ambassador.reflect_attribute_values(object.handle, values),
            None => debug!(instance = %object.instance_name, "no recorded values for update request"),
        }
        Ok(())
    }
}

/// Delivers capture records to an ambassador on a background thread.
pub struct Replayer {
    records: Vec<CaptureRecord>,
    ambassador: Arc<FederateAmbassador>,
    federation: Arc<ReplayFederation>,
    speed: f64,
}

impl Replayer {
    /// Creates a replayer delivering in recorded time.
    ///
    /// Records are delivered in `at_ms` order; records with equal offsets
    /// keep their file order.
    pub fn new(
        mut records: Vec<CaptureRecord>,
        ambassador: Arc<FederateAmbassador>,
        federation: Arc<ReplayFederation>,
    ) -> Self {
        records.sort_by_key(CaptureRecord::at_ms);
        Self {
            records,
            ambassador,
            federation,
            speed: 1.0,
        }
    }

    /// Scales replay time; `2.0` replays twice as fast.
    pub fn with_speed(mut self, speed: f64) -> Result<Self, CaptureError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CaptureError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(self)
    }

    /// Starts delivery. The handle yields the number of records delivered.
    pub fn spawn(self) -> JoinHandle<usize> {
        thread::spawn(move || self.deliver_all())
    }

    fn deliver_all(self) -> usize {
        let started = Instant::now();
        let epoch_ms = chrono::Utc::now().timestamp_millis();
        let total = self.records.len();
        for record in &self.records {
            let due = Duration::try_from_secs_f64(record.at_ms() as f64 / 1000.0 / self.speed)
                .unwrap_or(Duration::MAX);
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
            self.deliver(record, epoch_ms);
        }
        info!(records = total, "capture replay finished");
        total
    }

    /// Receipt times are the replay start plus the recorded offset, so
    /// speeding up replay keeps the recorded ordering of receipt times.
    fn deliver(&self, record: &CaptureRecord, epoch_ms: i64) {
        debug!(kind = record.kind(), at_ms = record.at_ms(), "delivering record");
        match record {
            CaptureRecord::Interaction {
                at_ms,
                class_name,
                fields,
                sent_time,
            } => {
                let offset = i64::try_from(*at_ms).unwrap_or(i64::MAX);
                self.ambassador.receive_interaction(ReceivedInteraction {
                    class_name: class_name.clone(),
                    fields: fields.clone(),
                    received_at_ms: epoch_ms.saturating_add(offset),
                    sent_time: *sent_time,
                });
            }
            CaptureRecord::ObjectDiscovered {
                handle,
                class_name,
                instance_name,
                ..
            } => self
                .ambassador
                .discover_object_instance(*handle, class_name, instance_name),
            CaptureRecord::AttributesReflected { handle, attributes, .. } => self
                .ambassador
                .reflect_attribute_values(*handle, attributes.clone()),
            CaptureRecord::ObjectRemoved { handle, .. } => {
                self.ambassador.remove_object_instance(*handle)
            }
            CaptureRecord::FederateJoined {
                handle,
                federate_name,
                federate_type,
                fom_modules,
                ..
            } => self
                .federation
                .join(*handle, federate_name, federate_type, fom_modules),
            CaptureRecord::FederateResigned { federate_name, .. } => {
                self.federation.resign(federate_name)
            }
        }
    }
}
