//! The verdict engine.
//!
//! A run walks the stages of [`Stage`] in order. Disabled stages are skipped;
//! any stage may end the run with a failed or inconclusive verdict. The
//! interaction stage is the only consumer of the ambassador's queue and
//! drains it in arrival order.

use crate::ambassador::FederateAmbassador;
use crate::config::{module_name, FieldPolicy, TestConfig, TestParams, Timeout, EVENT_IDENTIFIER_FIELD};
use crate::errors::{EngineError, FederationError};
use crate::event_id::EventIdentifier;
use crate::federation::{
    Federation, FEDERATE_NAME_ATTRIBUTE, FEDERATE_OBJECT_CLASS, FEDERATE_TYPE_ATTRIBUTE,
    FOM_MODULES_ATTRIBUTE, MUNITION_OBJECT_CLASS,
};
use crate::field_decoders::{FieldDecoderBindings, FieldDecoderRegistry};
use crate::interaction::{DiscoveredObject, ReceivedInteraction};
use crate::ledger::{DecodeContext, InteractionRecord};
use crate::types::EntityType;
use crate::verdict::{RunReport, Stage, StageOutcome, StageStatus, Verdict};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use volley_schema::codec::{decode_ascii_string, unicode_string, unicode_string_array};
use volley_schema::{ByteReader, ClassDefinition, HlaCodec, PrimitiveCodec, TypeResolver};

/// Interaction class of fire events.
pub const WEAPON_FIRE: &str = "WeaponFire";

/// Interaction class of detonation events.
pub const MUNITION_DETONATION: &str = "MunitionDetonation";

/// Field describing the fired or detonated entity.
pub const ENTITY_TYPE_FIELD: &str = "MunitionType";

/// Field naming the munition object instance.
pub const MUNITION_OBJECT_FIELD: &str = "MunitionObjectIdentifier";

const MIN_POLL: Duration = Duration::from_millis(1);

/// One of the two tracked interaction classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    /// `WeaponFire`.
    Fire,
    /// `MunitionDetonation`.
    Detonation,
}

impl Track {
    /// Class name of the track.
    pub fn class_name(self) -> &'static str {
        match self {
            Track::Fire => WEAPON_FIRE,
            Track::Detonation => MUNITION_DETONATION,
        }
    }
}

#[derive(Debug)]
struct TrackedClass {
    definition: ClassDefinition,
    record: InteractionRecord,
    under_test: bool,
    received: bool,
}

enum Flow {
    Continue,
    Stop,
}

/// Runs the conformance stages against a federation.
pub struct VerdictEngine {
    config: TestConfig,
    params: TestParams,
    resolver: TypeResolver,
    policy: FieldPolicy,
    bindings: FieldDecoderBindings,
    codec: Box<dyn PrimitiveCodec>,
    ambassador: Arc<FederateAmbassador>,
    queue: Receiver<ReceivedInteraction>,
    federation: Arc<dyn Federation>,
    fire: TrackedClass,
    detonation: TrackedClass,
    sut_seen: bool,
}

impl VerdictEngine {
    /// Validates the configuration, locates both classes and subscribes.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for an invalid configuration and
    /// [`EngineError::Setup`] when the schema cannot support the run.
    pub fn new(
        config: TestConfig,
        params: TestParams,
        resolver: TypeResolver,
        ambassador: Arc<FederateAmbassador>,
        queue: Receiver<ReceivedInteraction>,
        federation: Arc<dyn Federation>,
    ) -> Result<Self, EngineError> {
        config.validate(&params)?;
        let bindings = FieldDecoderBindings::bind(&FieldDecoderRegistry::builtin(), &config.param_decoders)?;
        let policy = config.field_policy();

        let fire = track(&resolver, WEAPON_FIRE, config.test_weapon_fire)?;
        let detonation = track(&resolver, MUNITION_DETONATION, config.test_munition_detonation)?;
        ambassador.subscribe_interaction(&fire.definition.name);
        ambassador.subscribe_interaction(&detonation.definition.name);

        if config.test_sut_federate_join {
            ambassador.subscribe_object(FEDERATE_OBJECT_CLASS, federate_attributes());
        }
        if config.test_munition_instance {
            let attributes = resolver
                .locator()
                .attribute_names(MUNITION_OBJECT_CLASS)
                .map_err(|e| EngineError::Setup(format!("{} class definition not found: {}", MUNITION_OBJECT_CLASS, e)))?;
            ambassador.subscribe_object(MUNITION_OBJECT_CLASS, attributes);
        }

        Ok(Self {
            config,
            params,
            resolver,
            policy,
            bindings,
            codec: Box::new(HlaCodec),
            ambassador,
            queue,
            federation,
            fire,
            detonation,
            sut_seen: false,
        })
    }

    /// Replaces the primitive codec used by decoder trees.
    pub fn with_codec(mut self, codec: Box<dyn PrimitiveCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Runs every enabled stage and reports the verdict.
    pub fn run(mut self) -> RunReport {
        let started_at = chrono::Utc::now().to_rfc3339();
        let mut stages = Vec::new();
        let mut stage = Stage::WaitSutJoin;
        let verdict = loop {
            if stage == Stage::Done {
                break Verdict::Pass;
            }
            let clock = Instant::now();
            if !self.is_enabled(stage) {
                debug!(%stage, "stage skipped");
                stages.push(outcome(stage, StageStatus::Skipped, clock));
                stage = stage.next();
                continue;
            }
            info!(%stage, "stage started");
            match self.execute(stage) {
                Ok(()) => {
                    stages.push(outcome(stage, StageStatus::Passed, clock));
                    stage = stage.next();
                }
                Err(verdict) => {
                    let status = match verdict {
                        Verdict::Inconclusive(_) => StageStatus::Inconclusive,
                        _ => StageStatus::Failed,
                    };
                    error!(%stage, %verdict, "stage ended the run");
                    stages.push(outcome(stage, status, clock));
                    break verdict;
                }
            }
        };
        info!(%verdict, "run finished");
        RunReport {
            verdict,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            stages,
            audit: self.audit(),
        }
    }

    fn is_enabled(&self, stage: Stage) -> bool {
        let any_under_test = self.fire.under_test || self.detonation.under_test;
        match stage {
            Stage::WaitSutJoin => self.config.test_sut_federate_join,
            Stage::WaitInteractions => any_under_test,
            Stage::CheckParams => true,
            Stage::CheckPairing => self.config.test_for_matching_pair,
            Stage::WaitSutResign => self.config.test_sut_federate_resign,
            Stage::Done => false,
        }
    }

    fn execute(&mut self, stage: Stage) -> Result<(), Verdict> {
        match stage {
            Stage::WaitSutJoin => self.wait_sut_join(),
            Stage::WaitInteractions => self.wait_interactions(),
            Stage::CheckParams => self.check_params(),
            Stage::CheckPairing => self.check_pairing(),
            Stage::WaitSutResign => self.wait_sut_resign(),
            Stage::Done => Ok(()),
        }
    }

    fn poll_interval(&self, timeout: Timeout, started: Instant) -> Duration {
        let interval = self.params.sleep_interval().max(MIN_POLL);
        timeout
            .remaining(started)
            .map_or(interval, |left| left.clamp(MIN_POLL, interval))
    }

    fn wait_sut_join(&mut self) -> Result<(), Verdict> {
        let name = self.params.sut_federate_name.clone();
        let timeout = self.params.join_timeout();
        let started = Instant::now();
        let attributes = federate_attributes();
        loop {
            for object in self.ambassador.discovered_objects(FEDERATE_OBJECT_CLASS) {
                if attributes.iter().any(|a| object.attribute(a).is_none()) {
                    debug!(instance = %object.instance_name, "requesting federate attributes");
                    self.federation
                        .request_attribute_update(&object, &attributes)
                        .map_err(environment)?;
                    continue;
                }
                let joined = decode_text(&object, FEDERATE_NAME_ATTRIBUTE)?;
                if joined != name {
                    debug!(federate = %joined, "other federate joined");
                    continue;
                }
                info!(federate = %name, "SuT federate joined");
                self.sut_seen = true;
                return self.check_joined_federate(&object);
            }
            if timeout.expired(started) {
                return Err(Verdict::Inconclusive(format!(
                    "SuT federate {} failed to join federation after {}",
                    name, timeout
                )));
            }
            thread::sleep(self.poll_interval(timeout, started));
        }
    }

    fn check_joined_federate(&self, object: &DiscoveredObject) -> Result<(), Verdict> {
        let expected_type = self.params.sut_federate_type.trim();
        let joined_type = decode_text(object, FEDERATE_TYPE_ATTRIBUTE)?;
        if !expected_type.is_empty() && joined_type != expected_type {
            return Err(Verdict::Failed(format!(
                "SuT federate {} joined with type {}, expected {}",
                self.params.sut_federate_name, joined_type, expected_type
            )));
        }
        if !self.config.test_foms {
            return Ok(());
        }
        let designators = object
            .attribute(FOM_MODULES_ATTRIBUTE)
            .map(unicode_string_array)
            .transpose()
            .map_err(|e| Verdict::Inconclusive(format!("cannot decode {}: {}", FOM_MODULES_ATTRIBUTE, e)))?
            .unwrap_or_default();
        let declared: Vec<&str> = designators.iter().map(|d| module_name(d)).collect();
        let missing: Vec<String> = self
            .params
            .schema_module_names()
            .into_iter()
            .filter(|module| !declared.iter().any(|d| d.eq_ignore_ascii_case(module)))
            .collect();
        if !missing.is_empty() {
            return Err(Verdict::Failed(format!(
                "SuT federate {} did not declare FOM module(s) {}",
                self.params.sut_federate_name,
                missing.join(", ")
            )));
        }
        info!(modules = declared.len(), "SuT declared every configured FOM module");
        Ok(())
    }

    fn sut_connected(&mut self) -> Result<(), Verdict> {
        let name = self.params.sut_federate_name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let joined = self.federation.is_federate_joined(name).map_err(environment)?;
        if joined {
            self.sut_seen = true;
        } else if self.sut_seen {
            return Err(Verdict::Inconclusive(format!(
                "SuT federate {} is no longer joined",
                name
            )));
        }
        Ok(())
    }

    fn wait_interactions(&mut self) -> Result<(), Verdict> {
        let timeout = self.params.test_timeout();
        let started = Instant::now();
        while !timeout.expired(started) {
            self.sut_connected()?;
            let wait = self.poll_interval(timeout, started);
            match self.queue.recv_timeout(wait) {
                Ok(interaction) => {
                    if let Flow::Stop = self.process(interaction)? {
                        info!("every class under test has been received");
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(wait),
            }
        }
        let never: Vec<&str> = [&self.fire, &self.detonation]
            .iter()
            .filter(|t| t.under_test && !t.received)
            .map(|t| t.definition.name.as_str())
            .collect();
        if !never.is_empty() {
            return Err(Verdict::Failed(format!(
                "did not receive expected interaction(s) {} within {}",
                never.join(", "),
                timeout
            )));
        }
        Ok(())
    }

    fn classify(&self, interaction: &ReceivedInteraction) -> Option<Track> {
        if interaction.is_class(&self.fire.definition.name) {
            Some(Track::Fire)
        } else if interaction.is_class(&self.detonation.definition.name) {
            Some(Track::Detonation)
        } else {
            None
        }
    }

    fn tracked(&self, track: Track) -> &TrackedClass {
        match track {
            Track::Fire => &self.fire,
            Track::Detonation => &self.detonation,
        }
    }

    fn process(&mut self, interaction: ReceivedInteraction) -> Result<Flow, Verdict> {
        let Some(track) = self.classify(&interaction) else {
            debug!(class = %interaction.class_name, "untracked interaction ignored");
            return Ok(Flow::Continue);
        };
        let class = track.class_name();
        {
            let tracked = match track {
                Track::Fire => &mut self.fire,
                Track::Detonation => &mut self.detonation,
            };
            tracked.received = true;
            if !tracked.under_test {
                info!(class, "received but not under test");
                return Ok(Flow::Continue);
            }
        }
        for (field, bytes) in &interaction.fields {
            debug!(class, field = %field, bytes = bytes.len(), "received field");
        }
        if !self.is_munition(track, &interaction)? {
            return Ok(Flow::Continue);
        }
        let id = event_identifier(class, &interaction)?;

        let tracked = match track {
            Track::Fire => &mut self.fire,
            Track::Detonation => &mut self.detonation,
        };
        let ctx = DecodeContext {
            resolver: &self.resolver,
            class: &tracked.definition,
            policy: &self.policy,
            bindings: &self.bindings,
            codec: self.codec.as_ref(),
        };
        tracked.record.ingest(&id, &interaction, &ctx);

        if self.config.test_munition_instance {
            self.check_munition_instance(track, &interaction)?;
        }
        Ok(if self.should_stop() { Flow::Stop } else { Flow::Continue })
    }

    fn is_munition(&self, track: Track, interaction: &ReceivedInteraction) -> Result<bool, Verdict> {
        let class = track.class_name();
        if self.tracked(track).definition.field(ENTITY_TYPE_FIELD).is_none() {
            return Ok(true);
        }
        let decoded = interaction
            .field(ENTITY_TYPE_FIELD)
            .ok_or_else(|| "field absent".to_string())
            .and_then(|bytes| EntityType::decode(bytes).map_err(|e| e.to_string()));
        match decoded {
            Ok(entity) if entity.is_munition() => Ok(true),
            Ok(entity) => {
                info!(class, entity = %entity, "not a munition entity, ignored");
                Ok(false)
            }
            Err(reason) if self.policy.is_optional(class, ENTITY_TYPE_FIELD) => {
                warn!(class, reason = %reason, "entity type unknown, message accepted");
                Ok(true)
            }
            Err(reason) => Err(Verdict::Failed(format!(
                "{} {} could not be decoded: {}",
                class, ENTITY_TYPE_FIELD, reason
            ))),
        }
    }

    fn check_munition_instance(&self, track: Track, interaction: &ReceivedInteraction) -> Result<(), Verdict> {
        let class = track.class_name();
        let name = interaction
            .field(MUNITION_OBJECT_FIELD)
            .ok_or_else(|| "field absent".to_string())
            .and_then(|bytes| {
                decode_ascii_string(&mut ByteReader::new(bytes)).map_err(|e| e.to_string())
            })
            .map(|name| name.trim().to_string())
            .and_then(|name| if name.is_empty() { Err("empty".to_string()) } else { Ok(name) })
            .map_err(|reason| {
                Verdict::Failed(format!("{} {} is unusable: {}", class, MUNITION_OBJECT_FIELD, reason))
            })?;
        let present = self.ambassador.is_object_instance_discovered(&name);
        match (track, present) {
            (Track::Fire, false) => Err(Verdict::Failed(format!(
                "{} names munition {} but no such object instance was discovered",
                class, name
            ))),
            (Track::Detonation, true) => Err(Verdict::Failed(format!(
                "{} names munition {} but the object instance still exists",
                class, name
            ))),
            _ => {
                debug!(class, munition = %name, "munition instance check passed");
                Ok(())
            }
        }
    }

    fn should_stop(&self) -> bool {
        let fire = &self.fire.record;
        let detonation = &self.detonation.record;
        match (self.fire.under_test, self.detonation.under_test) {
            (true, false) => !fire.is_empty(),
            (false, true) => !detonation.is_empty(),
            (true, true) if self.config.test_for_matching_pair => detonation
                .events()
                .any(|id| fire.is_issuing_id_present(&id.issuer)),
            (true, true) => !fire.is_empty() && !detonation.is_empty(),
            (false, false) => false,
        }
    }

    fn check_params(&mut self) -> Result<(), Verdict> {
        let mut problems = Vec::new();
        for tracked in [&self.fire, &self.detonation] {
            for audit in tracked.record.audit() {
                info!(
                    class = %tracked.definition.name,
                    event = %audit.event,
                    decoded = audit.decoded.len(),
                    failed = audit.failed.len(),
                    missing = audit.missing.len(),
                    optional_missing = audit.optional_missing.len(),
                    "event audit"
                );
                if audit.is_erroneous() {
                    let failed: Vec<&str> = audit.failed.keys().map(String::as_str).collect();
                    problems.push(format!(
                        "{} {} failed [{}] missing [{}]",
                        tracked.definition.name,
                        audit.event,
                        failed.join(", "),
                        audit.missing.join(", ")
                    ));
                }
            }
        }
        if problems.is_empty() {
            return Ok(());
        }
        Err(Verdict::Failed(format!(
            "failed or missing parameters were encountered: {}",
            problems.join("; ")
        )))
    }

    fn check_pairing(&mut self) -> Result<(), Verdict> {
        let unmatched: Vec<String> = self
            .detonation
            .record
            .events_and_times()
            .filter(|(id, time)| !self.fire.record.is_prior_event_present(id, *time))
            .map(|(id, _)| id.to_string())
            .collect();
        if unmatched.is_empty() {
            info!("every detonation has a prior matching fire");
            return Ok(());
        }
        Err(Verdict::Failed(format!(
            "no prior matching {} for {} event(s) {}",
            WEAPON_FIRE,
            MUNITION_DETONATION,
            unmatched.join(", ")
        )))
    }

    fn wait_sut_resign(&mut self) -> Result<(), Verdict> {
        let name = self.params.sut_federate_name.clone();
        let timeout = self.params.resign_timeout();
        let started = Instant::now();
        loop {
            if !self.federation.is_federate_joined(&name).map_err(environment)? {
                info!(federate = %name, "SuT federate resigned");
                return Ok(());
            }
            if timeout.expired(started) {
                return Err(Verdict::Inconclusive(format!(
                    "SuT federate {} failed to resign after {}",
                    name, timeout
                )));
            }
            thread::sleep(self.poll_interval(timeout, started));
        }
    }

    fn audit(&self) -> BTreeMap<String, Vec<crate::ledger::EventAudit>> {
        [&self.fire, &self.detonation]
            .iter()
            .filter(|t| t.under_test)
            .map(|t| (t.definition.name.clone(), t.record.audit()))
            .collect()
    }
}

fn track(resolver: &TypeResolver, class: &str, under_test: bool) -> Result<TrackedClass, EngineError> {
    let definition = resolver
        .locator()
        .find_interaction(class)
        .map_err(|e| EngineError::Setup(format!("{} class definition not found: {}", class, e)))?;
    if under_test {
        resolver
            .decoder_for_field(&definition, EVENT_IDENTIFIER_FIELD)
            .map_err(|e| EngineError::Setup(format!("{}.{} cannot be resolved: {}", class, EVENT_IDENTIFIER_FIELD, e)))?;
    }
    let record = InteractionRecord::new(definition.name.clone(), definition.field_names());
    Ok(TrackedClass {
        definition,
        record,
        under_test,
        received: false,
    })
}

fn federate_attributes() -> Vec<String> {
    [FEDERATE_NAME_ATTRIBUTE, FEDERATE_TYPE_ATTRIBUTE, FOM_MODULES_ATTRIBUTE]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn event_identifier(class: &str, interaction: &ReceivedInteraction) -> Result<EventIdentifier, Verdict> {
    let bytes = interaction.field(EVENT_IDENTIFIER_FIELD).ok_or_else(|| {
        Verdict::Failed(format!("{} received without {}", class, EVENT_IDENTIFIER_FIELD))
    })?;
    EventIdentifier::decode(bytes).map_err(|e| {
        Verdict::Failed(format!("{} {} could not be decoded: {}", class, EVENT_IDENTIFIER_FIELD, e))
    })
}

fn decode_text(object: &DiscoveredObject, attribute: &str) -> Result<String, Verdict> {
    let bytes = object.attribute(attribute).unwrap_or_default();
    unicode_string(bytes).map_err(|e| Verdict::Inconclusive(format!("cannot decode {}: {}", attribute, e)))
}

fn environment(error: FederationError) -> Verdict {
    Verdict::Inconclusive(error.to_string())
}

fn outcome(stage: Stage, status: StageStatus, clock: Instant) -> StageOutcome {
    StageOutcome {
        stage,
        status,
        elapsed_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}
