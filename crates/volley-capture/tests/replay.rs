//! Verdict engine runs fed by recorded captures.

use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use volley_capture::{
    CaptureReader, CaptureRecord, CaptureWriter, ReadMode, ReplayFederation, Replayer, WriteOptions,
};
use volley_core::{
    EventIdentifier, FederateAmbassador, FieldMap, RunReport, Stage, StageStatus, TestConfig,
    TestParams, Verdict, VerdictEngine,
};
use volley_schema::codec::encode_object_id;
use volley_schema::{SchemaSource, TypeResolver, XmlSchemaSource};

const FOM: &str = include_str!("../../../fixtures/warfare-fom.xml");

fn params(dir: &Path) -> TestParams {
    fs::write(dir.join("warfare-fom.xml"), FOM).unwrap();
    TestParams::from_json(
        &json!({
            "sutFederateName": "SuT",
            "sutFederateType": "Shooter",
            "sutFederateJoinTimeout": 1.0,
            "sutFederateResignTimeout": 1.0,
            "testTimeout": 1.0,
            "sleepTime": 0.005,
            "urls": ["warfare-fom.xml"]
        })
        .to_string(),
        Some(dir),
    )
    .unwrap()
}

fn config() -> TestConfig {
    TestConfig::from_json(
        &json!({
            "testSutFederateJoin": true,
            "testSutFederateResign": true,
            "testWeaponFire": true,
            "testMunitionDetonation": true,
            "optionalParams": [
                "FireControlSolutionRange", "FireMissionIndex", "FiringLocation",
                "InitialVelocityVector", "DetonationLocation", "DetonationResultCode",
                "FinalVelocityVector", "TargetObjectIdentifier"
            ],
            "paramDecoders": {"FuseType": "FuseTypeEnum16", "WarheadType": "WarheadTypeEnum16"}
        })
        .to_string(),
    )
    .unwrap()
}

fn event(at_ms: u64, class: &str, issuer: &str, counter: u16) -> CaptureRecord {
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), EventIdentifier::new(issuer, counter).encode());
    fields.insert("FiringObjectIdentifier".into(), encode_object_id(issuer));
    fields.insert("FuseType".into(), 1000i16.to_be_bytes().to_vec());
    fields.insert("MunitionObjectIdentifier".into(), encode_object_id("M-1"));
    fields.insert("MunitionType".into(), vec![2, 2, 0, 225, 2, 1, 0, 0]);
    fields.insert("QuantityFired".into(), 1u16.to_be_bytes().to_vec());
    fields.insert("WarheadType".into(), 1000i16.to_be_bytes().to_vec());
    CaptureRecord::interaction(at_ms, class, fields)
}

fn joined(at_ms: u64) -> CaptureRecord {
    CaptureRecord::FederateJoined {
        at_ms,
        handle: 1,
        federate_name: "SuT".into(),
        federate_type: "Shooter".into(),
        fom_modules: vec!["C:\\foms\\Warfare-FOM.xml".into()],
    }
}

fn resigned(at_ms: u64) -> CaptureRecord {
    CaptureRecord::FederateResigned {
        at_ms,
        federate_name: "SuT".into(),
    }
}

fn replay(records: Vec<CaptureRecord>) -> RunReport {
    replay_at(records, 1.0)
}

/// Writes `records` to a capture file, reads them back and replays them
/// `speed` times faster than recorded.
fn replay_at(records: Vec<CaptureRecord>, speed: f64) -> RunReport {
    let dir = TempDir::new().unwrap();
    let params = params(dir.path());
    let urls = params.url_strings();
    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    let resolver = TypeResolver::new(XmlSchemaSource.load(&urls).unwrap());

    let capture = dir.path().join("run.vlc");
    let mut writer = CaptureWriter::open(&capture, WriteOptions::default()).unwrap();
    for record in &records {
        writer.append(record).unwrap();
    }
    writer.finish().unwrap();
    let records = CaptureReader::open(&capture, ReadMode::Strict)
        .unwrap()
        .read_all()
        .unwrap();

    let (ambassador, queue) = FederateAmbassador::new();
    let federation = Arc::new(ReplayFederation::new(ambassador.clone()));
    let engine = VerdictEngine::new(
        config(),
        params,
        resolver,
        ambassador.clone(),
        queue,
        federation.clone(),
    )
    .unwrap();

    let replay = Replayer::new(records, ambassador, federation)
        .with_speed(speed)
        .unwrap()
        .spawn();
    let report = engine.run();
    replay.join().unwrap();
    report
}

#[test]
fn test_recorded_engagement_passes() {
    let report = replay(vec![
        joined(0),
        event(40, "WeaponFire", "Tank-1", 1),
        event(90, "MunitionDetonation", "Tank-1", 2),
        resigned(150),
    ]);

    assert_eq!(report.verdict, Verdict::Pass);
    assert!(report.stages.iter().all(|s| s.status == StageStatus::Passed));
    assert_eq!(report.audit["WeaponFire"].len(), 1);
    assert_eq!(report.audit["MunitionDetonation"][0].event, EventIdentifier::new("Tank-1", 2));
}

#[test]
fn test_fast_replay_keeps_fire_before_detonation() {
    // One recorded millisecond apart, delivered within the same wall-clock millisecond.
    let report = replay_at(
        vec![
            joined(0),
            event(40_000, "WeaponFire", "Tank-1", 1),
            event(40_001, "MunitionDetonation", "Tank-1", 2),
            resigned(150_000),
        ],
        1000.0,
    );

    assert_eq!(report.verdict, Verdict::Pass);
    let fire = report.audit["WeaponFire"][0].received_at_ms.unwrap();
    let detonation = report.audit["MunitionDetonation"][0].received_at_ms.unwrap();
    assert_eq!(detonation - fire, 1);
}

#[test]
fn test_detonation_without_prior_fire_fails_pairing() {
    let report = replay(vec![
        joined(0),
        event(40, "MunitionDetonation", "Tank-1", 2),
        event(90, "WeaponFire", "Tank-1", 1),
        resigned(150),
    ]);

    assert!(matches!(report.verdict, Verdict::Failed(_)));
    let last = report.stages.last().unwrap();
    assert_eq!(last.stage, Stage::CheckPairing);
}

#[test]
fn test_sut_resigning_mid_test_is_inconclusive() {
    let report = replay(vec![
        joined(0),
        event(40, "WeaponFire", "Tank-1", 1),
        resigned(80),
    ]);

    match &report.verdict {
        Verdict::Inconclusive(reason) => assert!(reason.contains("no longer joined")),
        other => panic!("expected INCONCLUSIVE, got {}", other),
    }
    assert_eq!(report.stages.last().unwrap().stage, Stage::WaitInteractions);
}

#[test]
fn test_sut_that_never_joins_is_inconclusive() {
    let report = replay(vec![event(10, "WeaponFire", "Tank-1", 1)]);

    assert!(matches!(report.verdict, Verdict::Inconclusive(_)));
    assert_eq!(report.stages[0].stage, Stage::WaitSutJoin);
    assert_eq!(report.stages[0].status, StageStatus::Inconclusive);
}
