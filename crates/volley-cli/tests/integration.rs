//! Integration tests for CLI commands.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use volley_capture::{CaptureRecord, CaptureWriter, WriteOptions};
use volley_core::{EventIdentifier, FieldMap};
use volley_schema::codec::encode_object_id;

const FOM: &str = include_str!("../../../fixtures/warfare-fom.xml");

fn run_cli(args: &[&str]) -> (Option<i32>, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_volley"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run volley");
    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("warfare-fom.xml"), FOM).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn arg(&self, name: &str) -> String {
        self.path(name).to_string_lossy().to_string()
    }

    fn write_json(&self, name: &str, value: serde_json::Value) -> String {
        fs::write(self.path(name), value.to_string()).unwrap();
        self.arg(name)
    }

    fn params(&self) -> String {
        self.write_json(
            "params.json",
            json!({
                "sutFederateName": "SuT",
                "sutFederateType": "Shooter",
                "sutFederateJoinTimeout": 2.0,
                "sutFederateResignTimeout": 2.0,
                "testTimeout": 2.0,
                "sleepTime": 0.005,
                "urls": ["warfare-fom.xml"]
            }),
        )
    }

    fn config(&self, extra: serde_json::Value) -> String {
        let mut config = json!({
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
        });
        if let (Some(config), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            config.extend(extra.clone());
        }
        self.write_json("config.json", config)
    }

    fn capture(&self, records: &[CaptureRecord]) -> String {
        let path = self.path("run.vlc");
        let mut writer = CaptureWriter::open(&path, WriteOptions::default()).unwrap();
        for record in records {
            writer.append(record).unwrap();
        }
        writer.finish().unwrap();
        self.arg("run.vlc")
    }
}

fn event(at_ms: u64, class: &str, counter: u16) -> CaptureRecord {
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), EventIdentifier::new("Tank-1", counter).encode());
    fields.insert("FiringObjectIdentifier".into(), encode_object_id("Tank-1"));
    fields.insert("FuseType".into(), 1000i16.to_be_bytes().to_vec());
    fields.insert("MunitionObjectIdentifier".into(), encode_object_id("M-1"));
    fields.insert("MunitionType".into(), vec![2, 2, 0, 225, 2, 1, 0, 0]);
    fields.insert("QuantityFired".into(), 1u16.to_be_bytes().to_vec());
    fields.insert("WarheadType".into(), 1000i16.to_be_bytes().to_vec());
    CaptureRecord::interaction(at_ms, class, fields)
}

fn engagement(fire_at: u64, detonation_at: u64) -> Vec<CaptureRecord> {
    vec![
        CaptureRecord::FederateJoined {
            at_ms: 0,
            handle: 1,
            federate_name: "SuT".into(),
            federate_type: "Shooter".into(),
            fom_modules: vec!["warfare-fom.xml".into()],
        },
        event(fire_at, "WeaponFire", 1),
        event(detonation_at, "MunitionDetonation", 2),
        CaptureRecord::FederateResigned {
            at_ms: 200,
            federate_name: "SuT".into(),
        },
    ]
}

fn fom_arg(ws: &Workspace) -> String {
    ws.arg("warfare-fom.xml")
}

#[test]
fn test_resolve_prints_decoder_tree() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_cli(&["resolve", "EventIdentifierStruct", "--fom", &fom_arg(&ws)]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("EventIdentifierStruct (fixed record, 2 fields)"));
    assert!(stdout.contains("RTIobjectId"));
}

#[test]
fn test_resolve_json_output() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_cli(&["resolve", "entitytypestruct", "--fom", &fom_arg(&ws), "--json"]);
    assert_eq!(code, Some(0));
    let tree: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tree["node"], "fixed_record");
}

#[test]
fn test_resolve_unknown_type_fails() {
    let ws = Workspace::new();
    let (code, _, stderr) = run_cli(&["resolve", "NoSuchType", "--fom", &fom_arg(&ws)]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("Error"));
}

#[test]
fn test_fields_lists_parameters() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_cli(&["fields", "WeaponFire", "--fom", &fom_arg(&ws)]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("FIELD"));
    assert!(stdout.contains("MunitionType"));
    assert!(stdout.contains("EntityTypeStruct"));
    assert!(!stdout.contains("unresolved"));
}

#[test]
fn test_fields_marks_unresolvable_types() {
    let ws = Workspace::new();
    fs::write(
        ws.path("range-fom.xml"),
        r#"<objectModel>
  <interactions>
    <interactionClass>
      <name>WeaponFire</name>
      <sharing>PublishSubscribe</sharing>
      <parameter><name>Range</name><dataType>HLAinteger64BE</dataType></parameter>
    </interactionClass>
  </interactions>
</objectModel>"#,
    )
    .unwrap();
    let (code, stdout, _) = run_cli(&["fields", "WeaponFire", "--fom", &ws.arg("range-fom.xml")]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("unresolved"));
}

#[test]
fn test_fields_of_object_class() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_cli(&["fields", "Munition", "--fom", &fom_arg(&ws), "--object"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("LauncherFlashPresent"));
}

#[test]
fn test_record_then_inspect() {
    let ws = Workspace::new();
    let lines = [
        json!({"record": "federate_joined", "at_ms": 0, "handle": 1, "federate_name": "SuT", "federate_type": "Shooter"}),
        json!({"record": "interaction", "at_ms": 25, "class_name": "WeaponFire",
               "fields": {"QuantityFired": hex::encode(1u16.to_be_bytes())}}),
    ];
    let input: String = lines.iter().map(|l| format!("{}\n\n", l)).collect();
    fs::write(ws.path("records.jsonl"), input).unwrap();
    let capture = ws.arg("recorded.vlc");

    let (code, stdout, _) = run_cli(&["record", &capture, "--from", &ws.arg("records.jsonl")]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Recorded 2 records"));

    let (code, stdout, _) = run_cli(&["inspect", &capture]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("AT_MS"));
    assert!(stdout.contains("federate_joined"));
    assert!(stdout.contains("WeaponFire (1 fields)"));

    let (code, stdout, _) = run_cli(&["inspect", &capture, "--json", "--max-records", "1"]);
    assert_eq!(code, Some(0));
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 1);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["record"], "federate_joined");
}

#[test]
fn test_record_rejects_bad_line_without_touching_capture() {
    let ws = Workspace::new();
    fs::write(ws.path("bad.jsonl"), "{\"record\": \"object_removed\", \"at_ms\": 1, \"handle\": 4}\nnot json\n").unwrap();
    let capture = ws.path("never.vlc");

    let (code, _, stderr) = run_cli(&["record", &capture.to_string_lossy(), "--from", &ws.arg("bad.jsonl")]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("line 2"));
    assert!(!Path::new(&capture).exists());
}

#[test]
fn test_run_passes_recorded_engagement() {
    let ws = Workspace::new();
    let config = ws.config(json!({}));
    let params = ws.params();
    let capture = ws.capture(&engagement(40, 90));

    let (code, stdout, stderr) = run_cli(&[
        "run", "--config", &config, "--params", &params, "--capture", &capture,
    ]);
    assert_eq!(code, Some(0), "stderr: {}", stderr);
    assert!(stdout.contains("check_pairing"));
    assert!(stdout.contains("Tank-1#1"));
    assert!(stdout.contains("VERDICT: PASS"));
}

#[test]
fn test_run_json_report() {
    let ws = Workspace::new();
    let config = ws.config(json!({}));
    let params = ws.params();
    let capture = ws.capture(&engagement(40, 90));

    let (code, stdout, _) = run_cli(&[
        "run", "--config", &config, "--params", &params, "--capture", &capture, "--json",
    ]);
    assert_eq!(code, Some(0));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["verdict"], "PASS");
    assert_eq!(report["audit"]["WeaponFire"][0]["event"]["issuer"], "Tank-1");
}

#[test]
fn test_run_failed_verdict_exit_code() {
    let ws = Workspace::new();
    let config = ws.config(json!({}));
    let params = ws.params();
    let capture = ws.capture(&engagement(90, 40));

    let (code, stdout, _) = run_cli(&[
        "run", "--config", &config, "--params", &params, "--capture", &capture,
    ]);
    assert_eq!(code, Some(2));
    assert!(stdout.contains("VERDICT: FAILED"));
}

#[test]
fn test_run_inconclusive_when_schema_lacks_classes() {
    let ws = Workspace::new();
    fs::write(ws.path("warfare-fom.xml"), "<objectModel/>").unwrap();
    let config = ws.config(json!({}));
    let params = ws.params();
    let capture = ws.capture(&engagement(40, 90));

    let (code, stdout, _) = run_cli(&[
        "run", "--config", &config, "--params", &params, "--capture", &capture,
    ]);
    assert_eq!(code, Some(3));
    assert!(stdout.contains("VERDICT: INCONCLUSIVE"));
}

#[test]
fn test_run_rejects_invalid_configuration() {
    let ws = Workspace::new();
    let config = ws.config(json!({"optionalParams": ["WeaponFire.EventIdentifier"]}));
    let params = ws.params();
    let capture = ws.capture(&engagement(40, 90));

    let (code, _, stderr) = run_cli(&[
        "run", "--config", &config, "--params", &params, "--capture", &capture,
    ]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("EventIdentifier"));
}
