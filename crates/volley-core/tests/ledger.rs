//! Ledger update pass against a resolved schema.

use std::collections::BTreeMap;
use volley_core::{
    DecodeContext, EventIdentifier, FieldDecoderBindings, FieldDecoderRegistry, FieldMap,
    FieldSelector, InteractionRecord, ReceivedInteraction, TestConfig,
};
use volley_schema::{HlaCodec, TypeResolver, XmlSchemaSource};

const FOM: &str = r#"<objectModel>
  <interactions>
    <interactionClass>
      <name>HLAinteractionRoot</name>
      <interactionClass>
        <name>WeaponFire</name>
        <sharing>Publish</sharing>
        <parameter><name>EventIdentifier</name><dataType>EventIdentifierStruct</dataType></parameter>
        <parameter><name>EntityType</name><dataType>EntityTypeStruct</dataType></parameter>
        <parameter><name>Range</name><dataType>RangeCode</dataType></parameter>
      </interactionClass>
    </interactionClass>
  </interactions>
  <dataTypes>
    <simpleDataTypes>
      <simpleData><name>RangeCode</name><representation>HLAinteger64BE</representation></simpleData>
    </simpleDataTypes>
    <fixedRecordDataTypes>
      <fixedRecordData>
        <name>EventIdentifierStruct</name>
        <encoding>HLAfixedRecord</encoding>
        <field><name>EventCount</name><dataType>RPRunsignedInteger16BE</dataType></field>
        <field><name>IssuingObjectIdentifier</name><dataType>RTIobjectId</dataType></field>
      </fixedRecordData>
      <fixedRecordData>
        <name>EntityTypeStruct</name>
        <encoding>HLAfixedRecord</encoding>
        <field><name>EntityKind</name><dataType>HLAoctet</dataType></field>
        <field><name>Domain</name><dataType>HLAoctet</dataType></field>
      </fixedRecordData>
    </fixedRecordDataTypes>
  </dataTypes>
</objectModel>"#;

fn resolver() -> TypeResolver {
    TypeResolver::new(vec![XmlSchemaSource::parse_str("mem.xml", FOM).unwrap()])
}

fn interaction(fields: FieldMap, at_ms: i64) -> ReceivedInteraction {
    ReceivedInteraction {
        class_name: "WeaponFire".into(),
        fields,
        received_at_ms: at_ms,
        sent_time: None,
    }
}

#[test]
fn test_optional_absent_field_is_recorded_separately() {
    let resolver = resolver();
    let class = resolver.locator().find_interaction("WeaponFire").unwrap();
    let config = TestConfig::from_json(r#"{"optionalParams": ["EntityType", "Range"]}"#).unwrap();
    let policy = config.field_policy();
    let bindings = FieldDecoderBindings::default();
    let ctx = DecodeContext {
        resolver: &resolver,
        class: &class,
        policy: &policy,
        bindings: &bindings,
        codec: &HlaCodec,
    };

    let id = EventIdentifier::new("X", 1);
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), id.encode());
    let mut record = InteractionRecord::new("WeaponFire", vec!["EventIdentifier".into(), "EntityType".into()]);
    record.ingest(&id, &interaction(fields, 100), &ctx);

    assert_eq!(record.decoded(&id).unwrap().len(), 1);
    assert_eq!(record.optional_missing(&id), vec!["EntityType"]);
    assert!(record.missing(&id).is_empty());
    assert!(!record.is_erroneous());
    assert_eq!(record.events_and_times().collect::<Vec<_>>(), vec![(&id, 100)]);
}

#[test]
fn test_unresolvable_type_lands_in_failed_set() {
    let resolver = resolver();
    let class = resolver.locator().find_interaction("WeaponFire").unwrap();
    let policy = TestConfig::default().field_policy();
    let bindings = FieldDecoderBindings::default();
    let ctx = DecodeContext {
        resolver: &resolver,
        class: &class,
        policy: &policy,
        bindings: &bindings,
        codec: &HlaCodec,
    };

    let id = EventIdentifier::new("X", 3);
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), id.encode());
    fields.insert("EntityType".into(), vec![2]);
    fields.insert("Range".into(), vec![0; 8]);
    let mut record = InteractionRecord::new("WeaponFire", class.field_names());
    record.ingest(&id, &interaction(fields, 5), &ctx);

    assert_eq!(record.failed(&id), vec!["EntityType", "Range"]);
    assert!(record.is_erroneous());
    let audit = record.audit();
    assert!(audit[0].failed["Range"].contains("no decoder"));
}

fn bind(pairs: &[(&str, &str)]) -> FieldDecoderBindings {
    let pairs: BTreeMap<FieldSelector, String> = pairs
        .iter()
        .map(|(selector, tag)| (FieldSelector::parse(*selector).unwrap(), tag.to_string()))
        .collect();
    FieldDecoderBindings::bind(&FieldDecoderRegistry::builtin(), &pairs).unwrap()
}

#[test]
fn test_bound_decoder_does_not_hide_unresolvable_type() {
    let resolver = resolver();
    let class = resolver.locator().find_interaction("WeaponFire").unwrap();
    let policy = TestConfig::default().field_policy();
    let bindings = bind(&[("WeaponFire.Range", "FuseTypeEnum16")]);
    let ctx = DecodeContext {
        resolver: &resolver,
        class: &class,
        policy: &policy,
        bindings: &bindings,
        codec: &HlaCodec,
    };

    let id = EventIdentifier::new("X", 4);
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), id.encode());
    fields.insert("EntityType".into(), vec![2, 1]);
    fields.insert("Range".into(), 9620i16.to_be_bytes().to_vec());
    let mut record = InteractionRecord::new("WeaponFire", class.field_names());
    record.ingest(&id, &interaction(fields, 5), &ctx);

    assert_eq!(record.failed(&id), vec!["Range"]);
    assert!(record.is_erroneous());
    assert!(record.audit()[0].failed["Range"].contains("HLAinteger64BE"));
}

#[test]
fn test_bound_decoder_replaces_resolved_tree() {
    let resolver = resolver();
    let class = resolver.locator().find_interaction("WeaponFire").unwrap();
    let config = TestConfig::from_json(r#"{"optionalParams": ["Range"]}"#).unwrap();
    let policy = config.field_policy();
    let bindings = bind(&[("EntityType", "EntityTypeStruct")]);
    let ctx = DecodeContext {
        resolver: &resolver,
        class: &class,
        policy: &policy,
        bindings: &bindings,
        codec: &HlaCodec,
    };

    let id = EventIdentifier::new("X", 5);
    let mut fields = FieldMap::new();
    fields.insert("EventIdentifier".into(), id.encode());
    fields.insert("EntityType".into(), vec![2, 1]);
    let mut record = InteractionRecord::new("WeaponFire", class.field_names());
    record.ingest(&id, &interaction(fields, 5), &ctx);

    assert!(!record.is_erroneous());
    assert_eq!(record.audit()[0].decoded["EntityType"], "Munition/AntiAir");
}
