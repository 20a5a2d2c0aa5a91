//! Resolution tests against small FOM modules.

use std::fs;
use tempfile::TempDir;
use volley_schema::codec::encode_object_id;
use volley_schema::{
    ClassKind, DecoderNode, PrimitiveKind, ResolveError, SchemaSource, TypeResolver, Value,
    XmlSchemaSource,
};

const BASE_FOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<objectModel xmlns="http://standards.ieee.org/IEEE1516-2010">
  <objects>
    <objectClass>
      <name>HLAobjectRoot</name>
      <objectClass>
        <name>BaseEntity</name>
        <objectClass>
          <name>PhysicalEntity</name>
          <objectClass>
            <name>Munition</name>
          </objectClass>
        </objectClass>
      </objectClass>
    </objectClass>
  </objects>
  <interactions>
    <interactionClass>
      <name>HLAinteractionRoot</name>
      <interactionClass>
        <name>WeaponFire</name>
      </interactionClass>
    </interactionClass>
  </interactions>
  <dataTypes>
    <simpleDataTypes>
      <simpleData>
        <name>EventCount</name>
        <representation>RPRunsignedInteger16BE</representation>
      </simpleData>
      <simpleData>
        <name>VelocityMeterPerSecondFloat32</name>
        <representation>HLAfloat32BE</representation>
      </simpleData>
      <simpleData>
        <name>LoopA</name>
        <representation>LoopB</representation>
      </simpleData>
      <simpleData>
        <name>LoopB</name>
        <representation>LoopA</representation>
      </simpleData>
    </simpleDataTypes>
    <enumeratedDataTypes>
      <enumeratedData>
        <name>EntityKindEnum8</name>
        <representation>HLAoctet</representation>
        <enumerator><name>Munition</name><value>2</value></enumerator>
      </enumeratedData>
    </enumeratedDataTypes>
    <arrayDataTypes>
      <arrayData>
        <name>RTIobjectIdArray</name>
        <dataType>RTIobjectId</dataType>
        <cardinality>Dynamic</cardinality>
        <encoding>HLAvariableArray</encoding>
      </arrayData>
      <arrayData>
        <name>BrokenArray</name>
        <dataType>NoSuchElement</dataType>
        <cardinality>Dynamic</cardinality>
        <encoding>HLAvariableArray</encoding>
      </arrayData>
    </arrayDataTypes>
    <fixedRecordDataTypes>
      <fixedRecordData>
        <name>EventIdentifierStruct</name>
        <encoding>HLAfixedRecord</encoding>
        <field><name>EventCount</name><dataType>EventCount</dataType></field>
        <field><name>IssuingObjectIdentifier</name><dataType>RTIobjectId</dataType></field>
      </fixedRecordData>
      <fixedRecordData>
        <name>VelocityVectorStruct</name>
        <encoding>HLAfixedRecord</encoding>
        <field><name>XVelocity</name><dataType>VelocityMeterPerSecondFloat32</dataType></field>
        <field><name>YVelocity</name><dataType>VelocityMeterPerSecondFloat32</dataType></field>
        <field><name>ZVelocity</name><dataType>VelocityMeterPerSecondFloat32</dataType></field>
      </fixedRecordData>
      <fixedRecordData>
        <name>PackedStruct</name>
        <encoding>HLApackedRecord</encoding>
        <field><name>A</name><dataType>HLAoctet</dataType></field>
      </fixedRecordData>
      <fixedRecordData>
        <name>HalfKnownStruct</name>
        <encoding>HLAfixedRecord</encoding>
        <field><name>A</name><dataType>HLAoctet</dataType></field>
        <field><name>B</name><dataType>Unknowable</dataType></field>
      </fixedRecordData>
    </fixedRecordDataTypes>
    <variantRecordDataTypes>
      <variantRecordData>
        <name>SpatialVariantStruct</name>
        <discriminant>DeadReckoningAlgorithm</discriminant>
        <dataType>DeadReckoningAlgorithmEnum8</dataType>
        <alternative><enumerator>DRM_Other</enumerator><name>Other</name><dataType>NA</dataType></alternative>
        <alternative><enumerator>DRM_FPW</enumerator><name>Static</name><dataType>EventIdentifierStruct</dataType></alternative>
        <alternative><enumerator>DRM_RPW</enumerator><name>Velocity</name><dataType>VelocityVectorStruct</dataType></alternative>
        <encoding>HLAvariantRecord</encoding>
      </variantRecordData>
    </variantRecordDataTypes>
  </dataTypes>
</objectModel>
"#;

const WARFARE_FOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<objectModel xmlns="http://standards.ieee.org/IEEE1516-2010">
  <objects>
    <objectClass>
      <name>HLAobjectRoot</name>
      <objectClass>
        <name>BaseEntity</name>
        <objectClass>
          <name>PhysicalEntity</name>
          <objectClass>
            <name>Munition</name>
            <sharing>PublishSubscribe</sharing>
            <attribute><name>LauncherFlashPresent</name><dataType>HLAoctet</dataType></attribute>
          </objectClass>
        </objectClass>
      </objectClass>
    </objectClass>
  </objects>
  <interactions>
    <interactionClass>
      <name>HLAinteractionRoot</name>
      <interactionClass>
        <name>WeaponFire</name>
        <sharing>PublishSubscribe</sharing>
        <parameter><name>EventIdentifier</name><dataType>EventIdentifierStruct</dataType></parameter>
        <parameter><name>FinalVelocityVector</name><dataType>VelocityVectorStruct</dataType></parameter>
        <parameter><name>FiringObjectIdentifier</name><dataType>RTIobjectId</dataType></parameter>
        <parameter><name>Confused</name><dataType>HLAoctet</dataType><dataType>HLAfloat32BE</dataType></parameter>
      </interactionClass>
    </interactionClass>
  </interactions>
  <dataTypes>
    <simpleDataTypes>
      <simpleData>
        <name>EventCount</name>
        <representation>HLAoctet</representation>
      </simpleData>
    </simpleDataTypes>
  </dataTypes>
</objectModel>
"#;

fn load_resolver() -> (TempDir, TypeResolver) {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("RPR-Base.xml");
    let warfare = temp_dir.path().join("RPR-Warfare.xml");
    fs::write(&base, BASE_FOM).unwrap();
    fs::write(&warfare, WARFARE_FOM).unwrap();

    let base = base.to_string_lossy().to_string();
    let warfare = warfare.to_string_lossy().to_string();
    let documents = XmlSchemaSource.load(&[&base, &warfare]).unwrap();
    (temp_dir, TypeResolver::new(documents))
}

#[test]
fn test_fixed_record_has_field_per_declaration_in_order() {
    let (_dir, resolver) = load_resolver();
    let node = resolver.resolve("VelocityVectorStruct").unwrap();
    match node {
        DecoderNode::FixedRecord { fields, .. } => {
            assert_eq!(fields.len(), 3);
            for field in fields {
                assert_eq!(field.type_name(), "VelocityMeterPerSecondFloat32");
            }
        }
        other => panic!("expected fixed record, got {:?}", other),
    }
}

#[test]
fn test_variant_discriminants_are_positional() {
    let (_dir, resolver) = load_resolver();
    let node = resolver.resolve("SpatialVariantStruct").unwrap();
    match node {
        DecoderNode::VariantRecord { alternatives, .. } => {
            let discriminants: Vec<u8> = alternatives.iter().map(|(d, _)| *d).collect();
            assert_eq!(discriminants, vec![0, 1, 2]);
            assert_eq!(alternatives[1].1.type_name(), "EventIdentifierStruct");
            assert_eq!(alternatives[2].1.type_name(), "VelocityVectorStruct");
        }
        other => panic!("expected variant record, got {:?}", other),
    }
}

#[test]
fn test_resolution_ignores_case() {
    let (_dir, resolver) = load_resolver();
    let upper = resolver.resolve("EVENTIDENTIFIERSTRUCT").unwrap();
    let exact = resolver.resolve("EventIdentifierStruct").unwrap();
    assert_eq!(upper, exact);
}

#[test]
fn test_first_document_wins_for_duplicate_declarations() {
    let (_dir, resolver) = load_resolver();
    let node = resolver.resolve("EventCount").unwrap();
    assert_eq!(
        node,
        DecoderNode::Alias {
            name: "EventCount".into(),
            inner: Box::new(DecoderNode::Primitive {
                kind: PrimitiveKind::UnsignedInteger16BE
            }),
        }
    );
}

#[test]
fn test_array_with_unknown_element_is_not_found() {
    let (_dir, resolver) = load_resolver();
    assert!(matches!(
        resolver.resolve("BrokenArray"),
        Err(ResolveError::NotFound { name }) if name == "NoSuchElement"
    ));
}

#[test]
fn test_array_resolves_element_shape() {
    let (_dir, resolver) = load_resolver();
    let node = resolver.resolve("RTIobjectIdArray").unwrap();
    let mut bytes = 2i32.to_be_bytes().to_vec();
    bytes.extend(encode_object_id("A"));
    bytes.extend([0, 0, 0]);
    bytes.extend(encode_object_id("BC"));
    let value = node.decode(&bytes).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::ObjectId("A".into()), Value::ObjectId("BC".into())])
    );
}

#[test]
fn test_unknown_encoding_fails_record() {
    let (_dir, resolver) = load_resolver();
    assert!(matches!(
        resolver.resolve("PackedStruct"),
        Err(ResolveError::UnknownEncoding { encoding, .. }) if encoding == "HLApackedRecord"
    ));
}

#[test]
fn test_record_with_unresolvable_field_fails() {
    let (_dir, resolver) = load_resolver();
    assert!(resolver.resolve("HalfKnownStruct").is_err());
}

#[test]
fn test_cyclic_declarations_are_reported() {
    let (_dir, resolver) = load_resolver();
    match resolver.resolve("LoopA") {
        Err(ResolveError::Cyclic { chain }) => {
            assert_eq!(chain, vec!["LoopA", "LoopB", "LoopA"]);
        }
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn test_unknown_name_is_not_found() {
    let (_dir, resolver) = load_resolver();
    assert!(matches!(
        resolver.resolve("HLAinteger64BE"),
        Err(ResolveError::NotFound { .. })
    ));
}

#[test]
fn test_defining_declaration_found_past_parentage_reference() {
    let (_dir, resolver) = load_resolver();
    let class = resolver.locator().find_interaction("WeaponFire").unwrap();
    assert!(class.source_uri.ends_with("RPR-Warfare.xml"));
    assert_eq!(
        class.field_names(),
        vec!["EventIdentifier", "FinalVelocityVector", "FiringObjectIdentifier", "Confused"]
    );

    let munition = resolver
        .locator()
        .find_object("BaseEntity.PhysicalEntity.Munition")
        .unwrap();
    assert_eq!(munition.field_names(), vec!["LauncherFlashPresent"]);
}

#[test]
fn test_parameter_decoder_decodes_event_identifier() {
    let (_dir, resolver) = load_resolver();
    let decoder = resolver
        .field_decoder(ClassKind::Interaction, "weaponfire", "eventidentifier")
        .unwrap();
    let mut bytes = vec![0, 9, 0, 0];
    bytes.extend(encode_object_id("Tank"));
    assert_eq!(decoder.decode(&bytes).unwrap().to_string(), "{9, \"Tank\"}");
}

#[test]
fn test_field_with_two_types_is_ambiguous() {
    let (_dir, resolver) = load_resolver();
    assert!(matches!(
        resolver.parameter_decoder("WeaponFire", "Confused"),
        Err(ResolveError::Ambiguous { count: 2, .. })
    ));
}

#[test]
fn test_missing_document_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.xml");
    let missing = missing.to_string_lossy().to_string();
    assert!(XmlSchemaSource.load(&[&missing]).is_err());
}

#[test]
fn test_decoder_tree_and_value_serialize_to_json() {
    let (_dir, resolver) = load_resolver();
    let node = resolver.resolve("EventIdentifierStruct").unwrap();

    let tree = serde_json::to_value(&node).unwrap();
    assert_eq!(tree["node"], "fixed_record");
    assert_eq!(tree["name"], "EventIdentifierStruct");
    assert_eq!(tree["fields"][0]["node"], "alias");
    assert_eq!(tree["fields"][0]["name"], "EventCount");

    let mut bytes = vec![0, 9, 0, 0];
    bytes.extend(encode_object_id("Tank"));
    let value = serde_json::to_value(node.decode(&bytes).unwrap()).unwrap();
    assert_eq!(value, serde_json::json!([9, "Tank"]));
}
