//! Schema loading tests: DSL parsing, the configuration setter surface, and
//! configuration error reporting.

use dccl_codec::{parse, parse_file, ConfigError, FieldKind};
use std::io::Write;

const FULL_SCHEMA: &str = r#"
// vehicle status report, 32 bytes on the wire
message status {
    id: 20;
    size: 32;
    trigger: NAV_STATUS;

    int depth {
        min: 0;
        max: 6000;
        source_var: NAV_DEPTH;
    }
    float speed { min: 0; max: 20.0; precision: 1; }
    enum mode { values: [transit, survey, loiter]; }
    string note { max_length: 4; source_key: note; }
    bool leak {}
    hex checksum { num_bytes: 2; }
}

message ping {
    id: 21;
    size: 8;
    int seq { min: 0; max: 254; array_length: 2; }
}
"#;

#[test]
fn test_parse_full_schema() {
    let messages = parse(FULL_SCHEMA).expect("parse");
    assert_eq!(messages.len(), 2);

    let status = &messages[0];
    assert_eq!(status.name(), "status");
    assert_eq!(status.id(), 20);
    assert_eq!(status.requested_bytes_total(), 32);
    assert_eq!(status.trigger_var(), "NAV_STATUS");
    assert_eq!(status.layout().len(), 6);
    assert!(status.name_present("depth"));
    assert!(status.name_present("_time"));
    assert!(!status.name_present("pitch"));

    let ping = &messages[1];
    assert_eq!(ping.layout()[0].array_length(), 2);
    // 0..=254 plus the absent code fits 8 bits per element
    assert_eq!(ping.layout()[0].calc_total_size(), 16);
}

#[test]
fn test_explicit_source_survives_trigger_default() {
    let messages = parse(FULL_SCHEMA).expect("parse");
    let status = &messages[0];
    // depth configured its own source; speed falls back to the trigger
    assert_eq!(status.layout()[0].source_var(), Some("NAV_DEPTH"));
    assert_eq!(status.layout()[1].source_var(), Some("NAV_STATUS"));
    assert_eq!(status.layout()[3].source_key(), Some("note"));
}

#[test]
fn test_field_kinds_resolved() {
    let messages = parse(FULL_SCHEMA).expect("parse");
    let kinds: Vec<&str> = messages[0]
        .layout()
        .iter()
        .map(|f| f.kind_name())
        .collect();
    assert_eq!(kinds, ["int", "float", "enum", "string", "bool", "hex"]);
    assert!(matches!(
        messages[0].layout()[2].kind(),
        FieldKind::Enum { values } if values.len() == 3
    ));
}

#[test]
fn test_unsupported_setter_reported_with_kind() {
    let schema = r#"
message bad {
    id: 1;
    size: 16;
    bool flag { max: 10; }
}
"#;
    match parse(schema) {
        Err(ConfigError::UnsupportedSetter { field, kind, setter }) => {
            assert_eq!(field, "flag");
            assert_eq!(kind, "bool");
            assert_eq!(setter, "set_max");
        }
        other => panic!("expected UnsupportedSetter, got {:?}", other.map(|m| m.len())),
    }
}

#[test]
fn test_unknown_property_rejected() {
    let schema = r#"
message bad {
    id: 1;
    size: 16;
    int x { min: 0; max: 10; wobble: 3; }
}
"#;
    assert!(matches!(parse(schema), Err(ConfigError::Parse(_))));
}

#[test]
fn test_empty_enum_rejected() {
    let schema = r#"
message bad {
    id: 1;
    size: 16;
    enum mode { values: []; }
}
"#;
    assert!(matches!(
        parse(schema),
        Err(ConfigError::BadFieldConfig { .. })
    ));
}

#[test]
fn test_inverted_bounds_rejected() {
    let schema = r#"
message bad {
    id: 1;
    size: 16;
    int x { min: 10; max: 2; }
}
"#;
    match parse(schema) {
        Err(ConfigError::InvalidBounds { field, .. }) => assert_eq!(field, "x"),
        other => panic!("expected InvalidBounds, got {:?}", other.map(|m| m.len())),
    }
}

#[test]
fn test_malformed_source_rejected() {
    assert!(matches!(
        parse("message broken { id: }"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_parse_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(FULL_SCHEMA.as_bytes()).expect("write");
    let messages = parse_file(file.path()).expect("parse_file");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].name(), "ping");
}

#[test]
fn test_parse_file_missing_path() {
    assert!(matches!(
        parse_file("/nonexistent/schema.dccl"),
        Err(ConfigError::Parse(_))
    ));
}
