//! End-to-end tests for detection, validation, parsing and resolution.
//!
//! Each test drives whole files through the public API the way the language
//! server does.

use std::io::Write;

use dtls_core::schema::detect_version_with_validation;
use dtls_core::{
    detect_version, validate_schema_consistency, Error, ErrorKind, LoadOptions, SchemaVersion,
    TokenFile, TokenSet,
};
use serde_json::json;

const MODERN: &str = r##"{
  "$schema": "https://www.designtokens.org/schemas/2025.10.json",
  "color": {
    "primary": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1.0, 0, 0]}},
    "secondary": {"$type": "color", "$ref": "#/color/primary"}
  }
}"##;

// ============================================================================
// 2025.10
// ============================================================================

#[test]
fn modern_file_detects_parses_and_resolves() {
    assert_eq!(detect_version(MODERN, None).unwrap(), SchemaVersion::V2025_10);

    let file = TokenFile::load("tokens.json", MODERN, &LoadOptions::default()).unwrap();
    let names: Vec<_> = file.tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["color-primary", "color-secondary"]);

    let primary = &file.tokens[0];
    let secondary = &file.tokens[1];
    assert!(secondary.is_resolved);
    assert_eq!(secondary.resolved_value, primary.resolved_value);
    assert_eq!(
        secondary.resolved_value,
        Some(json!({"colorSpace": "srgb", "components": [1.0, 0, 0]}))
    );
}

#[test]
fn modern_root_token_and_extends() {
    let content = r##"{
  "$schema": "https://www.designtokens.org/schemas/2025.10.json",
  "button": {
    "base": {
      "$root": {"$value": "solid"},
      "padding": {"$value": "8px"},
      "radius": {"$value": "4px"}
    },
    "primary": {
      "$extends": "#/button/base",
      "radius": {"$value": "6px"}
    }
  }
}"##;
    let file = TokenFile::load("b.json", content, &LoadOptions::default()).unwrap();
    let mut set = TokenSet::new();
    set.add_file(file.file_path, file.tokens);

    assert_eq!(set.get("button-base").unwrap().display_value(), "solid");
    assert_eq!(set.get("button-primary").unwrap().display_value(), "solid");
    assert_eq!(set.get("button-primary-padding").unwrap().display_value(), "8px");
    assert_eq!(set.get("button-primary-radius").unwrap().display_value(), "6px");
}

#[test]
fn modern_rejects_string_colors() {
    let content = r##"{
  "$schema": "https://www.designtokens.org/schemas/2025.10.json",
  "color": {"a": {"$type": "color", "$value": "#ff0000"}}
}"##;
    let err = TokenFile::load("c.json", content, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidColorFormat);
    assert!(err.suggestion().is_some());
}

#[test]
fn modern_root_and_marker_conflict() {
    let content = r#"{
  "$schema": "https://www.designtokens.org/schemas/2025.10.json",
  "color": {"primary": {"$root": {"$value": 1}, "_": {"$value": 2}}}
}"#;
    let err = TokenFile::load("r.json", content, &LoadOptions::default()).unwrap_err();
    assert_eq!(
        err,
        Error::conflicting_roots("r.json", "color.primary", "$root", "_")
    );
}

// ============================================================================
// Draft
// ============================================================================

#[test]
fn draft_group_marker_scenario() {
    let content = r##"{"color": {"primary": {
        "_": {"$value": "#ff0000", "$type": "color"},
        "hover": {"$value": "#cc0000"}
    }}}"##;
    let options = LoadOptions {
        group_markers: vec!["_".into()],
        ..Default::default()
    };
    let file = TokenFile::load("d.json", content, &options).unwrap();
    assert_eq!(file.schema_version, SchemaVersion::Draft);

    let tokens: Vec<_> = file
        .tokens
        .iter()
        .map(|t| (t.name.as_str(), t.path.join("."), t.display_value()))
        .collect();
    assert_eq!(
        tokens,
        [
            ("color-primary", "color.primary".to_string(), "#ff0000".to_string()),
            ("color-primary-hover", "color.primary.hover".to_string(), "#cc0000".to_string()),
        ]
    );
}

#[test]
fn draft_rejects_modern_features_by_name() {
    let content = r##"{
  "$schema": "https://www.designtokens.org/schemas/draft.json",
  "a": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [0, 0, 0]}},
  "b": {"$ref": "#/a"},
  "g": {"$extends": "#/a"}
}"##;
    let err = validate_schema_consistency(content, SchemaVersion::Draft).unwrap_err();
    match err {
        Error::MixedSchemaFeatures {
            conflicting_features,
            ..
        } => {
            let joined = conflicting_features.join(" | ");
            assert!(joined.contains("$ref"), "{joined}");
            assert!(joined.contains("$extends"), "{joined}");
        }
        other => panic!("expected mixed features, got {other:?}"),
    }
}

#[test]
fn draft_cycle_reports_the_chain() {
    let content = r#"{"color": {
        "a": {"$value": "{color.b}"},
        "b": {"$value": "{color.c}"},
        "c": {"$value": "{color.a}"}
    }}"#;
    let err = TokenFile::load("cycle.json", content, &LoadOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r"
    circular reference detected in cycle.json: color.a → color.b → color.c → color.a
    Suggestion: Break the circular dependency chain
    ");
}

#[test]
fn draft_unresolved_reference() {
    let content = r#"{"a": {"$value": "{nope}"}}"#;
    let err = TokenFile::load("u.json", content, &LoadOptions::default()).unwrap_err();
    assert_eq!(err, Error::unresolved("u.json", "a", "{nope}"));
}

// ============================================================================
// Detection edge cases
// ============================================================================

#[test]
fn detection_with_validation_reports_both() {
    let content = r##"{
  "$schema": "https://www.designtokens.org/schemas/draft.json",
  "b": {"$ref": "#/a"}
}"##;
    let (version, result) = detect_version_with_validation("v.json", content, None);
    assert_eq!(version, SchemaVersion::Draft);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::MixedSchemaFeatures);

    let (version, result) = detect_version_with_validation("v.json", "not json", None);
    assert_eq!(version, SchemaVersion::Unknown);
    assert_eq!(result.unwrap_err().file_path(), "v.json");
}

#[test]
fn same_tokens_in_both_conventions() {
    let modern = r#"{"$schema": "https://www.designtokens.org/schemas/2025.10.json",
        "space": {"$root": {"$value": "4px"}, "lg": {"$value": "8px"}}}"#;
    let legacy = r#"{"space": {"DEFAULT": {"$value": "4px"}, "lg": {"$value": "8px"}}}"#;
    let a = TokenFile::load("a.json", modern, &LoadOptions::default()).unwrap();
    let b = TokenFile::load("b.json", legacy, &LoadOptions::default()).unwrap();
    let names = |f: &TokenFile| f.tokens.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&a), names(&b));
}

// ============================================================================
// Files on disk
// ============================================================================

#[test]
fn yaml_file_from_disk() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        "color:\n  base:\n    $type: color\n    $value: '#336699'\n  link:\n    $type: color\n    $value: '{{color.base}}'\n"
    )
    .unwrap();

    let loaded = TokenFile::from_path(file.path(), &LoadOptions::default()).unwrap();
    assert_eq!(loaded.schema_version, SchemaVersion::Draft);
    let link = loaded.tokens.iter().find(|t| t.name == "color-link").unwrap();
    assert_eq!(link.display_value(), "#336699");
    assert_eq!((link.line, link.character), (4, 2));
}

#[test]
fn bad_file_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    std::fs::write(&good, r#"{"a": {"$value": 1}}"#).unwrap();
    std::fs::write(&bad, r#"{"a": "#).unwrap();

    let mut set = TokenSet::new();
    let mut errors = Vec::new();
    for path in [&bad, &good] {
        match TokenFile::from_path(path, &LoadOptions::default()) {
            Ok(file) => set.add_file(file.file_path, file.tokens),
            Err(err) => errors.push(err),
        }
    }
    assert_eq!(set.len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Syntax);
}
