//! Field transformers between auth-framework records and store documents.
//!
//! The two directions are deliberately not inverses:
//! - inbound strips `Id` suffixes and may coerce IDs to numbers
//! - outbound adds `Id` suffixes only for populated relationships and always
//!   renders IDs as strings

use chrono::{DateTime, NaiveDateTime, Utc};
use payload_auth_sdk::{Document, FieldValue, IdType, Record};
use regex::Regex;

use super::naming::FieldNaming;

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static ISO_DATETIME: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("static regex should not panic")
});

/// Write path: auth record → store document.
#[must_use]
pub fn transform_input(data: &Record, naming: &FieldNaming, id_type: IdType) -> Document {
    data.iter()
        .map(|(key, value)| {
            if naming.is_relation_field(key) {
                (
                    naming.store_field(key).to_owned(),
                    coerce_id_value(value, id_type),
                )
            } else if key == "id" {
                (key.clone(), coerce_id_value(value, id_type))
            } else {
                (key.clone(), value.to_json())
            }
        })
        .collect()
}

/// Numeric-ID mode turns numeric-looking strings into numbers; anything that
/// does not parse is passed through untouched.
fn coerce_id_value(value: &FieldValue, id_type: IdType) -> serde_json::Value {
    match (id_type, value) {
        (IdType::Number, FieldValue::String(s)) => parse_number(s)
            .map_or_else(|| serde_json::Value::String(s.clone()), serde_json::Value::Number),
        (IdType::Number, FieldValue::List(items)) => serde_json::Value::Array(
            items.iter().map(|v| coerce_id_value(v, id_type)).collect(),
        ),
        _ => value.to_json(),
    }
}

fn parse_number(raw: &str) -> Option<serde_json::Number> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(i.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

/// Read path: store document → auth record.
#[must_use]
pub fn transform_output(doc: Document) -> Record {
    let mut out = Record::new();
    for (key, value) in doc {
        if key == "id" {
            out.insert(key, id_value(&value));
            continue;
        }
        match value {
            serde_json::Value::Object(nested) if nested.contains_key("id") => {
                let id = nested.get("id").map_or(FieldValue::Null, id_value);
                out.insert(FieldNaming::relation_key(&key), id);
            }
            serde_json::Value::String(s) => {
                let value = parse_iso_datetime(&s).map_or(FieldValue::String(s), FieldValue::DateTime);
                out.insert(key, value);
            }
            other => {
                out.insert(key, FieldValue::from_json(other));
            }
        }
    }
    out
}

/// A stored ID as the auth framework sees it; a missing (`null`) ID stays null.
fn id_value(value: &serde_json::Value) -> FieldValue {
    if value.is_null() {
        FieldValue::Null
    } else {
        FieldValue::String(stringify_id(value))
    }
}

/// Renders a stored ID as the string the auth framework expects.
#[must_use]
pub fn stringify_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_iso_datetime(s: &str) -> Option<DateTime<Utc>> {
    if !ISO_DATETIME.is_match(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(pairs: &[(&str, FieldValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_input_strips_relation_suffix() {
        let naming = FieldNaming::default();
        let data = record(&[
            ("userId", FieldValue::from("9")),
            ("accountId", FieldValue::from("gh-123")),
            ("providerId", FieldValue::from("github")),
            ("token", FieldValue::from("t")),
        ]);
        let out = transform_input(&data, &naming, IdType::Text);
        assert_eq!(
            serde_json::Value::Object(out),
            json!({ "user": "9", "accountId": "gh-123", "providerId": "github", "token": "t" })
        );
    }

    #[test]
    fn test_input_numeric_coercion() {
        let naming = FieldNaming::default();
        let out = transform_input(
            &record(&[("sessionId", FieldValue::from("42"))]),
            &naming,
            IdType::Number,
        );
        assert_eq!(serde_json::Value::Object(out), json!({ "session": 42 }));
    }

    #[test]
    fn test_input_numeric_coercion_fails_soft() {
        let naming = FieldNaming::default();
        let out = transform_input(
            &record(&[("sessionId", FieldValue::from("abc"))]),
            &naming,
            IdType::Number,
        );
        assert_eq!(serde_json::Value::Object(out), json!({ "session": "abc" }));
    }

    #[test]
    fn test_input_text_mode_keeps_strings() {
        let naming = FieldNaming::default();
        let out = transform_input(
            &record(&[("userId", FieldValue::from("42")), ("id", FieldValue::from("7"))]),
            &naming,
            IdType::Text,
        );
        assert_eq!(serde_json::Value::Object(out), json!({ "user": "42", "id": "7" }));
    }

    #[test]
    fn test_input_plain_fields_not_coerced() {
        let naming = FieldNaming::default();
        let out = transform_input(
            &record(&[("name", FieldValue::from("42"))]),
            &naming,
            IdType::Number,
        );
        assert_eq!(serde_json::Value::Object(out), json!({ "name": "42" }));
    }

    #[test]
    fn test_input_dates_become_rfc3339() {
        let naming = FieldNaming::default();
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let out = transform_input(&record(&[("expiresAt", dt.into())]), &naming, IdType::Text);
        assert_eq!(out["expiresAt"], json!("2024-01-15T10:30:00.000Z"));
    }

    #[test]
    fn test_output_flattens_populated_relationship() {
        let out = transform_output(doc(json!({ "user": { "id": 5, "name": "x" } })));
        assert_eq!(out.get("userId"), Some(&FieldValue::from("5")));
        assert!(!out.contains_key("user"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_output_stringifies_top_level_id() {
        let out = transform_output(doc(json!({ "id": 12, "email": "a@b.c" })));
        assert_eq!(out.get("id"), Some(&FieldValue::from("12")));
        assert_eq!(out.get("email"), Some(&FieldValue::from("a@b.c")));
    }

    #[test]
    fn test_output_null_ids_stay_null() {
        let out = transform_output(doc(json!({ "id": null, "user": { "id": null } })));
        assert_eq!(out.get("id"), Some(&FieldValue::Null));
        assert_eq!(out.get("userId"), Some(&FieldValue::Null));
        assert!(!out.contains_key("user"));
    }

    #[test]
    fn test_output_coerces_iso_dates() {
        let out = transform_output(doc(json!({
            "createdAt": "2024-01-15T10:30:00.000Z",
            "naive": "2024-01-15T10:30:00",
            "notADate": "2024-01-15",
        })));
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(out.get("createdAt"), Some(&FieldValue::DateTime(expected)));
        assert_eq!(out.get("naive"), Some(&FieldValue::DateTime(expected)));
        assert_eq!(out.get("notADate"), Some(&FieldValue::from("2024-01-15")));
    }

    #[test]
    fn test_output_keeps_unpopulated_relationship_values() {
        let out = transform_output(doc(json!({ "user": 5, "meta": { "k": "v" } })));
        assert_eq!(out.get("user"), Some(&FieldValue::from(5)));
        assert!(matches!(out.get("meta"), Some(FieldValue::Map(_))));
    }

    #[test]
    fn test_transforms_are_asymmetric() {
        let naming = FieldNaming::default();
        let input = transform_input(
            &record(&[("userId", FieldValue::from("5"))]),
            &naming,
            IdType::Number,
        );
        // Unpopulated relationship comes back under the stripped key.
        let out = transform_output(input);
        assert_eq!(out.get("user"), Some(&FieldValue::from(5)));
        assert!(!out.contains_key("userId"));
    }
}
