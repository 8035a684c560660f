use phrixus_model::validation::{self, FieldError, ValidationErrors};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Built-in validators ──────────────────────────────────────────

#[test]
fn required_rejects_absent_null_and_empty() {
    assert!(validation::required(None).is_some());
    assert!(validation::required(Some(&json!(null))).is_some());
    assert!(validation::required(Some(&json!(""))).is_some());
    assert!(validation::required(Some(&json!([]))).is_some());
    assert!(validation::required(Some(&json!({}))).is_some());
}

#[test]
fn required_accepts_present_values() {
    assert!(validation::required(Some(&json!("x"))).is_none());
    assert!(validation::required(Some(&json!(0))).is_none());
    assert!(validation::required(Some(&json!(false))).is_none());
    assert!(validation::required(Some(&json!([1]))).is_none());
}

#[test]
fn required_error_has_stable_code() {
    let err = validation::required(None).unwrap();
    assert_eq!(err.code, "required");
    assert_eq!(err.message, "is required");
}

#[test]
fn string_ignores_absent_and_rejects_non_strings() {
    assert!(validation::string(None).is_none());
    assert!(validation::string(Some(&json!("sku-1"))).is_none());
    assert_eq!(validation::string(Some(&json!(5))).unwrap().code, "string");
}

#[test]
fn positive_number_bounds() {
    assert!(validation::positive_number(None).is_none());
    assert!(validation::positive_number(Some(&json!(2))).is_none());
    assert!(validation::positive_number(Some(&json!(0.5))).is_none());
    assert!(validation::positive_number(Some(&json!(0))).is_some());
    assert!(validation::positive_number(Some(&json!(-3))).is_some());
    assert!(validation::positive_number(Some(&json!("4"))).is_some());
}

// ── ValidationErrors ─────────────────────────────────────────────

#[test]
fn empty_errors_report_nothing() {
    let errors = ValidationErrors::new();
    assert!(!errors.has_errors());
    assert!(errors.is_empty());
    assert_eq!(errors.len(), 0);
    assert!(errors.get("anything").is_empty());
}

#[test]
fn errors_keep_attribute_and_validator_order() {
    let mut errors = ValidationErrors::new();
    errors.add("username", FieldError::new("required", "is required"));
    errors.add("email", FieldError::new("format", "is malformed"));
    errors.add("username", FieldError::new("length", "is too short"));

    let attrs: Vec<&str> = errors.iter().map(|(name, _)| name).collect();
    assert_eq!(attrs, vec!["username", "email"]);

    let codes: Vec<&str> = errors.get("username").iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["required", "length"]);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.error_count(), 3);
}

#[test]
fn clear_discards_everything() {
    let mut errors = ValidationErrors::new();
    errors.add("a", FieldError::new("required", "is required"));
    errors.clear();
    assert!(!errors.has_errors());
}

#[test]
fn display_joins_attribute_messages() {
    let mut errors = ValidationErrors::new();
    errors.add("username", FieldError::new("required", "is required"));
    errors.add("quantity", FieldError::new("positive_number", "must be positive"));
    assert_eq!(
        errors.to_string(),
        "username is required; quantity must be positive"
    );
}

#[test]
fn serializes_as_attribute_map() {
    let mut errors = ValidationErrors::new();
    errors.add("username", FieldError::new("required", "is required"));
    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(
        json,
        json!({"username": [{"code": "required", "message": "is required"}]})
    );
}
