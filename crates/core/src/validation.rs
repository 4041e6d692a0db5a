//! Input validation for raw patient records.
//!
//! Validation runs in stages: closed-world key check, typed decoding, required-field presence and
//! cross-field contradictions. Each stage reports every violation it finds before failing, so a
//! caller sees the complete list for that stage in one response.

use crate::constants::{ALLOWED_KEYS, REQUIRED_FIELDS};
use crate::error::{ValidationError, ValidationResult};
use crate::patient::PatientRecord;
use serde_json::{Map, Value};

/// Validates a raw input mapping and returns the typed, normalized record.
///
/// # Errors
///
/// - [`ValidationError::UnknownFields`] listing every key outside the whitelist
/// - [`ValidationError::InvalidField`] naming the first field with a value of the wrong type
/// - [`ValidationError::MissingRequiredField`] listing every absent or blank required field
/// - [`ValidationError::ContradictoryInput`] listing every violated implication
pub fn validate(raw: &Map<String, Value>) -> ValidationResult<PatientRecord> {
    reject_unknown_keys(raw)?;

    let mut record = decode(raw)?;
    normalize(&mut record);

    let missing = missing_required_fields(&record);
    if !missing.is_empty() {
        return Err(ValidationError::MissingRequiredField(missing));
    }

    let contradictions = contradictions(&record);
    if !contradictions.is_empty() {
        return Err(ValidationError::ContradictoryInput(contradictions));
    }

    Ok(record)
}

/// Convenience wrapper for callers holding an arbitrary JSON value.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidField`] if `raw` is not a JSON object, otherwise the same
/// errors as [`validate`].
pub fn validate_value(raw: &Value) -> ValidationResult<PatientRecord> {
    match raw.as_object() {
        Some(map) => validate(map),
        None => Err(ValidationError::InvalidField {
            field: "$".into(),
            message: "patient record must be a JSON object".into(),
        }),
    }
}

fn reject_unknown_keys(raw: &Map<String, Value>) -> ValidationResult<()> {
    let mut unknown: Vec<String> = raw
        .keys()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort();
    Err(ValidationError::UnknownFields(unknown))
}

fn decode(raw: &Map<String, Value>) -> ValidationResult<PatientRecord> {
    let value = Value::Object(raw.clone());
    serde_path_to_error::deserialize(value).map_err(|err| {
        let field = err.path().to_string();
        ValidationError::InvalidField {
            field,
            message: err.into_inner().to_string(),
        }
    })
}

fn normalize(record: &mut PatientRecord) {
    for (_, slot) in record.text_fields_mut() {
        if let Some(text) = slot.take() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                *slot = Some(trimmed.to_owned());
            }
        }
    }

    record.exclude_ingredients = std::mem::take(&mut record.exclude_ingredients)
        .into_iter()
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect();
}

fn missing_required_fields(record: &PatientRecord) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| !is_present(record, field))
        .map(|field| field.to_string())
        .collect()
}

fn is_present(record: &PatientRecord, field: &str) -> bool {
    match field {
        "gender" => record.gender.is_some(),
        "age" => record.age.is_some(),
        "height_cm" => record.height_cm.is_some(),
        "weight_kg" => record.weight_kg.is_some(),
        "daily_calories" => record.daily_calories.is_some(),
        "diet_type" => record.diet_type.is_some(),
        "prakriti" => record.prakriti.is_some(),
        _ => true,
    }
}

fn contradictions(record: &PatientRecord) -> Vec<String> {
    let implications = [
        (
            record.vegan && !record.vegetarian,
            "vegan=true but vegetarian=false",
        ),
        (
            record.has_celiac && !record.gluten_free,
            "has_celiac=true but gluten_free=false",
        ),
        (
            record.has_diabetes && !record.diabetic_friendly,
            "has_diabetes=true but diabetic_friendly=false",
        ),
    ];

    implications
        .into_iter()
        .filter(|(violated, _)| *violated)
        .map(|(_, message)| message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_input() -> Value {
        json!({
            "gender": "male",
            "age": 35,
            "height_cm": 175,
            "weight_kg": 75,
            "daily_calories": 2000,
            "diet_type": "vegetarian",
            "prakriti": "Vata-Pitta"
        })
    }

    fn with(mut input: Value, key: &str, value: Value) -> Value {
        input
            .as_object_mut()
            .expect("object")
            .insert(key.to_string(), value);
        input
    }

    #[test]
    fn accepts_minimal_record_with_defaults() {
        let record = validate_value(&base_input()).expect("valid record");
        assert_eq!(record.prakriti.as_deref(), Some("Vata-Pitta"));
        assert!(!record.has_diabetes);
        assert!(!record.gluten_free);
        assert!(record.exclude_ingredients.is_empty());
        assert_eq!(record.bmi, None);
    }

    #[test]
    fn rejects_every_unknown_key() {
        let input = with(with(base_input(), "shoe_size", json!(9)), "blood_type", json!("A"));
        let err = validate_value(&input).expect_err("unknown keys");
        assert_eq!(
            err,
            ValidationError::UnknownFields(vec!["blood_type".into(), "shoe_size".into()])
        );
    }

    #[test]
    fn names_exactly_the_missing_fields() {
        let mut input = base_input();
        let map = input.as_object_mut().expect("object");
        map.remove("age");
        map.insert("prakriti".into(), json!("   "));
        map.insert("diet_type".into(), Value::Null);

        let err = validate_value(&input).expect_err("missing fields");
        assert_eq!(
            err,
            ValidationError::MissingRequiredField(vec![
                "age".into(),
                "diet_type".into(),
                "prakriti".into()
            ])
        );
        assert_eq!(
            err.to_string(),
            "Missing required fields: age, diet_type, prakriti"
        );
    }

    #[test]
    fn vegan_without_vegetarian_is_contradictory() {
        let input = with(with(base_input(), "vegan", json!(true)), "vegetarian", json!(false));
        let err = validate_value(&input).expect_err("contradiction");
        assert_eq!(
            err,
            ValidationError::ContradictoryInput(vec!["vegan=true but vegetarian=false".into()])
        );
    }

    #[test]
    fn vegan_with_absent_vegetarian_is_contradictory() {
        let input = with(base_input(), "vegan", json!(true));
        let err = validate_value(&input).expect_err("contradiction");
        assert!(matches!(err, ValidationError::ContradictoryInput(_)));
    }

    #[test]
    fn collects_all_contradictions() {
        let input = with(
            with(with(base_input(), "vegan", json!(true)), "has_celiac", json!(true)),
            "has_diabetes",
            json!(true),
        );
        let err = validate_value(&input).expect_err("contradictions");
        assert_eq!(
            err.violations(),
            vec![
                "vegan=true but vegetarian=false".to_string(),
                "has_celiac=true but gluten_free=false".to_string(),
                "has_diabetes=true but diabetic_friendly=false".to_string(),
            ]
        );
    }

    #[test]
    fn wrong_type_names_the_field() {
        let input = with(base_input(), "has_ckd", json!("yes"));
        let err = validate_value(&input).expect_err("bad type");
        match err {
            ValidationError::InvalidField { field, .. } => assert_eq!(field, "has_ckd"),
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn trims_text_and_drops_blank_exclusions() {
        let input = with(
            with(base_input(), "gender", json!("  male ")),
            "exclude_ingredients",
            json!([" Garlic ", "", "   "]),
        );
        let record = validate_value(&input).expect("valid record");
        assert_eq!(record.gender.as_deref(), Some("male"));
        assert_eq!(record.exclude_ingredients, vec!["Garlic".to_string()]);
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = validate_value(&json!([1, 2])).expect_err("array input");
        assert!(matches!(err, ValidationError::InvalidField { .. }));
    }
}
