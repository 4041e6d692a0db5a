//! Clinical safety engine.
//!
//! Safety checks run on the validated record, independently of the model. They never block a
//! response; they produce advisory warnings and edit the diet plan before it is returned.
//!
//! Rules live in [`SAFETY_RULES`] and are evaluated top to bottom. Warning order is the table
//! order and is never re-sorted.

pub mod sanitize;

pub use sanitize::sanitize_diet_plan;

use crate::constants::FASTING_GLUCOSE_DIABETIC_MG_DL;
use crate::patient::PatientRecord;

/// One clinical rule: when `applies` holds, every entry of `warnings` is emitted in order.
#[derive(Clone, Copy, Debug)]
pub struct SafetyRule {
    pub name: &'static str,
    pub applies: fn(&PatientRecord) -> bool,
    pub warnings: &'static [&'static str],
}

pub const SAFETY_RULES: &[SafetyRule] = &[
    SafetyRule {
        name: "diabetes",
        applies: |r| {
            r.has_diabetes
                || r
                    .fasting_blood_sugar_mg_dl
                    .is_some_and(|glucose| glucose >= FASTING_GLUCOSE_DIABETIC_MG_DL)
        },
        warnings: &[
            "Patient has diabetes or elevated blood sugar - low GI foods recommended",
            "low GI recommended",
        ],
    },
    SafetyRule {
        name: "celiac",
        applies: |r| r.has_celiac || r.gluten_free,
        warnings: &["Gluten-free diet required - verify no gluten in suggested meals"],
    },
    SafetyRule {
        name: "ckd",
        applies: |r| r.has_ckd,
        warnings: &[
            "Chronic kidney disease detected - restrict potassium/phosphorus foods and verify renal diet with clinician",
        ],
    },
    SafetyRule {
        name: "acid_reflux",
        applies: |r| r.has_acidity_reflux,
        warnings: &["Acidity/reflux condition - avoid spicy/acidic meals, include reflux-safe alternatives"],
    },
    // Already on a low sodium diet: nothing to advise.
    SafetyRule {
        name: "hypertension",
        applies: |r| r.has_hypertension && !r.low_sodium,
        warnings: &["Hypertension detected - low sodium diet recommended"],
    },
    SafetyRule {
        name: "obesity",
        applies: |r| r.has_obesity,
        warnings: &["Obesity condition - calorie-controlled diet recommended"],
    },
    SafetyRule {
        name: "thyroid",
        applies: |r| r.has_thyroid,
        warnings: &["Thyroid condition - verify iodine intake with clinician"],
    },
    SafetyRule {
        name: "pcos",
        applies: |r| r.has_pcod_pcos,
        warnings: &["PCOS/PCOD condition - consider low glycemic index and anti-inflammatory foods"],
    },
    SafetyRule {
        name: "fatty_liver",
        applies: |r| r.has_nafld,
        warnings: &["NAFLD condition - avoid high fructose and processed foods"],
    },
    SafetyRule {
        name: "ibs_ibd",
        applies: |r| r.has_ibs_ibd,
        warnings: &["IBS/IBD condition - consider low FODMAP options and verify with gastroenterologist"],
    },
    SafetyRule {
        name: "dyslipidemia",
        applies: |r| r.has_dyslipidemia,
        warnings: &["Dyslipidemia condition - heart-healthy diet with controlled saturated fats recommended"],
    },
];

/// Evaluates every rule of [`SAFETY_RULES`] against the record.
pub fn check_safety(record: &PatientRecord) -> Vec<String> {
    let mut warnings = Vec::new();
    for rule in SAFETY_RULES {
        if (rule.applies)(record) {
            tracing::debug!("Safety rule {} fired", rule.name);
            warnings.extend(rule.warnings.iter().map(|w| (*w).to_owned()));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_value;
    use serde_json::json;

    const DIABETES: &str = "Patient has diabetes or elevated blood sugar - low GI foods recommended";
    const LOW_GI: &str = "low GI recommended";

    #[test]
    fn healthy_record_has_no_warnings() {
        assert!(check_safety(&PatientRecord::default()).is_empty());
    }

    #[test]
    fn ckd_warning_is_emitted() {
        let record = PatientRecord {
            has_ckd: true,
            ..Default::default()
        };
        let warnings = check_safety(&record);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Chronic kidney disease detected"));
    }

    #[test]
    fn elevated_glucose_triggers_diabetes_rule() {
        let record = PatientRecord {
            fasting_blood_sugar_mg_dl: Some(130.0),
            ..Default::default()
        };
        assert_eq!(check_safety(&record), vec![DIABETES, LOW_GI]);

        let borderline = PatientRecord {
            fasting_blood_sugar_mg_dl: Some(125.9),
            ..Default::default()
        };
        assert!(check_safety(&borderline).is_empty());
    }

    #[test]
    fn hypertension_is_quiet_on_low_sodium_diet() {
        let mut record = PatientRecord {
            has_hypertension: true,
            ..Default::default()
        };
        assert_eq!(
            check_safety(&record),
            vec!["Hypertension detected - low sodium diet recommended"]
        );

        record.low_sodium = true;
        assert!(check_safety(&record).is_empty());
    }

    #[test]
    fn warnings_follow_rule_order() {
        let record = PatientRecord {
            has_dyslipidemia: true,
            has_celiac: true,
            has_diabetes: true,
            has_thyroid: true,
            ..Default::default()
        };
        let warnings = check_safety(&record);
        assert_eq!(warnings.len(), 5);
        assert_eq!(warnings[0], DIABETES);
        assert_eq!(warnings[1], LOW_GI);
        assert!(warnings[2].starts_with("Gluten-free diet required"));
        assert!(warnings[3].starts_with("Thyroid condition"));
        assert!(warnings[4].starts_with("Dyslipidemia condition"));
    }

    #[test]
    fn gluten_free_preference_alone_triggers_celiac_rule() {
        let record = PatientRecord {
            gluten_free: true,
            ..Default::default()
        };
        assert_eq!(
            check_safety(&record),
            vec!["Gluten-free diet required - verify no gluten in suggested meals"]
        );
    }

    #[test]
    fn diabetic_patient_gets_exactly_the_diabetes_warnings() {
        let record = validate_value(&json!({
            "gender": "male",
            "age": 35,
            "height_cm": 175,
            "weight_kg": 75,
            "daily_calories": 2000,
            "diet_type": "vegetarian",
            "prakriti": "Vata-Pitta",
            "has_diabetes": true,
            "diabetic_friendly": true
        }))
        .expect("valid record");

        assert_eq!(check_safety(&record), vec![DIABETES, LOW_GI]);
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = SAFETY_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SAFETY_RULES.len());
    }
}
