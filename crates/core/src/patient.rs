//! The validated patient record.
//!
//! `PatientRecord` is the typed form of the closed input schema. It is only ever produced by
//! [`crate::validation::validate`], which enforces the whitelist, required fields and
//! contradiction rules before handing out an instance. Serializing a record yields the
//! sanitized input echo returned to callers.

use crate::fields::{CategoricalField, ConditionFlag, NumericField, PreferenceFlag};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A patient record that passed schema validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    // Basic info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_region: Option<String>,

    // Diet and nutrition
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub meal_frequency_per_day: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub water_intake_liters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snacking_habit: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub outside_food_freq_per_week: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_intake_level: Option<String>,

    // Constitutional type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prakriti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vata_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitta_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kapha_state: Option<String>,

    // Digestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowel_pattern: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bowel_movements_per_day: Option<f64>,

    // Sleep and stress
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,

    // Lifestyle
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub physical_activity_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapeutic_goal: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub daily_calories: Option<f64>,

    // Medical conditions
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_diabetes: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_hypertension: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_obesity: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_dyslipidemia: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_acidity_reflux: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_ckd: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_celiac: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_ibs_ibd: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_nafld: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_thyroid: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_pcod_pcos: bool,

    // Lab reports
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub fasting_blood_sugar_mg_dl: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub systolic_bp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub diastolic_bp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub waist_circumference_cm: Option<f64>,

    // Dietary preferences
    #[serde(default, deserialize_with = "null_as_false")]
    pub vegetarian: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub vegan: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub gluten_free: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub nut_free: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub diabetic_friendly: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub dairy_free: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub low_sodium: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub ketogenic: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub exclude_ingredients: Vec<String>,
}

impl PatientRecord {
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        let value = match field {
            CategoricalField::DietType => &self.diet_type,
            CategoricalField::PatientRegion => &self.patient_region,
            CategoricalField::Prakriti => &self.prakriti,
            CategoricalField::ActivityLevel => &self.activity_level,
            CategoricalField::Season => &self.season,
            CategoricalField::Gender => &self.gender,
            CategoricalField::BowelPattern => &self.bowel_pattern,
            CategoricalField::StressLevel => &self.stress_level,
            CategoricalField::SnackingHabit => &self.snacking_habit,
            CategoricalField::SugarIntakeLevel => &self.sugar_intake_level,
            CategoricalField::TherapeuticGoal => &self.therapeutic_goal,
            CategoricalField::PatientContinent => &self.patient_continent,
            CategoricalField::PatientCountry => &self.patient_country,
        };
        value.as_deref()
    }

    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Age => self.age,
            NumericField::HeightCm => self.height_cm,
            NumericField::WeightKg => self.weight_kg,
            NumericField::Bmi => self.bmi,
            NumericField::MealFrequencyPerDay => self.meal_frequency_per_day,
            NumericField::WaterIntakeLiters => self.water_intake_liters,
            NumericField::BowelMovementsPerDay => self.bowel_movements_per_day,
            NumericField::SleepHours => self.sleep_hours,
            NumericField::PhysicalActivityMinutes => self.physical_activity_minutes,
            NumericField::OutsideFoodFreqPerWeek => self.outside_food_freq_per_week,
            NumericField::DailyCalories => self.daily_calories,
            NumericField::FastingBloodSugarMgDl => self.fasting_blood_sugar_mg_dl,
            NumericField::SystolicBp => self.systolic_bp,
            NumericField::DiastolicBp => self.diastolic_bp,
            NumericField::WaistCircumferenceCm => self.waist_circumference_cm,
        }
    }

    pub fn condition(&self, flag: ConditionFlag) -> bool {
        match flag {
            ConditionFlag::Diabetes => self.has_diabetes,
            ConditionFlag::Hypertension => self.has_hypertension,
            ConditionFlag::Obesity => self.has_obesity,
            ConditionFlag::Dyslipidemia => self.has_dyslipidemia,
            ConditionFlag::AcidityReflux => self.has_acidity_reflux,
            ConditionFlag::Ckd => self.has_ckd,
            ConditionFlag::Celiac => self.has_celiac,
            ConditionFlag::IbsIbd => self.has_ibs_ibd,
            ConditionFlag::Nafld => self.has_nafld,
            ConditionFlag::Thyroid => self.has_thyroid,
            ConditionFlag::PcodPcos => self.has_pcod_pcos,
        }
    }

    pub fn preference(&self, flag: PreferenceFlag) -> bool {
        match flag {
            PreferenceFlag::Vegetarian => self.vegetarian,
            PreferenceFlag::Vegan => self.vegan,
            PreferenceFlag::GlutenFree => self.gluten_free,
            PreferenceFlag::NutFree => self.nut_free,
            PreferenceFlag::DiabeticFriendly => self.diabetic_friendly,
            PreferenceFlag::DairyFree => self.dairy_free,
            PreferenceFlag::LowSodium => self.low_sodium,
            PreferenceFlag::Ketogenic => self.ketogenic,
        }
    }

    /// Mutable handles to every free-text field, used for normalization.
    pub(crate) fn text_fields_mut(&mut self) -> [(&'static str, &mut Option<String>); 16] {
        [
            ("gender", &mut self.gender),
            ("patient_continent", &mut self.patient_continent),
            ("patient_country", &mut self.patient_country),
            ("patient_region", &mut self.patient_region),
            ("diet_type", &mut self.diet_type),
            ("snacking_habit", &mut self.snacking_habit),
            ("sugar_intake_level", &mut self.sugar_intake_level),
            ("prakriti", &mut self.prakriti),
            ("vata_state", &mut self.vata_state),
            ("pitta_state", &mut self.pitta_state),
            ("kapha_state", &mut self.kapha_state),
            ("bowel_pattern", &mut self.bowel_pattern),
            ("stress_level", &mut self.stress_level),
            ("activity_level", &mut self.activity_level),
            ("season", &mut self.season),
            ("therapeutic_goal", &mut self.therapeutic_goal),
        ]
    }
}

/// Accepts a JSON number or a numeric string. `null` and blank strings are absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) if n.is_finite() => Ok(Some(n)),
        Some(NumberOrText::Number(_)) => Err(serde::de::Error::custom("number must be finite")),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(serde::de::Error::custom(format!(
                    "expected a number, got \"{text}\""
                ))),
            }
        }
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_are_accepted() {
        let record: PatientRecord =
            serde_json::from_value(json!({ "meal_frequency_per_day": "3", "age": 35 }))
                .expect("decode record");
        assert_eq!(record.meal_frequency_per_day, Some(3.0));
        assert_eq!(record.numeric(NumericField::Age), Some(35.0));
    }

    #[test]
    fn null_flags_default_to_false() {
        let record: PatientRecord =
            serde_json::from_value(json!({ "has_ckd": null, "exclude_ingredients": null }))
                .expect("decode record");
        assert!(!record.condition(ConditionFlag::Ckd));
        assert!(record.exclude_ingredients.is_empty());
    }

    #[test]
    fn echo_omits_absent_optionals() {
        let record = PatientRecord {
            gender: Some("female".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).expect("serialize record");
        let object = value.as_object().expect("object");
        assert_eq!(object["gender"], json!("female"));
        assert!(!object.contains_key("age"));
        assert_eq!(object["has_diabetes"], json!(false));
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let err = serde_json::from_value::<PatientRecord>(json!({ "age": "thirty" }))
            .expect_err("should reject text age");
        assert!(err.to_string().contains("thirty"));
    }
}
