//! Field vocabulary of the patient record.
//!
//! The enums here pin the names and the registration order of every field the codec and the
//! safety engine look at. The order of each `ALL` array is part of the contract with the trained
//! classifier and must never be derived from data at runtime.

use serde::{Deserialize, Serialize};

/// Categorical fields that receive a label encoder, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    DietType,
    PatientRegion,
    Prakriti,
    ActivityLevel,
    Season,
    Gender,
    BowelPattern,
    StressLevel,
    SnackingHabit,
    SugarIntakeLevel,
    TherapeuticGoal,
    PatientContinent,
    PatientCountry,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 13] = [
        Self::DietType,
        Self::PatientRegion,
        Self::Prakriti,
        Self::ActivityLevel,
        Self::Season,
        Self::Gender,
        Self::BowelPattern,
        Self::StressLevel,
        Self::SnackingHabit,
        Self::SugarIntakeLevel,
        Self::TherapeuticGoal,
        Self::PatientContinent,
        Self::PatientCountry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DietType => "diet_type",
            Self::PatientRegion => "patient_region",
            Self::Prakriti => "prakriti",
            Self::ActivityLevel => "activity_level",
            Self::Season => "season",
            Self::Gender => "gender",
            Self::BowelPattern => "bowel_pattern",
            Self::StressLevel => "stress_level",
            Self::SnackingHabit => "snacking_habit",
            Self::SugarIntakeLevel => "sugar_intake_level",
            Self::TherapeuticGoal => "therapeutic_goal",
            Self::PatientContinent => "patient_continent",
            Self::PatientCountry => "patient_country",
        }
    }
}

/// Numeric fields that receive a z-score scaler, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Age,
    HeightCm,
    WeightKg,
    Bmi,
    MealFrequencyPerDay,
    WaterIntakeLiters,
    BowelMovementsPerDay,
    SleepHours,
    PhysicalActivityMinutes,
    OutsideFoodFreqPerWeek,
    DailyCalories,
    FastingBloodSugarMgDl,
    SystolicBp,
    DiastolicBp,
    WaistCircumferenceCm,
}

impl NumericField {
    pub const ALL: [NumericField; 15] = [
        Self::Age,
        Self::HeightCm,
        Self::WeightKg,
        Self::Bmi,
        Self::MealFrequencyPerDay,
        Self::WaterIntakeLiters,
        Self::BowelMovementsPerDay,
        Self::SleepHours,
        Self::PhysicalActivityMinutes,
        Self::OutsideFoodFreqPerWeek,
        Self::DailyCalories,
        Self::FastingBloodSugarMgDl,
        Self::SystolicBp,
        Self::DiastolicBp,
        Self::WaistCircumferenceCm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::HeightCm => "height_cm",
            Self::WeightKg => "weight_kg",
            Self::Bmi => "bmi",
            Self::MealFrequencyPerDay => "meal_frequency_per_day",
            Self::WaterIntakeLiters => "water_intake_liters",
            Self::BowelMovementsPerDay => "bowel_movements_per_day",
            Self::SleepHours => "sleep_hours",
            Self::PhysicalActivityMinutes => "physical_activity_minutes",
            Self::OutsideFoodFreqPerWeek => "outside_food_freq_per_week",
            Self::DailyCalories => "daily_calories",
            Self::FastingBloodSugarMgDl => "fasting_blood_sugar_mg_dl",
            Self::SystolicBp => "systolic_bp",
            Self::DiastolicBp => "diastolic_bp",
            Self::WaistCircumferenceCm => "waist_circumference_cm",
        }
    }
}

/// Boolean medical-condition flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionFlag {
    Diabetes,
    Hypertension,
    Obesity,
    Dyslipidemia,
    AcidityReflux,
    Ckd,
    Celiac,
    IbsIbd,
    Nafld,
    Thyroid,
    PcodPcos,
}

impl ConditionFlag {
    pub const ALL: [ConditionFlag; 11] = [
        Self::Diabetes,
        Self::Hypertension,
        Self::Obesity,
        Self::Dyslipidemia,
        Self::AcidityReflux,
        Self::Ckd,
        Self::Celiac,
        Self::IbsIbd,
        Self::Nafld,
        Self::Thyroid,
        Self::PcodPcos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diabetes => "has_diabetes",
            Self::Hypertension => "has_hypertension",
            Self::Obesity => "has_obesity",
            Self::Dyslipidemia => "has_dyslipidemia",
            Self::AcidityReflux => "has_acidity_reflux",
            Self::Ckd => "has_ckd",
            Self::Celiac => "has_celiac",
            Self::IbsIbd => "has_ibs_ibd",
            Self::Nafld => "has_nafld",
            Self::Thyroid => "has_thyroid",
            Self::PcodPcos => "has_pcod_pcos",
        }
    }
}

/// Boolean dietary-preference flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreferenceFlag {
    Vegetarian,
    Vegan,
    GlutenFree,
    NutFree,
    DiabeticFriendly,
    DairyFree,
    LowSodium,
    Ketogenic,
}

impl PreferenceFlag {
    pub const ALL: [PreferenceFlag; 8] = [
        Self::Vegetarian,
        Self::Vegan,
        Self::GlutenFree,
        Self::NutFree,
        Self::DiabeticFriendly,
        Self::DairyFree,
        Self::LowSodium,
        Self::Ketogenic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::GlutenFree => "gluten_free",
            Self::NutFree => "nut_free",
            Self::DiabeticFriendly => "diabetic_friendly",
            Self::DairyFree => "dairy_free",
            Self::LowSodium => "low_sodium",
            Self::Ketogenic => "ketogenic",
        }
    }
}

/// One column of the model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    Categorical(CategoricalField),
    Numeric(NumericField),
    Condition(ConditionFlag),
    Preference(PreferenceFlag),
}

impl FeatureColumn {
    pub fn name(self) -> &'static str {
        match self {
            Self::Categorical(f) => f.as_str(),
            Self::Numeric(f) => f.as_str(),
            Self::Condition(f) => f.as_str(),
            Self::Preference(f) => f.as_str(),
        }
    }
}

/// Number of columns in the model input.
pub const FEATURE_COLUMN_COUNT: usize = CategoricalField::ALL.len()
    + NumericField::ALL.len()
    + ConditionFlag::ALL.len()
    + PreferenceFlag::ALL.len();

/// The pinned model input layout: categorical, numeric, condition, then preference columns,
/// each group in its registration order.
pub fn feature_columns() -> Vec<FeatureColumn> {
    let mut columns = Vec::with_capacity(FEATURE_COLUMN_COUNT);
    columns.extend(CategoricalField::ALL.map(FeatureColumn::Categorical));
    columns.extend(NumericField::ALL.map(FeatureColumn::Numeric));
    columns.extend(ConditionFlag::ALL.map(FeatureColumn::Condition));
    columns.extend(PreferenceFlag::ALL.map(FeatureColumn::Preference));
    columns
}

/// Column names of [`feature_columns`], in order.
pub fn feature_column_names() -> Vec<&'static str> {
    feature_columns().into_iter().map(FeatureColumn::name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn feature_layout_is_pinned() {
        let names = feature_column_names();
        assert_eq!(names.len(), 47);
        assert_eq!(names[0], "diet_type");
        assert_eq!(names[12], "patient_country");
        assert_eq!(names[13], "age");
        assert_eq!(names[27], "waist_circumference_cm");
        assert_eq!(names[28], "has_diabetes");
        assert_eq!(names[46], "ketogenic");
    }

    #[test]
    fn column_names_are_unique() {
        let names = feature_column_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn serde_names_match_wire_names() {
        for field in CategoricalField::ALL {
            let json = serde_json::to_string(&field).expect("serialize field");
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
        for field in NumericField::ALL {
            let json = serde_json::to_string(&field).expect("serialize field");
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
