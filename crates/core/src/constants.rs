//! Constants used throughout the diet core crate.
//!
//! Field whitelists, file locations and plan defaults live here so the validator, the codec
//! and the binaries agree on them.

/// Every key a patient record may carry.
pub const ALLOWED_KEYS: [&str; 51] = [
    "gender",
    "age",
    "height_cm",
    "weight_kg",
    "bmi",
    "patient_continent",
    "patient_country",
    "patient_region",
    "meal_frequency_per_day",
    "water_intake_liters",
    "bowel_pattern",
    "bowel_movements_per_day",
    "sleep_hours",
    "stress_level",
    "physical_activity_minutes",
    "diet_type",
    "snacking_habit",
    "outside_food_freq_per_week",
    "sugar_intake_level",
    "prakriti",
    "vata_state",
    "pitta_state",
    "kapha_state",
    "has_diabetes",
    "has_hypertension",
    "has_obesity",
    "has_dyslipidemia",
    "has_acidity_reflux",
    "has_ckd",
    "has_celiac",
    "has_ibs_ibd",
    "has_nafld",
    "has_thyroid",
    "has_pcod_pcos",
    "fasting_blood_sugar_mg_dl",
    "systolic_bp",
    "diastolic_bp",
    "waist_circumference_cm",
    "activity_level",
    "season",
    "therapeutic_goal",
    "daily_calories",
    "vegetarian",
    "vegan",
    "gluten_free",
    "nut_free",
    "diabetic_friendly",
    "dairy_free",
    "low_sodium",
    "ketogenic",
    "exclude_ingredients",
];

/// Minimal fields a record must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "gender",
    "age",
    "height_cm",
    "weight_kg",
    "daily_calories",
    "diet_type",
    "prakriti",
];

/// Label substituted for missing categorical values.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Fasting glucose (mg/dL) at or above which the diabetes rule fires.
pub const FASTING_GLUCOSE_DIABETIC_MG_DL: f64 = 126.0;

/// Default location of the trained classifier artifact.
pub const DEFAULT_MODEL_PATH: &str = "model/ayur_model.json";

/// Default location of the reference dataset used to build the feature tables.
pub const DEFAULT_DATASET_PATH: &str = "model/reference_dataset.csv";

/// Default location of the persisted feature tables.
pub const DEFAULT_TABLES_PATH: &str = "model/feature_tables.yaml";

/// Filename of the encoder class documentation written next to the feature tables.
pub const MAPPINGS_FILENAME: &str = "mappings.json";

/// Calorie target used in a plan summary when the record has none.
pub const DEFAULT_PLAN_CALORIES: f64 = 2000.0;

/// Diet type used in a plan summary when the record has none.
pub const DEFAULT_PLAN_DIET_TYPE: &str = "balanced";

/// Length of a generated plan.
pub const PLAN_DURATION_WEEKS: u32 = 4;

/// Number of hex characters of the payload digest written to logs.
pub const PAYLOAD_HASH_HEX_LEN: usize = 16;
