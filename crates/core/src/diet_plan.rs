//! Diet plan document returned by the plan endpoint.

use crate::constants::{DEFAULT_PLAN_CALORIES, DEFAULT_PLAN_DIET_TYPE, PLAN_DURATION_WEEKS};
use crate::patient::PatientRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanSummary {
    pub total_calories: f64,
    pub diet_type: String,
    pub duration_weeks: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meal {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// A diet plan. The sanitizer edits it in place before it leaves the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DietPlan {
    pub plan_summary: PlanSummary,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub shopping_list: Vec<String>,
    /// Clinician-facing notes; safety warnings come first.
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Builds the plan skeleton for a record.
///
/// Meals and the shopping list start empty; the notes start with `warnings` in the order the
/// safety engine produced them.
pub fn assemble_diet_plan(record: &PatientRecord, warnings: &[String]) -> DietPlan {
    DietPlan {
        plan_summary: PlanSummary {
            total_calories: record.daily_calories.unwrap_or(DEFAULT_PLAN_CALORIES),
            diet_type: record
                .diet_type
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAN_DIET_TYPE.to_owned()),
            duration_weeks: PLAN_DURATION_WEEKS,
        },
        meals: Vec::new(),
        shopping_list: Vec::new(),
        notes: warnings.to_vec(),
    }
}
