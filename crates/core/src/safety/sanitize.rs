//! Ingredient filtering and note injection for diet plans.

use crate::diet_plan::DietPlan;
use crate::patient::PatientRecord;

const GLUTEN_TERMS: &[&str] = &["gluten", "wheat"];
const NUT_TERMS: &[&str] = &["nut", "peanut"];
const DAIRY_TERMS: &[&str] = &["dairy", "milk", "cheese"];

pub const RENAL_NOTE: &str = "Verify renal diet with clinician";
pub const GLUCOSE_NOTE: &str = "Monitor blood glucose levels";

/// Removes ingredients the patient must avoid and appends clinician notes.
///
/// Matching is a case-insensitive substring test. The gluten filter applies to meals and the
/// shopping list; the nut, dairy and exclusion filters apply to meal ingredients only. Notes are
/// appended once, so sanitizing an already sanitized plan changes nothing.
pub fn sanitize_diet_plan(plan: &mut DietPlan, record: &PatientRecord) {
    if record.has_celiac || record.gluten_free {
        drop_from_meals(plan, GLUTEN_TERMS);
        plan.shopping_list.retain(|item| !mentions_any(item, GLUTEN_TERMS));
    }
    if record.nut_free {
        drop_from_meals(plan, NUT_TERMS);
    }
    if record.dairy_free {
        drop_from_meals(plan, DAIRY_TERMS);
    }

    let excluded: Vec<String> = record
        .exclude_ingredients
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if !excluded.is_empty() {
        let terms: Vec<&str> = excluded.iter().map(String::as_str).collect();
        drop_from_meals(plan, &terms);
    }

    if record.has_ckd {
        push_note(plan, RENAL_NOTE);
    }
    if record.has_diabetes {
        push_note(plan, GLUCOSE_NOTE);
    }
}

fn drop_from_meals(plan: &mut DietPlan, terms: &[&str]) {
    for meal in &mut plan.meals {
        meal.ingredients.retain(|ingredient| !mentions_any(ingredient, terms));
    }
}

/// `terms` must already be lower case.
fn mentions_any(item: &str, terms: &[&str]) -> bool {
    let item = item.to_lowercase();
    terms.iter().any(|term| item.contains(term))
}

fn push_note(plan: &mut DietPlan, note: &str) {
    if !plan.notes.iter().any(|n| n == note) {
        plan.notes.push(note.to_owned());
    }
}
