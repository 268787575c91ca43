use super::defaults::{resolve_yield, sanitize_amount};
use super::entities::{CostingDraft, CostingResults, IngredientLine};
use super::errors::ValidationError;

pub fn line_total(quantity: f64, price_per_unit: f64) -> f64 {
    sanitize_amount(quantity) * sanitize_amount(price_per_unit)
}

/// Sum of line totals over named lines only.
pub fn ingredients_subtotal(lines: &[IngredientLine]) -> f64 {
    lines
        .iter()
        .filter(|line| line.is_named())
        .map(IngredientLine::line_total)
        .sum()
}

pub fn validate(draft: &CostingDraft) -> Result<(), ValidationError> {
    if draft.product_name.trim().is_empty() {
        return Err(ValidationError::MissingProductName);
    }
    if draft.named_ingredients().next().is_none() {
        return Err(ValidationError::NoNamedIngredients);
    }
    Ok(())
}

/// Unit cost and recommended price for the draft. Pure; no rounding is
/// applied, display code formats the values.
pub fn compute_results(draft: &CostingDraft) -> Result<CostingResults, ValidationError> {
    validate(draft)?;

    let yield_quantity = resolve_yield(draft.yield_quantity);
    let packaging = sanitize_amount(draft.packaging_cost);
    let label = sanitize_amount(draft.label_cost);
    let labor = sanitize_amount(draft.labor_cost);
    let marketing_rate = sanitize_amount(draft.marketing_percent) / 100.0;
    let profit_rate = sanitize_amount(draft.profit_percent) / 100.0;

    let cost_per_unit = ingredients_subtotal(&draft.ingredients) / yield_quantity;
    let total_cost_per_unit = cost_per_unit + packaging + label + (labor / yield_quantity);
    let marketing_cost = total_cost_per_unit * marketing_rate;
    let profit_margin = (total_cost_per_unit + marketing_cost) * profit_rate;
    let recommended_price = total_cost_per_unit + marketing_cost + profit_margin;

    let results = CostingResults {
        cost_per_unit,
        total_cost_per_unit,
        marketing_cost,
        profit_margin,
        recommended_price,
    };
    if !results.is_finite() {
        return Err(ValidationError::AmountOutOfRange);
    }
    Ok(results)
}
