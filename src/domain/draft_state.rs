//! On-disk shape of the costing draft.
//!
//! - Only editable fields are stored; calculation results never are.
//! - Rows without a name are dropped before writing.
//! - Drafts written by the browser front end keep numbers as strings and may
//!   omit fields, so every numeric field is read leniently.

use serde::{Deserialize, Deserializer, Serialize};

use super::defaults::PercentDefaults;
use super::entities::{Category, CostingDraft, IngredientInput, IngredientLine, Unit};
use crate::util::generate_id;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDraft {
    #[serde(default)]
    pub product_name: String,
    /// Absent in legacy drafts; `null` when an unknown category was selected.
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub ingredients: Vec<PersistedIngredient>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub yield_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub packaging_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub label_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub labor_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub marketing_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub profit_percent: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedIngredient {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price_per_unit: Option<f64>,
}

impl PersistedDraft {
    pub fn from_draft(draft: &CostingDraft) -> Self {
        Self {
            product_name: draft.product_name.clone(),
            category: Some(draft.category.map(|category| category.code().to_string())),
            ingredients: draft
                .named_ingredients()
                .map(|line| PersistedIngredient {
                    name: line.name.clone(),
                    quantity: Some(line.quantity),
                    unit: Some(line.unit.label().to_string()),
                    price_per_unit: Some(line.price_per_unit),
                })
                .collect(),
            yield_quantity: draft.yield_quantity,
            packaging_cost: Some(draft.packaging_cost),
            label_cost: Some(draft.label_cost),
            labor_cost: Some(draft.labor_cost),
            marketing_percent: Some(draft.marketing_percent),
            profit_percent: Some(draft.profit_percent),
        }
    }

    /// Rebuilds a draft. Missing category and percentages take the food
    /// defaults, matching what the form showed when the draft was written.
    pub fn into_draft(self) -> CostingDraft {
        let category = match self.category {
            None => Some(Category::Food),
            Some(code) => code.as_deref().and_then(Category::parse),
        };
        let food = PercentDefaults::for_category(Category::Food);

        let ingredients = self
            .ingredients
            .into_iter()
            .map(|stored| {
                IngredientLine::new(
                    generate_id("ing"),
                    IngredientInput {
                        name: stored.name,
                        quantity: stored.quantity.unwrap_or(0.0),
                        unit: stored.unit.as_deref().and_then(Unit::parse),
                        price_per_unit: stored.price_per_unit.unwrap_or(0.0),
                    },
                )
            })
            .collect();

        CostingDraft {
            product_name: self.product_name,
            category,
            ingredients,
            yield_quantity: self.yield_quantity,
            packaging_cost: self.packaging_cost.unwrap_or(0.0),
            label_cost: self.label_cost.unwrap_or(0.0),
            labor_cost: self.labor_cost.unwrap_or(0.0),
            marketing_percent: self.marketing_percent.unwrap_or(food.marketing),
            profit_percent: self.profit_percent.unwrap_or(food.profit),
            results: None,
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrText;

    impl<'de> serde::de::Visitor<'de> for NumberOrText {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, a numeric string or null")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value).filter(|v| v.is_finite()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(super::defaults::parse_optional_amount(value))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(NumberOrText)
}
