use serde::{Deserialize, Serialize};

use super::calculation::line_total;
use super::defaults::sanitize_amount;

/// Identifier for ingredient lines inside a draft.
pub type LineId = String;

/// OTOP product classification. Drives the default marketing/profit percentages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Goods,
    Handicraft,
    Herb,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Goods,
        Category::Handicraft,
        Category::Herb,
        Category::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Goods => "goods",
            Category::Handicraft => "handicraft",
            Category::Herb => "herb",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "อาหารและเครื่องดื่ม",
            Category::Goods => "ของใช้และของตกแต่ง",
            Category::Handicraft => "ผ้าและเครื่องแต่งกาย",
            Category::Herb => "สมุนไพรเพื่อสุขภาพ",
            Category::Other => "อื่นๆ",
        }
    }

    /// Accepts either the category code or its display label.
    pub fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|category| {
                category.code().eq_ignore_ascii_case(needle) || category.label() == needle
            })
    }
}

/// Measurement units offered for ingredients. Serialized with the Thai label
/// the remote sheet stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "กก.")]
    Kilogram,
    #[serde(rename = "กรัม")]
    Gram,
    #[serde(rename = "ลิตร")]
    Litre,
    #[serde(rename = "มล.")]
    Millilitre,
    #[serde(rename = "ชิ้น")]
    Piece,
    #[serde(rename = "ห่อ")]
    Wrap,
    #[serde(rename = "กล่อง")]
    Box,
    #[serde(rename = "ถุง")]
    Bag,
    #[serde(rename = "ขวด")]
    Bottle,
    #[serde(rename = "แพ็ค")]
    Pack,
    #[serde(rename = "เม็ด")]
    Tablet,
    #[serde(rename = "ช้อนโต๊ะ")]
    Tablespoon,
    #[serde(rename = "ถ้วย")]
    Cup,
}

impl Unit {
    pub const ALL: [Unit; 13] = [
        Unit::Kilogram,
        Unit::Gram,
        Unit::Litre,
        Unit::Millilitre,
        Unit::Piece,
        Unit::Wrap,
        Unit::Box,
        Unit::Bag,
        Unit::Bottle,
        Unit::Pack,
        Unit::Tablet,
        Unit::Tablespoon,
        Unit::Cup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Unit::Kilogram => "กก.",
            Unit::Gram => "กรัม",
            Unit::Litre => "ลิตร",
            Unit::Millilitre => "มล.",
            Unit::Piece => "ชิ้น",
            Unit::Wrap => "ห่อ",
            Unit::Box => "กล่อง",
            Unit::Bag => "ถุง",
            Unit::Bottle => "ขวด",
            Unit::Pack => "แพ็ค",
            Unit::Tablet => "เม็ด",
            Unit::Tablespoon => "ช้อนโต๊ะ",
            Unit::Cup => "ถ้วย",
        }
    }

    /// ASCII shorthand accepted from the command line.
    pub fn code(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Litre => "l",
            Unit::Millilitre => "ml",
            Unit::Piece => "pc",
            Unit::Wrap => "wrap",
            Unit::Box => "box",
            Unit::Bag => "bag",
            Unit::Bottle => "bottle",
            Unit::Pack => "pack",
            Unit::Tablet => "tablet",
            Unit::Tablespoon => "tbsp",
            Unit::Cup => "cup",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|unit| unit.label() == needle || unit.code().eq_ignore_ascii_case(needle))
    }
}

/// Initial values for a new ingredient line. Every field may be left blank.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngredientInput {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<Unit>,
    pub price_per_unit: f64,
}

impl IngredientInput {
    pub fn new(name: impl Into<String>, quantity: f64, unit: Unit, price_per_unit: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: Some(unit),
            price_per_unit,
        }
    }
}

/// One row of the ingredient table. The line total is derived and only
/// changes through [`IngredientLine::recompute_total`].
#[derive(Clone, Debug, PartialEq)]
pub struct IngredientLine {
    id: LineId,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub price_per_unit: f64,
    line_total: f64,
}

impl IngredientLine {
    pub fn new(id: impl Into<LineId>, input: IngredientInput) -> Self {
        let mut line = Self {
            id: id.into(),
            name: input.name,
            quantity: input.quantity,
            unit: input.unit.unwrap_or_default(),
            price_per_unit: input.price_per_unit,
            line_total: 0.0,
        };
        line.recompute_total();
        line
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn line_total(&self) -> f64 {
        self.line_total
    }

    /// A row without a name is an incomplete row: it never counts toward
    /// totals and is never persisted.
    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn recompute_total(&mut self) -> f64 {
        self.line_total = line_total(self.quantity, self.price_per_unit);
        self.line_total
    }
}

/// The five derived figures produced by a successful calculation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingResults {
    pub cost_per_unit: f64,
    pub total_cost_per_unit: f64,
    pub marketing_cost: f64,
    pub profit_margin: f64,
    pub recommended_price: f64,
}

impl CostingResults {
    pub fn is_finite(&self) -> bool {
        [
            self.cost_per_unit,
            self.total_cost_per_unit,
            self.marketing_cost,
            self.profit_margin,
            self.recommended_price,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// In-progress costing owned by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CostingDraft {
    pub product_name: String,
    pub category: Option<Category>,
    pub ingredients: Vec<IngredientLine>,
    pub yield_quantity: Option<f64>,
    pub packaging_cost: f64,
    pub label_cost: f64,
    pub labor_cost: f64,
    pub marketing_percent: f64,
    pub profit_percent: f64,
    pub(crate) results: Option<CostingResults>,
}

impl CostingDraft {
    /// Draft with no lines at all. The engine always adds a blank row on top.
    pub fn blank() -> Self {
        Self {
            product_name: String::new(),
            category: None,
            ingredients: Vec::new(),
            yield_quantity: None,
            packaging_cost: 0.0,
            label_cost: 0.0,
            labor_cost: 0.0,
            marketing_percent: 0.0,
            profit_percent: 0.0,
            results: None,
        }
    }

    pub fn results(&self) -> Option<&CostingResults> {
        self.results.as_ref()
    }

    pub fn line(&self, id: &str) -> Option<&IngredientLine> {
        self.ingredients.iter().find(|line| line.id() == id)
    }

    pub(crate) fn line_mut(&mut self, id: &str) -> Option<&mut IngredientLine> {
        self.ingredients.iter_mut().find(|line| line.id() == id)
    }

    pub fn named_ingredients(&self) -> impl Iterator<Item = &IngredientLine> {
        self.ingredients.iter().filter(|line| line.is_named())
    }

    /// Named line at a 1-based position. Only named lines are persisted, so
    /// these positions stay stable across a reload.
    pub fn named_line(&self, position: usize) -> Option<&IngredientLine> {
        position
            .checked_sub(1)
            .and_then(|idx| self.named_ingredients().nth(idx))
    }
}

impl Default for CostingDraft {
    fn default() -> Self {
        Self::blank()
    }
}

/// Ingredient row as it appears in a finalized record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub price_per_unit: f64,
    pub total: f64,
}

impl From<&IngredientLine> for RecordIngredient {
    fn from(line: &IngredientLine) -> Self {
        Self {
            name: line.name.trim().to_string(),
            quantity: sanitize_amount(line.quantity),
            unit: line.unit,
            price_per_unit: sanitize_amount(line.price_per_unit),
            total: line.line_total(),
        }
    }
}

/// Finalized costing submitted to the remote sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingRecord {
    pub user_id: String,
    pub product_name: String,
    pub category: Option<Category>,
    pub ingredients: Vec<RecordIngredient>,
    pub yield_quantity: f64,
    pub packaging_cost: f64,
    pub label_cost: f64,
    pub labor_cost: f64,
    pub marketing_percent: f64,
    pub profit_percent: f64,
    pub results: CostingResults,
    pub created_at: String,
}
