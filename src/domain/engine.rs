//! Smart Costing engine.
//!
//! Owns the current draft for one session. Every field edit persists the
//! draft to the local store. `calculate` attaches results and snapshots the
//! inputs they were computed from; `save` submits that snapshot as a
//! finalized record to the remote store.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, warn};

use super::calculation::{compute_results, ingredients_subtotal};
use super::defaults::{resolve_yield, sanitize_amount, PercentDefaults};
use super::draft_state::PersistedDraft;
use super::entities::{
    Category, CostingDraft, CostingRecord, CostingResults, IngredientInput, IngredientLine,
    LineId, RecordIngredient, Unit,
};
use super::errors::CostingError;
use super::ports::{DraftStore, IdentityProvider, RemoteStore, COSTING_DRAFT_KEY};
use crate::util::generate_id;

/// Snapshot taken when a save starts. Carries the record to submit and the
/// draft revision it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSave {
    record: CostingRecord,
    revision: u64,
}

impl PendingSave {
    pub fn record(&self) -> &CostingRecord {
        &self.record
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaveReceipt {
    pub record: CostingRecord,
    /// True when the draft was edited while the save was in flight; those
    /// edits were kept instead of being cleared.
    pub kept_newer_edits: bool,
}

pub struct CostingEngine<S> {
    store: S,
    draft: CostingDraft,
    /// Draft as it was at the last successful `calculate`, results included.
    calculated: Option<CostingDraft>,
    revision: u64,
}

impl<S: DraftStore> CostingEngine<S> {
    /// Engine with an empty draft. Nothing is read from or written to the store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            draft: empty_draft(),
            calculated: None,
            revision: 0,
        }
    }

    /// Engine initialised from whatever draft the store holds.
    pub fn restore(store: S) -> Self {
        let mut engine = Self::new(store);
        engine.restore_draft();
        engine
    }

    pub fn draft(&self) -> &CostingDraft {
        &self.draft
    }

    /// Results of the last calculation. Later edits do not clear them.
    pub fn results(&self) -> Option<&CostingResults> {
        self.draft.results()
    }

    /// Inputs the current results were computed from.
    pub fn calculated_draft(&self) -> Option<&CostingDraft> {
        self.calculated.as_ref()
    }

    pub fn ingredients_subtotal(&self) -> f64 {
        ingredients_subtotal(&self.draft.ingredients)
    }

    /// Bumped on every mutation of editable fields.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_product_name(&mut self, name: impl Into<String>) {
        self.draft.product_name = name.into();
        self.touch();
    }

    /// Selects a category and pre-fills its default percentages. The user
    /// may override them afterwards.
    pub fn set_category(&mut self, category: Category) {
        self.apply_category(Some(category));
    }

    /// Like [`set_category`](Self::set_category) but from a free-form label.
    /// Unknown labels leave the category unset and use the fallback percentages.
    pub fn select_category(&mut self, label: &str) {
        let category = Category::parse(label);
        if category.is_none() {
            debug!("[costing] unknown category '{label}', using fallback percentages");
        }
        self.apply_category(category);
    }

    fn apply_category(&mut self, category: Option<Category>) {
        let defaults = PercentDefaults::lookup(category);
        self.draft.category = category;
        self.draft.marketing_percent = defaults.marketing;
        self.draft.profit_percent = defaults.profit;
        self.touch();
    }

    pub fn add_ingredient_line(&mut self, initial: Option<IngredientInput>) -> LineId {
        let id = generate_id("ing");
        self.draft
            .ingredients
            .push(IngredientLine::new(id.clone(), initial.unwrap_or_default()));
        self.touch();
        id
    }

    /// Writes `input` into the first unnamed line, appending a new line only
    /// when every line already has a name.
    pub fn fill_ingredient_line(&mut self, input: IngredientInput) -> LineId {
        let blank = self
            .draft
            .ingredients
            .iter()
            .find(|line| !line.is_named())
            .map(|line| line.id().to_string());
        let Some(id) = blank else {
            return self.add_ingredient_line(Some(input));
        };
        self.edit_line(&id, |line| {
            line.name = input.name;
            line.quantity = input.quantity;
            line.unit = input.unit.unwrap_or_default();
            line.price_per_unit = input.price_per_unit;
        });
        id
    }

    /// Removes a line; unknown ids are ignored.
    pub fn remove_ingredient_line(&mut self, id: &str) {
        let before = self.draft.ingredients.len();
        self.draft.ingredients.retain(|line| line.id() != id);
        if self.draft.ingredients.len() != before {
            self.touch();
        }
    }

    pub fn set_line_name(&mut self, id: &str, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit_line(id, |line| line.name = name)
    }

    pub fn set_line_quantity(&mut self, id: &str, quantity: f64) -> bool {
        self.edit_line(id, |line| line.quantity = quantity)
    }

    pub fn set_line_unit(&mut self, id: &str, unit: Unit) -> bool {
        self.edit_line(id, |line| line.unit = unit)
    }

    pub fn set_line_price(&mut self, id: &str, price_per_unit: f64) -> bool {
        self.edit_line(id, |line| line.price_per_unit = price_per_unit)
    }

    fn edit_line(&mut self, id: &str, edit: impl FnOnce(&mut IngredientLine)) -> bool {
        let Some(line) = self.draft.line_mut(id) else {
            return false;
        };
        edit(line);
        self.recompute_line_total(id);
        self.touch();
        true
    }

    /// Returns the new line total, or `None` if the line does not exist.
    pub fn recompute_line_total(&mut self, id: &str) -> Option<f64> {
        self.draft.line_mut(id).map(IngredientLine::recompute_total)
    }

    pub fn set_yield_quantity(&mut self, yield_quantity: Option<f64>) {
        self.draft.yield_quantity = yield_quantity;
        self.touch();
    }

    pub fn set_packaging_cost(&mut self, cost: f64) {
        self.draft.packaging_cost = cost;
        self.touch();
    }

    pub fn set_label_cost(&mut self, cost: f64) {
        self.draft.label_cost = cost;
        self.touch();
    }

    pub fn set_labor_cost(&mut self, cost: f64) {
        self.draft.labor_cost = cost;
        self.touch();
    }

    pub fn set_marketing_percent(&mut self, percent: f64) {
        self.draft.marketing_percent = percent;
        self.touch();
    }

    pub fn set_profit_percent(&mut self, percent: f64) {
        self.draft.profit_percent = percent;
        self.touch();
    }

    /// Computes and attaches results. On validation failure the draft,
    /// including any earlier results, is left alone.
    pub fn calculate(&mut self) -> Result<CostingResults, CostingError> {
        let results = compute_results(&self.draft)?;
        self.draft.results = Some(results);
        self.calculated = Some(self.draft.clone());
        Ok(results)
    }

    /// Validates save preconditions and builds the record from the inputs
    /// captured by the last `calculate`, so figures and inputs always agree.
    pub fn begin_save(&self, identity: &impl IdentityProvider) -> Result<PendingSave, CostingError> {
        self.begin_save_at(identity, OffsetDateTime::now_utc())
    }

    pub fn begin_save_at(
        &self,
        identity: &impl IdentityProvider,
        created_at: OffsetDateTime,
    ) -> Result<PendingSave, CostingError> {
        let draft = self.calculated.as_ref().ok_or(CostingError::Precondition)?;
        let results = *draft.results().ok_or(CostingError::Precondition)?;
        let user_id = identity
            .current_owner_id()
            .ok_or(CostingError::AuthRequired)?;

        let created_at = created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| created_at.unix_timestamp().to_string());

        let record = CostingRecord {
            user_id,
            product_name: draft.product_name.trim().to_string(),
            category: draft.category,
            ingredients: draft.named_ingredients().map(RecordIngredient::from).collect(),
            yield_quantity: resolve_yield(draft.yield_quantity),
            packaging_cost: sanitize_amount(draft.packaging_cost),
            label_cost: sanitize_amount(draft.label_cost),
            labor_cost: sanitize_amount(draft.labor_cost),
            marketing_percent: sanitize_amount(draft.marketing_percent),
            profit_percent: sanitize_amount(draft.profit_percent),
            results,
            created_at,
        };

        Ok(PendingSave {
            record,
            revision: self.revision,
        })
    }

    /// Applies the remote outcome of a pending save.
    ///
    /// A rejection leaves the draft and the stored copy untouched. On success
    /// the draft is cleared only if nothing was edited since `begin_save`.
    pub fn finish_save<E: std::fmt::Display>(
        &mut self,
        pending: PendingSave,
        outcome: Result<(), E>,
    ) -> Result<SaveReceipt, CostingError> {
        if let Err(err) = outcome {
            let message = err.to_string();
            warn!(
                "[costing] save of '{}' rejected: {message}",
                pending.record.product_name
            );
            return Err(CostingError::Remote(message));
        }

        if pending.revision != self.revision {
            info!(
                "[costing] '{}' saved; draft changed during save (rev {} -> {}), keeping edits",
                pending.record.product_name, pending.revision, self.revision
            );
            self.calculated = None;
            self.draft.results = None;
            return Ok(SaveReceipt {
                record: pending.record,
                kept_newer_edits: true,
            });
        }

        info!("[costing] '{}' saved", pending.record.product_name);
        self.clear_stored_draft();
        self.draft = empty_draft();
        self.calculated = None;
        self.revision += 1;
        Ok(SaveReceipt {
            record: pending.record,
            kept_newer_edits: false,
        })
    }

    pub async fn save<R, I>(&mut self, remote: &R, identity: &I) -> Result<SaveReceipt, CostingError>
    where
        R: RemoteStore,
        I: IdentityProvider,
    {
        let pending = self.begin_save(identity)?;
        let outcome = remote.submit_costing(pending.record()).await;
        self.finish_save(pending, outcome)
    }

    /// Back to one blank line with default fields. Confirmation is the
    /// caller's job.
    pub fn reset(&mut self) {
        self.draft = empty_draft();
        self.calculated = None;
        self.revision += 1;
        self.clear_stored_draft();
    }

    pub fn persist_draft(&self) {
        let snapshot = PersistedDraft::from_draft(&self.draft);
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(err) => {
                warn!("[draft] failed to serialize draft: {err}");
                return;
            }
        };
        if let Err(err) = self.store.write(COSTING_DRAFT_KEY, &json) {
            warn!("[draft] failed to persist draft: {err}");
        }
    }

    /// Replaces the in-memory draft with the stored one, or an empty draft if
    /// nothing usable is stored. Results are never restored.
    pub fn restore_draft(&mut self) {
        self.revision += 1;
        self.calculated = None;
        let raw = match self.store.read(COSTING_DRAFT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("[draft] no stored draft");
                self.draft = empty_draft();
                return;
            }
            Err(err) => {
                warn!("[draft] failed to read stored draft: {err}");
                self.draft = empty_draft();
                return;
            }
        };

        match serde_json::from_str::<PersistedDraft>(&raw) {
            Ok(stored) => {
                let mut draft = stored.into_draft();
                if draft.ingredients.is_empty() {
                    draft
                        .ingredients
                        .push(IngredientLine::new(generate_id("ing"), IngredientInput::default()));
                }
                debug!(
                    "[draft] restored '{}' with {} ingredient line(s)",
                    draft.product_name,
                    draft.ingredients.len()
                );
                self.draft = draft;
            }
            Err(err) => {
                warn!("[draft] stored draft is unreadable, starting fresh: {err}");
                self.draft = empty_draft();
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.persist_draft();
    }

    fn clear_stored_draft(&self) {
        if let Err(err) = self.store.clear(COSTING_DRAFT_KEY) {
            warn!("[draft] failed to clear stored draft: {err}");
        }
    }
}

fn empty_draft() -> CostingDraft {
    let mut draft = CostingDraft::blank();
    draft
        .ingredients
        .push(IngredientLine::new(generate_id("ing"), IngredientInput::default()));
    draft
}
