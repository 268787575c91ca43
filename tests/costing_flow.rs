use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use thiserror::Error;

use otop_costing::{
    domain::{
        Category, CostingEngine, CostingError, CostingRecord, DraftStore, IngredientInput,
        RemoteStore, StaticIdentity, StorageError, Unit, ValidationError, COSTING_DRAFT_KEY,
    },
    infra::{FileDraftStore, MemoryDraftStore},
};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
#[error("{0}")]
struct FakeRemoteError(String);

/// Remote store that records submissions and answers with a canned outcome.
#[derive(Default)]
struct FakeRemote {
    reject_with: Option<String>,
    submitted: Mutex<Vec<CostingRecord>>,
    calls: AtomicUsize,
}

impl FakeRemote {
    fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    type Error = FakeRemoteError;

    async fn submit_costing(&self, record: &CostingRecord) -> Result<(), Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.reject_with {
            return Err(FakeRemoteError(message.clone()));
        }
        self.submitted
            .lock()
            .expect("lock")
            .push(record.clone());
        Ok(())
    }
}

/// Store whose every operation fails, as with a full or corrupt disk.
struct BrokenStore;

impl DraftStore for BrokenStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Other("disk unreadable".into()))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Other("quota exceeded".into()))
    }

    fn clear(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Other("quota exceeded".into()))
    }
}

fn flour_engine<S: DraftStore>(store: S) -> CostingEngine<S> {
    let mut engine = CostingEngine::restore(store);
    engine.set_product_name("Banana cake");
    engine.set_category(Category::Food);
    let blank = engine.draft().ingredients[0].id().to_string();
    engine.set_line_name(&blank, "flour");
    engine.set_line_quantity(&blank, 2.0);
    engine.set_line_unit(&blank, Unit::Kilogram);
    engine.set_line_price(&blank, 20.0);
    engine.set_yield_quantity(Some(10.0));
    engine.set_packaging_cost(5.0);
    engine.set_label_cost(2.0);
    engine.set_labor_cost(30.0);
    engine
}

#[test]
fn flour_scenario_end_to_end() {
    let mut engine = flour_engine(MemoryDraftStore::default());
    assert_eq!(engine.draft().marketing_percent, 12.0);
    assert_eq!(engine.draft().profit_percent, 25.0);

    let results = engine.calculate().expect("calculate");
    assert!((results.cost_per_unit - 4.0).abs() < EPSILON);
    assert!((results.total_cost_per_unit - 14.0).abs() < EPSILON);
    assert!((results.marketing_cost - 1.68).abs() < EPSILON);
    assert!((results.profit_margin - 3.92).abs() < EPSILON);
    assert!((results.recommended_price - 19.60).abs() < EPSILON);

    let again = engine.calculate().expect("calculate again");
    assert_eq!(results, again);
}

#[test]
fn named_lines_required_even_with_numbers() {
    let mut engine = CostingEngine::restore(MemoryDraftStore::default());
    engine.set_product_name("Mystery mix");
    let blank = engine.draft().ingredients[0].id().to_string();
    engine.set_line_quantity(&blank, 3.0);
    engine.set_line_price(&blank, 10.0);

    assert_eq!(
        engine.calculate(),
        Err(CostingError::Validation(ValidationError::NoNamedIngredients))
    );
    assert!(engine.results().is_none());
}

#[test]
fn draft_survives_reload_without_results() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let store = FileDraftStore::create(temp_dir.path()).expect("store");

    let mut engine = flour_engine(store.clone());
    engine.add_ingredient_line(Some(IngredientInput::new("banana", 1.5, Unit::Kilogram, 35.0)));
    engine.add_ingredient_line(None);
    engine.calculate().expect("calculate");
    let before = engine.draft().clone();
    drop(engine);

    let reloaded = CostingEngine::restore(store);
    let after = reloaded.draft();
    assert_eq!(after.product_name, before.product_name);
    assert_eq!(after.category, before.category);
    assert_eq!(after.yield_quantity, before.yield_quantity);
    assert_eq!(after.packaging_cost, before.packaging_cost);
    assert_eq!(after.label_cost, before.label_cost);
    assert_eq!(after.labor_cost, before.labor_cost);
    assert_eq!(after.marketing_percent, before.marketing_percent);
    assert_eq!(after.profit_percent, before.profit_percent);

    let summarize = |lines: &[otop_costing::domain::IngredientLine]| {
        lines
            .iter()
            .filter(|line| line.is_named())
            .map(|line| (line.name.clone(), line.quantity, line.unit, line.price_per_unit))
            .collect::<Vec<_>>()
    };
    assert_eq!(summarize(&after.ingredients), summarize(&before.ingredients));
    assert_eq!(after.ingredients.len(), 2);
    assert!(reloaded.results().is_none());
    assert!((reloaded.ingredients_subtotal() - 92.5).abs() < EPSILON);
}

#[test]
fn line_positions_survive_reload() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let store = FileDraftStore::create(temp_dir.path()).expect("store");

    let mut engine = CostingEngine::restore(store.clone());
    engine.fill_ingredient_line(IngredientInput::new("flour", 2.0, Unit::Kilogram, 20.0));
    engine.fill_ingredient_line(IngredientInput::new("sugar", 1.0, Unit::Kilogram, 25.0));
    assert_eq!(engine.draft().ingredients.len(), 2);
    drop(engine);

    let mut reloaded = CostingEngine::restore(store.clone());
    let sugar = reloaded
        .draft()
        .named_line(2)
        .map(|line| line.id().to_string())
        .expect("second line");
    assert_eq!(reloaded.draft().line(&sugar).map(|line| line.name.as_str()), Some("sugar"));
    reloaded.set_line_quantity(&sugar, 3.0);
    drop(reloaded);

    let again = CostingEngine::restore(store);
    let names: Vec<_> = again
        .draft()
        .named_ingredients()
        .map(|line| (line.name.clone(), line.quantity))
        .collect();
    assert_eq!(names, vec![("flour".to_string(), 2.0), ("sugar".to_string(), 3.0)]);
    assert!(again.draft().named_line(3).is_none());
    assert!(again.draft().named_line(0).is_none());
}

#[test]
fn unreadable_draft_starts_fresh() {
    let store = MemoryDraftStore::default();
    store.write(COSTING_DRAFT_KEY, "{not json").expect("write");

    let engine = CostingEngine::restore(store);
    assert_eq!(engine.draft().ingredients.len(), 1);
    assert_eq!(engine.draft().product_name, "");
}

#[test]
fn stored_draft_without_ingredients_gets_blank_line() {
    let store = MemoryDraftStore::default();
    store
        .write(COSTING_DRAFT_KEY, r#"{"productName": "Tea", "ingredients": []}"#)
        .expect("write");

    let engine = CostingEngine::restore(store);
    assert_eq!(engine.draft().product_name, "Tea");
    assert_eq!(engine.draft().ingredients.len(), 1);
    assert!(!engine.draft().ingredients[0].is_named());
}

#[test]
fn storage_failures_do_not_interrupt_editing() {
    let mut engine = flour_engine(BrokenStore);
    let results = engine.calculate().expect("calculate");
    assert!((results.recommended_price - 19.60).abs() < EPSILON);
    engine.reset();
    assert_eq!(engine.draft().ingredients.len(), 1);
}

#[tokio::test]
async fn successful_save_clears_draft() {
    let store = Arc::new(MemoryDraftStore::default());
    let remote = FakeRemote::default();
    let mut engine = flour_engine(store.clone());
    engine.calculate().expect("calculate");
    assert!(store.contains(COSTING_DRAFT_KEY));

    let receipt = engine
        .save(&remote, &StaticIdentity::new("0812345678"))
        .await
        .expect("save");
    assert!(!receipt.kept_newer_edits);

    let submitted = remote.submitted.lock().expect("lock");
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].user_id, "0812345678");
    assert_eq!(submitted[0].product_name, "Banana cake");
    assert_eq!(submitted[0].ingredients.len(), 1);
    assert!((submitted[0].results.recommended_price - 19.60).abs() < EPSILON);

    assert!(!store.contains(COSTING_DRAFT_KEY));
    assert!(engine.results().is_none());
    assert_eq!(engine.draft().product_name, "");
    assert_eq!(engine.draft().ingredients.len(), 1);
}

#[tokio::test]
async fn rejected_save_keeps_everything_for_retry() {
    let store = Arc::new(MemoryDraftStore::default());
    let remote = FakeRemote::rejecting("Sheet is locked by another editor");
    let mut engine = flour_engine(store.clone());
    engine.calculate().expect("calculate");
    let draft_before = engine.draft().clone();
    let stored_before = store.read(COSTING_DRAFT_KEY).expect("read");

    let err = engine
        .save(&remote, &StaticIdentity::new("0812345678"))
        .await
        .expect_err("rejected");
    assert_eq!(err, CostingError::Remote("Sheet is locked by another editor".into()));
    assert_eq!(err.to_string(), "Sheet is locked by another editor");

    assert_eq!(engine.draft(), &draft_before);
    assert_eq!(store.read(COSTING_DRAFT_KEY).expect("read"), stored_before);
}

#[tokio::test]
async fn save_preconditions_skip_the_network() {
    let remote = FakeRemote::default();
    let mut engine = flour_engine(MemoryDraftStore::default());

    let err = engine
        .save(&remote, &StaticIdentity::new("0812345678"))
        .await
        .expect_err("not calculated");
    assert_eq!(err, CostingError::Precondition);

    engine.calculate().expect("calculate");
    let err = engine
        .save(&remote, &StaticIdentity::anonymous())
        .await
        .expect_err("no owner");
    assert_eq!(err, CostingError::AuthRequired);
    assert_eq!(remote.calls(), 0);
}

#[tokio::test]
async fn edits_after_calculate_save_calculated_snapshot() {
    let remote = FakeRemote::default();
    let mut engine = flour_engine(MemoryDraftStore::default());
    let results = engine.calculate().expect("calculate");

    engine.set_product_name("Banana cake (renamed)");
    engine.set_labor_cost(90.0);
    assert_eq!(engine.results(), Some(&results));

    let receipt = engine
        .save(&remote, &StaticIdentity::new("0812345678"))
        .await
        .expect("save");
    assert!(!receipt.kept_newer_edits);
    assert_eq!(receipt.record.product_name, "Banana cake");
    assert_eq!(receipt.record.labor_cost, 30.0);
    assert_eq!(receipt.record.results, results);
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn edits_during_pending_save_are_kept() {
    let store = Arc::new(MemoryDraftStore::default());
    let remote = FakeRemote::default();
    let mut engine = flour_engine(store.clone());
    engine.calculate().expect("calculate");

    let pending = engine
        .begin_save(&StaticIdentity::new("0812345678"))
        .expect("begin");
    engine.set_product_name("Banana cake (large)");
    let outcome = remote.submit_costing(pending.record()).await;

    let receipt = engine.finish_save(pending, outcome).expect("finish");
    assert!(receipt.kept_newer_edits);
    assert_eq!(receipt.record.product_name, "Banana cake");
    assert_eq!(engine.draft().product_name, "Banana cake (large)");
    assert!(engine.results().is_none());
    assert!(store.contains(COSTING_DRAFT_KEY));
}
