use chrono::{TimeZone, Utc};
use doclite::collection::Document;
use doclite::database::Database;
use doclite::doc;
use doclite::errors::EngineResult;

/// Runs a test with explicit setup and teardown phases.
///
/// The teardown runs even when the test body fails, so a failing assertion
/// never leaves collections behind for the next test.
pub fn run_test<B, T, A>(before: B, test: T, after: A)
where
    B: Fn() -> EngineResult<TestContext>,
    T: Fn(TestContext) -> EngineResult<()>,
    A: Fn(TestContext) -> EngineResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let ctx_for_test = ctx.clone();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        test(ctx_for_test)
    }));

    if let Err(e) = after(ctx) {
        eprintln!("Warning: cleanup failed: {:?}", e);
    }

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => std::panic::resume_unwind(panic_err),
    }
}

#[derive(Clone)]
pub struct TestContext {
    db: Database,
}

impl TestContext {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }
}

pub fn create_test_context() -> EngineResult<TestContext> {
    Ok(TestContext::new(Database::new()))
}

pub fn cleanup(ctx: TestContext) -> EngineResult<()> {
    let db = ctx.db();
    for name in db.list_collection_names() {
        db.drop_collection(&name)?;
    }
    Ok(())
}

/// Three documents sharing a shape, with distinct names and birth days.
pub fn create_test_docs() -> Vec<Document> {
    let bd1 = Utc.with_ymd_and_hms(2012, 7, 1, 16, 2, 48).unwrap();
    let bd2 = Utc.with_ymd_and_hms(2010, 6, 12, 16, 2, 48).unwrap();
    let bd3 = Utc.with_ymd_and_hms(2014, 4, 17, 16, 2, 48).unwrap();

    vec![
        doc! {
            "first_name": "fn1",
            "last_name": "ln1",
            "birth_day": bd1,
            "data": [1, 2, 3],
            "list": ["one", "two", "three"],
            "body": "a quick brown fox jump over the lazy dog",
        },
        doc! {
            "first_name": "fn2",
            "last_name": "ln2",
            "birth_day": bd2,
            "data": [3, 4, 3],
            "list": ["three", "four", "five"],
            "body": "quick hello world from doclite",
        },
        doc! {
            "first_name": "fn3",
            "last_name": "ln2",
            "birth_day": bd3,
            "data": [9, 4, 8],
            "body": "Lorem ipsum dolor sit amet, consectetur adipiscing elit",
        },
    ]
}
