use doclite::collection::FindOptions;
use doclite::common::Fields;
use doclite::doc;
use doclite_int_test::test_util::{cleanup, create_test_context, run_test};

fn fields(names: &[&str]) -> Fields {
    Fields::with_names(names.iter().map(|n| n.to_string()).collect()).unwrap()
}

fn seed(collection: &doclite::collection::Collection) {
    collection.insert_many(vec![
        doc! { "city": "Oslo", "age": 10 },
        doc! { "city": "Oslo", "age": 30 },
        doc! { "city": "Bergen", "age": 10 },
        doc! { "city": "Bergen", "age": 30 },
    ]);
}

#[test]
fn test_compound_equality() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city", "age"]), false)?;

            let mut cursor = collection.find(
                &doc! { "city": "Oslo", "age": 30 },
                FindOptions::new(),
            )?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_city_age"));
            assert_eq!(cursor.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_prefix_equality_with_range() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city", "age"]), false)?;

            let mut cursor = collection.find(
                &doc! { "city": "Oslo", "age": { "$gt": 15 } },
                FindOptions::new(),
            )?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_city_age"));
            assert_eq!(cursor.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_prefix_alone_is_covered() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city", "age"]), false)?;

            // a leading-field query still uses the compound index
            let mut cursor = collection.find(&doc! { "city": "Bergen" }, FindOptions::new())?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_city_age"));
            assert_eq!(cursor.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_trailing_field_alone_is_not_covered() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city", "age"]), false)?;

            // the index cannot serve a query missing its leading field
            let mut cursor = collection.find(&doc! { "age": 30 }, FindOptions::new())?;
            assert!(cursor.plan().unwrap().is_collection_scan());
            assert_eq!(cursor.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_longer_prefix_wins() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city"]), false)?;
            collection.create_index(fields(&["city", "age"]), false)?;

            let mut cursor = collection.find(
                &doc! { "city": "Oslo", "age": 10 },
                FindOptions::new(),
            )?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_city_age"));
            assert_eq!(cursor.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_first_created_index_wins_ties() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            seed(&collection);
            collection.create_index(fields(&["city"]), false)?;
            collection.create_index(fields(&["city", "age"]), false)?;

            // both indexes cover exactly one equality here
            let mut cursor = collection.find(&doc! { "city": "Oslo" }, FindOptions::new())?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_city"));
            assert_eq!(cursor.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_compound_unique_index() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["city", "age"]), true)?;

            collection.insert_one(doc! { "city": "Oslo", "age": 10 })?;
            collection.insert_one(doc! { "city": "Oslo", "age": 20 })?;

            let result = collection.insert_one(doc! { "city": "Oslo", "age": 10 });
            assert!(result.is_err());
            assert_eq!(collection.size(), 2);

            Ok(())
        },
        cleanup,
    )
}
