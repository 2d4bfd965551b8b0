use doclite::collection::{order_by, FindOptions};
use doclite::common::{SortOrder, Value};
use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let mut cursor = collection.find(&doc! {}, FindOptions::new())?;
            assert_eq!(cursor.size(), 3);

            // cursors replay from the start after a reset
            cursor.reset();
            assert_eq!(cursor.size(), 3);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_equality() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            assert_eq!(collection.count_documents(&doc! { "first_name": "fn1" })?, 1);
            assert_eq!(collection.count_documents(&doc! { "last_name": "ln2" })?, 2);
            assert_eq!(collection.count_documents(&doc! { "first_name": "fn0" })?, 0);

            // implicit equality fans out over array elements
            assert_eq!(collection.count_documents(&doc! { "data": 4 })?, 2);
            assert_eq!(collection.count_documents(&doc! { "list": "four" })?, 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_comparison_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(vec![
                doc! { "age": 10 },
                doc! { "age": 20 },
                doc! { "age": 30 },
            ]);

            assert_eq!(collection.count_documents(&doc! { "age": { "$gt": 10 } })?, 2);
            assert_eq!(collection.count_documents(&doc! { "age": { "$gte": 10 } })?, 3);
            assert_eq!(collection.count_documents(&doc! { "age": { "$lt": 30 } })?, 2);
            assert_eq!(collection.count_documents(&doc! { "age": { "$lte": 10 } })?, 1);
            assert_eq!(collection.count_documents(&doc! { "age": { "$ne": 20 } })?, 2);
            assert_eq!(
                collection.count_documents(&doc! { "age": { "$gt": 10, "$lt": 30 } })?,
                1
            );

            // ints and doubles compare by numeric value
            assert_eq!(collection.count_documents(&doc! { "age": { "$gt": 10.5 } })?, 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_in_and_nin() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            assert_eq!(
                collection
                    .count_documents(&doc! { "first_name": { "$in": ["fn1", "fn2"] } })?,
                2
            );
            assert_eq!(
                collection
                    .count_documents(&doc! { "first_name": { "$nin": ["fn1", "fn2"] } })?,
                1
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_logical_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            assert_eq!(
                collection.count_documents(&doc! {
                    "$and": [{ "last_name": "ln2" }, { "first_name": "fn3" }]
                })?,
                1
            );
            assert_eq!(
                collection.count_documents(&doc! {
                    "$or": [{ "first_name": "fn1" }, { "first_name": "fn2" }]
                })?,
                2
            );
            assert_eq!(
                collection.count_documents(&doc! {
                    "$nor": [{ "first_name": "fn1" }, { "first_name": "fn2" }]
                })?,
                1
            );
            assert_eq!(
                collection
                    .count_documents(&doc! { "first_name": { "$not": { "$eq": "fn1" } } })?,
                2
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_array_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            assert_eq!(
                collection.count_documents(&doc! { "data": { "$size": 3 } })?,
                3
            );
            assert_eq!(
                collection.count_documents(&doc! { "data": { "$all": [3, 4] } })?,
                1
            );
            assert_eq!(
                collection
                    .count_documents(&doc! { "data": { "$elemMatch": { "$gt": 8 } } })?,
                1
            );
            assert_eq!(
                collection.count_documents(&doc! { "list": { "$exists": true } })?,
                2
            );
            assert_eq!(
                collection.count_documents(&doc! { "list": { "$exists": false } })?,
                1
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_on_nested_path() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(vec![
                doc! { "name": "a", "address": { "city": "Oslo", "zip": 1 } },
                doc! { "name": "b", "address": { "city": "Bergen", "zip": 2 } },
                doc! { "name": "c", "orders": [{ "total": 5 }, { "total": 9 }] },
            ]);

            assert_eq!(
                collection.count_documents(&doc! { "address.city": "Oslo" })?,
                1
            );
            // fan-out over embedded array documents
            assert_eq!(
                collection.count_documents(&doc! { "orders.total": { "$gt": 7 } })?,
                1
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_sort_skip_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(vec![
                doc! { "n": 3 },
                doc! { "n": 1 },
                doc! { "n": 2 },
            ]);

            let docs = collection
                .find(&doc! {}, order_by("n", SortOrder::Ascending))?
                .collect_documents()?;
            let values: Vec<Value> = docs.iter().map(|d| d.get("n")).collect();
            assert_eq!(values, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);

            let docs = collection
                .find(
                    &doc! {},
                    order_by("n", SortOrder::Descending).skip(1).limit(1),
                )?
                .collect_documents()?;
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].get("n"), Value::I64(2));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_projection() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let options =
                FindOptions::new().with_projection(&doc! { "first_name": 1, "_id": 0 })?;
            let docs = collection.find(&doc! {}, options)?.collect_documents()?;
            for doc in docs {
                assert!(doc.contains_field("first_name"));
                assert!(!doc.contains_field("last_name"));
                assert!(!doc.contains_field("_id"));
            }

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_missing_field_equals_null() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(vec![doc! { "a": 1 }, doc! { "a": 1, "b": 2 }]);

            assert_eq!(collection.count_documents(&doc! { "b": null })?, 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_rejects_malformed_predicate() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.find(&doc! { "age": { "$wat": 1 } }, FindOptions::new());
            assert_eq!(
                result.err().unwrap().kind(),
                &ErrorKind::InvalidPredicate
            );

            let result = collection.find(&doc! { "$and": [] }, FindOptions::new());
            assert_eq!(
                result.err().unwrap().kind(),
                &ErrorKind::InvalidPredicate
            );

            Ok(())
        },
        cleanup,
    )
}
