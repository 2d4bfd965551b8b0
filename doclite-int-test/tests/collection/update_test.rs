use doclite::collection::{insert_if_absent, UpdateOptions};
use doclite::common::Value;
use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_update_set() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.update_one(
                &doc! { "first_name": "fn1" },
                &doc! { "$set": { "last_name": "new-last-name" } },
                UpdateOptions::new(),
            )?;
            assert_eq!(result.matched_count(), 1);
            assert_eq!(result.modified_count(), 1);

            let updated = collection.find_one(&doc! { "first_name": "fn1" })?.unwrap();
            assert_eq!(updated.get("last_name").as_str(), Some("new-last-name"));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.update_many(
                &doc! { "last_name": "ln2" },
                &doc! { "$set": { "seen": true } },
                UpdateOptions::new(),
            )?;
            assert_eq!(result.matched_count(), 2);
            assert_eq!(result.modified_count(), 2);
            assert_eq!(collection.count_documents(&doc! { "seen": true })?, 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_set_nested_path() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a", "address": { "city": "Oslo" } })?;

            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$set": { "address.zip": 555 } },
                UpdateOptions::new(),
            )?;

            let updated = collection.find_one(&doc! { "name": "a" })?.unwrap();
            assert_eq!(updated.get("address.zip"), Value::I64(555));
            assert_eq!(updated.get("address.city"), Value::from("Oslo"));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_inc_and_unset() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a", "count": 10, "tmp": 1 })?;

            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$inc": { "count": 5 }, "$unset": { "tmp": "" } },
                UpdateOptions::new(),
            )?;

            let updated = collection.find_one(&doc! { "name": "a" })?.unwrap();
            assert_eq!(updated.get("count"), Value::I64(15));
            assert!(!updated.contains_field("tmp"));

            // incrementing a missing field starts from zero
            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$inc": { "visits": 1 } },
                UpdateOptions::new(),
            )?;
            let updated = collection.find_one(&doc! { "name": "a" })?.unwrap();
            assert_eq!(updated.get("visits"), Value::I64(1));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_push_and_pull() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a", "tags": ["x"] })?;

            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$push": { "tags": "y" } },
                UpdateOptions::new(),
            )?;
            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$push": { "tags": { "$each": ["z", "w"] } } },
                UpdateOptions::new(),
            )?;

            let updated = collection.find_one(&doc! { "name": "a" })?.unwrap();
            assert_eq!(
                updated.get("tags"),
                Value::Array(vec![
                    Value::from("x"),
                    Value::from("y"),
                    Value::from("z"),
                    Value::from("w"),
                ])
            );

            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$pull": { "tags": "y" } },
                UpdateOptions::new(),
            )?;
            let updated = collection.find_one(&doc! { "name": "a" })?.unwrap();
            assert_eq!(
                updated.get("tags"),
                Value::Array(vec![Value::from("x"), Value::from("z"), Value::from("w")])
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_noop_counts_as_matched_only() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a", "count": 10 })?;

            let result = collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$set": { "count": 10 } },
                UpdateOptions::new(),
            )?;
            assert_eq!(result.matched_count(), 1);
            assert_eq!(result.modified_count(), 0);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_upsert_inserts_when_nothing_matches() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let result = collection.update_one(
                &doc! { "name": "ghost", "kind": "spirit" },
                &doc! { "$set": { "seen": false } },
                insert_if_absent(),
            )?;
            assert_eq!(result.matched_count(), 0);
            assert!(result.upserted_id().is_some());

            // seeded from the selector's equality constraints, then updated
            let inserted = collection.find_one(&doc! { "name": "ghost" })?.unwrap();
            assert_eq!(inserted.get("kind").as_str(), Some("spirit"));
            assert_eq!(inserted.get("seen").as_bool(), Some(false));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_upsert_does_not_insert_on_match() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a" })?;

            let result = collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$set": { "seen": true } },
                insert_if_absent(),
            )?;
            assert_eq!(result.matched_count(), 1);
            assert!(result.upserted_id().is_none());
            assert_eq!(collection.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_rejects_id_change() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "_id": 1, "name": "a" })?;

            let result = collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$set": { "_id": 2 } },
                UpdateOptions::new(),
            );
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidUpdate);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_rejects_unknown_operator() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let result = collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$rename": { "name": "title" } },
                UpdateOptions::new(),
            );
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidUpdate);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_one_keeps_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "_id": 7, "name": "a", "count": 1 })?;

            let result = collection.replace_one(
                &doc! { "name": "a" },
                doc! { "name": "b" },
                UpdateOptions::new(),
            )?;
            assert_eq!(result.matched_count(), 1);
            assert_eq!(result.modified_count(), 1);

            let replaced = collection.find_one(&doc! { "_id": 7 })?.unwrap();
            assert_eq!(replaced.get("name").as_str(), Some("b"));
            assert!(!replaced.contains_field("count"));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_one_rejects_foreign_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "_id": 7, "name": "a" })?;

            let result = collection.replace_one(
                &doc! { "name": "a" },
                doc! { "_id": 8, "name": "b" },
                UpdateOptions::new(),
            );
            assert_eq!(
                result.err().unwrap().kind(),
                &ErrorKind::IdentifierMismatch
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_one_rejects_operator_document() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_one(doc! { "name": "a" })?;

            let result = collection.replace_one(
                &doc! { "name": "a" },
                doc! { "$set": { "name": "b" } },
                UpdateOptions::new(),
            );
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidUpdate);

            Ok(())
        },
        cleanup,
    )
}
