use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_insert() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let document = doc! {
                "first_name": "John",
                "last_name": "Doe",
                "birth_day": 1234567890,
                "data": [1, 2, 3],
                "body": "This is a test document",
            };

            let id = collection.insert_one(document)?;
            assert!(id.is_id());

            let mut cursor = collection.find(&doc! {}, Default::default())?;
            for document in &mut cursor {
                let document = document?;
                assert_eq!(document.get("first_name").as_str(), Some("John"));
                assert_eq!(document.get("last_name").as_str(), Some("Doe"));
                assert!(!document.get("birth_day").is_null());
                assert!(!document.get("data").is_null());
                assert!(!document.get("body").is_null());
                assert!(!document.get("_id").is_null());
            }

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_batch() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let result = collection.insert_many(create_test_docs());
            assert_eq!(result.inserted_count(), 3);
            assert!(result.first_error().is_none());

            let mut cursor = collection.find(&doc! {}, Default::default())?;
            for document in &mut cursor {
                let document = document?;
                assert!(!document.get("first_name").is_null());
                assert!(!document.get("last_name").is_null());
                assert!(!document.get("birth_day").is_null());
                assert!(!document.get("_id").is_null());
            }

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_keeps_caller_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let id = collection.insert_one(doc! { "_id": 42, "name": "a" })?;
            assert_eq!(id.as_i64(), Some(42));

            let found = collection.find_one(&doc! { "_id": 42 })?;
            assert!(found.is_some());

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_rejects_composite_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let result = collection.insert_one(doc! { "_id": [1, 2], "name": "a" });
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidId);

            let result = collection.insert_one(doc! { "_id": { "a": 1 }, "name": "b" });
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidId);

            assert_eq!(collection.size(), 0);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_duplicate_id_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            collection.insert_one(doc! { "_id": 1, "name": "a" })?;
            let result = collection.insert_one(doc! { "_id": 1, "name": "b" });
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::DuplicateKey);

            // the stored document is untouched
            let found = collection.find_one(&doc! { "_id": 1 })?.unwrap();
            assert_eq!(found.get("name").as_str(), Some("a"));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_batch_reports_first_error() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let result = collection.insert_many(vec![
                doc! { "_id": 1, "n": 1 },
                doc! { "_id": 1, "n": 2 },
                doc! { "_id": 2, "n": 3 },
            ]);

            // the failing document is skipped, the rest still land
            assert_eq!(result.inserted_count(), 2);
            assert_eq!(
                result.first_error().unwrap().kind(),
                &ErrorKind::DuplicateKey
            );
            assert_eq!(collection.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_heterogeneous_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let mut docs = create_test_docs();
            docs.push(doc! { "test": "doclite test" });

            let result = collection.insert_many(docs);
            assert_eq!(result.inserted_count(), 4);
            assert_eq!(collection.size(), 4);

            Ok(())
        },
        cleanup,
    )
}
