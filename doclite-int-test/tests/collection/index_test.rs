use doclite::common::Fields;
use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

fn fields(names: &[&str]) -> Fields {
    Fields::with_names(names.iter().map(|n| n.to_string()).collect()).unwrap()
}

#[test]
fn test_create_and_list_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;

            let descriptor = collection.create_index(fields(&["first_name"]), false)?;
            assert_eq!(descriptor.index_name(), "idx_first_name");
            assert!(!descriptor.is_unique());
            assert!(!descriptor.is_compound());

            collection.create_index(fields(&["last_name", "first_name"]), false)?;

            let indexes = collection.list_indexes();
            assert_eq!(indexes.len(), 2);
            // creation order is preserved
            assert_eq!(indexes[0].index_name(), "idx_first_name");
            assert_eq!(indexes[1].index_name(), "idx_last_name_first_name");
            assert!(indexes[1].is_compound());

            assert!(collection.has_index(&fields(&["first_name"])));
            assert!(!collection.has_index(&fields(&["body"])));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_create_index_on_existing_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            collection.create_index(fields(&["last_name"]), false)?;

            let mut cursor = collection.find(&doc! { "last_name": "ln2" }, Default::default())?;
            assert_eq!(
                cursor.plan().unwrap().index_name(),
                Some("idx_last_name")
            );
            assert_eq!(cursor.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_duplicate_index_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["first_name"]), false)?;

            let result = collection.create_index(fields(&["first_name"]), true);
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::IndexConflict);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_index() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["first_name"]), false)?;

            collection.drop_index(&fields(&["first_name"]))?;
            assert!(!collection.has_index(&fields(&["first_name"])));

            let result = collection.drop_index(&fields(&["first_name"]));
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::IndexNotFound);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_rejects_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["email"]), true)?;

            collection.insert_one(doc! { "email": "a@x", "n": 1 })?;
            let result = collection.insert_one(doc! { "email": "a@x", "n": 2 });
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::DuplicateKey);
            assert_eq!(collection.size(), 1);

            // a different key is fine
            collection.insert_one(doc! { "email": "b@x", "n": 2 })?;
            assert_eq!(collection.size(), 2);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_build_fails_on_existing_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(vec![
                doc! { "email": "a@x" },
                doc! { "email": "a@x" },
            ]);

            let result = collection.create_index(fields(&["email"]), true);
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::DuplicateKey);
            assert!(!collection.has_index(&fields(&["email"])));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_checked_on_update() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["email"]), true)?;
            collection.insert_one(doc! { "email": "a@x" })?;
            collection.insert_one(doc! { "email": "b@x" })?;

            let result = collection.update_one(
                &doc! { "email": "b@x" },
                &doc! { "$set": { "email": "a@x" } },
                Default::default(),
            )?;
            assert_eq!(result.first_error().unwrap().kind(), &ErrorKind::DuplicateKey);

            // the conflicting write did not go through
            assert_eq!(collection.count_documents(&doc! { "email": "b@x" })?, 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_maintained_across_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["city"]), false)?;

            collection.insert_one(doc! { "name": "a", "city": "Oslo" })?;
            collection.insert_one(doc! { "name": "b", "city": "Oslo" })?;

            collection.update_one(
                &doc! { "name": "a" },
                &doc! { "$set": { "city": "Bergen" } },
                Default::default(),
            )?;
            assert_eq!(collection.count_documents(&doc! { "city": "Oslo" })?, 1);
            assert_eq!(collection.count_documents(&doc! { "city": "Bergen" })?, 1);

            collection.delete_one(&doc! { "name": "b" })?;
            assert_eq!(collection.count_documents(&doc! { "city": "Oslo" })?, 0);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multikey_index_over_arrays() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index(fields(&["tags"]), false)?;

            collection.insert_one(doc! { "name": "a", "tags": ["red", "blue"] })?;
            collection.insert_one(doc! { "name": "b", "tags": ["blue"] })?;

            let mut cursor = collection.find(&doc! { "tags": "blue" }, Default::default())?;
            assert_eq!(cursor.plan().unwrap().index_name(), Some("idx_tags"));
            assert_eq!(cursor.size(), 2);

            let mut cursor = collection.find(&doc! { "tags": "red" }, Default::default())?;
            assert_eq!(cursor.size(), 1);

            Ok(())
        },
        cleanup,
    )
}
