use doclite::common::Fields;
use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_get_name() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            assert_eq!(collection.name(), "test");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collection_handles_share_state() {
    run_test(
        create_test_context,
        |ctx| {
            let a = ctx.db().collection("test")?;
            let b = ctx.db().collection("test")?;

            a.insert_one(doc! { "n": 1 })?;
            assert_eq!(b.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_collection_name() {
    run_test(
        create_test_context,
        |ctx| {
            let result = ctx.db().collection("");
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);

            let result = ctx.db().collection("a$b");
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_list_collection_names() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.collection("one")?;
            db.collection("two")?;

            let mut names = db.list_collection_names();
            names.sort();
            assert_eq!(names, vec!["one".to_string(), "two".to_string()]);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let collection = db.collection("test")?;
            collection.insert_many(create_test_docs());
            assert!(db.has_collection("test"));

            db.drop_collection("test")?;
            assert!(!db.has_collection("test"));

            // dropping again fails
            let result = db.drop_collection("test");
            assert_eq!(
                result.err().unwrap().kind(),
                &ErrorKind::CollectionNotFound
            );

            // recreating yields an empty collection
            let collection = db.collection("test")?;
            assert_eq!(collection.size(), 0);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clear_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let collection = db.collection("test")?;
            collection.insert_many(create_test_docs());
            collection.create_index(Fields::with_names(vec!["first_name".to_string()])?, false)?;

            collection.drop();

            // still registered, but empty and unindexed
            assert!(db.has_collection("test"));
            assert_eq!(collection.size(), 0);
            assert!(collection.list_indexes().is_empty());

            Ok(())
        },
        cleanup,
    )
}
