use doclite::doc;
use doclite_int_test::test_util::{cleanup, create_test_context, create_test_docs, run_test};

#[test]
fn test_delete_one() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.delete_one(&doc! { "last_name": "ln2" })?;
            assert_eq!(result.deleted_count(), 1);
            assert_eq!(collection.size(), 2);
            assert_eq!(collection.count_documents(&doc! { "last_name": "ln2" })?, 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_many() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.delete_many(&doc! { "last_name": "ln2" })?;
            assert_eq!(result.deleted_count(), 2);
            assert_eq!(collection.size(), 1);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_all() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.delete_many(&doc! {})?;
            assert_eq!(result.deleted_count(), 3);
            assert_eq!(collection.size(), 0);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_nothing_matching() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert_many(create_test_docs());

            let result = collection.delete_many(&doc! { "first_name": "nope" })?;
            assert_eq!(result.deleted_count(), 0);
            assert_eq!(collection.size(), 3);

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_by_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let id = collection.insert_one(doc! { "name": "a" })?;
            collection.insert_one(doc! { "name": "b" })?;

            let result = collection.delete_one(&doc! { "_id": id })?;
            assert_eq!(result.deleted_count(), 1);
            assert_eq!(collection.size(), 1);

            Ok(())
        },
        cleanup,
    )
}
