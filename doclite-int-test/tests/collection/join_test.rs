use doclite::common::Value;
use doclite::doc;
use doclite::errors::ErrorKind;
use doclite_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};

fn seed(ctx: &TestContext) -> doclite::errors::EngineResult<()> {
    let customers = ctx.db().collection("customers")?;
    customers.insert_many(vec![
        doc! { "_id": 1, "name": "Ann" },
        doc! { "_id": 2, "name": "Ben" },
        doc! { "_id": 3, "name": "Cam" },
    ]);

    let orders = ctx.db().collection("orders")?;
    orders.insert_many(vec![
        doc! { "customer": 1, "item": "apple" },
        doc! { "customer": 1, "item": "plum" },
        doc! { "customer": 2, "item": "pear" },
    ]);
    Ok(())
}

#[test]
fn test_lookup_joins_matching_documents() {
    run_test(
        create_test_context,
        |ctx| {
            seed(&ctx)?;
            let customers = ctx.db().collection("customers")?;

            let out = customers
                .aggregate(&[doc! { "$lookup": {
                    "from": "orders",
                    "localField": "_id",
                    "foreignField": "customer",
                    "as": "orders",
                } }])?
                .collect_documents()?;

            assert_eq!(out.len(), 3);
            match out[0].get("orders") {
                Value::Array(orders) => assert_eq!(orders.len(), 2),
                other => panic!("expected array, got {}", other),
            }
            match out[1].get("orders") {
                Value::Array(orders) => assert_eq!(orders.len(), 1),
                other => panic!("expected array, got {}", other),
            }
            // unmatched documents still carry the field, as an empty array
            assert_eq!(out[2].get("orders"), Value::Array(Vec::new()));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lookup_then_group() {
    run_test(
        create_test_context,
        |ctx| {
            seed(&ctx)?;
            let orders = ctx.db().collection("orders")?;

            let out = orders
                .aggregate(&[
                    doc! { "$lookup": {
                        "from": "customers",
                        "localField": "customer",
                        "foreignField": "_id",
                        "as": "who",
                    } },
                    doc! { "$group": { "_id": "$customer", "n": { "$sum": 1 } } },
                ])?
                .collect_documents()?;

            assert_eq!(out.len(), 2);
            assert_eq!(out[0].get("_id"), Value::I64(1));
            assert_eq!(out[0].get("n"), Value::I64(2));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lookup_matches_array_membership() {
    run_test(
        create_test_context,
        |ctx| {
            let teams = ctx.db().collection("teams")?;
            teams.insert_one(doc! { "name": "ops", "members": ["ann", "ben"] })?;

            let people = ctx.db().collection("people")?;
            people.insert_many(vec![doc! { "user": "ann" }, doc! { "user": "cam" }]);

            let out = people
                .aggregate(&[doc! { "$lookup": {
                    "from": "teams",
                    "localField": "user",
                    "foreignField": "members",
                    "as": "teams",
                } }])?
                .collect_documents()?;

            match out[0].get("teams") {
                Value::Array(teams) => assert_eq!(teams.len(), 1),
                other => panic!("expected array, got {}", other),
            }
            assert_eq!(out[1].get("teams"), Value::Array(Vec::new()));

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lookup_unknown_collection_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let customers = ctx.db().collection("customers")?;
            customers.insert_one(doc! { "name": "Ann" })?;

            let result = customers.aggregate(&[doc! { "$lookup": {
                "from": "nowhere",
                "localField": "_id",
                "foreignField": "customer",
                "as": "x",
            } }]);
            assert_eq!(
                result.err().unwrap().kind(),
                &ErrorKind::CollectionNotFound
            );

            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lookup_missing_field_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let customers = ctx.db().collection("customers")?;

            let result = customers.aggregate(&[doc! { "$lookup": {
                "from": "orders",
                "localField": "_id",
                "as": "orders",
            } }]);
            assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidPipeline);

            Ok(())
        },
        cleanup,
    )
}
