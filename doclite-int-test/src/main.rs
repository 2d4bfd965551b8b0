use doclite::collection::FindOptions;
use doclite::doc;
use doclite::errors::EngineResult;
use doclite_int_test::test_util::create_test_context;
use rand::Rng;

fn main() -> EngineResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let collection = ctx.db().collection("stress")?;

    let count = 1_000_000;
    let mut rng = rand::thread_rng();

    let start = std::time::Instant::now();
    for i in 0..count {
        let tag: i64 = rng.gen_range(0..1000);
        collection.insert_one(doc! {
            "sequence": i,
            "tag": tag,
            "processed": false,
        })?;
    }
    println!("Inserted {} documents in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut cursor = collection.find(&doc! { "processed": false }, FindOptions::new())?;
    println!("Scanned {} documents in {:?}", cursor.size(), start.elapsed());

    collection.create_index(
        doclite::common::Fields::with_names(vec!["tag".to_string()])?,
        false,
    )?;
    let start = std::time::Instant::now();
    let hits = collection.count_documents(&doc! { "tag": 42 })?;
    println!("Found {} documents by index in {:?}", hits, start.elapsed());

    Ok(())
}
