//! Build, mutate and convert a document, logging splices.
//!
//! RUST_LOG=bdoc=trace cargo run --package bdoc --example document_tour

use bdoc::{Document, DocumentIndex, Primitive, from_document, to_document, to_json};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct User {
    name: String,
    age: i32,
    tags: Vec<String>,
}

fn main() -> Result<(), bdoc::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = to_document(&User {
        name: "Amy".into(),
        age: 30,
        tags: vec!["admin".into()],
    })?;
    let snapshot = doc.clone();

    // same key: in place
    doc.set_pair_at(DocumentIndex::new(1), "age", 31i32);
    // new key: moves to the end
    doc.set_pair_at(DocumentIndex::new(0), "display_name", "amy");
    doc.assign("tags", None);
    doc.insert("tags", Primitive::Array(Document::array(["admin", "ops"])));

    println!("before: {}", to_json(&snapshot)?);
    println!("after:  {}", to_json(&doc)?);

    for pair in &doc {
        println!("{} {} = {:?}", pair.index, pair.key, pair.value);
    }

    doc.insert("name", Primitive::String("Amy".into()));
    let user: User = from_document(doc)?;
    println!("{user:?}");
    Ok(())
}
