//! Property tests over arbitrary documents.

use bdoc::{Binary, DateTime, Decimal128, Document, ObjectId, Primitive, Regex, Timestamp};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Primitive> {
    prop_oneof![numeric(), textual()]
}

fn numeric() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        (-1.0e12..1.0e12f64).prop_map(Primitive::Double),
        any::<i32>().prop_map(Primitive::Int32),
        any::<i64>().prop_map(Primitive::Int64),
        any::<bool>().prop_map(Primitive::Bool),
        any::<i64>().prop_map(|ms| Primitive::DateTime(DateTime::from_millis(ms))),
        (any::<u32>(), any::<u32>())
            .prop_map(|(time, increment)| Primitive::Timestamp(Timestamp { time, increment })),
        any::<[u8; 16]>().prop_map(|b| Primitive::Decimal128(Decimal128::from_bytes(b))),
    ]
}

fn textual() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,16}".prop_map(Primitive::String),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(subtype, bytes)| Primitive::Binary(Binary { subtype, bytes })),
        any::<[u8; 12]>().prop_map(|b| Primitive::ObjectId(ObjectId::from_bytes(b))),
        Just(Primitive::Null),
        ("[a-z^$.*]{0,8}", "[imsx]{0,3}")
            .prop_map(|(pattern, options)| Primitive::Regex(Regex { pattern, options })),
        "[a-z();]{0,12}".prop_map(Primitive::JavaScript),
        Just(Primitive::MinKey),
        Just(Primitive::MaxKey),
    ]
}

fn value() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        4 => scalar(),
        1 => prop::collection::vec(scalar(), 0..4)
            .prop_map(|values| Primitive::Array(Document::array(values))),
        1 => prop::collection::vec(("[a-z]{1,4}", scalar()), 0..4)
            .prop_map(|pairs| Primitive::Document(pairs.into_iter().collect())),
    ]
}

/// Distinct keys in arbitrary order.
fn entries() -> impl Strategy<Value = Vec<(String, Primitive)>> {
    prop::collection::btree_map("[a-z_][a-z0-9_]{0,7}", value(), 0..12)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn build(entries: &[(String, Primitive)]) -> Document {
    let mut doc = Document::new();
    for (key, value) in entries {
        doc.insert(key, value.clone());
    }
    doc
}

proptest! {
    #[test]
    fn prop_insert_then_iterate_round_trips(entries in entries()) {
        let doc = build(&entries);
        let read: Vec<(String, Primitive)> =
            doc.iter().map(|pair| (pair.key, pair.value)).collect();
        prop_assert_eq!(read, entries);
    }

    #[test]
    fn prop_count_matches_iteration(entries in entries(), removals in 0usize..6) {
        let mut doc = build(&entries);
        for (key, _) in entries.iter().take(removals) {
            doc.remove(key);
        }
        let mut iter = doc.iter();
        let mut steps = 0;
        while iter.next().is_some() {
            steps += 1;
        }
        prop_assert!(iter.is_drained());
        prop_assert_eq!(doc.count(), steps);
    }

    #[test]
    fn prop_bytes_revalidate(entries in entries()) {
        let doc = build(&entries);
        let parsed = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
        prop_assert_eq!(parsed, doc);
    }

    #[test]
    fn prop_lookup_finds_every_key(entries in entries()) {
        let doc = build(&entries);
        for (key, value) in &entries {
            let got = doc.get(key);
            prop_assert_eq!(got.as_ref(), Some(value));
        }
    }
}
