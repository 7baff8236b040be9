//! Relaxed Extended JSON interchange.

use bdoc::{
    Binary, DateTime, Document, Error, ObjectId, Primitive, Regex, Timestamp, from_json, to_json,
};

#[test]
fn test_every_kind_survives_json() {
    let mut doc = Document::new();
    doc.insert("double", 2.25f64);
    doc.insert("string", "s");
    doc.insert("document", [("k", 1i32)].into_iter().collect::<Document>());
    doc.insert("array", Primitive::Array(Document::array([true, false])));
    doc.insert(
        "binary",
        Binary {
            subtype: 4,
            bytes: vec![0, 1, 2, 255],
        },
    );
    doc.insert("object_id", ObjectId::from_bytes([0xEE; 12]));
    doc.insert("bool", true);
    doc.insert("datetime", DateTime::from_millis(1_234));
    doc.insert("null", Primitive::Null);
    doc.insert(
        "regex",
        Regex {
            pattern: "a+".into(),
            options: "ix".into(),
        },
    );
    doc.insert("javascript", Primitive::JavaScript("f()".into()));
    doc.insert("int32", -4i32);
    doc.insert(
        "timestamp",
        Timestamp {
            time: 10,
            increment: 1,
        },
    );
    doc.insert("int64", 1i64 << 40);
    doc.insert("min", Primitive::MinKey);
    doc.insert("max", Primitive::MaxKey);

    let text = to_json(&doc).unwrap();
    let back = from_json(&text).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_small_int64_keeps_its_width() {
    let mut doc = Document::new();
    doc.insert("n", 5i64);
    doc.insert("m", 5i32);
    let text = to_json(&doc).unwrap();
    assert_eq!(text, r#"{"n":{"$numberLong":"5"},"m":5}"#);
    let back = from_json(&text).unwrap();
    assert_eq!(back.get("n"), Some(Primitive::Int64(5)));
    assert_eq!(back.get("m"), Some(Primitive::Int32(5)));
}

#[test]
fn test_nul_in_key_is_an_error() {
    assert_eq!(
        from_json(r#"{"a\u0000b": 1}"#),
        Err(Error::InvalidCString {
            value: "a\0b".into()
        })
    );
    assert!(from_json(r#"{"outer": [{"a\u0000b": 1}]}"#).is_err());
}

#[test]
fn test_nul_in_regex_is_an_error() {
    let text = r#"{"re": {"$regularExpression": {"pattern": "x\u0000y", "options": "i"}}}"#;
    assert!(matches!(from_json(text), Err(Error::JsonParse(_))));
}

#[test]
fn test_ordinal_keys_stay_an_object_when_nested() {
    let mut inner = Document::new();
    inner.insert("0", "a");
    let mut doc = Document::new();
    doc.insert("inner", inner);
    let text = to_json(&doc).unwrap();
    assert_eq!(text, r#"{"inner":{"0":"a"}}"#);
    assert_eq!(from_json(&text).unwrap(), doc);
}

#[test]
fn test_object_id_text() {
    let doc = from_json(r#"{"_id": {"$oid": "65f1a2b3c4d5e6f708192a3b"}}"#).unwrap();
    let id: ObjectId = doc.get_as("_id").unwrap();
    assert_eq!(id.to_hex(), "65f1a2b3c4d5e6f708192a3b");
    assert_eq!(to_json(&doc).unwrap(), r#"{"_id":{"$oid":"65f1a2b3c4d5e6f708192a3b"}}"#);
}

#[cfg(feature = "chrono")]
#[test]
fn test_iso_date_string() {
    let doc = from_json(r#"{"at": {"$date": "1970-01-01T00:00:01Z"}}"#).unwrap();
    assert_eq!(
        doc.get("at"),
        Some(Primitive::DateTime(DateTime::from_millis(1_000)))
    );
}
