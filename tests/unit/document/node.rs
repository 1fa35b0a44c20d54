use super::*;

#[test]
fn parse_keeps_document_key_order() {
    let doc = DocumentNode::from_json_str(r#"{"z": 1, "a": 2, "m": {"y": true, "b": null}}"#)
        .unwrap();
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);

    let inner: Vec<&str> = doc
        .get("m")
        .and_then(DocumentNode::as_object)
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(inner, vec!["y", "b"]);
}

#[test]
fn parse_maps_json_shapes_onto_variants() {
    let doc =
        DocumentNode::from_json_str(r#"{"n": null, "b": false, "i": 7, "f": 1.5, "s": "x", "a": [1, {}]}"#)
            .unwrap();
    assert_eq!(doc.get("n"), Some(&DocumentNode::Leaf(Scalar::Null)));
    assert_eq!(doc.get("b"), Some(&DocumentNode::Leaf(Scalar::Bool(false))));
    assert_eq!(doc.get("i").and_then(DocumentNode::as_u64), Some(7));
    assert!(matches!(doc.get("f"), Some(DocumentNode::Leaf(Scalar::Number(_)))));
    assert_eq!(doc.get("s").and_then(DocumentNode::as_text), Some("x"));
    let Some(DocumentNode::Array(items)) = doc.get("a") else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 2);
    assert!(items[0].is_leaf());
    assert!(items[1].as_object().is_some());
}

#[test]
fn serialize_round_trips_json_text() {
    let src = r#"{"title":"t","contents":[{"obj_type":"Image","params":{"src":"a.png","w":3}}]}"#;
    let doc = DocumentNode::from_json_str(src).unwrap();
    assert_eq!(doc.to_json_string().unwrap(), src);
}

#[test]
fn invalid_json_is_validation_error() {
    let err = DocumentNode::from_json_str("{").unwrap_err();
    assert!(matches!(err, PackError::Validation(_)));
}

#[test]
fn default_is_empty_object() {
    let doc = DocumentNode::default();
    assert!(doc.as_object().unwrap().is_empty());
    assert_eq!(doc.to_json_string().unwrap(), "{}");
}
