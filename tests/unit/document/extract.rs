use proptest::prelude::*;

use super::*;

fn doc(json: &str) -> DocumentNode {
    DocumentNode::from_json_str(json).unwrap()
}

#[test]
fn empty_tree_yields_nothing() {
    assert!(extract_image_sources(&doc("{}")).is_empty());
    assert!(extract_image_sources(&doc("[]")).is_empty());
    assert!(extract_image_sources(&doc("\"Image\"")).is_empty());
}

#[test]
fn tree_without_images_yields_nothing() {
    let d = doc(
        r#"{"title": "x", "contents": [{"obj_type": "Paragraph", "params": {"text": "hi", "src": "no.png"}}]}"#,
    );
    assert!(extract_image_sources(&d).is_empty());
}

#[test]
fn sibling_images_follow_key_order() {
    let d = doc(
        r#"{"a": {"obj_type": "Image", "params": {"src": "img/x.png"}},
            "b": {"obj_type": "Image", "params": {"src": "img/y.png"}}}"#,
    );
    assert_eq!(extract_image_sources(&d), vec!["img/x.png", "img/y.png"]);
}

#[test]
fn nested_tables_and_arrays_are_searched() {
    let d = doc(
        r#"{"contents": [
            {"obj_type": "Image", "params": {"src": "top.jpg"}},
            {"obj_type": "Table", "params": {"rows": [
                {"obj_type": "Row", "params": {"cells": [
                    {"obj_type": "Cell", "params": {"contents": [
                        {"obj_type": "Image", "params": {"src": "cell.png", "fit_width": true}}
                    ]}}
                ]}}
            ]}},
            {"obj_type": "Image", "params": {"src": "bottom.gif"}}
        ]}"#,
    );
    assert_eq!(
        extract_image_sources(&d),
        vec!["top.jpg", "cell.png", "bottom.gif"]
    );
}

#[test]
fn duplicates_are_preserved() {
    let d = doc(
        r#"[{"obj_type": "Image", "params": {"src": "a.png"}},
            {"obj_type": "Image", "params": {"src": "b.png"}},
            {"obj_type": "Image", "params": {"src": "a.png"}}]"#,
    );
    assert_eq!(extract_image_sources(&d), vec!["a.png", "b.png", "a.png"]);
}

#[test]
fn malformed_references_are_skipped() {
    let d = doc(
        r#"[{"obj_type": "Image"},
            {"obj_type": "Image", "params": {}},
            {"obj_type": "Image", "params": {"src": ""}},
            {"obj_type": "Image", "params": {"src": 12}},
            {"obj_type": "Image", "params": "src"},
            {"obj_type": "Image", "params": {"src": "ok.png"}}]"#,
    );
    assert_eq!(extract_image_sources(&d), vec!["ok.png"]);
}

#[test]
fn marker_must_be_a_leaf_under_obj_type() {
    let d = doc(
        r#"{"kind": "Image", "params": {"src": "nope.png"},
            "obj_type": {"value": "Image"},
            "inner": {"obj_type": "image", "params": {"src": "case.png"}}}"#,
    );
    assert!(extract_image_sources(&d).is_empty());
}

#[test]
fn image_params_are_searched_for_nested_images() {
    let d = doc(
        r#"{"obj_type": "Image", "params": {"src": "outer.png",
            "caption": {"obj_type": "Image", "params": {"src": "inner.png"}}}}"#,
    );
    assert_eq!(extract_image_sources(&d), vec!["outer.png", "inner.png"]);
}

#[test]
fn unique_sources_keeps_first_occurrence() {
    let sources: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
    assert_eq!(unique_sources(&sources), vec!["b", "a", "c"]);
    assert!(unique_sources(&[]).is_empty());
}

/// Generated tree shape; `Image` leaves become image nodes when built.
#[derive(Clone, Debug)]
enum Shape {
    Number(u64),
    Text(String),
    Image(String),
    Object(Vec<Shape>),
    Array(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        any::<u64>().prop_map(Shape::Number),
        "[A-Za-z]{0,6}".prop_map(Shape::Text),
        "[a-z]{1,5}\\.png".prop_map(Shape::Image),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Shape::Object),
            prop::collection::vec(inner, 0..5).prop_map(Shape::Array),
        ]
    })
}

/// Build the node for `shape`, recording planted sources in document order.
fn build(shape: &Shape, planted: &mut Vec<String>) -> DocumentNode {
    match shape {
        Shape::Number(n) => DocumentNode::uint(*n),
        Shape::Text(t) => DocumentNode::text(t.clone()),
        Shape::Image(src) => {
            planted.push(src.clone());
            let mut params = ObjectMap::new();
            params.insert(SRC_KEY.to_string(), DocumentNode::text(src.clone()));
            let mut node = ObjectMap::new();
            node.insert(OBJ_TYPE_KEY.to_string(), DocumentNode::text(IMAGE_OBJ_TYPE));
            node.insert(PARAMS_KEY.to_string(), DocumentNode::Object(params));
            DocumentNode::Object(node)
        }
        Shape::Object(children) => DocumentNode::Object(
            children
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("k{i}"), build(c, planted)))
                .collect(),
        ),
        Shape::Array(children) => {
            DocumentNode::Array(children.iter().map(|c| build(c, planted)).collect())
        }
    }
}

proptest! {
    #[test]
    fn extraction_finds_exactly_the_planted_sources(s in shape()) {
        let mut planted = Vec::new();
        let root = build(&s, &mut planted);

        let found = extract_image_sources(&root);
        prop_assert_eq!(&found, &planted);

        let reparsed = DocumentNode::from_json_str(&root.to_json_string().unwrap()).unwrap();
        prop_assert_eq!(extract_image_sources(&reparsed), found);
    }
}
