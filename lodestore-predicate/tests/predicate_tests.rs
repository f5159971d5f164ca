use lodestore_predicate::{
    to_remote_filter, ModelPredicate, Operator, PredicateBuilder, PredicateError, PredicateLeaf,
};
use lodestore_schema::{ModelField, SchemaModel};
use lodestore_types::Record;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn post_model() -> SchemaModel {
    SchemaModel::new(
        "Post",
        vec![
            ModelField::id("id"),
            ModelField::string("title"),
            ModelField::int("rating"),
            ModelField::bool("draft"),
            ModelField::string("tags").array(),
        ],
    )
}

fn post(title: &str, rating: i64) -> Record {
    Record::from_value(json!({
        "id": "p1",
        "title": title,
        "rating": rating,
        "draft": false,
        "tags": ["tech", "rust"],
    }))
    .unwrap()
}

// ── Leaf semantics ────────────────────────────────────────────────

#[test]
fn eq_matches_identical_value() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("title", Operator::Eq, "Hello")
        .unwrap()
        .build();
    assert!(p.matches(&post("Hello", 3)));
    assert!(!p.matches(&post("Other", 3)));
}

#[test]
fn ne_matches_different_and_missing() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("title", Operator::Ne, "Hello")
        .unwrap()
        .build();
    assert!(!p.matches(&post("Hello", 3)));
    assert!(p.matches(&post("Other", 3)));
    let no_title = Record::from_value(json!({ "id": "p1" })).unwrap();
    assert!(p.matches(&no_title));
}

#[test]
fn numeric_ordering_operators() {
    let model = post_model();
    let ge = PredicateBuilder::new(&model)
        .field("rating", Operator::Ge, 4)
        .unwrap()
        .build();
    assert!(ge.matches(&post("T", 4)));
    assert!(ge.matches(&post("T", 9)));
    assert!(!ge.matches(&post("T", 3)));
}

#[test]
fn between_is_inclusive() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .between("rating", 2, 4)
        .unwrap()
        .build();
    assert!(!p.matches(&post("T", 1)));
    assert!(p.matches(&post("T", 2)));
    assert!(p.matches(&post("T", 3)));
    assert!(p.matches(&post("T", 4)));
    assert!(!p.matches(&post("T", 5)));
}

#[test]
fn begins_with_and_contains_on_strings() {
    let model = post_model();
    let begins = PredicateBuilder::new(&model)
        .field("title", Operator::BeginsWith, "He")
        .unwrap()
        .build();
    assert!(begins.matches(&post("Hello", 1)));
    assert!(!begins.matches(&post("Oh Hello", 1)));

    let contains = PredicateBuilder::new(&model)
        .field("title", Operator::Contains, "ell")
        .unwrap()
        .build();
    assert!(contains.matches(&post("Hello", 1)));
    assert!(!contains.matches(&post("Goodbye", 1)));
}

#[test]
fn contains_is_membership_on_arrays() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("tags", Operator::Contains, "rust")
        .unwrap()
        .build();
    assert!(p.matches(&post("T", 1)));

    let not = PredicateBuilder::new(&model)
        .field("tags", Operator::NotContains, "golf")
        .unwrap()
        .build();
    assert!(not.matches(&post("T", 1)));
}

// ── Group semantics ───────────────────────────────────────────────

#[test]
fn and_requires_all_children() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("title", Operator::Eq, "Hello")
        .unwrap()
        .field("rating", Operator::Gt, 2)
        .unwrap()
        .build();
    assert!(p.matches(&post("Hello", 3)));
    assert!(!p.matches(&post("Hello", 1)));
}

#[test]
fn or_requires_any_child() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .or(|b| {
            b.field("title", Operator::Eq, "A")?
                .field("title", Operator::Eq, "B")
        })
        .unwrap()
        .build();
    assert!(p.matches(&post("A", 1)));
    assert!(p.matches(&post("B", 1)));
    assert!(!p.matches(&post("C", 1)));
}

#[test]
fn not_negates_child_group() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .not(|b| b.field("title", Operator::Eq, "Hello"))
        .unwrap()
        .build();
    assert!(!p.matches(&post("Hello", 1)));
    assert!(p.matches(&post("Other", 1)));
}

#[test]
fn match_all_accepts_everything() {
    let p = ModelPredicate::all();
    assert!(p.matches(&post("Anything", 0)));
    assert!(p.matches(&Record::new()));
}

#[test]
fn empty_conjunction_accepts_everything() {
    let model = post_model();
    let p = PredicateBuilder::new(&model).build();
    assert!(p.matches(&post("T", 1)));
}

// ── Validation ────────────────────────────────────────────────────

#[test]
fn unknown_field_is_error() {
    let model = post_model();
    let err = PredicateBuilder::new(&model)
        .field("nope", Operator::Eq, 1)
        .unwrap_err();
    assert!(matches!(err, PredicateError::UnknownField { .. }));
}

#[test]
fn begins_with_on_numeric_field_is_error() {
    let model = post_model();
    let err = PredicateBuilder::new(&model)
        .field("rating", Operator::BeginsWith, "4")
        .unwrap_err();
    assert!(matches!(err, PredicateError::OperatorNotSupported { .. }));
}

#[test]
fn ordering_on_boolean_field_is_error() {
    let model = post_model();
    let err = PredicateBuilder::new(&model)
        .field("draft", Operator::Lt, true)
        .unwrap_err();
    assert!(matches!(err, PredicateError::OperatorNotSupported { .. }));
}

#[test]
fn between_on_array_field_is_error() {
    let model = post_model();
    assert!(PredicateBuilder::new(&model).between("tags", "a", "z").is_err());
}

// ── Serde round-trips ─────────────────────────────────────────────

#[test]
fn between_survives_serde_roundtrip() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .between("rating", 2, 4)
        .unwrap()
        .build();
    let back: ModelPredicate =
        serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
    assert_eq!(back, p);
    // The revived range must still evaluate as an inclusive range, not as
    // an equality against the `[lo, hi]` array.
    assert!(back.matches(&post("T", 3)));
    assert!(!back.matches(&post("T", 5)));
}

#[test]
fn mixed_group_survives_serde_roundtrip() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("title", Operator::BeginsWith, "He")
        .unwrap()
        .or(|b| {
            b.between("rating", 2, 4)?
                .field("draft", Operator::Eq, false)
        })
        .unwrap()
        .build();
    let back: ModelPredicate =
        serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
    assert_eq!(back, p);
}

#[test]
fn between_leaf_rejects_non_range_operand() {
    let malformed = json!({ "field": "rating", "operator": "between", "operand": 3 });
    assert!(serde_json::from_value::<PredicateLeaf>(malformed).is_err());
    let short = json!({ "field": "rating", "operator": "between", "operand": [2] });
    assert!(serde_json::from_value::<PredicateLeaf>(short).is_err());
}

// ── Remote filter translation ─────────────────────────────────────

#[test]
fn match_all_translates_to_no_filter() {
    assert_eq!(to_remote_filter(&ModelPredicate::all()), None);
}

#[test]
fn leaf_and_group_filter_shape() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .field("title", Operator::BeginsWith, "He")
        .unwrap()
        .between("rating", 2, 4)
        .unwrap()
        .build();
    let filter = to_remote_filter(&p).unwrap();
    assert_eq!(
        filter,
        json!({ "and": [
            { "title": { "beginsWith": "He" } },
            { "rating": { "between": [2, 4] } },
        ]})
    );
}

#[test]
fn not_filter_shape() {
    let model = post_model();
    let p = PredicateBuilder::new(&model)
        .not(|b| b.field("draft", Operator::Eq, true))
        .unwrap()
        .build();
    let filter = to_remote_filter(&p).unwrap();
    assert_eq!(
        filter,
        json!({ "and": [ { "not": { "and": [ { "draft": { "eq": true } } ] } } ] })
    );
}

// ── Property: eq mirrors strict equality, between mirrors range ───

proptest! {
    #[test]
    fn eq_law(stored in any::<i64>(), probe in any::<i64>()) {
        let model = post_model();
        let record = post("T", stored);
        let p = PredicateBuilder::new(&model)
            .field("rating", Operator::Eq, probe)
            .unwrap()
            .build();
        prop_assert_eq!(p.matches(&record), stored == probe);
    }

    #[test]
    fn between_law(stored in -1000i64..1000, lo in -1000i64..1000, hi in -1000i64..1000) {
        let model = post_model();
        let record = post("T", stored);
        let p = PredicateBuilder::new(&model).between("rating", lo, hi).unwrap().build();
        prop_assert_eq!(p.matches(&record), lo <= stored && stored <= hi);
    }
}
