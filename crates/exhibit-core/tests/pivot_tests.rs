mod common;

use std::sync::Arc;

use common::long_frame;
use exhibit_core::{
    Calculator, Exhibit, ExhibitError, FieldType, Functor, IdentityFunctor,
    LookupCalculator, ObsDescriptor, PivotCalculator, PivotFunctor, PivotKey, SimpleFrame,
    UpdatableFrame, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn one_key_two_rows_yield_one_row() {
    let exhibit = long_frame("t", &[("p", "v1", 1.5), ("p", "v2", 2.5)]);
    let mut pivot = PivotCalculator::new(
        Box::new(LookupCalculator::new("t")),
        vec!["id".to_string()],
        vec![PivotKey::new("key", ["v1", "v2"])],
    );
    pivot.initialize(&exhibit.descriptor()).unwrap();

    let out = pivot.apply(&exhibit).unwrap();
    assert_eq!(out.size(), 1);
    let row = out.get(0).unwrap();
    assert_eq!(row.get_by_name("score_v1").unwrap(), &Value::from(1.5));
    assert_eq!(row.get_by_name("score_v2").unwrap(), &Value::from(2.5));
}

fn two_key_exhibit() -> Exhibit {
    let desc = ObsDescriptor::builder()
        .string_field("sex")
        .string_field("arm")
        .long_field("n")
        .double_field("mean")
        .build()
        .unwrap();
    let rows = [("f", "a", 10, 1.0), ("f", "b", 11, 2.0), ("m", "a", 12, 3.0)]
        .iter()
        .map(|(sex, arm, n, mean)| {
            vec![
                Value::from(*sex),
                Value::from(*arm),
                Value::from(*n as i64),
                Value::from(*mean),
            ]
        })
        .collect();
    Exhibit::of_frame(
        "stats",
        Arc::new(SimpleFrame::from_values(desc, rows).unwrap()),
    )
}

#[test]
fn two_keys_give_one_column_group_per_combination() {
    let exhibit = two_key_exhibit();
    let mut pivot = PivotCalculator::new(
        Box::new(LookupCalculator::new("stats")),
        Vec::new(),
        vec![PivotKey::new("sex", ["f", "m"]), PivotKey::new("arm", ["a", "b"])],
    );
    let desc = pivot.initialize(&exhibit.descriptor()).unwrap();
    assert_eq!(
        desc.names().collect::<Vec<_>>(),
        vec![
            "n_f_a", "mean_f_a", "n_f_b", "mean_f_b", "n_m_a", "mean_m_a", "n_m_b", "mean_m_b",
        ]
    );
    assert_eq!(desc.get(1).unwrap().field_type, FieldType::Double);

    let out = pivot.apply(&exhibit).unwrap();
    assert_eq!(
        out.get(0).unwrap().to_string(),
        "[10,1,11,2,12,3,null,null]"
    );
}

#[test]
fn colliding_column_names_are_rejected() {
    let desc = ObsDescriptor::builder()
        .string_field("k")
        .int_field("v")
        .int_field("v_a")
        .build()
        .unwrap();
    let exhibit = Exhibit::of_frame("t", Arc::new(SimpleFrame::empty(desc)));
    let mut pivot = PivotCalculator::new(
        Box::new(LookupCalculator::new("t")),
        vec!["v_a".to_string()],
        vec![PivotKey::new("k", ["a"])],
    );
    assert!(matches!(
        pivot.initialize(&exhibit.descriptor()),
        Err(ExhibitError::DuplicateField { name }) if name == "v_a"
    ));
}

#[test]
fn empty_source_yields_row_of_nulls() {
    let exhibit = long_frame("t", &[]);
    let mut pivot = PivotCalculator::new(
        Box::new(LookupCalculator::new("t")),
        vec!["id".to_string()],
        vec![PivotKey::new("key", ["v1"])],
    );
    pivot.initialize(&exhibit.descriptor()).unwrap();
    let out = pivot.apply(&exhibit).unwrap();
    assert_eq!(out.get(0).unwrap().to_string(), "[null,null]");
}

#[test]
fn initialized_pivot_follows_refreshed_frame() {
    let desc = ObsDescriptor::of(&[("key", FieldType::String), ("score", FieldType::Double)])
        .unwrap();
    let frame = Arc::new(UpdatableFrame::new(desc.clone()));
    let exhibit = Exhibit::of_frame("t", frame.clone());
    let mut pivot = PivotCalculator::single_key(
        Box::new(LookupCalculator::new("t")),
        PivotKey::new("key", ["v1"]),
    );
    pivot.initialize(&exhibit.descriptor()).unwrap();

    let batch = |score: f64| {
        exhibit_core::Obs::new(desc.clone(), vec![Value::from("v1"), Value::from(score)]).unwrap()
    };
    frame.update_values(vec![batch(1.0)]).unwrap();
    assert_eq!(pivot.apply(&exhibit).unwrap().get(0).unwrap().to_string(), "[1]");
    frame.update_values(vec![batch(2.0)]).unwrap();
    assert_eq!(pivot.apply(&exhibit).unwrap().get(0).unwrap().to_string(), "[2]");
}

#[test]
fn functor_replaces_frame_and_keeps_the_rest() {
    let mut exhibit = long_frame(
        "t",
        &[("p", "v1", 1.0), ("q", "v1", 3.0), ("p", "v2", 2.0)],
    );
    exhibit = exhibit.with_frame("other", Arc::new(SimpleFrame::empty(ObsDescriptor::empty())));
    let mut pivot = PivotFunctor::new(
        "t",
        Box::new(IdentityFunctor::new()),
        vec!["id".to_string()],
        vec![PivotKey::new("key", ["v1", "v2"])],
    );
    pivot.initialize(&exhibit.descriptor()).unwrap();
    let out = pivot.apply(&exhibit).unwrap();
    assert!(Arc::ptr_eq(
        out.frame("other").unwrap(),
        exhibit.frame("other").unwrap()
    ));
    let rows: Vec<String> = out
        .frame("t")
        .unwrap()
        .iter()
        .map(|obs| obs.to_string())
        .collect();
    assert_eq!(rows, vec!["[p,1,2]", "[q,3,null]"]);
}

#[test]
fn cleanup_is_terminal() {
    let exhibit = long_frame("t", &[("p", "v1", 1.0)]);
    let mut pivot = PivotCalculator::single_key(
        Box::new(LookupCalculator::new("t")),
        PivotKey::new("key", ["v1"]),
    );
    pivot.initialize(&exhibit.descriptor()).unwrap();
    pivot.cleanup();
    pivot.cleanup();
    assert!(matches!(
        pivot.apply(&exhibit),
        Err(ExhibitError::CleanedUp { stage: "pivot" })
    ));
}
