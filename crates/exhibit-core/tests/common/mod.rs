#![allow(dead_code)]

use std::sync::Arc;

use exhibit_core::{Exhibit, FieldType, FrameRef, Obs, ObsDescriptor, SimpleFrame, Value};

/// `(id: string, key: string, score: double)` rows in a frame called `name`.
pub fn long_frame(name: &str, rows: &[(&str, &str, f64)]) -> Exhibit {
    let desc = ObsDescriptor::builder()
        .string_field("id")
        .string_field("key")
        .double_field("score")
        .build()
        .unwrap();
    let values = rows
        .iter()
        .map(|(id, key, score)| vec![Value::from(*id), Value::from(*key), Value::from(*score)])
        .collect();
    Exhibit::of_frame(name, Arc::new(SimpleFrame::from_values(desc, values).unwrap()))
}

pub fn frame(fields: &[(&str, FieldType)], rows: Vec<Vec<Value>>) -> FrameRef {
    let desc = ObsDescriptor::of(fields).unwrap();
    Arc::new(SimpleFrame::from_values(desc, rows).unwrap())
}

pub fn attributes(fields: &[(&str, FieldType)], values: Vec<Value>) -> Obs {
    Obs::new(ObsDescriptor::of(fields).unwrap(), values).unwrap()
}
