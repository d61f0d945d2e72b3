use std::collections::BTreeMap;

use exhibit_core::{Exhibit, ExhibitId, Frame, Obs, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{JsonError, JsonResult};

/// Encode one cell.
///
/// Numbers stay numbers; decimals, dates, and timestamps become strings so no precision or
/// calendar information is lost. NaN and infinities have no JSON form and are rejected.
pub fn encode_value(value: &Value) -> JsonResult<JsonValue> {
    let non_finite = || JsonError::UnsupportedValue {
        field_type: value.field_type().unwrap_or(exhibit_core::FieldType::Double),
        value: value.to_string(),
    };
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(n) => JsonValue::from(*n),
        Value::Long(n) => JsonValue::from(*n),
        Value::Float(n) => serde_json::Number::from_f64(f64::from(n.0))
            .map(JsonValue::Number)
            .ok_or_else(non_finite)?,
        Value::Double(n) => serde_json::Number::from_f64(n.0)
            .map(JsonValue::Number)
            .ok_or_else(non_finite)?,
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::String(s) => JsonValue::String(s.to_string()),
        Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
        Value::Timestamp(ts) => JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    })
}

fn encode_row(obs: &Obs) -> JsonResult<Vec<JsonValue>> {
    obs.iter().map(encode_value).collect()
}

/// A frame as column names plus rows aligned to them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDocument {
    pub columns: Vec<String>,
    pub data: Vec<Vec<JsonValue>>,
}

impl FrameDocument {
    pub fn from_frame(frame: &dyn Frame) -> JsonResult<Self> {
        Ok(Self {
            columns: frame.descriptor().names().map(str::to_string).collect(),
            data: frame
                .iter()
                .map(|obs| encode_row(&obs))
                .collect::<JsonResult<_>>()?,
        })
    }
}

/// An exhibit as a flat attribute map plus per-frame column lists and rows.
///
/// Every map is keyed by name in sorted order, so two exhibits with the same content encode to
/// the same text whatever order their frames were added in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExhibitDocument {
    pub attrs: BTreeMap<String, JsonValue>,
    pub columns: BTreeMap<String, Vec<String>>,
    pub frames: BTreeMap<String, Vec<Vec<JsonValue>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vectors: BTreeMap<String, Vec<JsonValue>>,
}

impl ExhibitDocument {
    pub fn from_exhibit(exhibit: &Exhibit) -> JsonResult<Self> {
        let attributes = exhibit.attributes();
        let attrs = attributes
            .descriptor()
            .iter()
            .zip(attributes.iter())
            .map(|(field, value)| Ok((field.name.clone(), encode_value(value)?)))
            .collect::<JsonResult<_>>()?;

        let mut columns = BTreeMap::new();
        let mut frames = BTreeMap::new();
        for (name, frame) in exhibit.frames() {
            let doc = FrameDocument::from_frame(&**frame)?;
            columns.insert(name.clone(), doc.columns);
            frames.insert(name.clone(), doc.data);
        }

        let vectors = exhibit
            .vectors()
            .iter()
            .map(|(name, vector)| {
                let values = vector.iter().map(encode_value).collect::<JsonResult<_>>()?;
                Ok((name.clone(), values))
            })
            .collect::<JsonResult<_>>()?;

        Ok(Self {
            attrs,
            columns,
            frames,
            vectors,
        })
    }
}

pub fn to_json_string(exhibit: &Exhibit) -> JsonResult<String> {
    Ok(serde_json::to_string(&ExhibitDocument::from_exhibit(exhibit)?)?)
}

pub fn frame_to_json_string(frame: &dyn Frame) -> JsonResult<String> {
    Ok(serde_json::to_string(&FrameDocument::from_frame(frame)?)?)
}

pub fn id_to_json(id: &ExhibitId) -> JsonResult<String> {
    Ok(serde_json::to_string(id)?)
}

pub fn id_from_json(json: &str) -> JsonResult<ExhibitId> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibit_core::{Decimal, FieldType};
    use pretty_assertions::assert_eq;

    #[test]
    fn scalar_encoding() {
        assert_eq!(encode_value(&Value::Null).unwrap(), JsonValue::Null);
        assert_eq!(encode_value(&Value::from(3.0)).unwrap().to_string(), "3.0");
        assert_eq!(encode_value(&Value::from(1729)).unwrap().to_string(), "1729");
        assert_eq!(
            encode_value(&Value::Decimal(Decimal::new(1205, 2))).unwrap(),
            JsonValue::String("12.05".to_string())
        );
        let date = FieldType::Date.cast(Value::from("2015-03-01")).unwrap();
        assert_eq!(encode_value(&date).unwrap(), JsonValue::String("2015-03-01".into()));
        let ts = FieldType::Timestamp
            .cast(Value::from("2015-03-01 12:30:05"))
            .unwrap();
        assert_eq!(
            encode_value(&ts).unwrap(),
            JsonValue::String("2015-03-01T12:30:05".into())
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        assert!(matches!(
            encode_value(&Value::from(f64::NAN)),
            Err(JsonError::UnsupportedValue {
                field_type: FieldType::Double,
                ..
            })
        ));
        assert!(matches!(
            encode_value(&Value::from(f32::INFINITY)),
            Err(JsonError::UnsupportedValue {
                field_type: FieldType::Float,
                ..
            })
        ));
    }
}
