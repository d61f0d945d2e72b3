use std::sync::Arc;

use crate::descriptor::{Field, ObsDescriptor};
use crate::error::{ExhibitError, ExhibitResult};
use crate::frame::SimpleFrame;
use crate::obs::Obs;
use crate::types::{FieldType, Value};

/// A homogeneous column of values of one [`FieldType`].
///
/// Elements are validated when the vector is built; `Null` is accepted in any position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vector {
    field_type: FieldType,
    values: Arc<[Value]>,
}

impl Vector {
    pub fn builder(field_type: FieldType) -> VectorBuilder {
        VectorBuilder::new(field_type)
    }

    /// Validate and collect `values` into a vector of `field_type`.
    pub fn new<V, I>(field_type: FieldType, values: I) -> ExhibitResult<Self>
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let mut builder = VectorBuilder::new(field_type);
        for value in values {
            builder.push(value)?;
        }
        Ok(builder.build())
    }

    pub(crate) fn from_parts(field_type: FieldType, values: Vec<Value>) -> Self {
        Self {
            field_type,
            values: values.into(),
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// View this vector as a one-column frame whose column is called `name`.
    pub fn to_frame(&self, name: &str) -> SimpleFrame {
        let descriptor = ObsDescriptor::with_shadowing(vec![Field::new(name, self.field_type)]);
        let rows = self
            .values
            .iter()
            .map(|v| Obs::from_parts(descriptor.clone(), vec![v.clone()]))
            .collect();
        SimpleFrame::from_parts(descriptor, rows)
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Accumulates the elements of a [`Vector`], rejecting inadmissible ones as they arrive.
#[derive(Clone, Debug)]
pub struct VectorBuilder {
    field_type: FieldType,
    values: Vec<Value>,
}

impl VectorBuilder {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) -> ExhibitResult<&mut Self> {
        let value = value.into();
        if !self.field_type.admits(&value) {
            return Err(ExhibitError::InvalidElementType {
                index: self.values.len(),
                expected: self.field_type,
                value: value.to_string(),
            });
        }
        self.values.push(value);
        Ok(self)
    }

    pub fn build(self) -> Vector {
        Vector {
            field_type: self.field_type,
            values: self.values.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use pretty_assertions::assert_eq;

    #[test]
    fn strings_are_rejected_for_double() {
        let err = Vector::new(FieldType::Double, ["A", "B", "C"]).unwrap_err();
        assert!(matches!(
            err,
            ExhibitError::InvalidElementType {
                index: 0,
                expected: FieldType::Double,
                ..
            }
        ));
    }

    #[test]
    fn failure_reports_offending_index() {
        let mut builder = Vector::builder(FieldType::Integer);
        builder.push(1).unwrap().push(Value::Null).unwrap();
        let err = builder.push(2i64).unwrap_err();
        assert!(matches!(err, ExhibitError::InvalidElementType { index: 2, .. }));
    }

    #[test]
    fn get_agrees_with_iteration() {
        let v = Vector::new(FieldType::Double, [1.0, 2.5, -3.0]).unwrap();
        assert_eq!(v.size(), 3);
        assert_eq!(v.field_type(), FieldType::Double);
        for (idx, value) in v.iter().enumerate() {
            assert_eq!(v.get(idx), Some(value));
        }
        assert_eq!(v.get(3), None);
    }

    #[test]
    fn vector_as_frame() {
        let v = Vector::new(FieldType::String, ["a", "b"]).unwrap();
        let frame = v.to_frame("letters");
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.descriptor().index_of("letters"), Some(0));
        assert_eq!(
            frame.get(1).unwrap().get(0),
            Some(&Value::from("b"))
        );
    }
}
