use std::fmt;
use std::sync::Arc;

use crate::descriptor::ObsDescriptor;
use crate::error::{ExhibitError, ExhibitResult};
use crate::types::Value;

/// One row: a fixed-arity tuple of values bound to an [`ObsDescriptor`].
///
/// Construction checks arity and that every non-null value is admitted by the declared type of
/// its position, so a live `Obs` always agrees with its descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct Obs {
    descriptor: ObsDescriptor,
    values: Arc<[Value]>,
}

impl Obs {
    pub fn new(descriptor: ObsDescriptor, values: Vec<Value>) -> ExhibitResult<Self> {
        if descriptor.size() != values.len() {
            return Err(ExhibitError::ArityMismatch {
                expected: descriptor.size(),
                actual: values.len(),
            });
        }
        for (field, value) in descriptor.iter().zip(&values) {
            if !field.field_type.admits(value) {
                return Err(ExhibitError::TypeMismatch {
                    field: field.name.clone(),
                    expected: field.field_type,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            descriptor,
            values: values.into(),
        })
    }

    /// Like [`Obs::new`], but converts each argument into a [`Value`] first.
    pub fn of<V, I>(descriptor: ObsDescriptor, values: I) -> ExhibitResult<Self>
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::new(descriptor, values.into_iter().map(Into::into).collect())
    }

    /// The row with no fields.
    pub fn empty() -> Self {
        Self {
            descriptor: ObsDescriptor::empty(),
            values: Arc::from(Vec::new()),
        }
    }

    /// A row of `descriptor` where every slot holds its type's default value.
    pub fn defaults(descriptor: ObsDescriptor) -> Self {
        let values: Vec<Value> = descriptor
            .iter()
            .map(|f| f.field_type.default_value())
            .collect();
        Self {
            descriptor,
            values: values.into(),
        }
    }

    /// Rows assembled by stages whose schema already guarantees the invariant.
    pub(crate) fn from_parts(descriptor: ObsDescriptor, values: Vec<Value>) -> Self {
        debug_assert_eq!(descriptor.size(), values.len());
        Self {
            descriptor,
            values: values.into(),
        }
    }

    pub fn descriptor(&self) -> &ObsDescriptor {
        &self.descriptor
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> ExhibitResult<&Value> {
        self.descriptor
            .index_of(name)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| ExhibitError::UnknownField(name.to_string()))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl Default for Obs {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Obs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obs{self}")
    }
}

impl fmt::Display for Obs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use pretty_assertions::assert_eq;

    fn desc() -> ObsDescriptor {
        ObsDescriptor::builder()
            .string_field("name")
            .double_field("score")
            .build()
            .unwrap()
    }

    #[test]
    fn rows_are_positional_and_named() {
        let obs = Obs::new(desc(), vec![Value::from("ann"), Value::from(1.5)]).unwrap();
        assert_eq!(obs.get(1), Some(&Value::from(1.5)));
        assert_eq!(obs.get(2), None);
        assert_eq!(obs.get_by_name("name").unwrap(), &Value::from("ann"));
        assert!(matches!(
            obs.get_by_name("missing"),
            Err(ExhibitError::UnknownField(_))
        ));
        assert_eq!(obs.to_string(), "[ann,1.5]");
    }

    #[test]
    fn nulls_fit_any_slot() {
        let obs = Obs::new(desc(), vec![Value::Null, Value::Null]).unwrap();
        assert!(obs.iter().all(Value::is_null));
    }

    #[test]
    fn construction_validates_shape() {
        assert!(matches!(
            Obs::new(desc(), vec![Value::from("ann")]),
            Err(ExhibitError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
        let err = Obs::new(desc(), vec![Value::from("ann"), Value::from("high")]).unwrap_err();
        assert!(matches!(
            err,
            ExhibitError::TypeMismatch {
                expected: FieldType::Double,
                ..
            }
        ));
    }

    #[test]
    fn equality_covers_descriptor_and_values() {
        let a = Obs::new(desc(), vec![Value::from("x"), Value::from(2.0)]).unwrap();
        let b = Obs::new(desc(), vec![Value::from("x"), Value::from(2.0)]).unwrap();
        assert_eq!(a, b);
        let other = ObsDescriptor::builder()
            .string_field("label")
            .double_field("score")
            .build()
            .unwrap();
        let c = Obs::new(other, vec![Value::from("x"), Value::from(2.0)]).unwrap();
        assert_ne!(a, c);
        assert_eq!(Obs::empty().size(), 0);
    }

    #[test]
    fn defaults_follow_field_types() {
        let obs = Obs::defaults(desc());
        assert_eq!(obs.values(), &[Value::from(""), Value::from(0.0)]);
    }
}
