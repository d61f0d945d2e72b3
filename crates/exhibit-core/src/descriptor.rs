use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ExhibitError, ExhibitResult};
use crate::types::FieldType;

/// A named, typed slot in a row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.field_type)
    }
}

/// The schema of a row: an ordered list of fields with O(1) name lookup.
///
/// Cloning is cheap; clones share the same field list.
#[derive(Clone)]
pub struct ObsDescriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl ObsDescriptor {
    /// Build a descriptor, rejecting duplicate field names.
    pub fn new(fields: Vec<Field>) -> ExhibitResult<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), idx).is_some() {
                return Err(ExhibitError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self {
            inner: Arc::new(DescriptorInner { fields, index }),
        })
    }

    /// Build a descriptor where a repeated name resolves to its first position.
    ///
    /// Only composite descriptors are allowed to carry repeated names.
    pub(crate) fn with_shadowing(fields: Vec<Field>) -> Self {
        let mut index = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            index.entry(field.name.clone()).or_insert(idx);
        }
        Self {
            inner: Arc::new(DescriptorInner { fields, index }),
        }
    }

    /// The descriptor with no fields.
    pub fn empty() -> Self {
        Self::with_shadowing(Vec::new())
    }

    pub fn of(fields: &[(&str, FieldType)]) -> ExhibitResult<Self> {
        Self::new(
            fields
                .iter()
                .map(|(name, ft)| Field::new(*name, *ft))
                .collect(),
        )
    }

    pub fn builder() -> ObsDescriptorBuilder {
        ObsDescriptorBuilder::default()
    }

    pub fn size(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// The field at position `index`.
    pub fn get(&self, index: usize) -> ExhibitResult<&Field> {
        self.inner
            .fields
            .get(index)
            .ok_or(ExhibitError::FieldIndexOutOfRange {
                index,
                size: self.size(),
            })
    }

    /// Position of the field called `name`, or `None` when absent.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.index.contains_key(name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.inner.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.fields.iter().map(|f| f.name.as_str())
    }

    pub(crate) fn ptr_eq(&self, other: &ObsDescriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ObsDescriptor {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ObsDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.fields == other.inner.fields
    }
}

impl Eq for ObsDescriptor {}

impl fmt::Debug for ObsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.fields.iter()).finish()
    }
}

impl fmt::Display for ObsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ObsDescriptor {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Incrementally assembles an [`ObsDescriptor`].
#[derive(Clone, Debug, Default)]
pub struct ObsDescriptorBuilder {
    fields: Vec<Field>,
}

impl ObsDescriptorBuilder {
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type));
        self
    }

    pub fn boolean_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Boolean)
    }

    pub fn int_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Integer)
    }

    pub fn long_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Long)
    }

    pub fn float_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Float)
    }

    pub fn double_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Double)
    }

    pub fn decimal_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Decimal)
    }

    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::String)
    }

    pub fn date_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Date)
    }

    pub fn timestamp_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Timestamp)
    }

    pub fn build(self) -> ExhibitResult<ObsDescriptor> {
        ObsDescriptor::new(self.fields)
    }
}
