//! Frames: ordered row collections sharing one descriptor.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::descriptor::{Field, ObsDescriptor};
use crate::error::{ExhibitError, ExhibitResult};
use crate::obs::Obs;
use crate::types::Value;

/// A table of [`Obs`] rows that all conform to [`Frame::descriptor`].
///
/// Iteration is restartable: every call to [`Frame::iter`] starts again at row 0.
pub trait Frame: fmt::Debug + Send + Sync {
    fn descriptor(&self) -> &ObsDescriptor;

    fn size(&self) -> usize;

    fn get(&self, row: usize) -> Option<Obs>;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot of the current rows, in order.
    fn rows(&self) -> Vec<Obs> {
        (0..self.size()).filter_map(|row| self.get(row)).collect()
    }

    fn iter(&self) -> std::vec::IntoIter<Obs> {
        self.rows().into_iter()
    }
}

/// Shared handle to a frame; exhibits and stages pass frames around by reference count.
pub type FrameRef = Arc<dyn Frame>;

impl dyn Frame + '_ {
    /// Column view by field name.
    pub fn column(&self, name: &str) -> ExhibitResult<Column<'_>> {
        let index = self
            .descriptor()
            .index_of(name)
            .ok_or_else(|| ExhibitError::UnknownField(name.to_string()))?;
        self.column_at(index)
    }

    /// Column view by field position.
    pub fn column_at(&self, index: usize) -> ExhibitResult<Column<'_>> {
        let field = self.descriptor().get(index)?.clone();
        Ok(Column {
            frame: self,
            index,
            field,
        })
    }
}

/// Read-only view of a single column of a frame.
#[derive(Debug)]
pub struct Column<'a> {
    frame: &'a dyn Frame,
    index: usize,
    field: Field,
}

impl Column<'_> {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn size(&self) -> usize {
        self.frame.size()
    }

    pub fn get(&self, row: usize) -> Option<Value> {
        self.frame
            .get(row)
            .and_then(|obs| obs.get(self.index).cloned())
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.frame
            .iter()
            .map(move |obs| obs.get(self.index).cloned().unwrap_or_default())
    }
}

fn check_rows(descriptor: &ObsDescriptor, rows: &[Obs]) -> ExhibitResult<()> {
    match rows.iter().find(|obs| obs.descriptor() != descriptor) {
        Some(obs) => Err(ExhibitError::DescriptorMismatch {
            expected: descriptor.to_string(),
            actual: obs.descriptor().to_string(),
        }),
        None => Ok(()),
    }
}

/// An immutable frame.
#[derive(Clone, Debug)]
pub struct SimpleFrame {
    descriptor: ObsDescriptor,
    rows: Arc<[Obs]>,
}

impl SimpleFrame {
    /// Build a frame, checking that every row carries `descriptor`.
    pub fn new(descriptor: ObsDescriptor, rows: Vec<Obs>) -> ExhibitResult<Self> {
        check_rows(&descriptor, &rows)?;
        Ok(Self::from_parts(descriptor, rows))
    }

    /// Build a frame from raw value rows, validating each against `descriptor`.
    pub fn from_values(descriptor: ObsDescriptor, rows: Vec<Vec<Value>>) -> ExhibitResult<Self> {
        let rows = rows
            .into_iter()
            .map(|values| Obs::new(descriptor.clone(), values))
            .collect::<ExhibitResult<Vec<_>>>()?;
        Ok(Self::from_parts(descriptor, rows))
    }

    pub fn empty(descriptor: ObsDescriptor) -> Self {
        Self::from_parts(descriptor, Vec::new())
    }

    pub(crate) fn from_parts(descriptor: ObsDescriptor, rows: Vec<Obs>) -> Self {
        Self {
            descriptor,
            rows: rows.into(),
        }
    }
}

impl Frame for SimpleFrame {
    fn descriptor(&self) -> &ObsDescriptor {
        &self.descriptor
    }

    fn size(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, row: usize) -> Option<Obs> {
        self.rows.get(row).cloned()
    }

    fn rows(&self) -> Vec<Obs> {
        self.rows.to_vec()
    }
}

/// A frame whose rows can be replaced in place while its descriptor stays fixed.
///
/// Stages initialized against the frame keep working across refreshes. Readers that race with
/// [`UpdatableFrame::update_values`] may see either batch.
#[derive(Debug)]
pub struct UpdatableFrame {
    descriptor: ObsDescriptor,
    rows: RwLock<Vec<Obs>>,
}

impl UpdatableFrame {
    pub fn new(descriptor: ObsDescriptor) -> Self {
        Self {
            descriptor,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rows(descriptor: ObsDescriptor, rows: Vec<Obs>) -> ExhibitResult<Self> {
        check_rows(&descriptor, &rows)?;
        Ok(Self {
            descriptor,
            rows: RwLock::new(rows),
        })
    }

    /// Replace the current batch. Rows carrying a different descriptor are rejected and the
    /// previous batch is kept.
    pub fn update_values(&self, rows: Vec<Obs>) -> ExhibitResult<()> {
        check_rows(&self.descriptor, &rows)?;
        *self.rows.write().unwrap_or_else(PoisonError::into_inner) = rows;
        Ok(())
    }
}

impl Frame for UpdatableFrame {
    fn descriptor(&self) -> &ObsDescriptor {
        &self.descriptor
    }

    fn size(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn get(&self, row: usize) -> Option<Obs> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(row)
            .cloned()
    }

    fn rows(&self) -> Vec<Obs> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use pretty_assertions::assert_eq;

    fn desc() -> ObsDescriptor {
        ObsDescriptor::of(&[("id", FieldType::Integer), ("v", FieldType::String)]).unwrap()
    }

    fn row(id: i32, v: &str) -> Obs {
        Obs::new(desc(), vec![Value::from(id), Value::from(v)]).unwrap()
    }

    #[test]
    fn iteration_restarts_at_first_row() {
        let frame = SimpleFrame::new(desc(), vec![row(1, "a"), row(2, "b")]).unwrap();
        let first: Vec<Obs> = frame.iter().collect();
        let second: Vec<Obs> = frame.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(frame.get(0), Some(row(1, "a")));
        assert_eq!(frame.get(2), None);
    }

    #[test]
    fn column_views() {
        let frame: FrameRef =
            Arc::new(SimpleFrame::new(desc(), vec![row(1, "a"), row(2, "b")]).unwrap());
        let col = frame.column("v").unwrap();
        assert_eq!(col.field(), &Field::new("v", FieldType::String));
        assert_eq!(col.size(), 2);
        assert_eq!(col.get(1), Some(Value::from("b")));
        assert_eq!(
            frame.column_at(0).unwrap().iter().collect::<Vec<_>>(),
            vec![Value::from(1), Value::from(2)]
        );
        assert!(matches!(
            frame.column("nope"),
            Err(ExhibitError::UnknownField(_))
        ));
    }

    #[test]
    fn frame_from_values_validates() {
        let err = SimpleFrame::from_values(desc(), vec![vec![Value::from("x"), Value::from("y")]])
            .unwrap_err();
        assert!(matches!(err, ExhibitError::TypeMismatch { .. }));
    }

    #[test]
    fn updatable_frame_refreshes_in_place() {
        let frame = Arc::new(UpdatableFrame::new(desc()));
        let shared: FrameRef = frame.clone();
        assert!(shared.is_empty());

        frame.update_values(vec![row(1, "a")]).unwrap();
        assert_eq!(shared.size(), 1);

        frame
            .update_values(vec![row(2, "b"), row(3, "c")])
            .unwrap();
        assert_eq!(shared.rows(), vec![row(2, "b"), row(3, "c")]);
    }

    #[test]
    fn updatable_frame_rejects_foreign_rows() {
        let frame = UpdatableFrame::with_rows(desc(), vec![row(1, "a")]).unwrap();
        let other = ObsDescriptor::of(&[("id", FieldType::Integer)]).unwrap();
        let foreign = Obs::new(other, vec![Value::from(9)]).unwrap();
        let err = frame.update_values(vec![foreign]).unwrap_err();
        assert!(matches!(err, ExhibitError::DescriptorMismatch { .. }));
        assert_eq!(frame.rows(), vec![row(1, "a")]);
    }
}
