//! Composition: flattening several schemas, exhibits, or stages into one.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::descriptor::{Field, ObsDescriptor};
use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::{Exhibit, ExhibitDescriptor};
use crate::frame::{FrameRef, SimpleFrame};
use crate::obs::Obs;
use crate::stage::{Calculator, Functor, StageState};

/// Several row schemas presented as one flattened schema.
///
/// Every field stays addressable by global position. Name lookup scans components in order, so
/// when two components share a field name the earlier one wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeObsDescriptor {
    components: Vec<ObsDescriptor>,
    flattened: ObsDescriptor,
    positions: Vec<(usize, usize)>,
}

impl CompositeObsDescriptor {
    pub fn new(components: Vec<ObsDescriptor>) -> Self {
        let mut fields = Vec::new();
        let mut positions = Vec::new();
        for (source, component) in components.iter().enumerate() {
            for (local, field) in component.iter().enumerate() {
                fields.push(field.clone());
                positions.push((source, local));
            }
        }
        Self {
            components,
            flattened: ObsDescriptor::with_shadowing(fields),
            positions,
        }
    }

    pub fn components(&self) -> &[ObsDescriptor] {
        &self.components
    }

    /// The flattened schema as a plain descriptor.
    pub fn descriptor(&self) -> &ObsDescriptor {
        &self.flattened
    }

    pub fn size(&self) -> usize {
        self.flattened.size()
    }

    pub fn get(&self, index: usize) -> ExhibitResult<&Field> {
        self.flattened.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.flattened.index_of(name)
    }

    /// The `(component, local index)` pair behind global position `index`.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        self.positions.get(index).copied()
    }

    /// Concatenate one row per component into a row of the flattened schema.
    pub fn join(&self, rows: &[Obs]) -> ExhibitResult<Obs> {
        if rows.len() != self.components.len() {
            return Err(ExhibitError::ArityMismatch {
                expected: self.components.len(),
                actual: rows.len(),
            });
        }
        let mut values = Vec::with_capacity(self.size());
        for (component, row) in self.components.iter().zip(rows) {
            if row.descriptor() != component {
                return Err(ExhibitError::DescriptorMismatch {
                    expected: component.to_string(),
                    actual: row.descriptor().to_string(),
                });
            }
            values.extend(row.iter().cloned());
        }
        Ok(Obs::from_parts(self.flattened.clone(), values))
    }
}

/// Merge exhibit descriptors: attributes are concatenated, frames and vectors are unioned.
///
/// A name may appear only once across all components within each of the three namespaces.
pub fn composite_descriptor(descriptors: &[ExhibitDescriptor]) -> ExhibitResult<ExhibitDescriptor> {
    let mut attr_names = HashSet::new();
    let mut frames = BTreeMap::new();
    let mut vectors = BTreeMap::new();
    for descriptor in descriptors {
        for name in descriptor.attributes().names() {
            if !attr_names.insert(name.to_string()) {
                return Err(ExhibitError::DuplicateAttribute(name.to_string()));
            }
        }
        for (name, fd) in descriptor.frames() {
            if frames.insert(name.clone(), fd.clone()).is_some() {
                return Err(ExhibitError::DuplicateFrame(name.clone()));
            }
        }
        for (name, ft) in descriptor.vectors() {
            if vectors.insert(name.clone(), *ft).is_some() {
                return Err(ExhibitError::DuplicateVector(name.clone()));
            }
        }
    }
    let attributes = CompositeObsDescriptor::new(
        descriptors
            .iter()
            .map(|d| d.attributes().clone())
            .collect(),
    );
    Ok(ExhibitDescriptor::new(
        attributes.descriptor().clone(),
        frames,
        vectors,
    ))
}

/// Several exhibits merged into one.
#[derive(Clone, Debug)]
pub struct CompositeExhibit {
    attributes: CompositeObsDescriptor,
    exhibit: Exhibit,
}

impl CompositeExhibit {
    pub fn create(exhibits: &[Exhibit]) -> ExhibitResult<Self> {
        let descriptors: Vec<ExhibitDescriptor> =
            exhibits.iter().map(Exhibit::descriptor).collect();
        composite_descriptor(&descriptors)?;

        let attributes = CompositeObsDescriptor::new(
            exhibits
                .iter()
                .map(|e| e.attributes().descriptor().clone())
                .collect(),
        );
        let rows: Vec<Obs> = exhibits.iter().map(|e| e.attributes().clone()).collect();
        let attribute_row = attributes.join(&rows)?;

        let frames = exhibits
            .iter()
            .flat_map(|e| e.frames().iter())
            .map(|(name, frame)| (name.clone(), frame.clone()))
            .collect();
        let vectors = exhibits
            .iter()
            .flat_map(|e| e.vectors().iter())
            .map(|(name, vector)| (name.clone(), vector.clone()))
            .collect();
        Ok(Self {
            attributes,
            exhibit: Exhibit::from_parts(attribute_row, frames, vectors),
        })
    }

    /// The attribute schema, which remembers which component each attribute came from.
    pub fn attribute_descriptor(&self) -> &CompositeObsDescriptor {
        &self.attributes
    }

    pub fn exhibit(&self) -> &Exhibit {
        &self.exhibit
    }

    pub fn into_exhibit(self) -> Exhibit {
        self.exhibit
    }
}

/// Runs several calculators against the same exhibit and zips their frames row by row.
///
/// The output has as many rows as the longest input; shorter inputs repeat their last row. An
/// input with no rows at all cannot be repeated and fails with [`ExhibitError::MissingObs`],
/// unless every input is empty.
pub struct CompositeCalculator {
    calculators: Vec<Box<dyn Calculator>>,
    state: StageState<CompositeObsDescriptor>,
}

impl CompositeCalculator {
    pub fn new(calculators: Vec<Box<dyn Calculator>>) -> Self {
        Self {
            calculators,
            state: StageState::default(),
        }
    }
}

impl Calculator for CompositeCalculator {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ObsDescriptor> {
        let components = self
            .calculators
            .iter_mut()
            .map(|c| c.initialize(descriptor))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let composite = CompositeObsDescriptor::new(components);
        log::debug!("composite calculator resolved [{}]", composite.descriptor());
        Ok(self.state.set("composite", composite)?.descriptor().clone())
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<FrameRef> {
        let composite = self.state.resolved("composite")?.clone();
        let frames = self
            .calculators
            .iter_mut()
            .map(|c| c.apply(exhibit))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let sources: Vec<Vec<Obs>> = frames.iter().map(|f| f.rows()).collect();
        let height = sources.iter().map(Vec::len).max().unwrap_or(0);
        log::trace!("composite calculator zipping {} frames into {height} rows", sources.len());

        let mut rows = Vec::with_capacity(height);
        for row in 0..height {
            let current = sources
                .iter()
                .enumerate()
                .map(|(position, source)| {
                    source
                        .get(row)
                        .or_else(|| source.last())
                        .cloned()
                        .ok_or(ExhibitError::MissingObs { position })
                })
                .collect::<ExhibitResult<Vec<_>>>()?;
            rows.push(composite.join(&current)?);
        }
        Ok(Arc::new(SimpleFrame::from_parts(
            composite.descriptor().clone(),
            rows,
        )))
    }

    fn cleanup(&mut self) {
        if self.state.clean_up() {
            self.calculators.iter_mut().for_each(|c| c.cleanup());
        }
    }
}

/// Runs several functors against the same exhibit and merges their outputs.
pub struct CompositeFunctor {
    functors: Vec<Box<dyn Functor>>,
    state: StageState<ExhibitDescriptor>,
}

impl CompositeFunctor {
    pub fn new(functors: Vec<Box<dyn Functor>>) -> Self {
        Self {
            functors,
            state: StageState::default(),
        }
    }
}

impl Functor for CompositeFunctor {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        let components = self
            .functors
            .iter_mut()
            .map(|f| f.initialize(descriptor))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let merged = composite_descriptor(&components)?;
        log::debug!("composite functor resolved {merged}");
        self.state.set("composite", merged).cloned()
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        self.state.resolved("composite")?;
        let outputs = self
            .functors
            .iter_mut()
            .map(|f| f.apply(exhibit))
            .collect::<ExhibitResult<Vec<_>>>()?;
        Ok(CompositeExhibit::create(&outputs)?.into_exhibit())
    }

    fn cleanup(&mut self) {
        if self.state.clean_up() {
            self.functors.iter_mut().for_each(|f| f.cleanup());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldType, Value};
    use pretty_assertions::assert_eq;

    fn f1() -> ObsDescriptor {
        ObsDescriptor::of(&[("v0", FieldType::Double), ("v1", FieldType::String)]).unwrap()
    }

    fn f2() -> ObsDescriptor {
        ObsDescriptor::of(&[("x", FieldType::Integer)]).unwrap()
    }

    #[test]
    fn flattened_lookup() {
        let cd = CompositeObsDescriptor::new(vec![f1(), f2()]);
        assert_eq!(cd.size(), 3);
        assert_eq!(cd.index_of("v1"), Some(1));
        assert_eq!(cd.index_of("x"), Some(2));
        assert_eq!(cd.index_of("v3"), None);
        assert_eq!(cd.get(2).unwrap(), &Field::new("x", FieldType::Integer));
        assert_eq!(cd.locate(2), Some((1, 0)));
        assert_eq!(cd.locate(3), None);
    }

    #[test]
    fn earlier_component_shadows_later() {
        let a = ObsDescriptor::of(&[("k", FieldType::Integer)]).unwrap();
        let b = ObsDescriptor::of(&[("k", FieldType::String)]).unwrap();
        let cd = CompositeObsDescriptor::new(vec![a, b]);
        assert_eq!(cd.index_of("k"), Some(0));
        assert_eq!(cd.get(1).unwrap().field_type, FieldType::String);
    }

    #[test]
    fn join_concatenates_rows() {
        let cd = CompositeObsDescriptor::new(vec![f1(), ObsDescriptor::empty(), f2()]);
        let joined = cd
            .join(&[
                Obs::of(f1(), [Value::from(1.0), Value::from("a")]).unwrap(),
                Obs::empty(),
                Obs::of(f2(), [7]).unwrap(),
            ])
            .unwrap();
        assert_eq!(joined.to_string(), "[1,a,7]");
        assert_eq!(joined.get_by_name("x").unwrap(), &Value::from(7));
        assert!(matches!(
            cd.join(&[Obs::empty()]),
            Err(ExhibitError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn composite_descriptor_rejects_duplicates() {
        let a = ExhibitDescriptor::of_frame("f", f1());
        let b = ExhibitDescriptor::of_frame("f", f2());
        assert!(matches!(
            composite_descriptor(&[a.clone(), b]),
            Err(ExhibitError::DuplicateFrame(name)) if name == "f"
        ));

        let v = ExhibitDescriptor::of_vector("v", FieldType::Long);
        assert!(matches!(
            composite_descriptor(&[v.clone(), v]),
            Err(ExhibitError::DuplicateVector(_))
        ));

        let attrs = ExhibitDescriptor::empty().with_attributes(f2());
        assert!(matches!(
            composite_descriptor(&[attrs.clone(), attrs]),
            Err(ExhibitError::DuplicateAttribute(name)) if name == "x"
        ));

        let merged = composite_descriptor(&[a, ExhibitDescriptor::empty().with_attributes(f2())])
            .unwrap();
        assert_eq!(merged.attributes(), &f2());
        assert_eq!(merged.frames().len(), 1);
    }
}
