use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::descriptor::ObsDescriptor;
use crate::error::{ExhibitError, ExhibitResult};
use crate::frame::{FrameRef, SimpleFrame};
use crate::obs::Obs;
use crate::types::FieldType;
use crate::vector::Vector;

/// Schema of an [`Exhibit`]: attribute fields, frame schemas by name, vector types by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExhibitDescriptor {
    attributes: ObsDescriptor,
    frames: BTreeMap<String, ObsDescriptor>,
    vectors: BTreeMap<String, FieldType>,
}

impl ExhibitDescriptor {
    pub fn new(
        attributes: ObsDescriptor,
        frames: BTreeMap<String, ObsDescriptor>,
        vectors: BTreeMap<String, FieldType>,
    ) -> Self {
        Self {
            attributes,
            frames,
            vectors,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of_frame(name: impl Into<String>, descriptor: ObsDescriptor) -> Self {
        Self::empty().with_frame(name, descriptor)
    }

    pub fn of_vector(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::empty().with_vector(name, field_type)
    }

    pub fn with_attributes(mut self, attributes: ObsDescriptor) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_frame(mut self, name: impl Into<String>, descriptor: ObsDescriptor) -> Self {
        self.frames.insert(name.into(), descriptor);
        self
    }

    pub fn with_vector(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.vectors.insert(name.into(), field_type);
        self
    }

    pub fn attributes(&self) -> &ObsDescriptor {
        &self.attributes
    }

    pub fn frames(&self) -> &BTreeMap<String, ObsDescriptor> {
        &self.frames
    }

    pub fn vectors(&self) -> &BTreeMap<String, FieldType> {
        &self.vectors
    }

    pub fn frame(&self, name: &str) -> ExhibitResult<&ObsDescriptor> {
        self.frames
            .get(name)
            .ok_or_else(|| ExhibitError::UnknownFrame(name.to_string()))
    }

    /// Every attribute, frame, and vector name, merged into one set.
    pub fn name_set(&self) -> BTreeSet<String> {
        self.attributes
            .names()
            .map(str::to_string)
            .chain(self.frames.keys().cloned())
            .chain(self.vectors.keys().cloned())
            .collect()
    }
}

impl fmt::Display for ExhibitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attributes: [{}]", self.attributes)?;
        for (name, descriptor) in &self.frames {
            write!(f, "; frame {name}: [{descriptor}]")?;
        }
        for (name, field_type) in &self.vectors {
            write!(f, "; vector {name}: {field_type}")?;
        }
        Ok(())
    }
}

/// The data of one logical entity: an attribute row plus named frames and vectors.
#[derive(Clone, Debug, Default)]
pub struct Exhibit {
    attributes: Obs,
    frames: BTreeMap<String, FrameRef>,
    vectors: BTreeMap<String, Arc<Vector>>,
}

impl Exhibit {
    pub fn new(attributes: Obs) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    pub fn from_parts(
        attributes: Obs,
        frames: BTreeMap<String, FrameRef>,
        vectors: BTreeMap<String, Arc<Vector>>,
    ) -> Self {
        Self {
            attributes,
            frames,
            vectors,
        }
    }

    /// The canonical empty exhibit: no attributes, frames, or vectors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An exhibit holding a single frame and nothing else.
    pub fn of_frame(name: impl Into<String>, frame: FrameRef) -> Self {
        Self::empty().with_frame(name, frame)
    }

    pub fn with_frame(mut self, name: impl Into<String>, frame: FrameRef) -> Self {
        self.frames.insert(name.into(), frame);
        self
    }

    pub fn with_vector(mut self, name: impl Into<String>, vector: impl Into<Arc<Vector>>) -> Self {
        self.vectors.insert(name.into(), vector.into());
        self
    }

    /// An exhibit shaped like `descriptor` holding default values: one default row per frame
    /// and a one-element vector per vector.
    pub fn default_values(descriptor: &ExhibitDescriptor) -> Self {
        let frames = descriptor
            .frames()
            .iter()
            .map(|(name, fd)| {
                let row = Obs::defaults(fd.clone());
                let frame: FrameRef = Arc::new(SimpleFrame::from_parts(fd.clone(), vec![row]));
                (name.clone(), frame)
            })
            .collect();
        let vectors = descriptor
            .vectors()
            .iter()
            .map(|(name, ft)| {
                let vector = Vector::from_parts(*ft, vec![ft.default_value()]);
                (name.clone(), Arc::new(vector))
            })
            .collect();
        Self {
            attributes: Obs::defaults(descriptor.attributes().clone()),
            frames,
            vectors,
        }
    }

    pub fn attributes(&self) -> &Obs {
        &self.attributes
    }

    pub fn frames(&self) -> &BTreeMap<String, FrameRef> {
        &self.frames
    }

    pub fn vectors(&self) -> &BTreeMap<String, Arc<Vector>> {
        &self.vectors
    }

    pub fn frame(&self, name: &str) -> ExhibitResult<&FrameRef> {
        self.frames
            .get(name)
            .ok_or_else(|| ExhibitError::UnknownFrame(name.to_string()))
    }

    pub fn vector(&self, name: &str) -> ExhibitResult<&Arc<Vector>> {
        self.vectors
            .get(name)
            .ok_or_else(|| ExhibitError::UnknownVector(name.to_string()))
    }

    pub fn descriptor(&self) -> ExhibitDescriptor {
        ExhibitDescriptor {
            attributes: self.attributes.descriptor().clone(),
            frames: self
                .frames
                .iter()
                .map(|(name, frame)| (name.clone(), frame.descriptor().clone()))
                .collect(),
            vectors: self
                .vectors
                .iter()
                .map(|(name, vector)| (name.clone(), vector.field_type()))
                .collect(),
        }
    }
}

/// An exhibit that can gain frames and vectors after construction.
///
/// Additions shadow base entries of the same name. The base exhibit itself is never touched;
/// frames and vectors are shared, not copied.
#[derive(Clone, Debug)]
pub struct UpdatableExhibit {
    inner: Exhibit,
}

impl UpdatableExhibit {
    pub fn new(base: &Exhibit) -> Self {
        Self {
            inner: base.clone(),
        }
    }

    pub fn add_frame(&mut self, name: impl Into<String>, frame: FrameRef) -> &mut Self {
        self.inner.frames.insert(name.into(), frame);
        self
    }

    pub fn add_vector(&mut self, name: impl Into<String>, vector: impl Into<Arc<Vector>>) -> &mut Self {
        self.inner.vectors.insert(name.into(), vector.into());
        self
    }

    pub fn descriptor(&self) -> ExhibitDescriptor {
        self.inner.descriptor()
    }

    pub fn exhibit(&self) -> Exhibit {
        self.inner.clone()
    }

    pub fn into_exhibit(self) -> Exhibit {
        self.inner
    }
}
