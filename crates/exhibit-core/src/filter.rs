use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{Field, ObsDescriptor};
use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::{Exhibit, ExhibitDescriptor};
use crate::obs::Obs;
use crate::stage::{Functor, StageState};

/// Keeps only the attributes, frames, and vectors whose names are in a keep set.
///
/// Frames and vectors that survive are shared with the input exhibit. When `apply` runs before
/// `initialize`, the stage initializes itself from the first exhibit it sees.
#[derive(Debug)]
pub struct FilterFunctor {
    keep: BTreeSet<String>,
    state: StageState<Filtered>,
}

#[derive(Debug)]
struct Filtered {
    descriptor: ExhibitDescriptor,
    /// Source attribute position for each surviving attribute, in output order.
    attribute_sources: Vec<usize>,
}

impl FilterFunctor {
    pub fn new<S, I>(keep: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
            state: StageState::default(),
        }
    }

    pub fn keep(&self) -> &BTreeSet<String> {
        &self.keep
    }

    fn filter(&self, descriptor: &ExhibitDescriptor) -> ExhibitResult<Filtered> {
        let (attribute_sources, fields): (Vec<usize>, Vec<Field>) = descriptor
            .attributes()
            .iter()
            .enumerate()
            .filter(|(_, field)| self.keep.contains(&field.name))
            .map(|(idx, field)| (idx, field.clone()))
            .unzip();
        let frames: BTreeMap<_, _> = descriptor
            .frames()
            .iter()
            .filter(|(name, _)| self.keep.contains(*name))
            .map(|(name, fd)| (name.clone(), fd.clone()))
            .collect();
        let vectors: BTreeMap<_, _> = descriptor
            .vectors()
            .iter()
            .filter(|(name, _)| self.keep.contains(*name))
            .map(|(name, ft)| (name.clone(), *ft))
            .collect();
        Ok(Filtered {
            descriptor: ExhibitDescriptor::new(ObsDescriptor::new(fields)?, frames, vectors),
            attribute_sources,
        })
    }
}

impl Functor for FilterFunctor {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        let filtered = self.filter(descriptor)?;
        log::debug!("filter resolved {}", filtered.descriptor);
        Ok(self.state.set("filter", filtered)?.descriptor.clone())
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        if self.state.is_uninitialized() {
            self.initialize(&exhibit.descriptor())?;
        }
        let filtered = self.state.resolved("filter")?;
        log::trace!("filter keeping {} names", self.keep.len());

        let attributes = exhibit.attributes();
        let values = filtered
            .attribute_sources
            .iter()
            .zip(filtered.descriptor.attributes())
            .map(|(&source, field)| {
                attributes
                    .get(source)
                    .cloned()
                    .ok_or_else(|| ExhibitError::UnknownField(field.name.clone()))
            })
            .collect::<ExhibitResult<Vec<_>>>()?;
        let attributes = Obs::new(filtered.descriptor.attributes().clone(), values)?;

        let frames = filtered
            .descriptor
            .frames()
            .keys()
            .map(|name| Ok((name.clone(), exhibit.frame(name)?.clone())))
            .collect::<ExhibitResult<BTreeMap<_, _>>>()?;
        let vectors = filtered
            .descriptor
            .vectors()
            .keys()
            .map(|name| Ok((name.clone(), exhibit.vector(name)?.clone())))
            .collect::<ExhibitResult<BTreeMap<_, _>>>()?;
        Ok(Exhibit::from_parts(attributes, frames, vectors))
    }

    fn cleanup(&mut self) {
        self.state.clean_up();
    }
}
