use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::{Exhibit, ExhibitDescriptor};
use crate::stage::Functor;

/// An ordered chain of functors; each stage consumes the previous stage's output.
///
/// Cleanup runs for every stage exactly once, either explicitly or when the pipeline is dropped,
/// so an aborted run still releases whatever the stages hold.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Functor>>,
    cleaned_up: bool,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Functor>>) -> Self {
        Self {
            stages,
            cleaned_up: false,
        }
    }

    pub fn push(&mut self, stage: Box<dyn Functor>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn check_live(&self) -> ExhibitResult<()> {
        if self.cleaned_up {
            return Err(ExhibitError::CleanedUp { stage: "pipeline" });
        }
        Ok(())
    }
}

impl Functor for Pipeline {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        self.check_live()?;
        let mut current = descriptor.clone();
        for stage in &mut self.stages {
            current = stage.initialize(&current)?;
        }
        log::debug!("pipeline of {} stages resolved {current}", self.stages.len());
        Ok(current)
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        self.check_live()?;
        let mut current = exhibit.clone();
        for stage in &mut self.stages {
            current = stage.apply(&current)?;
        }
        Ok(current)
    }

    fn apply_optional(&mut self, exhibit: Option<&Exhibit>) -> ExhibitResult<Option<Exhibit>> {
        self.check_live()?;
        let Some(exhibit) = exhibit else {
            return Ok(None);
        };
        let mut current = exhibit.clone();
        for stage in &mut self.stages {
            match stage.apply_optional(Some(&current))? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        log::debug!("cleaning up pipeline of {} stages", self.stages.len());
        for stage in &mut self.stages {
            stage.cleanup();
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.cleanup();
    }
}
