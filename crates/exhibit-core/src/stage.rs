//! The pipeline stage contract.
//!
//! A stage moves through `Uninitialized -> Initialized -> CleanedUp`. `initialize` resolves the
//! output schema once; `apply` may then run any number of times against exhibits that conform to
//! the input schema; `cleanup` releases owned resources and is terminal.

use crate::descriptor::ObsDescriptor;
use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::{Exhibit, ExhibitDescriptor};
use crate::frame::FrameRef;

/// A stage that maps an exhibit to a frame.
pub trait Calculator: Send {
    /// Resolve and cache the schema of the frames `apply` will return.
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ObsDescriptor>;

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<FrameRef>;

    /// Release owned resources. Calling it more than once has no further effect.
    fn cleanup(&mut self) {}
}

/// A stage that maps an exhibit to a new exhibit.
pub trait Functor: Send {
    /// Resolve and cache the descriptor of the exhibits `apply` will return.
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor>;

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit>;

    /// Release owned resources. Calling it more than once has no further effect.
    fn cleanup(&mut self) {}

    /// Like [`Functor::apply`], but an absent input yields an absent output.
    fn apply_optional(&mut self, exhibit: Option<&Exhibit>) -> ExhibitResult<Option<Exhibit>> {
        exhibit.map(|exhibit| self.apply(exhibit)).transpose()
    }
}

impl<C: Calculator + ?Sized> Calculator for Box<C> {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ObsDescriptor> {
        (**self).initialize(descriptor)
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<FrameRef> {
        (**self).apply(exhibit)
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }
}

impl<F: Functor + ?Sized> Functor for Box<F> {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        (**self).initialize(descriptor)
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        (**self).apply(exhibit)
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }

    fn apply_optional(&mut self, exhibit: Option<&Exhibit>) -> ExhibitResult<Option<Exhibit>> {
        (**self).apply_optional(exhibit)
    }
}

/// Lifecycle of a stage, carrying whatever the stage resolved during `initialize`.
#[derive(Clone, Debug)]
pub(crate) enum StageState<T> {
    Uninitialized,
    Initialized(T),
    CleanedUp,
}

impl<T> Default for StageState<T> {
    fn default() -> Self {
        StageState::Uninitialized
    }
}

impl<T> StageState<T> {
    /// The resolved state, or the lifecycle error for `stage`.
    pub(crate) fn resolved(&self, stage: &'static str) -> ExhibitResult<&T> {
        match self {
            StageState::Initialized(resolved) => Ok(resolved),
            StageState::Uninitialized => Err(ExhibitError::NotInitialized { stage }),
            StageState::CleanedUp => Err(ExhibitError::CleanedUp { stage }),
        }
    }

    pub(crate) fn is_uninitialized(&self) -> bool {
        matches!(self, StageState::Uninitialized)
    }

    /// Store the resolved state; re-initializing replaces it, a cleaned-up stage stays dead.
    pub(crate) fn set(&mut self, stage: &'static str, resolved: T) -> ExhibitResult<&T> {
        if matches!(self, StageState::CleanedUp) {
            return Err(ExhibitError::CleanedUp { stage });
        }
        *self = StageState::Initialized(resolved);
        self.resolved(stage)
    }

    /// Returns `true` when this call performed the transition.
    pub(crate) fn clean_up(&mut self) -> bool {
        let was_live = !matches!(self, StageState::CleanedUp);
        *self = StageState::CleanedUp;
        was_live
    }
}

/// Passes every exhibit through unchanged.
#[derive(Debug, Default)]
pub struct IdentityFunctor {
    state: StageState<ExhibitDescriptor>,
}

impl IdentityFunctor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Functor for IdentityFunctor {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        self.state
            .set("identity", descriptor.clone())
            .cloned()
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        if let StageState::CleanedUp = self.state {
            return Err(ExhibitError::CleanedUp { stage: "identity" });
        }
        Ok(exhibit.clone())
    }

    fn cleanup(&mut self) {
        self.state.clean_up();
    }
}
