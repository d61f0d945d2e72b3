use std::sync::Arc;

use crate::descriptor::ObsDescriptor;
use crate::error::ExhibitResult;
use crate::exhibit::{Exhibit, ExhibitDescriptor};
use crate::frame::FrameRef;
use crate::stage::{Calculator, Functor, StageState};

/// Projects one named frame out of an exhibit. Rows are shared, never copied.
#[derive(Debug)]
pub struct LookupCalculator {
    frame: String,
    state: StageState<ObsDescriptor>,
}

impl LookupCalculator {
    pub fn new(frame: impl Into<String>) -> Self {
        Self {
            frame: frame.into(),
            state: StageState::default(),
        }
    }

    pub fn frame_name(&self) -> &str {
        &self.frame
    }
}

impl Calculator for LookupCalculator {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ObsDescriptor> {
        let resolved = descriptor.frame(&self.frame)?.clone();
        log::debug!("lookup of frame {} resolved [{resolved}]", self.frame);
        self.state.set("lookup", resolved).cloned()
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<FrameRef> {
        self.state.resolved("lookup")?;
        log::trace!("lookup of frame {}", self.frame);
        Ok(Arc::clone(exhibit.frame(&self.frame)?))
    }

    fn cleanup(&mut self) {
        self.state.clean_up();
    }
}

/// Like [`LookupCalculator`], but wraps the frame in a one-frame exhibit for chaining.
#[derive(Debug)]
pub struct LookupFunctor {
    frame: String,
    state: StageState<ExhibitDescriptor>,
}

impl LookupFunctor {
    pub fn new(frame: impl Into<String>) -> Self {
        Self {
            frame: frame.into(),
            state: StageState::default(),
        }
    }
}

impl Functor for LookupFunctor {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        let resolved = ExhibitDescriptor::of_frame(&self.frame, descriptor.frame(&self.frame)?.clone());
        log::debug!("lookup functor resolved {resolved}");
        self.state.set("lookup", resolved).cloned()
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        self.state.resolved("lookup")?;
        let frame = Arc::clone(exhibit.frame(&self.frame)?);
        Ok(Exhibit::of_frame(&self.frame, frame))
    }

    fn cleanup(&mut self) {
        self.state.clean_up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExhibitError;
    use crate::frame::SimpleFrame;
    use crate::obs::Obs;
    use crate::types::{FieldType, Value};
    use pretty_assertions::assert_eq;

    fn exhibit() -> (Exhibit, FrameRef) {
        let desc = ObsDescriptor::of(&[("a", FieldType::Integer)]).unwrap();
        let frame: FrameRef =
            Arc::new(SimpleFrame::from_values(desc, vec![vec![Value::from(1)]]).unwrap());
        let attrs = ObsDescriptor::of(&[("id", FieldType::String)]).unwrap();
        let exhibit = Exhibit::new(Obs::of(attrs, ["p"]).unwrap()).with_frame("t", frame.clone());
        (exhibit, frame)
    }

    #[test]
    fn lookup_returns_the_same_frame() {
        let (exhibit, frame) = exhibit();
        let mut calc = LookupCalculator::new("t");
        let out = calc.initialize(&exhibit.descriptor()).unwrap();
        assert_eq!(&out, frame.descriptor());
        let result = calc.apply(&exhibit).unwrap();
        assert!(Arc::ptr_eq(&result, &frame));
    }

    #[test]
    fn missing_frame_fails_initialize() {
        let (exhibit, _) = exhibit();
        let mut calc = LookupCalculator::new("nope");
        assert!(matches!(
            calc.initialize(&exhibit.descriptor()),
            Err(ExhibitError::UnknownFrame(_))
        ));
        assert!(matches!(
            calc.apply(&exhibit),
            Err(ExhibitError::NotInitialized { .. })
        ));
    }

    #[test]
    fn apply_against_exhibit_without_frame_is_lookup_error() {
        let (exhibit, _) = exhibit();
        let mut calc = LookupCalculator::new("t");
        calc.initialize(&exhibit.descriptor()).unwrap();
        assert!(matches!(
            calc.apply(&Exhibit::empty()),
            Err(ExhibitError::UnknownFrame(_))
        ));
        // the stage keeps working for the next exhibit
        assert!(calc.apply(&exhibit).is_ok());
    }

    #[test]
    fn functor_wraps_single_frame() {
        let (exhibit, frame) = exhibit();
        let mut functor = LookupFunctor::new("t");
        let desc = functor.initialize(&exhibit.descriptor()).unwrap();
        assert_eq!(desc.attributes().size(), 0);
        assert_eq!(desc.frames().len(), 1);
        let out = functor.apply(&exhibit).unwrap();
        assert_eq!(out.descriptor(), desc);
        assert!(Arc::ptr_eq(out.frame("t").unwrap(), &frame));
        functor.cleanup();
        assert!(matches!(
            functor.apply(&exhibit),
            Err(ExhibitError::CleanedUp { .. })
        ));
    }
}
