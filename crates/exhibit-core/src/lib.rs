mod composite;
mod config;
mod descriptor;
mod error;
mod exhibit;
mod filter;
mod frame;
mod lookup;
mod obs;
mod pipeline;
mod pivot;
mod stage;
mod store;
mod types;
mod vector;

pub use crate::descriptor::{Field, ObsDescriptor, ObsDescriptorBuilder};
pub use crate::exhibit::{Exhibit, ExhibitDescriptor, UpdatableExhibit};
pub use crate::frame::{Column, Frame, FrameRef, SimpleFrame, UpdatableFrame};
pub use crate::obs::Obs;
pub use crate::types::{Decimal, FieldType, ParseDecimalError, Value};
pub use crate::vector::{Vector, VectorBuilder};

pub use crate::composite::{
    composite_descriptor, CompositeCalculator, CompositeExhibit, CompositeFunctor,
    CompositeObsDescriptor,
};
pub use crate::filter::FilterFunctor;
pub use crate::lookup::{LookupCalculator, LookupFunctor};
pub use crate::pipeline::Pipeline;
pub use crate::pivot::{PivotCalculator, PivotFunctor, PivotKey};
pub use crate::stage::{Calculator, Functor, IdentityFunctor};

pub use crate::config::{PipelineConfig, StageConfig};
pub use crate::store::{ExhibitId, ExhibitStore, MultiExhibitStore, NeighborLookup, SimpleExhibitStore};

pub use crate::error::{ExhibitError, ExhibitResult};
