//! Serializable stage configuration.
//!
//! ```json
//! {"stages": [
//!   {"type": "pivot", "frame": "visits", "by": ["id"],
//!    "variables": [{"name": "week", "levels": ["1", "2"]}]},
//!   {"type": "filter", "keep": ["visits"]}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

use crate::filter::FilterFunctor;
use crate::lookup::LookupFunctor;
use crate::pipeline::Pipeline;
use crate::pivot::{PivotFunctor, PivotKey};
use crate::stage::{Functor, IdentityFunctor};

/// One configured stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StageConfig {
    Lookup {
        frame: String,
    },
    Filter {
        keep: Vec<String>,
    },
    Pivot {
        frame: String,
        #[serde(default)]
        by: Vec<String>,
        variables: Vec<PivotKey>,
    },
}

impl StageConfig {
    pub fn build(&self) -> Box<dyn Functor> {
        match self {
            StageConfig::Lookup { frame } => Box::new(LookupFunctor::new(frame.clone())),
            StageConfig::Filter { keep } => Box::new(FilterFunctor::new(keep.iter().cloned())),
            StageConfig::Pivot {
                frame,
                by,
                variables,
            } => Box::new(PivotFunctor::new(
                frame.clone(),
                Box::new(IdentityFunctor::new()),
                by.clone(),
                variables.clone(),
            )),
        }
    }
}

/// An ordered list of stages, built into a [`Pipeline`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    pub fn build(&self) -> Pipeline {
        Pipeline::new(self.stages.iter().map(StageConfig::build).collect())
    }
}
