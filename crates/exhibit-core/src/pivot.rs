//! Reshaping long frames into wide rows.
//!
//! Every combination of key levels (the cross product of the declared key domains, first key
//! outermost) gets one group of output columns, one per value field. The column for value field
//! `f` under levels `l1, l2, ...` is named `f_l1_l2...`. Source rows are matched to a combination
//! by comparing the display form of their key values to the level labels, so a null key value
//! matches the label `null`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::{Field, ObsDescriptor};
use crate::error::{ExhibitError, ExhibitResult};
use crate::exhibit::{Exhibit, ExhibitDescriptor, UpdatableExhibit};
use crate::frame::{Frame, FrameRef, SimpleFrame};
use crate::obs::Obs;
use crate::stage::{Calculator, Functor, StageState};
use crate::types::Value;

/// A pivot key: a source field and the labels it may take, in output order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotKey {
    pub name: String,
    pub levels: Vec<String>,
}

impl PivotKey {
    pub fn new<S, I>(name: impl Into<String>, levels: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            name: name.into(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }
}

/// Every combination of levels, first key outermost.
fn cross_product(keys: &[PivotKey]) -> Vec<Vec<String>> {
    keys.iter().fold(vec![Vec::new()], |prefixes, key| {
        prefixes
            .iter()
            .flat_map(|prefix| {
                key.levels.iter().map(move |level| {
                    let mut combination = prefix.clone();
                    combination.push(level.clone());
                    combination
                })
            })
            .collect()
    })
}

fn column_name(field: &str, labels: &[String]) -> String {
    let mut name = field.to_string();
    for label in labels {
        name.push('_');
        name.push_str(label);
    }
    name
}

/// How source positions map onto the pivoted row.
#[derive(Clone, Debug)]
struct PivotLayout {
    source: ObsDescriptor,
    output: ObsDescriptor,
    pass_through: Vec<usize>,
    keys: Vec<usize>,
    values: Vec<usize>,
    combinations: HashMap<Vec<String>, usize>,
}

impl PivotLayout {
    fn new(source: &ObsDescriptor, pass_through: &[String], keys: &[PivotKey]) -> ExhibitResult<Self> {
        let position = |name: &str| {
            source
                .index_of(name)
                .ok_or_else(|| ExhibitError::UnknownField(name.to_string()))
        };
        let pass_positions = pass_through
            .iter()
            .map(|name| position(name.as_str()))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let key_positions = keys
            .iter()
            .map(|key| position(key.name.as_str()))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let values: Vec<usize> = (0..source.size())
            .filter(|idx| !pass_positions.contains(idx) && !key_positions.contains(idx))
            .collect();

        let combos = cross_product(keys);
        let mut fields: Vec<Field> = pass_positions
            .iter()
            .map(|&idx| source.fields()[idx].clone())
            .collect();
        for labels in &combos {
            for &idx in &values {
                let field = &source.fields()[idx];
                fields.push(Field::new(column_name(&field.name, labels), field.field_type));
            }
        }
        let output = ObsDescriptor::new(fields)?;
        let combinations = combos
            .into_iter()
            .enumerate()
            .map(|(idx, labels)| (labels, idx))
            .collect();
        Ok(Self {
            source: source.clone(),
            output,
            pass_through: pass_positions,
            keys: key_positions,
            values,
            combinations,
        })
    }

    fn check_source(&self, frame: &dyn Frame) -> ExhibitResult<()> {
        if frame.descriptor() != &self.source {
            return Err(ExhibitError::DescriptorMismatch {
                expected: self.source.to_string(),
                actual: frame.descriptor().to_string(),
            });
        }
        Ok(())
    }

    fn check_row(&self, row: &Obs) -> ExhibitResult<()> {
        if row.descriptor() != &self.source {
            return Err(ExhibitError::DescriptorMismatch {
                expected: self.source.to_string(),
                actual: row.descriptor().to_string(),
            });
        }
        Ok(())
    }

    /// Collapse `rows` into one output row.
    ///
    /// A combination matched by no row keeps nulls; one matched by several rows is an error.
    fn collapse(&self, rows: &[Obs]) -> ExhibitResult<Obs> {
        for row in rows {
            self.check_row(row)?;
        }
        let mut out = vec![Value::Null; self.output.size()];
        if let Some(first) = rows.first() {
            for (slot, &idx) in self.pass_through.iter().enumerate() {
                out[slot] = first.values()[idx].clone();
            }
        }

        let mut matched: HashMap<usize, Vec<&Obs>> = HashMap::new();
        for row in rows {
            let labels: Vec<String> = self
                .keys
                .iter()
                .map(|&idx| row.values()[idx].to_string())
                .collect();
            if let Some(&combo) = self.combinations.get(&labels) {
                matched.entry(combo).or_default().push(row);
            }
        }

        let width = self.values.len();
        for (combo, hits) in matched {
            if hits.len() > 1 {
                let labels: Vec<String> = self
                    .keys
                    .iter()
                    .map(|&idx| hits[0].values()[idx].to_string())
                    .collect();
                return Err(ExhibitError::AmbiguousPivotMatch {
                    combination: labels.join("_"),
                    matches: hits.len(),
                });
            }
            let base = self.pass_through.len() + combo * width;
            for (offset, &idx) in self.values.iter().enumerate() {
                out[base + offset] = hits[0].values()[idx].clone();
            }
        }
        Ok(Obs::from_parts(self.output.clone(), out))
    }
}

/// Pivots the frame produced by an upstream calculator into a single wide row.
pub struct PivotCalculator {
    base: Box<dyn Calculator>,
    pass_through: Vec<String>,
    keys: Vec<PivotKey>,
    state: StageState<PivotLayout>,
}

impl PivotCalculator {
    pub fn new(base: Box<dyn Calculator>, pass_through: Vec<String>, keys: Vec<PivotKey>) -> Self {
        Self {
            base,
            pass_through,
            keys,
            state: StageState::default(),
        }
    }

    /// Pivot on a single key with no pass-through fields.
    pub fn single_key(base: Box<dyn Calculator>, key: PivotKey) -> Self {
        Self::new(base, Vec::new(), vec![key])
    }
}

impl Calculator for PivotCalculator {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ObsDescriptor> {
        let source = self.base.initialize(descriptor)?;
        let layout = PivotLayout::new(&source, &self.pass_through, &self.keys)?;
        log::debug!("pivot resolved [{}]", layout.output);
        Ok(self.state.set("pivot", layout)?.output.clone())
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<FrameRef> {
        self.state.resolved("pivot")?;
        let frame = self.base.apply(exhibit)?;
        let layout = self.state.resolved("pivot")?;
        layout.check_source(frame.as_ref())?;
        let rows = frame.rows();
        log::trace!("pivot collapsing {} rows", rows.len());
        let row = layout.collapse(&rows)?;
        Ok(Arc::new(SimpleFrame::from_parts(layout.output.clone(), vec![row])))
    }

    fn cleanup(&mut self) {
        if self.state.clean_up() {
            self.base.cleanup();
        }
    }
}

/// Pivots one named frame of an upstream functor's output, one row per distinct `by` tuple.
///
/// Groups appear in the order their first row appears. The pivoted frame replaces the source
/// frame under the same name; everything else in the upstream exhibit is passed along.
pub struct PivotFunctor {
    frame: String,
    base: Box<dyn Functor>,
    by: Vec<String>,
    keys: Vec<PivotKey>,
    state: StageState<PivotLayout>,
}

impl PivotFunctor {
    pub fn new(
        frame: impl Into<String>,
        base: Box<dyn Functor>,
        by: Vec<String>,
        keys: Vec<PivotKey>,
    ) -> Self {
        Self {
            frame: frame.into(),
            base,
            by,
            keys,
            state: StageState::default(),
        }
    }
}

impl Functor for PivotFunctor {
    fn initialize(&mut self, descriptor: &ExhibitDescriptor) -> ExhibitResult<ExhibitDescriptor> {
        let upstream = self.base.initialize(descriptor)?;
        let layout = PivotLayout::new(upstream.frame(&self.frame)?, &self.by, &self.keys)?;
        let resolved = upstream.with_frame(self.frame.clone(), layout.output.clone());
        log::debug!("pivot of frame {} resolved {resolved}", self.frame);
        self.state.set("pivot", layout)?;
        Ok(resolved)
    }

    fn apply(&mut self, exhibit: &Exhibit) -> ExhibitResult<Exhibit> {
        self.state.resolved("pivot")?;
        let upstream = self.base.apply(exhibit)?;
        let layout = self.state.resolved("pivot")?;
        let source = upstream.frame(&self.frame)?;
        layout.check_source(source.as_ref())?;

        let mut groups: Vec<Vec<Obs>> = Vec::new();
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        for row in source.iter() {
            layout.check_row(&row)?;
            let id: Vec<Value> = layout
                .pass_through
                .iter()
                .map(|&idx| row.values()[idx].clone())
                .collect();
            let slot = *index.entry(id).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
        log::trace!("pivot of frame {} produced {} groups", self.frame, groups.len());

        let rows = groups
            .iter()
            .map(|group| layout.collapse(group))
            .collect::<ExhibitResult<Vec<_>>>()?;
        let pivoted: FrameRef = Arc::new(SimpleFrame::from_parts(layout.output.clone(), rows));
        let mut out = UpdatableExhibit::new(&upstream);
        out.add_frame(self.frame.clone(), pivoted);
        Ok(out.into_exhibit())
    }

    fn cleanup(&mut self) {
        if self.state.clean_up() {
            self.base.cleanup();
        }
    }
}
