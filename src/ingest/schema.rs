//! Positional column schema for ridership files.

use crate::error::{PipelineError, PipelineResult};
use serde::Deserialize;

pub const DATE: &str = "date";
pub const LINE: &str = "line";
pub const STATION: &str = "station";
pub const BOARDING: &str = "boarding";
pub const ALIGHTING: &str = "alighting";
pub const TOTAL: &str = "total";

/// Columns every schema must name.
pub const REQUIRED_COLUMNS: [&str; 5] = [DATE, LINE, BOARDING, ALIGHTING, TOTAL];

/// Ordered column names applied to the input by position.
///
/// The header row of the input is discarded; the n-th column is labelled with
/// the n-th name here, so reordered source columns are silently mislabelled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, if the schema has it.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// True when every name in `names` is part of the schema.
    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.contains(n))
    }

    /// Reject schemas with duplicate names or without the required columns.
    pub fn validate(&self) -> PipelineResult<()> {
        for (i, name) in self.names.iter().enumerate() {
            if self.names[..i].contains(name) {
                return Err(PipelineError::Config(format!(
                    "column '{name}' appears more than once"
                )));
            }
        }

        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !self.contains(c)) {
            return Err(PipelineError::Config(format!(
                "column schema lacks required column '{missing}'"
            )));
        }

        Ok(())
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::new(REQUIRED_COLUMNS)
    }
}
