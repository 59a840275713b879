// Series selections assigned to one axis of one chart

use std::fmt;

use crate::error::PlotError;

/// Which vertical axis a selection (or series) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisSide {
    Primary,
    Secondary,
}

impl fmt::Display for AxisSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisSide::Primary => write!(f, "primary"),
            AxisSide::Secondary => write!(f, "secondary"),
        }
    }
}

/// A non-empty, order-preserving set of series names.
///
/// Repeated names keep their first position; pick order is otherwise
/// preserved because it drives draw order and tooltip order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSelection {
    names: Vec<String>,
}

impl SeriesSelection {
    pub fn new<I, S>(axis: AxisSide, names: I) -> Result<Self, PlotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }

        if deduped.is_empty() {
            return Err(PlotError::EmptySelection { axis });
        }

        Ok(SeriesSelection { names: deduped })
    }

    /// Parse a comma-separated list such as `Metric1,Metric2`.
    pub fn parse(axis: AxisSide, input: &str) -> Result<Self, PlotError> {
        SeriesSelection::new(
            axis,
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.names[0]
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Members in sorted order; identical for any pick order.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut sorted = self.names.clone();
        sorted.sort();
        sorted
    }
}

impl fmt::Display for SeriesSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}
