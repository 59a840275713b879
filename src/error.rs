// Error taxonomy for the chart configuration engine

use thiserror::Error;

use crate::selection::AxisSide;

/// Failures raised by the core. None of these are fatal: callers at the
/// selection-event boundary re-prompt instead of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error("no series selected for the {axis} axis (selection required)")]
    EmptySelection { axis: AxisSide },

    #[error("series '{name}' not found. Available series: {}", available.join(", "))]
    UnknownSeries { name: String, available: Vec<String> },

    #[error("dataset must contain at least one row")]
    EmptyDataset,

    #[error("dates must be unique and ascending (row {row})")]
    DatesNotAscending { row: usize },

    #[error("series '{name}' has {found} values, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("chart is not a member of any crosshair group")]
    UnknownChart,

    #[error("a crosshair group needs at least one chart")]
    EmptyGroup,

    #[error("charts were built for different crosshair groups")]
    GroupMismatch,

    #[error("slot {slot} out of range (1..={slots})")]
    SlotOutOfRange { slot: usize, slots: usize },
}

impl PlotError {
    /// True for the error the UI answers with a "selection required" notice.
    pub fn is_selection_required(&self) -> bool {
        matches!(self, PlotError::EmptySelection { .. })
    }
}
