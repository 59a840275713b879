// Chart descriptions produced by the compiler and consumed by the renderer

use std::fmt;
use uuid::Uuid;

use crate::palette::Rgb;
use crate::scale::AxisRange;
use crate::selection::{AxisSide, SeriesSelection};
use crate::tooltip::TooltipSchema;

// =============================================================================
// Identity
// =============================================================================

/// Identity of one built chart. Every build gets a fresh id, so a rebuilt
/// chart is a different chart as far as crosshair groups are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartId(Uuid);

impl ChartId {
    pub fn new() -> Self {
        ChartId(Uuid::new_v4())
    }
}

impl Default for ChartId {
    fn default() -> Self {
        ChartId::new()
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Crosshair group label. Allocated by the coordinator; charts only carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

// =============================================================================
// Chart description
// =============================================================================

/// How one series is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub name: String,
    pub color: Rgb,
    pub axis: AxisSide,
    /// Position in the chart's draw sequence (0 = drawn first, at the bottom).
    pub draw_order: usize,
}

/// A fully specified, ready-to-render dual-axis chart. Immutable once built;
/// a changed selection produces a new spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: ChartId,
    pub title: String,
    pub primary: SeriesSelection,
    pub secondary: SeriesSelection,
    /// The primary axis auto-scales at render time; only the secondary axis
    /// carries an explicit range.
    pub secondary_range: AxisRange,
    /// Sorted by `draw_order`.
    pub series: Vec<SeriesStyle>,
    pub tooltip: TooltipSchema,
    /// Primary series the hover indicator tracks (the topmost primary line).
    pub hover_anchor: String,
    pub group: GroupId,
}

impl ChartSpec {
    pub fn series_on(&self, axis: AxisSide) -> impl Iterator<Item = &SeriesStyle> {
        self.series.iter().filter(move |s| s.axis == axis)
    }

    /// Same selections, ranges, styles and tooltip, regardless of identity,
    /// title and group.
    pub fn same_configuration(&self, other: &ChartSpec) -> bool {
        self.primary == other.primary
            && self.secondary == other.secondary
            && self.secondary_range == other.secondary_range
            && self.series == other.series
            && self.tooltip == other.tooltip
            && self.hover_anchor == other.hover_anchor
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Placement of a list of charts on a grid, filled row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub nrow: usize,
    pub ncol: usize,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    /// Index into the chart list the layout was compiled from.
    pub chart: usize,
}
