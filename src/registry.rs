// Session-scoped store of saved primary/secondary selections

use indexmap::IndexMap;
use std::fmt;
use tracing::debug;

use crate::compiler::build_chart;
use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::ir::{ChartSpec, GroupId};
use crate::selection::SeriesSelection;

/// A saved selection pair, replayable into a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlot {
    pub key: PlotKey,
    pub primary: SeriesSelection,
    pub secondary: SeriesSelection,
}

/// Saved plots for one session. Constructed empty, dropped with the
/// session, never written to disk. Entries are only added or overwritten.
#[derive(Debug, Default)]
pub struct SavedPlotRegistry {
    plots: IndexMap<PlotKey, SavedPlot>,
}

/// Identity of a saved plot: the sorted members of each axis, so pick order
/// does not matter. Names are compared whole, never by their joined text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlotKey {
    primary: Vec<String>,
    secondary: Vec<String>,
}

impl PlotKey {
    pub fn new(primary: &SeriesSelection, secondary: &SeriesSelection) -> Self {
        PlotKey {
            primary: primary.sorted_names(),
            secondary: secondary.sorted_names(),
        }
    }
}

/// Human-readable form, `A,B vs C`.
impl fmt::Display for PlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.primary.join(","), self.secondary.join(","))
    }
}

impl SavedPlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a selection pair. Saving the same member sets again replaces
    /// the earlier entry in place.
    pub fn save(&mut self, primary: &SeriesSelection, secondary: &SeriesSelection) -> PlotKey {
        let key = PlotKey::new(primary, secondary);
        let replaced = self
            .plots
            .insert(
                key.clone(),
                SavedPlot {
                    key: key.clone(),
                    primary: primary.clone(),
                    secondary: secondary.clone(),
                },
            )
            .is_some();
        debug!(%key, replaced, "saved plot");
        key
    }

    /// Saved plots in first-save order.
    pub fn list_all(&self) -> impl Iterator<Item = &SavedPlot> {
        self.plots.values()
    }

    pub fn get(&self, key: &PlotKey) -> Option<&SavedPlot> {
        self.plots.get(key)
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// Rebuild every saved plot against `dataset`, all in `group`.
    pub fn render_all(
        &self,
        dataset: &Dataset,
        group: GroupId,
    ) -> Result<Vec<ChartSpec>, PlotError> {
        self.plots
            .values()
            .map(|plot| build_chart(None, dataset, &plot.primary, &plot.secondary, group))
            .collect()
    }
}
