// Interactive session: serialized selection, hover, save and render events

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::compiler::build_chart_from_names;
use crate::config::RenderConfig;
use crate::crosshair::{CrosshairCoordinator, CrosshairState, CrosshairUpdate};
use crate::csv_reader::parse_date;
use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::graph;
use crate::ir::{ChartId, ChartSpec, GroupId};
use crate::registry::{PlotKey, SavedPlotRegistry};
use crate::selection::{AxisSide, SeriesSelection};

/// Default selections per slot, used when the dataset has these columns.
const DEFAULT_SELECTIONS: [(&str, &str); 2] = [("Metric1", "Metric2"), ("Metric3", "Metric4")];

/// Which chart an event points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Comparison slot, 1-based.
    Slot(usize),
    /// Saved plot in the saved grid, 1-based.
    Saved(usize),
}

/// One session event.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select {
        slot: usize,
        axis: AxisSide,
        names: Vec<String>,
    },
    Save { slot: usize },
    Hover { target: Target, at: NaiveDateTime },
    Leave { target: Target },
    Tooltip { target: Target },
    List,
    Render { path: PathBuf },
    RenderSaved { path: PathBuf },
}

/// Parse one event line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let command = match (verb, args.as_slice()) {
        ("select", [slot, axis, rest @ ..]) => {
            let axis = match *axis {
                "primary" => AxisSide::Primary,
                "secondary" => AxisSide::Secondary,
                other => bail!("Unknown axis '{}' (expected primary or secondary)", other),
            };
            let names = rest
                .join(" ")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            Command::Select {
                slot: parse_slot(slot)?,
                axis,
                names,
            }
        }
        ("save", [slot]) => Command::Save {
            slot: parse_slot(slot)?,
        },
        ("hover", [target, date]) => Command::Hover {
            target: parse_target(target)?,
            at: parse_date(date).ok_or_else(|| anyhow!("Invalid date '{}'", date))?,
        },
        ("leave", [target]) => Command::Leave {
            target: parse_target(target)?,
        },
        ("tooltip", [target]) => Command::Tooltip {
            target: parse_target(target)?,
        },
        ("list", []) => Command::List,
        ("render", [path]) => Command::Render {
            path: PathBuf::from(path),
        },
        ("render-saved", [path]) => Command::RenderSaved {
            path: PathBuf::from(path),
        },
        _ => bail!("Unrecognized command '{}'", line),
    };

    Ok(Some(command))
}

fn parse_slot(input: &str) -> Result<usize> {
    let slot = input
        .parse::<usize>()
        .with_context(|| format!("Invalid slot '{}'", input))?;
    if slot == 0 {
        bail!("Slots are numbered from 1");
    }
    Ok(slot)
}

fn parse_target(input: &str) -> Result<Target> {
    match input.strip_prefix('s') {
        Some(rest) => Ok(Target::Saved(parse_slot(rest)?)),
        None => Ok(Target::Slot(parse_slot(input)?)),
    }
}

/// One comparison chart position and its current selections.
#[derive(Debug, Clone, Default)]
pub struct ChartSlot {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    /// `None` while a selection is empty or the last build failed.
    pub chart: Option<ChartSpec>,
}

/// Everything one interactive session owns. Events are applied one at a
/// time, each to completion.
pub struct Session {
    dataset: Dataset,
    slots: Vec<ChartSlot>,
    registry: SavedPlotRegistry,
    crosshair: CrosshairCoordinator,
    slot_group: GroupId,
    saved_group: GroupId,
    saved_charts: Vec<ChartSpec>,
    /// Set by `save`; the saved charts are rebuilt only after a change.
    saved_dirty: bool,
    comparison: RenderConfig,
    saved: RenderConfig,
}

impl Session {
    pub fn new(dataset: Dataset, n_slots: usize) -> Self {
        let mut crosshair = CrosshairCoordinator::new();
        let slot_group = crosshair.create_group();
        let saved_group = crosshair.create_group();

        let slots = (0..n_slots)
            .map(|i| {
                let mut slot = ChartSlot::default();
                if let Some(&(p, s)) = DEFAULT_SELECTIONS.get(i) {
                    if dataset.has_series(p) && dataset.has_series(s) {
                        slot.primary = vec![p.to_string()];
                        slot.secondary = vec![s.to_string()];
                    }
                }
                slot
            })
            .collect();

        let mut session = Session {
            dataset,
            slots,
            registry: SavedPlotRegistry::new(),
            crosshair,
            slot_group,
            saved_group,
            saved_charts: Vec::new(),
            saved_dirty: false,
            comparison: RenderConfig::comparison(),
            saved: RenderConfig::saved_grid(),
        };

        for idx in 0..session.slots.len() {
            if let Err(e) = session.rebuild_slot(idx) {
                warn!(slot = idx + 1, error = %e, "initial chart build failed");
            }
        }
        session.relink_slots();
        session
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn slots(&self) -> &[ChartSlot] {
        &self.slots
    }

    pub fn registry(&self) -> &SavedPlotRegistry {
        &self.registry
    }

    pub fn crosshair(&self) -> &CrosshairCoordinator {
        &self.crosshair
    }

    /// Replace one axis's selection for a slot and rebuild its chart.
    /// An empty selection leaves the slot without a chart and reports
    /// `EmptySelection`; unknown series fail the build.
    pub fn select(
        &mut self,
        slot: usize,
        axis: AxisSide,
        names: Vec<String>,
    ) -> Result<(), PlotError> {
        let idx = self.slot_index(slot)?;
        match axis {
            AxisSide::Primary => self.slots[idx].primary = names,
            AxisSide::Secondary => self.slots[idx].secondary = names,
        }
        let result = self.rebuild_slot(idx);
        self.relink_slots();
        result
    }

    /// Save a slot's current selections. Returns the registry key. Series
    /// missing from the dataset are refused so the saved grid stays buildable.
    pub fn save(&mut self, slot: usize) -> Result<PlotKey, PlotError> {
        let current = &self.slots[self.slot_index(slot)?];
        let primary = SeriesSelection::new(AxisSide::Primary, current.primary.iter().cloned())?;
        let secondary =
            SeriesSelection::new(AxisSide::Secondary, current.secondary.iter().cloned())?;
        self.dataset.require(&primary)?;
        self.dataset.require(&secondary)?;

        let key = self.registry.save(&primary, &secondary);
        self.saved_dirty = true;
        info!(%key, slot, "saved plot");
        Ok(key)
    }

    /// Move the pointer over a chart.
    pub fn hover(&mut self, target: Target, at: NaiveDateTime) -> Result<CrosshairUpdate> {
        let chart = self.chart_id(target)?;
        Ok(self.crosshair.pointer_moved(chart, at)?)
    }

    pub fn leave(&mut self, target: Target) -> Result<CrosshairState> {
        let chart = self.chart_id(target)?;
        Ok(self.crosshair.pointer_left(chart)?)
    }

    /// Tooltip lines for a chart at the group's crosshair, if one is active.
    pub fn tooltip(&mut self, target: Target) -> Result<Option<Vec<String>>> {
        let chart_id = self.chart_id(target)?;
        let Some(index) = self.crosshair.active_index(chart_id) else {
            return Ok(None);
        };
        let chart = self.chart(target)?;
        Ok(Some(chart.tooltip.format_at(&self.dataset, index)))
    }

    /// PNG of every comparison slot that currently has a chart.
    pub fn render(&self) -> Result<Vec<u8>> {
        let charts: Vec<ChartSpec> = self.slots.iter().filter_map(|s| s.chart.clone()).collect();
        if charts.is_empty() {
            bail!("Selection required: no slot has both a primary and a secondary selection");
        }
        let active = self.crosshair.active_index(charts[0].id);
        graph::render_grid(&charts, &self.dataset, &self.comparison, active)
    }

    /// PNG of every saved plot, or `None` while nothing has been saved.
    pub fn render_saved(&mut self) -> Result<Option<Vec<u8>>> {
        self.refresh_saved()?;
        if self.saved_charts.is_empty() {
            return Ok(None);
        }
        let active = self.crosshair.active_index(self.saved_charts[0].id);
        let png = graph::render_grid(&self.saved_charts, &self.dataset, &self.saved, active)?;
        Ok(Some(png))
    }

    /// Apply one event, writing its outcome to `out`.
    pub fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Select { slot, axis, names } => {
                self.check_slot(slot)?;
                match self.select(slot, axis, names) {
                    Ok(()) => {
                        let title = self.slots[slot - 1]
                            .chart
                            .as_ref()
                            .map(|c| c.title.clone())
                            .unwrap_or_default();
                        writeln!(out, "slot {}: {}", slot, title)?;
                    }
                    Err(e) if e.is_selection_required() => {
                        warn!(slot, "chart suppressed: {}", e);
                        writeln!(out, "slot {}: selection required", slot)?;
                    }
                    Err(e) => {
                        let context = format!("slot {}: chart build failed", slot);
                        return Err(anyhow!(e).context(context));
                    }
                }
            }
            Command::Save { slot } => {
                self.check_slot(slot)?;
                match self.save(slot) {
                    Ok(key) => {
                        self.refresh_saved()?;
                        writeln!(out, "saved '{}' ({} saved)", key, self.registry.len())?;
                    }
                    Err(e) if e.is_selection_required() => {
                        writeln!(out, "slot {}: selection required", slot)?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Command::Hover { target, at } => {
                let update = self.hover(target, at)?;
                writeln!(
                    out,
                    "crosshair at {} on {} chart(s)",
                    update.date.format(crate::tooltip::DATE_FORMAT),
                    update.members.len()
                )?;
            }
            Command::Leave { target } => match self.leave(target)? {
                CrosshairState::Idle => writeln!(out, "crosshair idle")?,
                CrosshairState::Tracking { date, .. } => writeln!(
                    out,
                    "crosshair at {}",
                    date.format(crate::tooltip::DATE_FORMAT)
                )?,
            },
            Command::Tooltip { target } => match self.tooltip(target)? {
                Some(lines) => {
                    for line in lines {
                        writeln!(out, "{}", line)?;
                    }
                }
                None => writeln!(out, "no active crosshair")?,
            },
            Command::List => {
                if self.registry.is_empty() {
                    writeln!(out, "No saved plots yet")?;
                }
                for plot in self.registry.list_all() {
                    writeln!(out, "{}: {} vs {}", plot.key, plot.primary, plot.secondary)?;
                }
            }
            Command::Render { path } => {
                let png = self.render()?;
                write_png(&path, &png)?;
                info!(path = %path.display(), "rendered comparison charts");
                writeln!(out, "wrote {}", path.display())?;
            }
            Command::RenderSaved { path } => match self.render_saved()? {
                Some(png) => {
                    write_png(&path, &png)?;
                    info!(path = %path.display(), "rendered saved plots");
                    writeln!(out, "wrote {}", path.display())?;
                }
                None => writeln!(out, "No saved plots yet")?,
            },
        }
        Ok(())
    }

    /// Process events line by line. A failing event is reported and the
    /// session carries on with the next one.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        for (line_no, line) in input.lines().enumerate() {
            let line = line.context("Failed to read session input")?;
            let outcome = parse_command(&line).and_then(|cmd| match cmd {
                Some(cmd) => self.handle(cmd, &mut out),
                None => Ok(()),
            });
            if let Err(e) = outcome {
                warn!(line = line_no + 1, "event failed: {:#}", e);
                writeln!(out, "error: {:#}", e)?;
            }
        }
        out.flush().context("Failed to flush session output")?;
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        self.slot_index(slot)?;
        Ok(())
    }

    /// 0-based index of a 1-based slot number.
    fn slot_index(&self, slot: usize) -> Result<usize, PlotError> {
        if slot == 0 || slot > self.slots.len() {
            return Err(PlotError::SlotOutOfRange {
                slot,
                slots: self.slots.len(),
            });
        }
        Ok(slot - 1)
    }

    fn chart(&self, target: Target) -> Result<&ChartSpec> {
        match target {
            Target::Slot(slot) => {
                self.check_slot(slot)?;
                self.slots[slot - 1]
                    .chart
                    .as_ref()
                    .ok_or_else(|| anyhow!("Slot {} has no chart (selection required)", slot))
            }
            Target::Saved(n) => self
                .saved_charts
                .get(n.wrapping_sub(1))
                .ok_or_else(|| anyhow!("No saved plot #{}", n)),
        }
    }

    fn chart_id(&mut self, target: Target) -> Result<ChartId> {
        if matches!(target, Target::Saved(_)) {
            self.refresh_saved()?;
        }
        Ok(self.chart(target)?.id)
    }

    fn rebuild_slot(&mut self, idx: usize) -> Result<(), PlotError> {
        let slot = &mut self.slots[idx];
        // A new selection always replaces the old chart, even on failure
        slot.chart = None;
        let chart = build_chart_from_names(
            None,
            &self.dataset,
            slot.primary.as_slice(),
            slot.secondary.as_slice(),
            self.slot_group,
        )?;
        slot.chart = Some(chart);
        Ok(())
    }

    fn relink_slots(&mut self) {
        let charts: Vec<ChartSpec> = self.slots.iter().filter_map(|s| s.chart.clone()).collect();
        if charts.is_empty() {
            for id in self.crosshair.members(self.slot_group).to_vec() {
                self.crosshair.detach(id);
            }
            return;
        }
        if let Err(e) = self.crosshair.link_group(&charts, &self.dataset) {
            warn!(error = %e, "failed to link comparison charts");
        }
    }

    fn refresh_saved(&mut self) -> Result<()> {
        if !self.saved_dirty {
            return Ok(());
        }

        // Relinking resets the group, so carry an active crosshair over by
        // position. Saved plots never move once listed.
        let tracking = match self.crosshair.state(self.saved_group) {
            Some(CrosshairState::Tracking { source, date, .. }) => self
                .saved_charts
                .iter()
                .position(|c| c.id == source)
                .map(|pos| (pos, date)),
            _ => None,
        };

        let charts = self.registry.render_all(&self.dataset, self.saved_group)?;
        if !charts.is_empty() {
            self.crosshair.link_group(&charts, &self.dataset)?;
            let carried = tracking.and_then(|(pos, date)| Some((charts.get(pos)?.id, date)));
            if let Some((chart, date)) = carried {
                self.crosshair.pointer_moved(chart, date)?;
            }
        }
        self.saved_charts = charts;
        self.saved_dirty = false;
        Ok(())
    }
}

fn write_png(path: &PathBuf, png: &[u8]) -> Result<()> {
    fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))
}
