// Chart compiler: selections in, chart descriptions and grid layouts out

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::ir::{ChartId, ChartSpec, GridCell, GridLayout, GroupId, SeriesStyle};
use crate::palette::color_for;
use crate::scale::range_for;
use crate::selection::{AxisSide, SeriesSelection};
use crate::tooltip::build_tooltip;

/// Human-readable default title, e.g. `[A, B] vs [C]`.
pub fn default_title(primary: &SeriesSelection, secondary: &SeriesSelection) -> String {
    format!("{} vs {}", primary, secondary)
}

/// Compile a primary/secondary selection pair into a chart description.
///
/// Every named series must exist in `dataset`. The secondary axis gets an
/// explicit range over its own series; the primary axis is left to
/// auto-scale. Within each axis, series are drawn in reverse pick order so
/// the first pick ends up on top, and the hover indicator tracks that
/// topmost primary line.
pub fn build_chart(
    title: Option<&str>,
    dataset: &Dataset,
    primary: &SeriesSelection,
    secondary: &SeriesSelection,
    group: GroupId,
) -> Result<ChartSpec, PlotError> {
    // 1. Validate against the known column set
    dataset.require(primary)?;
    dataset.require(secondary)?;

    // 2. Secondary axis range (primary is intentionally not computed here)
    let secondary_range = range_for(dataset, AxisSide::Secondary, secondary.names())?;

    // 3. Styles: primary lines first, then secondary, each reversed
    let mut series = Vec::with_capacity(primary.len() + secondary.len());
    let draws = primary
        .iter()
        .rev()
        .map(|name| (name, AxisSide::Primary))
        .chain(secondary.iter().rev().map(|name| (name, AxisSide::Secondary)));
    for (draw_order, (name, axis)) in draws.enumerate() {
        series.push(SeriesStyle {
            name: name.to_string(),
            color: color_for(name),
            axis,
            draw_order,
        });
    }

    // 4. Tooltip in pick order
    let tooltip = build_tooltip(primary, secondary);

    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| default_title(primary, secondary));

    debug!(%title, series = series.len(), %group, "built chart spec");

    Ok(ChartSpec {
        id: ChartId::new(),
        title,
        primary: primary.clone(),
        secondary: secondary.clone(),
        secondary_range,
        series,
        tooltip,
        hover_anchor: primary.first().to_string(),
        group,
    })
}

/// Same as `build_chart`, starting from raw name lists as the selection UI
/// hands them over. An empty list fails with `EmptySelection`.
pub fn build_chart_from_names<S: AsRef<str>>(
    title: Option<&str>,
    dataset: &Dataset,
    primary: &[S],
    secondary: &[S],
    group: GroupId,
) -> Result<ChartSpec, PlotError> {
    let primary = SeriesSelection::new(AxisSide::Primary, primary.iter().map(|s| s.as_ref()))?;
    let secondary =
        SeriesSelection::new(AxisSide::Secondary, secondary.iter().map(|s| s.as_ref()))?;
    build_chart(title, dataset, &primary, &secondary, group)
}

/// Lay `n_charts` out on a grid with at most `columns` columns, filling
/// rows left to right.
pub fn compile_layout(n_charts: usize, columns: usize) -> GridLayout {
    if n_charts == 0 {
        return GridLayout {
            nrow: 0,
            ncol: 0,
            cells: Vec::new(),
        };
    }

    let ncol = columns.clamp(1, n_charts);
    let nrow = n_charts.div_ceil(ncol);
    let cells = (0..n_charts)
        .map(|chart| GridCell {
            row: chart / ncol,
            col: chart % ncol,
            chart,
        })
        .collect();

    GridLayout { nrow, ncol, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::AxisRange;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn make_dataset() -> Dataset {
        let dates = (1..=5)
            .map(|d| {
                NaiveDate::from_ymd_opt(2024, 1, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            })
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("Metric1".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        columns.insert("Metric2".to_string(), vec![10.0, 8.0, 12.0, 9.0, 11.0]);
        columns.insert("Metric3".to_string(), vec![-3.0, -2.0, -1.0, 0.0, 1.0]);
        columns.insert("Metric4".to_string(), vec![0.5, 0.25, 0.75, 1.0, 0.0]);
        Dataset::new(dates, columns).unwrap()
    }

    fn sel(axis: AxisSide, names: &[&str]) -> SeriesSelection {
        SeriesSelection::new(axis, names.iter().copied()).unwrap()
    }

    #[test]
    fn test_build_single_series_per_axis() {
        let data = make_dataset();
        let chart = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric1"]),
            &sel(AxisSide::Secondary, &["Metric2"]),
            GroupId(1),
        )
        .unwrap();

        assert_eq!(chart.title, "[Metric1] vs [Metric2]");
        assert_eq!(chart.tooltip.len(), 3);
        assert_eq!(chart.secondary_range, AxisRange { min: 8.0, max: 12.0 });
        assert_eq!(chart.hover_anchor, "Metric1");
        assert_eq!(chart.group, GroupId(1));

        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "Metric1");
        assert_eq!(chart.series[0].axis, AxisSide::Primary);
        assert_eq!(chart.series[1].name, "Metric2");
        assert_eq!(chart.series[1].axis, AxisSide::Secondary);
    }

    #[test]
    fn test_draw_order_is_reversed_per_axis() {
        let data = make_dataset();
        let chart = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric1", "Metric2", "Metric3"]),
            &sel(AxisSide::Secondary, &["Metric4"]),
            GroupId(1),
        )
        .unwrap();

        let primary: Vec<&str> = chart
            .series_on(AxisSide::Primary)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(primary, vec!["Metric3", "Metric2", "Metric1"]);

        let orders: Vec<usize> = chart.series.iter().map(|s| s.draw_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);

        // The first pick is drawn last among primaries and carries the hover
        assert_eq!(chart.hover_anchor, "Metric1");

        // Tooltip keeps the pick order
        let labels: Vec<&str> = chart.tooltip.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Date", "Metric1", "Metric2", "Metric3", "Metric4"]);
    }

    #[test]
    fn test_two_primaries_scenario() {
        let data = make_dataset();
        let chart = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric1", "Metric2"]),
            &sel(AxisSide::Secondary, &["Metric3"]),
            GroupId(0),
        )
        .unwrap();
        let primary: Vec<&str> = chart
            .series_on(AxisSide::Primary)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(primary, vec!["Metric2", "Metric1"]);
        assert_eq!(chart.title, "[Metric1, Metric2] vs [Metric3]");
    }

    #[test]
    fn test_secondary_range_ignores_primary() {
        let data = make_dataset();
        let chart = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric2"]),
            &sel(AxisSide::Secondary, &["Metric3", "Metric4"]),
            GroupId(0),
        )
        .unwrap();
        assert_eq!(chart.secondary_range, AxisRange { min: -3.0, max: 1.0 });
    }

    #[test]
    fn test_colors_follow_palette() {
        let data = make_dataset();
        let chart = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric1"]),
            &sel(AxisSide::Secondary, &["Metric1"]),
            GroupId(0),
        )
        .unwrap();
        // Same series on both axes: two styles, one color
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].color, color_for("Metric1"));
        assert_eq!(chart.series[0].color, chart.series[1].color);
        assert_eq!(chart.tooltip.len(), 3);
    }

    #[test]
    fn test_explicit_title() {
        let data = make_dataset();
        let chart = build_chart(
            Some("Plot 1"),
            &data,
            &sel(AxisSide::Primary, &["Metric1"]),
            &sel(AxisSide::Secondary, &["Metric2"]),
            GroupId(0),
        )
        .unwrap();
        assert_eq!(chart.title, "Plot 1");
    }

    #[test]
    fn test_unknown_series_fails() {
        let data = make_dataset();
        let res = build_chart(
            None,
            &data,
            &sel(AxisSide::Primary, &["Metric1"]),
            &sel(AxisSide::Secondary, &["Metric9"]),
            GroupId(0),
        );
        match res {
            Err(PlotError::UnknownSeries { name, .. }) => assert_eq!(name, "Metric9"),
            other => panic!("Expected UnknownSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_build_from_names_empty() {
        let data = make_dataset();
        let res = build_chart_from_names(None, &data, &["Metric1"], &[], GroupId(0));
        assert_eq!(
            res.unwrap_err(),
            PlotError::EmptySelection {
                axis: AxisSide::Secondary
            }
        );
        let res = build_chart_from_names::<&str>(None, &data, &[], &[], GroupId(0));
        assert_eq!(
            res.unwrap_err(),
            PlotError::EmptySelection {
                axis: AxisSide::Primary
            }
        );
    }

    #[test]
    fn test_rebuild_is_fresh_value() {
        let data = make_dataset();
        let p = sel(AxisSide::Primary, &["Metric1"]);
        let s = sel(AxisSide::Secondary, &["Metric2"]);
        let a = build_chart(None, &data, &p, &s, GroupId(0)).unwrap();
        let b = build_chart(None, &data, &p, &s, GroupId(0)).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.same_configuration(&b));
    }

    #[test]
    fn test_compile_layout_grid() {
        let layout = compile_layout(5, 3);
        assert_eq!((layout.nrow, layout.ncol), (2, 3));
        assert_eq!(layout.cells[4], GridCell { row: 1, col: 1, chart: 4 });
    }

    #[test]
    fn test_compile_layout_column_and_row() {
        let column = compile_layout(2, 1);
        assert_eq!((column.nrow, column.ncol), (2, 1));

        let row = compile_layout(2, 4);
        assert_eq!((row.nrow, row.ncol), (1, 2));

        let empty = compile_layout(0, 3);
        assert!(empty.cells.is_empty());
    }
}
