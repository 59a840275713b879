// Axis ranges: exact secondary domains and padded primary auto-scaling

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::selection::AxisSide;

/// Absolute half-width used to open up a zero-height range.
const DEGENERATE_PAD: f64 = 1.0;
/// Relative half-width for large magnitudes, where +-1.0 would vanish.
const DEGENERATE_PAD_REL: f64 = 1e-6;

/// Numeric domain of one axis. Invariant: `min < max` for any range
/// produced by this module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Axis domain over every value of every named series, across the whole
/// dataset: min of the per-series minimums, max of the per-series maximums.
/// A flat result is widened to `(v - eps, v + eps)`.
pub fn range_for<S: AsRef<str>>(
    dataset: &Dataset,
    axis: AxisSide,
    names: &[S],
) -> Result<AxisRange, PlotError> {
    if names.is_empty() {
        return Err(PlotError::EmptySelection { axis });
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for name in names {
        let (lo, hi) = min_max(dataset.column(name.as_ref())?);
        min = min.min(lo);
        max = max.max(hi);
    }

    let range = finish_range(min, max);
    debug!(%axis, min = range.min, max = range.max, "computed axis range");
    Ok(range)
}

/// Auto-scaled domain for the primary axis as drawn by the render sink:
/// the same data extent, padded by 5% on each side.
pub fn auto_range<S: AsRef<str>>(
    dataset: &Dataset,
    names: &[S],
) -> Result<AxisRange, PlotError> {
    let raw = range_for(dataset, AxisSide::Primary, names)?;
    Ok(pad_range(raw.min, raw.max))
}

/// Padded domain around raw bounds; a single value gets +-1.
pub fn pad_range(min: f64, max: f64) -> AxisRange {
    if min == max {
        AxisRange {
            min: min - 1.0,
            max: max + 1.0,
        }
    } else {
        let padding = (max - min) * 0.05;
        AxisRange {
            min: min - padding,
            max: max + padding,
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn finish_range(min: f64, max: f64) -> AxisRange {
    // Only NaN cells: nothing to scale against
    if !min.is_finite() || !max.is_finite() {
        return AxisRange { min: 0.0, max: 1.0 };
    }

    if min == max {
        let eps = DEGENERATE_PAD.max(min.abs() * DEGENERATE_PAD_REL);
        return AxisRange {
            min: min - eps,
            max: max + eps,
        };
    }

    AxisRange { min, max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn make_dataset(columns: Vec<(&str, Vec<f64>)>) -> Dataset {
        let n = columns[0].1.len();
        let dates = (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            })
            .collect();
        let columns: IndexMap<String, Vec<f64>> = columns
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Dataset::new(dates, columns).unwrap()
    }

    #[test]
    fn test_range_single_series() {
        let data = make_dataset(vec![("A", vec![3.0, -1.0, 7.5, 2.0, 0.0])]);
        let range = range_for(&data, AxisSide::Secondary, &["A"]).unwrap();
        assert_eq!(range, AxisRange { min: -1.0, max: 7.5 });
    }

    #[test]
    fn test_range_multiple_series() {
        let data = make_dataset(vec![
            ("A", vec![1.0, 2.0, 3.0]),
            ("B", vec![-5.0, 0.0, 1.0]),
            ("C", vec![100.0, 100.0, 100.0]),
        ]);
        let range = range_for(&data, AxisSide::Secondary, &["A", "B"]).unwrap();
        assert_eq!(range, AxisRange { min: -5.0, max: 3.0 });
    }

    #[test]
    fn test_range_flat_series_is_expanded() {
        let data = make_dataset(vec![("Flat", vec![10.0; 5])]);
        let range = range_for(&data, AxisSide::Secondary, &["Flat"]).unwrap();
        assert!(range.min < 10.0);
        assert!(range.max > 10.0);
        assert!(range.min < range.max);
    }

    #[test]
    fn test_range_flat_large_magnitude() {
        let data = make_dataset(vec![("Big", vec![1e20; 3])]);
        let range = range_for(&data, AxisSide::Secondary, &["Big"]).unwrap();
        assert!(range.min < 1e20 && 1e20 < range.max);
    }

    #[test]
    fn test_range_empty_selection() {
        let data = make_dataset(vec![("A", vec![1.0])]);
        let names: [&str; 0] = [];
        let res = range_for(&data, AxisSide::Secondary, &names);
        assert_eq!(
            res.unwrap_err(),
            PlotError::EmptySelection {
                axis: AxisSide::Secondary
            }
        );
    }

    #[test]
    fn test_range_unknown_series() {
        let data = make_dataset(vec![("A", vec![1.0])]);
        let res = range_for(&data, AxisSide::Secondary, &["A", "B"]);
        assert!(matches!(res, Err(PlotError::UnknownSeries { .. })));
    }

    #[test]
    fn test_range_ignores_nan() {
        let data = make_dataset(vec![("A", vec![f64::NAN, 2.0, 4.0])]);
        let range = range_for(&data, AxisSide::Secondary, &["A"]).unwrap();
        assert_eq!(range, AxisRange { min: 2.0, max: 4.0 });

        let all_nan = make_dataset(vec![("N", vec![f64::NAN, f64::NAN])]);
        let range = range_for(&all_nan, AxisSide::Secondary, &["N"]).unwrap();
        assert_eq!(range, AxisRange { min: 0.0, max: 1.0 });
    }

    #[test]
    fn test_auto_range_pads() {
        let data = make_dataset(vec![("A", vec![0.0, 100.0])]);
        let range = auto_range(&data, &["A"]).unwrap();
        assert_eq!(range, AxisRange { min: -5.0, max: 105.0 });
    }

    #[test]
    fn test_pad_range_single_point() {
        assert_eq!(pad_range(5.0, 5.0), AxisRange { min: 4.0, max: 6.0 });
    }
}
