// Date-keyed table of named numeric series

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::error::PlotError;
use crate::selection::SeriesSelection;

/// Ordered rows keyed by a unique, ascending date. Every series has exactly
/// one value per row. The core never mutates a dataset once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dates: Vec<NaiveDateTime>,
    columns: IndexMap<String, Vec<f64>>,
}

impl Dataset {
    pub fn new(
        dates: Vec<NaiveDateTime>,
        columns: IndexMap<String, Vec<f64>>,
    ) -> Result<Self, PlotError> {
        if dates.is_empty() {
            return Err(PlotError::EmptyDataset);
        }

        if let Some(pos) = dates.windows(2).position(|w| w[0] >= w[1]) {
            // Report the 1-based row that broke the ordering
            return Err(PlotError::DatesNotAscending { row: pos + 2 });
        }

        for (name, values) in &columns {
            if values.len() != dates.len() {
                return Err(PlotError::ColumnLength {
                    name: name.clone(),
                    expected: dates.len(),
                    found: values.len(),
                });
            }
        }

        Ok(Dataset { dates, columns })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDateTime] {
        &self.dates
    }

    /// Series names in column order.
    pub fn series_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn has_series(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], PlotError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PlotError::UnknownSeries {
                name: name.to_string(),
                available: self.series_names(),
            })
    }

    /// Fail with `UnknownSeries` on the first selected name the dataset lacks.
    pub fn require(&self, selection: &SeriesSelection) -> Result<(), PlotError> {
        for name in selection.iter() {
            self.column(name)?;
        }
        Ok(())
    }

    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.get(name).and_then(|v| v.get(index)).copied()
    }

    /// Index of the row whose date is closest to `at`.
    pub fn nearest_index(&self, at: NaiveDateTime) -> usize {
        nearest_date_index(&self.dates, at)
    }
}

/// Index of the date closest to `at` in an ascending, non-empty slice.
/// Ties go to the earlier date; positions outside the data clamp to the ends.
pub fn nearest_date_index(dates: &[NaiveDateTime], at: NaiveDateTime) -> usize {
    let idx = dates.partition_point(|d| *d < at);
    if idx == 0 {
        return 0;
    }
    if idx >= dates.len() {
        return dates.len() - 1;
    }

    let before = at - dates[idx - 1];
    let after = dates[idx] - at;
    if before <= after {
        idx - 1
    } else {
        idx
    }
}
