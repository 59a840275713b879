// Hover tooltip schema: which fields show up, in which order

use chrono::NaiveDateTime;

use crate::dataset::Dataset;
use crate::selection::SeriesSelection;

/// Display format for the date entry: calendar date only.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What a tooltip entry reads from the hovered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// The row's date key, shown with `format` (strftime syntax).
    Date { format: &'static str },
    /// A series column, by name.
    Series(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipField {
    pub label: String,
    pub field: FieldRef,
}

/// Ordered tooltip entries. The first is always the date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipSchema {
    pub fields: Vec<TooltipField>,
}

/// A tooltip entry resolved against one row. Value formatting is left to
/// whoever displays it.
#[derive(Debug, Clone, PartialEq)]
pub enum TooltipValue {
    Date(NaiveDateTime),
    Number(f64),
}

impl TooltipSchema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve every entry at row `index`. Entries whose series is missing
    /// from the dataset are skipped.
    pub fn values_at(&self, dataset: &Dataset, index: usize) -> Vec<(String, TooltipValue)> {
        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match &field.field {
                FieldRef::Date { .. } => {
                    dataset.dates().get(index).copied().map(TooltipValue::Date)
                }
                FieldRef::Series(name) => dataset.value(name, index).map(TooltipValue::Number),
            };
            if let Some(value) = value {
                out.push((field.label.clone(), value));
            }
        }
        out
    }

    /// `label: value` lines with the date in calendar form and numbers to
    /// three decimals.
    pub fn format_at(&self, dataset: &Dataset, index: usize) -> Vec<String> {
        self.values_at(dataset, index)
            .into_iter()
            .map(|(label, value)| match value {
                TooltipValue::Date(d) => format!("{}: {}", label, d.format(DATE_FORMAT)),
                TooltipValue::Number(v) => format!("{}: {:.3}", label, v),
            })
            .collect()
    }
}

/// Date entry first, then one entry per series: primary selection order,
/// then secondary selection order. A series on both axes appears twice.
pub fn build_tooltip(primary: &SeriesSelection, secondary: &SeriesSelection) -> TooltipSchema {
    let mut fields = Vec::with_capacity(1 + primary.len() + secondary.len());
    fields.push(TooltipField {
        label: "Date".to_string(),
        field: FieldRef::Date {
            format: DATE_FORMAT,
        },
    });

    for name in primary.iter().chain(secondary.iter()) {
        fields.push(TooltipField {
            label: name.to_string(),
            field: FieldRef::Series(name.to_string()),
        });
    }

    TooltipSchema { fields }
}
