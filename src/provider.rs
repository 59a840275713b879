// Data providers: where the dataset comes from

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

use crate::csv_reader;
use crate::dataset::Dataset;

/// External collaborator that hands the core a dataset.
pub trait DataProvider {
    fn get_dataset(&self) -> Result<Dataset>;
}

/// Reads a CSV file, or stdin when the path is `-`.
pub struct CsvProvider {
    pub path: PathBuf,
}

impl DataProvider for CsvProvider {
    fn get_dataset(&self) -> Result<Dataset> {
        let csv_data = if self.path.as_os_str() == "-" {
            csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?
        } else {
            let file = File::open(&self.path)
                .with_context(|| format!("Failed to open {}", self.path.display()))?;
            csv_reader::read_csv(file)
                .with_context(|| format!("Failed to read CSV from {}", self.path.display()))?
        };

        csv_reader::to_dataset(&csv_data)
    }
}

/// (mean, standard deviation) of the daily step for each sample metric.
const SAMPLE_STEPS: [(f64, f64); 8] = [
    (-10.0, 0.5),
    (1.0, 0.3),
    (-1.0, 0.4),
    (1.0, 0.2),
    (0.5, 0.3),
    (-0.5, 0.2),
    (1.5, 0.4),
    (-1.5, 0.3),
];

/// Random-walk sample data: `Metric1..Metric8` over `days` consecutive days
/// ending at `end`.
pub struct SampleProvider {
    pub days: usize,
    pub seed: Option<u64>,
    pub end: NaiveDate,
}

impl SampleProvider {
    pub fn new(days: usize, seed: Option<u64>) -> Self {
        SampleProvider {
            days,
            seed,
            end: Local::now().date_naive(),
        }
    }
}

impl DataProvider for SampleProvider {
    fn get_dataset(&self) -> Result<Dataset> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let first = i64::try_from(self.days.saturating_sub(1))
            .ok()
            .and_then(Duration::try_days)
            .and_then(|back| self.end.checked_sub_signed(back))
            .with_context(|| {
                format!("{} days of sample data reach past the supported dates", self.days)
            })?;
        let dates = first
            .iter_days()
            .take(self.days)
            .map(|d| d.and_hms_opt(0, 0, 0).context("Invalid sample date"))
            .collect::<Result<Vec<_>>>()?;

        let mut columns = IndexMap::new();
        for (idx, &(mean, sd)) in SAMPLE_STEPS.iter().enumerate() {
            let step = Normal::new(mean, sd).context("Invalid sample distribution")?;
            let mut total = 0.0;
            let walk: Vec<f64> = (0..self.days)
                .map(|_| {
                    total += step.sample(&mut rng);
                    total
                })
                .collect();
            columns.insert(format!("Metric{}", idx + 1), walk);
        }

        debug!(days = self.days, seed = ?self.seed, "generated sample dataset");
        Ok(Dataset::new(dates, columns)?)
    }
}
