use mysqlbench_common::{ParseError, PERCENTILES};

/// Summary statistics of one throughput series.
#[derive(Debug, Clone, PartialEq)]
pub struct TpsStatistics {
    /// `(percentile, value)` pairs in [`PERCENTILES`] order.
    pub percentiles: Vec<(f64, f64)>,
    pub average: f64,
    pub stddev: f64,
}

impl TpsStatistics {
    /// Compute nearest-rank percentiles, mean and sample standard deviation.
    pub fn from_samples(samples: &[f64]) -> Result<Self, ParseError> {
        if samples.is_empty() {
            return Err(ParseError::EmptySeries);
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));

        let percentiles = PERCENTILES.iter().map(|&p| (p, nearest_rank(&sorted, p))).collect();

        let count = sorted.len() as f64;
        let average = sorted.iter().sum::<f64>() / count;
        let stddev = if sorted.len() > 1 {
            let squares: f64 = samples.iter().map(|s| (s - average).powi(2)).sum();
            (squares / (count - 1.0)).sqrt()
        } else {
            0.0
        };

        Ok(Self { percentiles, average, stddev })
    }

    /// Look a value up by its label: `p<N>`, `average` or `stddev`.
    pub fn get(&self, label: &str) -> Option<f64> {
        match label {
            "average" => Some(self.average),
            "stddev" => Some(self.stddev),
            _ => self
                .percentiles
                .iter()
                .find(|(p, _)| percentile_label(*p) == label)
                .map(|(_, v)| *v),
        }
    }

    /// `stddev / average`, only defined for a positive average.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.average > 0.0).then(|| self.stddev / self.average)
    }
}

/// `p1`, `p50`, `p99.9`: the percentile in its shortest decimal form.
pub fn percentile_label(p: f64) -> String {
    format!("p{p}")
}

/// Sorted `data` must be non-empty. Returns the element at index
/// `floor(n * p / 100)`, clamped to the last element.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let idx = (sorted.len() as f64 * p / 100.0).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
