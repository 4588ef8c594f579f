//! Population-relative tanh normalisation
//!
//! `5 * tanh((x - mean) / (2 * std)) + 5` maps raw scores onto (0, 10) with
//! the population mean at exactly 5. The standard deviation is the sample
//! estimate (n - 1 denominator).

/// Score given to every value when the population has no spread
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Mean and sample standard deviation of a set of raw scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Population {
    pub mean: f64,
    pub std_dev: f64,
}

impl Population {
    /// Statistics over the finite values; `None` when fewer than two exist
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.len() < 2 {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    pub fn normalize(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 || !self.std_dev.is_finite() {
            return NEUTRAL_SCORE;
        }
        5.0 * ((value - self.mean) / (2.0 * self.std_dev)).tanh() + 5.0
    }
}

/// Normalises every present value against the population of present values
///
/// Missing values stay missing. A population of fewer than two values, or
/// one with zero spread, scores everything at [`NEUTRAL_SCORE`].
pub fn tanh_normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let population = Population::of(values.iter().flatten().copied());

    values
        .iter()
        .map(|value| {
            value.map(|v| match population {
                Some(population) => population.normalize(v),
                None => NEUTRAL_SCORE,
            })
        })
        .collect()
}
