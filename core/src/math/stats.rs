/// NaN-aware reductions over sensor samples. NaN marks a missing reading.
pub struct StatsHelper;

impl StatsHelper {
    pub fn count_valid(samples: &[f64]) -> usize {
        samples.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn nan_mean(samples: &[f64]) -> Option<f64> {
        let (sum, count) = samples
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            return None;
        }
        Some(sum / count as f64)
    }

    pub fn nan_max(samples: &[f64]) -> Option<f64> {
        samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }
}
