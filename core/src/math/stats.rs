use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    pub fn mean(samples: &[Complex64]) -> Complex64 {
        if samples.is_empty() {
            return Complex64::new(0.0, 0.0);
        }
        samples.iter().sum::<Complex64>() / samples.len() as f64
    }

    /// Population variance `mean(|x - mean(x)|^2)` of a complex sequence.
    pub fn variance(samples: &[Complex64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean = Self::mean(samples);
        let sum: f64 = samples.iter().map(|&v| (v - mean).norm_sqr()).sum();
        sum / samples.len() as f64
    }

    pub fn std_dev(samples: &[Complex64]) -> f64 {
        Self::variance(samples).sqrt()
    }

    pub fn median(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        }
    }
}
