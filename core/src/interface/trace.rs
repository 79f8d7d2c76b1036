//! Labeled diagnostic traces and the sink that renders them.

use crate::math::fft::{power_spectrum_db, shifted_frequencies};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// One named curve of `(x, y)` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// A figure: title, axis labels and one or more series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Destination for rendered traces. Implementations decide the format.
pub trait TraceSink {
    type Error;

    fn render(&mut self, trace: &Trace, name: &str) -> Result<(), Self::Error>;
}

impl Trace {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        self.series.push(Series {
            label: label.into(),
            points,
        });
        self
    }

    /// Real and imaginary parts against time in microseconds.
    pub fn time_domain(title: &str, samples: &[Complex64], sample_rate: f64) -> Self {
        let time = |k: usize| k as f64 / sample_rate * 1e6;
        let real = samples.iter().enumerate().map(|(k, v)| (time(k), v.re)).collect();
        let imag = samples.iter().enumerate().map(|(k, v)| (time(k), v.im)).collect();
        Self::new(title, "Time (us)", "Amplitude")
            .with_series("Real", real)
            .with_series("Imag", imag)
    }

    /// Power spectrum in dBFS against frequency in MHz.
    pub fn spectrum(title: &str, samples: &[Complex64], sample_rate: f64) -> Self {
        let freqs = shifted_frequencies(samples.len(), sample_rate);
        let points = freqs
            .iter()
            .zip(power_spectrum_db(samples))
            .map(|(f, db)| (f / 1e6, db))
            .collect();
        Self::new(title, "Frequency (MHz)", "Power (dBFS)").with_series("Spectrum", points)
    }

    /// `20 log10 |x|` against time in microseconds.
    pub fn power_db(title: &str, samples: &[Complex64], sample_rate: f64) -> Self {
        let points = samples
            .iter()
            .enumerate()
            .map(|(k, v)| {
                (
                    k as f64 / sample_rate * 1e6,
                    20.0 * (v.norm() + f64::EPSILON).log10(),
                )
            })
            .collect();
        Self::new(title, "Time (us)", "Power (dBFS)").with_series("Power", points)
    }

    /// Real-valued trace against time in microseconds.
    pub fn magnitude(title: &str, values: &[f64], sample_rate: f64) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(k, &v)| (k as f64 / sample_rate * 1e6, v))
            .collect();
        Self::new(title, "Time (us)", "Magnitude").with_series("Magnitude", points)
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Limits every series to about `max_points` by keeping the point with
    /// the largest `y` in each bucket, so peaks survive the reduction.
    pub fn reduced(&self, max_points: usize) -> Self {
        let max_points = max_points.max(1);
        let series = self
            .series
            .iter()
            .map(|series| {
                if series.points.len() <= max_points {
                    return series.clone();
                }
                let bucket = (series.points.len() + max_points - 1) / max_points;
                let points = series
                    .points
                    .chunks(bucket)
                    .filter_map(|chunk| chunk.iter().copied().max_by(|a, b| a.1.total_cmp(&b.1)))
                    .collect();
                Series {
                    label: series.label.clone(),
                    points,
                }
            })
            .collect();
        Self {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            series,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
