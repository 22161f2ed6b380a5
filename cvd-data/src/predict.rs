//! Polynomial-regression forecasts of a cumulative metric.

use chrono::{Days, NaiveDate};
use cvd_core::{Metric, TimeseriesRow};
use serde::Serialize;

/// Degree used for forecasts.
pub const DEFAULT_DEGREE: usize = 3;

/// Least-squares polynomial fit `y = c0 + c1·t + … + cd·t^d`.
///
/// Inputs are rescaled to `t = x / scale` before fitting so that high powers
/// of long series stay well conditioned.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialRegression {
    coefficients: Vec<f64>,
    scale: f64,
}

impl PolynomialRegression {
    /// Fit the given degree, lowered to `xs.len() - 1` when there are too few
    /// points. Returns `None` for empty or mismatched input, or a singular system.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        let degree = degree.min(xs.len() - 1);
        let scale = xs.iter().fold(0.0_f64, |m, x| m.max(x.abs())).max(1.0);
        let n = degree + 1;

        // Normal equations: (VᵀV) c = Vᵀy
        let mut matrix = vec![vec![0.0; n + 1]; n];
        for (&x, &y) in xs.iter().zip(ys) {
            let t = x / scale;
            let powers: Vec<f64> = (0..n).map(|p| t.powi(p as i32)).collect();
            for row in 0..n {
                for col in 0..n {
                    matrix[row][col] += powers[row] * powers[col];
                }
                matrix[row][n] += powers[row] * y;
            }
        }

        let coefficients = solve(matrix)?;
        Some(PolynomialRegression {
            coefficients,
            scale,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        let t = x / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c)
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut m: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = m.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);
        for row in 0..n {
            if row != col {
                let factor = m[row][col] / m[col][col];
                for k in col..=n {
                    m[row][k] -= factor * m[col][k];
                }
            }
        }
    }
    Some((0..n).map(|i| m[i][n] / m[i][i]).collect())
}

/// One forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast the cumulative metric for `days` days after the last row.
///
/// The curve is shifted so that it passes through the last observation, and
/// forecasts never fall below the previous value.
pub fn forecast(series: &[TimeseriesRow], metric: Metric, days: u32, degree: usize) -> Vec<Forecast> {
    let Some(last) = series.last() else {
        return Vec::new();
    };
    let xs: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let ys: Vec<f64> = series.iter().map(|r| r.cumulative(metric)).collect();
    let Some(regression) = PolynomialRegression::fit(&xs, &ys, degree) else {
        log::debug!("regression could not be fitted, no forecast");
        return Vec::new();
    };

    let last_x = (series.len() - 1) as f64;
    let offset = last.cumulative(metric) - regression.predict(last_x).round();
    let mut previous = last.cumulative(metric);

    (1..=days)
        .filter_map(|i| {
            let date = last.date.checked_add_days(Days::new(i as u64))?;
            let predicted = regression.predict(last_x + i as f64).round() + offset;
            previous = predicted.max(previous).round();
            Some(Forecast {
                date,
                value: previous,
            })
        })
        .collect()
}
