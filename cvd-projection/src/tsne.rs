//! Exact t-SNE for small inputs (a few hundred regions at most).

use serde::{Deserialize, Serialize};

use crate::embed::{distance_matrix, gaussian, Embedder};

const EARLY_EXAGGERATION: f64 = 4.0;
const EXAGGERATION_ITERATIONS: usize = 100;
const MOMENTUM_SWITCH: usize = 250;
const PERPLEXITY_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsneParams {
    /// Learning rate.
    pub epsilon: f64,
    pub perplexity: f64,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for TsneParams {
    fn default() -> Self {
        TsneParams {
            epsilon: 10.0,
            perplexity: 10.0,
            iterations: 500,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tsne {
    pub params: TsneParams,
}

impl Tsne {
    pub fn new(params: TsneParams) -> Self {
        Tsne { params }
    }
}

/// Row-conditional affinities with each row's bandwidth tuned to the target
/// perplexity, symmetrized and normalized to sum to 1.
///
/// Distances are divided by their mean first, so the bandwidth search starts
/// near the right scale whatever the magnitude of the input.
fn joint_probabilities(distances: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = distances.len();
    let target_entropy = perplexity.ln();
    let mut p = vec![vec![0.0; n]; n];

    let (total, count) = distances
        .iter()
        .flatten()
        .filter(|d| **d > 0.0 && d.is_finite())
        .fold((0.0, 0usize), |(total, count), d| (total + d, count + 1));
    let scale = if count > 0 { total / count as f64 } else { 1.0 };

    for i in 0..n {
        let mut beta = 1.0;
        let (mut beta_min, mut beta_max) = (f64::NEG_INFINITY, f64::INFINITY);
        for _ in 0..50 {
            let mut sum = 0.0;
            for j in 0..n {
                p[i][j] = if i == j { 0.0 } else { (-distances[i][j] / scale * beta).exp() };
                sum += p[i][j];
            }
            let sum = sum.max(f64::MIN_POSITIVE);
            let mut entropy = 0.0;
            for j in 0..n {
                p[i][j] /= sum;
                if p[i][j] > 1e-7 {
                    entropy -= p[i][j] * p[i][j].ln();
                }
            }

            let diff = entropy - target_entropy;
            if diff.abs() < PERPLEXITY_TOLERANCE {
                break;
            }
            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
            } else {
                beta_max = beta;
                beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
            }
        }
    }

    let mut joint = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            joint[i][j] = ((p[i][j] + p[j][i]) / (2.0 * n as f64)).max(1e-12);
        }
    }
    joint
}

impl Embedder for Tsne {
    fn name(&self) -> &'static str {
        "tsne"
    }

    fn embed(&self, rows: &[Vec<f64>]) -> Vec<[f64; 2]> {
        let n = rows.len();
        if n < 2 {
            return vec![[0.0, 0.0]; n];
        }
        let perplexity = self.params.perplexity.clamp(1.0, (n - 1) as f64);
        let p = joint_probabilities(&distance_matrix(rows), perplexity);

        let mut rng = fastrand::Rng::with_seed(self.params.seed);
        let mut y: Vec<[f64; 2]> = (0..n)
            .map(|_| [gaussian(&mut rng) * 1e-4, gaussian(&mut rng) * 1e-4])
            .collect();
        let mut velocity = vec![[0.0; 2]; n];
        let mut gains = vec![[1.0_f64; 2]; n];

        for iteration in 0..self.params.iterations {
            let exaggeration = if iteration < EXAGGERATION_ITERATIONS {
                EARLY_EXAGGERATION
            } else {
                1.0
            };
            let momentum = if iteration < MOMENTUM_SWITCH { 0.5 } else { 0.8 };

            // Student-t kernel in the embedding
            let mut num = vec![vec![0.0; n]; n];
            let mut z = 0.0;
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = y[i][0] - y[j][0];
                    let dy = y[i][1] - y[j][1];
                    let q = 1.0 / (1.0 + dx * dx + dy * dy);
                    num[i][j] = q;
                    num[j][i] = q;
                    z += 2.0 * q;
                }
            }
            let z = z.max(f64::MIN_POSITIVE);

            for i in 0..n {
                let mut grad = [0.0; 2];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let mult = 4.0 * (exaggeration * p[i][j] - num[i][j] / z) * num[i][j];
                    grad[0] += mult * (y[i][0] - y[j][0]);
                    grad[1] += mult * (y[i][1] - y[j][1]);
                }
                for d in 0..2 {
                    let same_sign = (grad[d] > 0.0) == (velocity[i][d] > 0.0);
                    gains[i][d] = if same_sign { gains[i][d] * 0.8 } else { gains[i][d] + 0.2 };
                    gains[i][d] = gains[i][d].max(0.01);
                    velocity[i][d] = momentum * velocity[i][d] - self.params.epsilon * gains[i][d] * grad[d];
                }
            }

            for i in 0..n {
                y[i][0] += velocity[i][0];
                y[i][1] += velocity[i][1];
            }
            let mean_x = y.iter().map(|p| p[0]).sum::<f64>() / n as f64;
            let mean_y = y.iter().map(|p| p[1]).sum::<f64>() / n as f64;
            for point in y.iter_mut() {
                point[0] -= mean_x;
                point[1] -= mean_y;
            }
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::squared_distance;
    use approx::assert_relative_eq;

    fn clusters() -> Vec<Vec<f64>> {
        let mut rows = Vec::new();
        for i in 0..6 {
            let base = if i < 3 { 0.0 } else { 100.0 };
            rows.push((0..5).map(|d| base + (i * d) as f64 * 0.1).collect());
        }
        rows
    }

    #[test]
    fn joint_probabilities_are_symmetric_and_normalized() {
        let p = joint_probabilities(&distance_matrix(&clusters()), 2.0);
        let total: f64 = p.iter().flatten().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!((p[0][4] - p[4][0]).abs() < 1e-15);
    }

    #[test]
    fn affinities_ignore_input_magnitude() {
        let small = joint_probabilities(&distance_matrix(&clusters()), 2.0);
        let huge: Vec<Vec<f64>> = clusters()
            .into_iter()
            .map(|row| row.into_iter().map(|v| v * 1e8).collect())
            .collect();
        let p = joint_probabilities(&distance_matrix(&huge), 2.0);
        assert!(p[0][1] > 1e-3);
        assert!(p[0][1] > 100.0 * p[0][4]);
        assert_relative_eq!(p[0][1], small[0][1], max_relative = 1e-3);
    }

    #[test]
    fn separated_groups_stay_separated() {
        let tsne = Tsne::new(TsneParams {
            perplexity: 2.0,
            iterations: 300,
            ..TsneParams::default()
        });
        let y = tsne.embed(&clusters());
        assert_eq!(y.len(), 6);
        assert!(y.iter().all(|p| p[0].is_finite() && p[1].is_finite()));

        let within = squared_distance(&y[0], &y[1]);
        let across = squared_distance(&y[0], &y[4]);
        assert!(across > within);
    }

    #[test]
    fn same_seed_same_embedding() {
        let tsne = Tsne::default();
        assert_eq!(tsne.embed(&clusters()), tsne.embed(&clusters()));
    }

    #[test]
    fn single_row_is_origin() {
        assert_eq!(Tsne::default().embed(&[vec![1.0, 2.0]]), vec![[0.0, 0.0]]);
    }
}
