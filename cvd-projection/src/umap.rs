//! A compact UMAP: exact k-nearest neighbours, fuzzy simplicial set, and
//! stochastic layout optimization with negative sampling.

use serde::{Deserialize, Serialize};

use crate::embed::{distance_matrix, Embedder};

const NEGATIVE_SAMPLE_RATE: usize = 5;
const GRADIENT_CLIP: f64 = 4.0;
const SIGMA_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UmapParams {
    pub neighbors: usize,
    pub spread: f64,
    pub min_dist: f64,
    pub epochs: usize,
    pub seed: u64,
}

impl Default for UmapParams {
    fn default() -> Self {
        UmapParams {
            neighbors: 15,
            spread: 1.0,
            min_dist: 0.1,
            epochs: 500,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Umap {
    pub params: UmapParams,
}

impl Umap {
    pub fn new(params: UmapParams) -> Self {
        Umap { params }
    }
}

/// Fit `1 / (1 + a·d^(2b))` to the target membership curve defined by
/// `spread` and `min_dist`, by successive grid refinement.
pub fn fit_ab(spread: f64, min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (1..=300).map(|i| i as f64 * 3.0 * spread / 300.0).collect();
    let target: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();
    let error = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&target)
            .map(|(&x, &t)| {
                let v = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (v - t) * (v - t)
            })
            .sum()
    };

    let (mut log_a, mut b) = (0.0_f64, 1.0_f64);
    let (mut log_a_step, mut b_step) = (1.0_f64, 0.5_f64);
    for _ in 0..12 {
        let mut best = (error(log_a.exp(), b), log_a, b);
        for i in -5..=5 {
            for j in -5..=5 {
                let la = log_a + i as f64 * log_a_step / 5.0;
                let bb = (b + j as f64 * b_step / 5.0).max(0.05);
                let e = error(la.exp(), bb);
                if e < best.0 {
                    best = (e, la, bb);
                }
            }
        }
        log_a = best.1;
        b = best.2;
        log_a_step /= 2.0;
        b_step /= 2.0;
    }
    (log_a.exp(), b)
}

/// Symmetric fuzzy membership weights over the k-nearest-neighbour graph.
fn fuzzy_graph(rows: &[Vec<f64>], k: usize) -> Vec<(usize, usize, f64)> {
    let n = rows.len();
    let distances: Vec<Vec<f64>> = distance_matrix(rows)
        .into_iter()
        .map(|row| row.into_iter().map(f64::sqrt).collect())
        .collect();
    let target = (k as f64).log2();
    let mut weights = vec![vec![0.0; n]; n];

    for i in 0..n {
        let mut neighbors: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        neighbors.sort_by(|&a, &b| distances[i][a].total_cmp(&distances[i][b]));
        neighbors.truncate(k);

        let rho = neighbors
            .iter()
            .map(|&j| distances[i][j])
            .find(|&d| d > 0.0)
            .unwrap_or(0.0);

        let (mut lo, mut hi, mut sigma) = (0.0_f64, f64::INFINITY, 1.0_f64);
        for _ in 0..64 {
            let sum: f64 = neighbors
                .iter()
                .map(|&j| (-(distances[i][j] - rho).max(0.0) / sigma).exp())
                .sum();
            if (sum - target).abs() < SIGMA_TOLERANCE {
                break;
            }
            if sum > target {
                hi = sigma;
                sigma = (lo + hi) / 2.0;
            } else {
                lo = sigma;
                sigma = if hi.is_infinite() { sigma * 2.0 } else { (lo + hi) / 2.0 };
            }
        }
        let sigma = sigma.max(1e-3);

        for &j in &neighbors {
            weights[i][j] = (-(distances[i][j] - rho).max(0.0) / sigma).exp();
        }
    }

    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (weights[i][j], weights[j][i]);
            let w = a + b - a * b;
            if w > 0.0 {
                edges.push((i, j, w));
            }
        }
    }
    edges
}

fn clip(v: f64) -> f64 {
    v.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

impl Embedder for Umap {
    fn name(&self) -> &'static str {
        "umap"
    }

    fn min_rows(&self) -> usize {
        self.params.neighbors + 1
    }

    fn embed(&self, rows: &[Vec<f64>]) -> Vec<[f64; 2]> {
        let n = rows.len();
        if n < 2 {
            return vec![[0.0, 0.0]; n];
        }
        let k = self.params.neighbors.clamp(1, n - 1);
        let edges = fuzzy_graph(rows, k);
        let max_weight = edges.iter().map(|e| e.2).fold(0.0, f64::max);
        let (a, b) = fit_ab(self.params.spread, self.params.min_dist);

        let mut rng = fastrand::Rng::with_seed(self.params.seed);
        let mut y: Vec<[f64; 2]> = (0..n)
            .map(|_| [rng.f64() * 20.0 - 10.0, rng.f64() * 20.0 - 10.0])
            .collect();

        for epoch in 0..self.params.epochs {
            let alpha = 1.0 - epoch as f64 / self.params.epochs as f64;
            for &(i, j, w) in &edges {
                if rng.f64() > w / max_weight {
                    continue;
                }
                let (dx, dy) = (y[i][0] - y[j][0], y[i][1] - y[j][1]);
                let dist2 = dx * dx + dy * dy;
                if dist2 > 0.0 {
                    let coeff = -2.0 * a * b * dist2.powf(b - 1.0) / (1.0 + a * dist2.powf(b));
                    let (gx, gy) = (clip(coeff * dx), clip(coeff * dy));
                    y[i][0] += gx * alpha;
                    y[i][1] += gy * alpha;
                    y[j][0] -= gx * alpha;
                    y[j][1] -= gy * alpha;
                }

                for _ in 0..NEGATIVE_SAMPLE_RATE {
                    let other = rng.usize(..n);
                    if other == i {
                        continue;
                    }
                    let (dx, dy) = (y[i][0] - y[other][0], y[i][1] - y[other][1]);
                    let dist2 = dx * dx + dy * dy;
                    let coeff = 2.0 * b / ((0.001 + dist2) * (1.0 + a * dist2.powf(b)));
                    y[i][0] += clip(coeff * dx) * alpha;
                    y[i][1] += clip(coeff * dy) * alpha;
                }
            }
        }
        y
    }
}
