/// A 2-D embedding algorithm.
pub trait Embedder {
    fn name(&self) -> &'static str;

    /// Fewest rows the algorithm accepts; smaller inputs are not embedded.
    fn min_rows(&self) -> usize {
        1
    }

    /// One `[x, y]` per input row, in input order. Rows have equal length.
    fn embed(&self, rows: &[Vec<f64>]) -> Vec<[f64; 2]>;
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Pairwise squared Euclidean distances.
pub(crate) fn distance_matrix(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut d = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let v = squared_distance(&rows[i], &rows[j]);
            d[i][j] = v;
            d[j][i] = v;
        }
    }
    d
}

/// Standard normal sample (Box-Muller).
pub(crate) fn gaussian(rng: &mut fastrand::Rng) -> f64 {
    let u = rng.f64().max(f64::MIN_POSITIVE);
    let v = rng.f64();
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}
