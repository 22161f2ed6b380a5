//! Sammon stress: how well pairwise distances survive the projection.

fn min_max_normalize<R: AsRef<[f64]>>(rows: &[R]) -> Vec<Vec<f64>> {
    let (min, max) = rows
        .iter()
        .flat_map(|r| r.as_ref().iter().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;
    rows.iter()
        .map(|r| {
            r.as_ref()
                .iter()
                .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
                .collect()
        })
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Sammon stress of `embedded` against `input`, both min-max normalized
/// over all their values. Pairs identical in the input are skipped.
///
/// `None` when the lengths differ or no pair is usable.
pub fn sammon_stress(input: &[Vec<f64>], embedded: &[[f64; 2]]) -> Option<f64> {
    if input.len() != embedded.len() {
        return None;
    }
    let raw = min_max_normalize(input);
    let low = min_max_normalize(embedded);

    let (mut total, mut weighted) = (0.0, 0.0);
    for i in 0..raw.len() {
        for j in (i + 1)..raw.len() {
            let dx = distance(&raw[i], &raw[j]);
            if dx == 0.0 {
                continue;
            }
            let dy = distance(&low[i], &low[j]);
            total += dx;
            weighted += (dx - dy) * (dx - dy) / dx;
        }
    }
    (total > 0.0).then(|| weighted / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn faithful_embedding_has_zero_stress() {
        let input = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let embedded = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_relative_eq!(sammon_stress(&input, &embedded).unwrap(), 0.0);
    }

    #[test]
    fn distorted_embedding_has_positive_stress() {
        let input = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let embedded = [[0.0, 0.0], [1.0, 0.0], [0.5, 0.0]];
        assert!(sammon_stress(&input, &embedded).unwrap() > 0.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(sammon_stress(&[vec![1.0]], &[]).is_none());
        assert!(sammon_stress(&[vec![1.0], vec![1.0]], &[[0.0, 0.0], [1.0, 1.0]]).is_none());
    }
}
