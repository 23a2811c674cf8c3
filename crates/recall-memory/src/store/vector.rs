//! Vector math applied to embeddings before indexing.

/// Decay rate of the recency weight.
const DECAY_RATE: f32 = 0.2;

/// Scale `vector` to unit L2 norm in place.
///
/// A zero vector is left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Recency weight for fragments of `session_id` in a store bounded by
/// `max_session_id`: `exp(-0.2 * (1 - (session_id + 1) / (max_session_id + 1)))`.
///
/// Strictly increasing in `session_id` and within `(0, 1]`. Ids at or past
/// the ceiling weigh 1.0; negative ids are treated as session 0.
pub fn importance_weight(session_id: i64, max_session_id: i64) -> f32 {
    let session = session_id.max(0) as f64;
    let ceiling = max_session_id.max(0) as f64;
    let ratio = ((session + 1.0) / (ceiling + 1.0)).min(1.0);
    (-(DECAY_RATE as f64) * (1.0 - ratio)).exp() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f32 {
        vector.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_gives_unit_norm() {
        for raw in [vec![3.0, 4.0], vec![0.001, 0.0, -2.0], vec![1e6, 1e6, 1e6]] {
            let mut vector = raw.clone();
            l2_normalize(&mut vector);
            assert!((norm(&vector) - 1.0).abs() < 1e-5, "{raw:?}");
        }
    }

    #[test]
    fn test_normalize_leaves_zero_vector() {
        let mut vector = vec![0.0; 4];
        l2_normalize(&mut vector);
        assert_eq!(vector, vec![0.0; 4]);
    }

    #[test]
    fn test_weight_strictly_increasing_within_bounds() {
        let max = 10;
        let weights: Vec<f32> = (0..max).map(|s| importance_weight(s, max)).collect();
        for pair in weights.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(weights.iter().all(|w| *w > 0.0 && *w <= 1.0));
    }

    #[test]
    fn test_weight_values() {
        // Session 2 of 3: exp(-0.2 * (1 - 3/4)) = exp(-0.05)
        assert!((importance_weight(2, 3) - (-0.05f32).exp()).abs() < 1e-6);
        assert!((importance_weight(3, 3) - 1.0).abs() < 1e-6);
        assert!((importance_weight(9, 3) - 1.0).abs() < 1e-6);
    }
}
