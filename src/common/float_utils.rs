use crate::common::constants::VOLUME_EPSILON;

/// Relative/absolute tolerance comparison used by volume invariants
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= VOLUME_EPSILON * scale
}

/// Length of the overlap between `[a_low, a_high]` and `[b_low, b_high]`
pub fn overlap(a_low: f64, a_high: f64, b_low: f64, b_high: f64) -> f64 {
    (a_high.min(b_high) - a_low.max(b_low)).max(0.0)
}

/// True when every value is a finite number
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_scales_with_magnitude() {
        assert!(approx_eq(1_000_000.0, 1_000_000.000_000_1));
        assert!(approx_eq(0.0, 1e-12));
        assert!(!approx_eq(1.0, 1.001));
    }

    #[test]
    fn test_overlap() {
        assert_eq!(overlap(0.0, 10.0, 5.0, 15.0), 5.0);
        assert_eq!(overlap(0.0, 1.0, 2.0, 3.0), 0.0);
        assert_eq!(overlap(2.0, 3.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn test_all_finite() {
        assert!(all_finite(&[1.0, 2.0]));
        assert!(!all_finite(&[1.0, f64::NAN]));
        assert!(!all_finite(&[f64::INFINITY]));
    }
}
