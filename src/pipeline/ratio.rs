/// Divide, yielding 0 instead of NaN or infinity when the denominator is zero.
///
/// Every rate shown on the dashboard goes through this helper.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_yields_zero() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn regular_division() {
        assert_eq!(safe_ratio(120.0, 150.0), 0.8);
    }

    #[test]
    fn non_finite_inputs_collapse_to_zero() {
        assert_eq!(safe_ratio(f64::NAN, 2.0), 0.0);
        assert_eq!(safe_ratio(f64::INFINITY, 2.0), 0.0);
    }
}
