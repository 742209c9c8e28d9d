//! Trailing moving averages.
//!
//! The rolling mean at position `i` averages the non-missing values among
//! `values[i + 1 - window ..= i]` (clamped at the start of the series). A
//! position is `None` when fewer than `min_periods` non-missing values fall
//! in its window.

/// Computes the trailing rolling mean of `values`.
///
/// `NaN` entries are treated as missing: they neither contribute to the sum
/// nor count toward `min_periods`.
///
/// # Panics
///
/// Panics if `window` is zero.
///
/// # Examples
///
/// ```
/// use rlfit_stats::rolling::rolling_mean;
///
/// let values = [1.0, f64::NAN, 0.0, 1.0];
/// let means = rolling_mean(&values, 3, 2);
/// assert_eq!(means, vec![None, None, Some(0.5), Some(0.5)]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    assert!(window > 0, "window must be positive");

    let mut sum = 0.0;
    let mut observed = 0_usize;
    let mut means = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        if !value.is_nan() {
            sum += value;
            observed += 1;
        }
        if i >= window {
            let leaving = values[i - window];
            if !leaving.is_nan() {
                sum -= leaving;
                observed -= 1;
            }
        }
        if observed >= min_periods.max(1) {
            means.push(Some(sum / observed as f64));
        } else {
            means.push(None);
        }
    }

    means
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert!(rolling_mean(&[], 20, 5).is_empty());
    }

    #[test]
    fn test_min_periods_gate() {
        let values = [1.0; 6];
        let means = rolling_mean(&values, 20, 5);
        assert_eq!(means[..4], [None, None, None, None]);
        assert_eq!(means[4], Some(1.0));
        assert_eq!(means[5], Some(1.0));
    }

    #[test]
    fn test_window_slides() {
        let values = [1.0, 1.0, 0.0, 0.0, 0.0];
        let means = rolling_mean(&values, 2, 1);
        assert_eq!(
            means,
            vec![Some(1.0), Some(1.0), Some(0.5), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn test_missing_values_do_not_count() {
        let values = [f64::NAN, f64::NAN, 1.0, f64::NAN, 0.0];
        let means = rolling_mean(&values, 5, 2);
        assert_eq!(means, vec![None, None, None, None, Some(0.5)]);
    }

    #[test]
    fn test_matches_direct_computation() {
        let values = (0..50)
            .map(|i| f64::from(u8::from(i % 3 == 0)))
            .collect::<Vec<_>>();
        let means = rolling_mean(&values, 20, 5);
        for (i, mean) in means.iter().enumerate() {
            let start = (i + 1).saturating_sub(20);
            let slice = &values[start..=i];
            if slice.len() < 5 {
                assert_eq!(*mean, None);
            } else {
                #[expect(clippy::cast_precision_loss)]
                let expected = slice.iter().sum::<f64>() / slice.len() as f64;
                assert!((mean.unwrap() - expected).abs() < 1e-12);
            }
        }
    }
}
