/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency and
/// dispersion for a dataset of `f64` values. Missing observations
/// (`NaN`) are skipped, so `count` may be smaller than the input length.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// The number of non-missing values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    ///
    /// For an even number of values this is the mean of the two middle values.
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// `NaN` values are dropped and the remaining values are sorted internally
    /// before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one non-`NaN` value
    /// * `None` - if the dataset is empty or contains only `NaN`
    ///
    /// # Examples
    ///
    /// ```
    /// # use rlfit_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, f64::NAN, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted, `NaN`-free values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order or contains `NaN`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rlfit_stats::descriptive::DescriptiveStats;
    /// let values = [1.0, 2.0, 3.0, 4.0];
    /// let stats = DescriptiveStats::from_sorted(&values).unwrap();
    /// assert_eq!(stats.median, 2.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted_values[mid - 1], sorted_values[mid])
        } else {
            sorted_values[mid]
        };
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
        })
    }
}

/// Mean of the non-`NaN` values, or `NaN` if there are none.
///
/// # Examples
///
/// ```
/// # use rlfit_stats::descriptive::nan_mean;
/// assert_eq!(nan_mean([1.0, f64::NAN, 0.0]), 0.5);
/// assert!(nan_mean([f64::NAN]).is_nan());
/// ```
#[must_use]
pub fn nan_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    DescriptiveStats::new(values).map_or(f64::NAN, |s| s.mean)
}

/// Median of the non-`NaN` values, or `NaN` if there are none.
#[must_use]
pub fn nan_median<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    DescriptiveStats::new(values).map_or(f64::NAN, |s| s.median)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new([]).is_none());
        assert!(DescriptiveStats::new([f64::NAN, f64::NAN]).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.variance, 0.0);
    }

    #[test]
    fn test_even_count_median_is_midpoint() {
        let stats = DescriptiveStats::new([400.0, 100.0, 300.0, 200.0]).unwrap();
        assert_eq!(stats.median, 250.0);
        assert_eq!(stats.mean, 250.0);
    }

    #[test]
    fn test_variance_and_std_dev() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.variance - 4.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_values_are_skipped() {
        let stats = DescriptiveStats::new([f64::NAN, 1.0, 3.0, f64::NAN]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(nan_median([f64::NAN, 1.0, 3.0]), 2.0);
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[3.0, 1.0]);
    }
}
