//! Statistical utilities for the rlfit workspace.
//!
//! This crate provides the small set of summary statistics the behavioral
//! analysis needs:
//!
//! - **Descriptive statistics**: count, mean, median, variance, etc. over
//!   datasets that may contain missing (`NaN`) observations
//! - **Rolling means**: trailing moving averages with a minimum number of
//!   observed values per window
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`rolling`]: Trailing moving averages used for learning curves
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use rlfit_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing a rolling mean
//!
//! ```
//! use rlfit_stats::rolling::rolling_mean;
//!
//! let values = [1.0, 0.0, 1.0, 1.0];
//! let means = rolling_mean(&values, 2, 2);
//! assert_eq!(means, vec![None, Some(0.5), Some(0.5), Some(1.0)]);
//! ```

pub mod descriptive;
pub mod rolling;
