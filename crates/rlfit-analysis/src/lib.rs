//! Behavioral data handling around the model fit.
//!
//! This crate turns raw experiment exports into the inputs and outputs of the
//! fitting pipeline:
//!
//! - [`behavior`]: loading and normalizing behavior CSVs of either export
//!   schema into [`Trial`](rlfit_model::Trial)s plus correctness and reaction
//!   times
//! - [`summary`]: accuracy, reward and median reaction time per participant,
//!   round and difficulty
//! - [`learning_curve`]: moving-average accuracy by difficulty and liking
//! - [`output`]: CSV writers for fit results, summaries and curves
//! - [`synthetic`]: simulated participants for demos and parameter recovery
//!
//! # Pipeline
//!
//! ```text
//! behavior.csv
//!     ↓ load_behavior
//! BehaviorTable ──→ summarize ──→ summary.csv
//!     │         └─→ learning_curves ──→ learning_curves.csv
//!     ↓ trials()
//! GroupFitter (rlfit-fit)
//!     ↓ write_fits
//! rl_fits.csv
//! ```

pub mod behavior;
pub mod learning_curve;
pub mod output;
pub mod summary;
pub mod synthetic;
