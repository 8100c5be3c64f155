//! A Rust library for validating the output of an MCMC sampler: effective
//! sample size and split R hat per parameter, tree depth saturation,
//! energy Bayesian fraction of missing information per chain, divergent
//! transitions, and the partition of draws into divergent and
//! non-divergent ones.
//!
//! The sampler itself is out of scope.  A [`FitResult`] is built from its
//! per-chain draws and per-iteration metadata (or read from CmdStan CSV
//! output with [`io`]) and is never mutated afterwards.
//!
//! ```
//! use mcmc_diag::{Chain, DiagnosticEvaluator, FitResult, IterationMetadata};
//!
//! let names = vec!["mu".to_string()];
//! let rows: Vec<Vec<f64>> = (0..100).map(|i| vec![((i * 37) % 11) as f64]).collect();
//! let metadata = (0..100)
//!     .map(|i| IterationMetadata {
//!         treedepth: 3,
//!         energy: ((i * 13) % 7) as f64,
//!         divergent: i == 42,
//!         ..Default::default()
//!     })
//!     .collect();
//! let fit = FitResult::new(vec![Chain::from_rows(names, rows, metadata)?])?;
//!
//! for warning in DiagnosticEvaluator::default().evaluate(&fit).into_result()? {
//!     println!("{}", warning);
//! }
//! # Ok::<(), mcmc_diag::DiagnosticError>(())
//! ```
#[macro_use]
extern crate approx;

/// Pass/fail checks and the warnings they raise
pub mod checks;
/// Energy Bayesian fraction of missing information (E-BFMI)
pub mod energy;
/// Error type of the fit-level API
pub mod error;
/// Effective Sample Size (ESS) and Monte Carlo standard error
pub mod ess;
/// Evaluator bundling the checks with a configuration
pub mod evaluator;
/// Typed sampler output: chains, draws and per-iteration metadata
pub mod fit;
/// CmdStan CSV reading
pub mod io;
/// Partition of draws into divergent and non-divergent transitions
pub mod partition;
/// Gelman-Rubin split potential scale reduction (Rhat)
pub mod rhat;
/// Per-parameter summary statistics
pub mod summary;
/// Summary statistics, chain splitting and autocovariance helpers used by
/// the estimators
pub mod utils;

#[cfg(test)]
mod testing;

pub use checks::{
    check_all, check_divergences, check_effective_sample_size, check_energy, check_split_rhat,
    check_treedepth, CheckReport, Warning, WarningKind,
};
pub use error::DiagnosticError;
pub use evaluator::{DiagnosticConfig, DiagnosticEvaluator};
pub use fit::{Chain, FitResult, IterationMetadata};
pub use partition::{partition_divergences, DivergencePartition, DrawRef};
pub use summary::{summarize, ParameterSummary};
