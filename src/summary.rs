//! Per-parameter statistics derived from a fit.

use crate::error::DiagnosticError;
use crate::ess::{compute_estimated_mcse, compute_split_effective_sample_size, MIN_SPLIT_ESS_DRAWS};
use crate::fit::FitResult;
use crate::rhat::{split_potential_scale_reduction_factor, MIN_SPLIT_RHAT_DRAWS};
use crate::utils::{constant_within_chains, flatten, mean, sample_variance};
use rayon::prelude::*;

/// Statistics for a single parameter, valid for the fit they were
/// computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    /// Monte Carlo standard error of the mean; NaN when `n_eff` is zero or
    /// unavailable.
    pub mcse: f64,
    /// Split effective sample size.  Zero when the within-chain variance
    /// is zero, NaN when the chains are too short to estimate it.
    pub n_eff: f64,
    /// Split Rhat, absent with fewer than two chains or too few iterations.
    pub rhat: Option<f64>,
}

impl ParameterSummary {
    /// `n_eff` divided by the total number of sampling iterations.
    pub fn n_eff_ratio(&self, total_iterations: usize) -> f64 {
        self.n_eff / total_iterations as f64
    }
}

fn split_n_eff(draws: &[Vec<f64>]) -> Result<f64, DiagnosticError> {
    if constant_within_chains(draws) {
        return Ok(0.0);
    }
    Ok(compute_split_effective_sample_size(draws)?)
}

/// Split effective sample size of every parameter, in parameter order.
///
/// A parameter with zero within-chain variance has no defined ESS; it is
/// reported as zero so that it is always flagged rather than dividing by a
/// zero variance.  Chains shorter than [`MIN_SPLIT_ESS_DRAWS`] give
/// [`DiagnosticError::InsufficientIterations`].
pub fn effective_sample_sizes(fit: &FitResult) -> Result<Vec<f64>, DiagnosticError> {
    if fit.num_iterations() < MIN_SPLIT_ESS_DRAWS {
        return Err(DiagnosticError::InsufficientIterations {
            found: fit.num_iterations(),
            required: MIN_SPLIT_ESS_DRAWS,
        });
    }
    (0..fit.parameter_names().len())
        .into_par_iter()
        .map(|p| split_n_eff(&fit.parameter_draws(p)))
        .collect()
}

/// Split Rhat of every parameter, in parameter order.  Needs at least two
/// chains of at least [`MIN_SPLIT_RHAT_DRAWS`] iterations.
pub fn split_rhats(fit: &FitResult) -> Result<Vec<f64>, DiagnosticError> {
    if fit.num_chains() < 2 {
        return Err(DiagnosticError::InsufficientChains {
            found: fit.num_chains(),
            required: 2,
        });
    }
    if fit.num_iterations() < MIN_SPLIT_RHAT_DRAWS {
        return Err(DiagnosticError::InsufficientIterations {
            found: fit.num_iterations(),
            required: MIN_SPLIT_RHAT_DRAWS,
        });
    }
    (0..fit.parameter_names().len())
        .into_par_iter()
        .map(|p| -> Result<f64, DiagnosticError> {
            Ok(split_potential_scale_reduction_factor(
                &fit.parameter_draws(p),
            )?)
        })
        .collect()
}

/// Computes a [`ParameterSummary`] for every parameter of the fit.
/// Statistics the fit is too small for are NaN or absent rather than
/// errors.
pub fn summarize(fit: &FitResult) -> Result<Vec<ParameterSummary>, DiagnosticError> {
    let with_n_eff = fit.num_iterations() >= MIN_SPLIT_ESS_DRAWS;
    let with_rhat = fit.num_chains() >= 2 && fit.num_iterations() >= MIN_SPLIT_RHAT_DRAWS;
    fit.parameter_names()
        .par_iter()
        .enumerate()
        .map(|(p, name)| -> Result<ParameterSummary, DiagnosticError> {
            let draws = fit.parameter_draws(p);
            let all = flatten(&draws);
            let n_eff = if with_n_eff {
                split_n_eff(&draws)?
            } else {
                f64::NAN
            };
            let mcse = if n_eff > 0.0 {
                compute_estimated_mcse(&draws)?
            } else {
                f64::NAN
            };
            let rhat = if with_rhat {
                Some(split_potential_scale_reduction_factor(&draws)?)
            } else {
                None
            };
            let sd = if all.len() > 1 {
                sample_variance(&all)?.sqrt()
            } else {
                0.0
            };
            Ok(ParameterSummary {
                name: name.clone(),
                mean: mean(&all)?,
                sd,
                mcse,
                n_eff,
                rhat,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{constant_parameter_fit, fit_from_traces, iid_fit};

    #[test]
    fn test_summaries_follow_parameter_order() {
        let fit = iid_fit(4, 500, &["mu", "tau", "theta"], 11);
        let summaries = summarize(&fit).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["mu", "tau", "theta"]);
        for s in &summaries {
            assert!(s.mean.abs() < 0.2, "{:?}", s);
            assert!((s.sd - 1.0).abs() < 0.1, "{:?}", s);
            assert!(s.n_eff_ratio(fit.total_iterations()) > 0.3, "{:?}", s);
            assert!(s.mcse > 0.0 && s.mcse < 0.05, "{:?}", s);
            let rhat = s.rhat.unwrap();
            assert!((rhat - 1.0).abs() < 0.05, "{:?}", s);
        }
    }

    #[test]
    fn test_degenerate_parameter() {
        let fit = constant_parameter_fit(4, 200, 5.0, 3);
        let n_eff = effective_sample_sizes(&fit).unwrap();
        assert_eq!(n_eff[1], 0.0);
        assert!(n_eff[0] > 0.0);

        let summaries = summarize(&fit).unwrap();
        assert_eq!(summaries[1].n_eff, 0.0);
        assert_abs_diff_eq!(summaries[1].mean, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summaries[1].sd, 0.0, epsilon = 1e-12);
        assert!(summaries[1].mcse.is_nan());
    }

    #[test]
    fn test_single_chain() {
        let fit = iid_fit(1, 200, &["x"], 2);
        assert!(matches!(
            split_rhats(&fit),
            Err(DiagnosticError::InsufficientChains {
                found: 1,
                required: 2
            })
        ));
        let summaries = summarize(&fit).unwrap();
        assert_eq!(summaries[0].rhat, None);
    }

    #[test]
    fn test_chains_constant_at_different_values() {
        let fit = fit_from_traces(&[vec![1.0; 100], vec![2.0; 100]]);
        assert_eq!(effective_sample_sizes(&fit).unwrap(), vec![0.0]);
        let summary = &summarize(&fit).unwrap()[0];
        assert_eq!(summary.n_eff, 0.0);
        assert!(summary.mcse.is_nan());
        assert!(!summary.rhat.unwrap().is_finite());
    }

    #[test]
    fn test_short_chains() {
        let fit = fit_from_traces(&[vec![1.0, 2.0, 4.0], vec![3.0, 1.0, 2.0]]);
        assert!(matches!(
            effective_sample_sizes(&fit),
            Err(DiagnosticError::InsufficientIterations {
                found: 3,
                required: 8
            })
        ));
        assert!(matches!(
            split_rhats(&fit),
            Err(DiagnosticError::InsufficientIterations {
                found: 3,
                required: 4
            })
        ));
        let summary = &summarize(&fit).unwrap()[0];
        assert!(summary.n_eff.is_nan());
        assert_eq!(summary.rhat, None);
        assert_abs_diff_eq!(summary.mean, 13.0 / 6.0, epsilon = 1e-12);
    }
}
