//! Pass/fail checks over a fit.  Each check returns the warnings it
//! raised; an empty list means the check passed.

use crate::energy::{energy_bfmi, MIN_E_BFMI_DRAWS};
use crate::error::DiagnosticError;
use crate::fit::FitResult;
use crate::summary::{effective_sample_sizes, split_rhats};
use std::fmt;
use tracing::{debug, info, warn};

/// Parameters with `n_eff / iterations` below this are flagged; under it
/// the ESS estimator itself is biased high.
pub const MIN_N_EFF_RATIO: f64 = 0.001;
/// Parameters with split Rhat above this are flagged.
pub const MAX_SPLIT_RHAT: f64 = 1.1;
pub const DEFAULT_MAX_TREEDEPTH: u32 = 10;
pub const DEFAULT_E_BFMI_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    EffectiveSampleSize,
    SplitRhat,
    TreeDepth,
    Energy,
    Divergence,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::EffectiveSampleSize => "n_eff",
            WarningKind::SplitRhat => "split Rhat",
            WarningKind::TreeDepth => "tree depth",
            WarningKind::Energy => "E-BFMI",
            WarningKind::Divergence => "divergences",
        };
        f.write_str(name)
    }
}

/// A single diagnostic finding.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// `n_eff / iterations` of `parameter` fell below [`MIN_N_EFF_RATIO`].
    LowEffectiveSampleSize { parameter: String, ratio: f64 },
    /// Split Rhat of `parameter` exceeded [`MAX_SPLIT_RHAT`] or was not finite.
    HighSplitRhat { parameter: String, rhat: f64 },
    /// Split Rhat needs an ensemble; only `chains` were supplied.
    SplitRhatUnavailable { chains: usize },
    /// The `check` statistic needs `required` iterations per chain; the fit
    /// has `iterations`.
    TooFewIterations {
        check: WarningKind,
        iterations: usize,
        required: usize,
    },
    /// `count` of `total` iterations reached `max_depth`.
    TreeDepthSaturation {
        count: usize,
        total: usize,
        max_depth: u32,
    },
    /// E-BFMI of `chain` fell below `threshold` or was not finite.
    LowEnergyBfmi {
        chain: usize,
        e_bfmi: f64,
        threshold: f64,
    },
    /// `count` of `total` iterations ended with a divergence.
    Divergences { count: usize, total: usize },
}

impl Warning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::LowEffectiveSampleSize { .. } => WarningKind::EffectiveSampleSize,
            Warning::HighSplitRhat { .. } | Warning::SplitRhatUnavailable { .. } => {
                WarningKind::SplitRhat
            }
            Warning::TooFewIterations { check, .. } => *check,
            Warning::TreeDepthSaturation { .. } => WarningKind::TreeDepth,
            Warning::LowEnergyBfmi { .. } => WarningKind::Energy,
            Warning::Divergences { .. } => WarningKind::Divergence,
        }
    }

    /// Parameter the warning is about, if any.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Warning::LowEffectiveSampleSize { parameter, .. }
            | Warning::HighSplitRhat { parameter, .. } => Some(parameter.as_str()),
            _ => None,
        }
    }

    /// Chain the warning is about, if any.
    pub fn chain(&self) -> Option<usize> {
        match self {
            Warning::LowEnergyBfmi { chain, .. } => Some(*chain),
            _ => None,
        }
    }

    /// Share of iterations affected, in percent, for count-based warnings.
    pub fn percentage(&self) -> Option<f64> {
        match self {
            Warning::TreeDepthSaturation { count, total, .. }
            | Warning::Divergences { count, total } => Some(percent(*count, *total)),
            _ => None,
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    100.0 * count as f64 / total as f64
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LowEffectiveSampleSize { parameter, ratio } => write!(
                f,
                "n_eff / iter for parameter {} is {:.3e}; \
                 the effective sample size estimate is likely biased high",
                parameter, ratio
            ),
            Warning::HighSplitRhat { parameter, rhat } => write!(
                f,
                "Rhat for parameter {} is {:.3}; chains have not mixed",
                parameter, rhat
            ),
            Warning::SplitRhatUnavailable { chains } => write!(
                f,
                "split Rhat cannot be computed from {} chain(s); at least 2 are required",
                chains
            ),
            Warning::TooFewIterations {
                check,
                iterations,
                required,
            } => write!(
                f,
                "{} cannot be estimated from {} iteration(s) per chain; at least {} are required",
                check, iterations, required
            ),
            Warning::TreeDepthSaturation {
                count,
                total,
                max_depth,
            } => write!(
                f,
                "{} of {} iterations saturated the maximum tree depth of {} ({:.3}%)",
                count,
                total,
                max_depth,
                percent(*count, *total)
            ),
            Warning::LowEnergyBfmi {
                chain,
                e_bfmi,
                threshold,
            } => write!(
                f,
                "chain {}: E-BFMI = {:.3} is below {}; \
                 the posterior may not be well explored",
                chain, e_bfmi, threshold
            ),
            Warning::Divergences { count, total } => write!(
                f,
                "{} of {} iterations ended with a divergence ({:.3}%)",
                count,
                total,
                percent(*count, *total)
            ),
        }
    }
}

fn too_few_iterations(check: WarningKind, found: usize, required: usize) -> Vec<Warning> {
    warn!(check = %check, iterations = found, required, "too few iterations per chain");
    vec![Warning::TooFewIterations {
        check,
        iterations: found,
        required,
    }]
}

/// Flags parameters whose split effective sample size per iteration is
/// below [`MIN_N_EFF_RATIO`].  Chains too short for the estimator give a
/// single [`Warning::TooFewIterations`].
pub fn check_effective_sample_size(fit: &FitResult) -> Result<Vec<Warning>, DiagnosticError> {
    let total = fit.total_iterations() as f64;
    let n_effs = match effective_sample_sizes(fit) {
        Ok(n_effs) => n_effs,
        Err(DiagnosticError::InsufficientIterations { found, required }) => {
            return Ok(too_few_iterations(
                WarningKind::EffectiveSampleSize,
                found,
                required,
            ));
        }
        Err(e) => return Err(e),
    };
    let mut warnings = Vec::new();
    for (name, n_eff) in fit.parameter_names().iter().zip(n_effs) {
        let ratio = n_eff / total;
        debug!(parameter = %name, n_eff, ratio, "effective sample size");
        if ratio < MIN_N_EFF_RATIO {
            warn!(parameter = %name, ratio, "low n_eff / iter");
            warnings.push(Warning::LowEffectiveSampleSize {
                parameter: name.clone(),
                ratio,
            });
        }
    }
    if warnings.is_empty() {
        info!("n_eff / iter looks reasonable for all parameters");
    }
    Ok(warnings)
}

/// Flags parameters whose split Rhat exceeds [`MAX_SPLIT_RHAT`].  With
/// fewer than two chains a single [`Warning::SplitRhatUnavailable`] is
/// returned instead, and with chains too short to split a single
/// [`Warning::TooFewIterations`].
pub fn check_split_rhat(fit: &FitResult) -> Result<Vec<Warning>, DiagnosticError> {
    let rhats = match split_rhats(fit) {
        Ok(rhats) => rhats,
        Err(DiagnosticError::InsufficientChains { found, .. }) => {
            warn!(chains = found, "split Rhat needs at least 2 chains");
            return Ok(vec![Warning::SplitRhatUnavailable { chains: found }]);
        }
        Err(DiagnosticError::InsufficientIterations { found, required }) => {
            return Ok(too_few_iterations(WarningKind::SplitRhat, found, required));
        }
        Err(e) => return Err(e),
    };
    let mut warnings = Vec::new();
    for (name, rhat) in fit.parameter_names().iter().zip(rhats) {
        debug!(parameter = %name, rhat, "split Rhat");
        if !rhat.is_finite() || rhat > MAX_SPLIT_RHAT {
            warn!(parameter = %name, rhat, "high split Rhat");
            warnings.push(Warning::HighSplitRhat {
                parameter: name.clone(),
                rhat,
            });
        }
    }
    if warnings.is_empty() {
        info!("Rhat looks reasonable for all parameters");
    }
    Ok(warnings)
}

/// Counts iterations whose tree depth reached `max_depth` (inclusive).
/// Saturation costs efficiency; it does not bias estimates by itself.
pub fn check_treedepth(fit: &FitResult, max_depth: u32) -> Vec<Warning> {
    let total = fit.total_iterations();
    let count = fit
        .iterations()
        .filter(|(_, _, m)| m.treedepth >= max_depth)
        .count();
    if count == 0 {
        info!(max_depth, "no iterations saturated the maximum tree depth");
        return Vec::new();
    }
    warn!(count, total, max_depth, "tree depth saturation");
    vec![Warning::TreeDepthSaturation {
        count,
        total,
        max_depth,
    }]
}

/// Flags chains whose E-BFMI falls below `threshold`.
pub fn check_energy(fit: &FitResult, threshold: f64) -> Result<Vec<Warning>, DiagnosticError> {
    if fit.num_iterations() < MIN_E_BFMI_DRAWS {
        return Ok(too_few_iterations(
            WarningKind::Energy,
            fit.num_iterations(),
            MIN_E_BFMI_DRAWS,
        ));
    }
    let mut warnings = Vec::new();
    for (chain, c) in fit.chains().iter().enumerate() {
        let e_bfmi = energy_bfmi(&c.energies())?;
        debug!(chain, e_bfmi, "E-BFMI");
        if !e_bfmi.is_finite() || e_bfmi < threshold {
            warn!(chain, e_bfmi, threshold, "low E-BFMI");
            warnings.push(Warning::LowEnergyBfmi {
                chain,
                e_bfmi,
                threshold,
            });
        }
    }
    if warnings.is_empty() {
        info!("E-BFMI indicated no pathological behavior");
    }
    Ok(warnings)
}

/// Reports every divergent iteration; any nonzero count is a warning.
pub fn check_divergences(fit: &FitResult) -> Vec<Warning> {
    let total = fit.total_iterations();
    let count = fit.iterations().filter(|(_, _, m)| m.divergent).count();
    if count == 0 {
        info!("no divergent iterations");
        return Vec::new();
    }
    warn!(count, total, "divergent iterations");
    vec![Warning::Divergences { count, total }]
}

/// Outcome of every check run by [`check_all`], in check order.  A check
/// that could not complete keeps its error alongside the warnings of the
/// others.
#[derive(Debug)]
pub struct CheckReport {
    outcomes: Vec<(WarningKind, Result<Vec<Warning>, DiagnosticError>)>,
}

impl CheckReport {
    pub fn outcomes(&self) -> &[(WarningKind, Result<Vec<Warning>, DiagnosticError>)] {
        &self.outcomes
    }

    pub fn outcome(&self, check: WarningKind) -> Option<&Result<Vec<Warning>, DiagnosticError>> {
        self.outcomes
            .iter()
            .find(|(kind, _)| *kind == check)
            .map(|(_, result)| result)
    }

    /// Warnings of every check that completed, in check order.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> + '_ {
        self.outcomes
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
            .flatten()
    }

    /// Checks that could not complete, with their errors.
    pub fn errors(&self) -> impl Iterator<Item = (WarningKind, &DiagnosticError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|(kind, result)| result.as_ref().err().map(|e| (*kind, e)))
    }

    /// True when every check completed.
    pub fn is_complete(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.outcomes
            .into_iter()
            .filter_map(|(_, result)| result.ok())
            .flatten()
            .collect()
    }

    /// Every warning, or the first error in check order.
    pub fn into_result(self) -> Result<Vec<Warning>, DiagnosticError> {
        let mut warnings = Vec::new();
        for (_, result) in self.outcomes {
            warnings.extend(result?);
        }
        Ok(warnings)
    }
}

/// Runs every check in the order n_eff, split Rhat, tree depth, energy,
/// divergences.  All checks always run and each keeps its own outcome.
pub fn check_all(fit: &FitResult, max_depth: u32, energy_threshold: f64) -> CheckReport {
    let outcomes = vec![
        (
            WarningKind::EffectiveSampleSize,
            check_effective_sample_size(fit),
        ),
        (WarningKind::SplitRhat, check_split_rhat(fit)),
        (WarningKind::TreeDepth, Ok(check_treedepth(fit, max_depth))),
        (WarningKind::Energy, check_energy(fit, energy_threshold)),
        (WarningKind::Divergence, Ok(check_divergences(fit))),
    ];
    for (kind, result) in &outcomes {
        if let Err(e) = result {
            warn!(check = %kind, error = %e, "check did not complete");
        }
    }
    CheckReport { outcomes }
}
