use crate::checks::{check_all, CheckReport, DEFAULT_E_BFMI_THRESHOLD, DEFAULT_MAX_TREEDEPTH};
use crate::error::DiagnosticError;
use crate::fit::FitResult;
use crate::partition::{partition_divergences, DivergencePartition};
use crate::summary::{summarize, ParameterSummary};

/// Tunable thresholds for [`DiagnosticEvaluator`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticConfig {
    /// Tree depth ceiling the sampler ran with; iterations reaching it are
    /// counted as saturated.
    pub max_treedepth: u32,
    /// Chains with E-BFMI below this are flagged.
    pub energy_threshold: f64,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            max_treedepth: DEFAULT_MAX_TREEDEPTH,
            energy_threshold: DEFAULT_E_BFMI_THRESHOLD,
        }
    }
}

impl DiagnosticConfig {
    pub fn with_max_treedepth(mut self, max_treedepth: u32) -> Self {
        self.max_treedepth = max_treedepth;
        self
    }

    pub fn with_energy_threshold(mut self, energy_threshold: f64) -> Self {
        self.energy_threshold = energy_threshold;
        self
    }
}

/// Runs the full set of checks with a fixed configuration.  Holds no state
/// beyond its configuration, so one evaluator can be shared across threads
/// and fits.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticEvaluator {
    config: DiagnosticConfig,
}

impl DiagnosticEvaluator {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    /// Outcome of every check for `fit`, see [`check_all`].
    pub fn evaluate(&self, fit: &FitResult) -> CheckReport {
        check_all(fit, self.config.max_treedepth, self.config.energy_threshold)
    }

    /// Evaluates each fit independently, e.g. reruns of one model under
    /// different sampler settings.  Results come back in input order.
    pub fn evaluate_each<'a, I>(&self, fits: I) -> Vec<CheckReport>
    where
        I: IntoIterator<Item = &'a FitResult>,
    {
        fits.into_iter().map(|fit| self.evaluate(fit)).collect()
    }

    pub fn summarize(&self, fit: &FitResult) -> Result<Vec<ParameterSummary>, DiagnosticError> {
        summarize(fit)
    }

    pub fn partition<'a>(&self, fit: &'a FitResult) -> DivergencePartition<'a> {
        partition_divergences(fit)
    }
}
