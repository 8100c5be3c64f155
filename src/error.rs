use thiserror::Error;

/// Errors raised while building or evaluating a fit.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// Chains disagree on parameter names or iteration counts, a chain's
    /// draws and metadata have inconsistent shapes, or a draw or energy is
    /// not finite.
    #[error("malformed fit result: {0}")]
    MalformedFitResult(String),

    /// An ensemble statistic was requested with too few chains.
    #[error("insufficient chains: {found} supplied, at least {required} required")]
    InsufficientChains { found: usize, required: usize },

    /// A statistic was requested on chains too short to estimate it.
    #[error("insufficient iterations: {found} per chain, at least {required} required")]
    InsufficientIterations { found: usize, required: usize },

    /// No chains, no parameters or no sampling iterations.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A low-level statistic could not be computed.
    #[error(transparent)]
    Numeric(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
