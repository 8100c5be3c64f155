//! Splitting sampling draws by whether their transition diverged, e.g. to
//! plot where divergences concentrate in parameter space.

use crate::fit::FitResult;
use ndarray::ArrayView1;

/// One sampling draw borrowed from a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRef<'a> {
    pub chain: usize,
    pub iteration: usize,
    /// One value per parameter, in the fit's parameter order.
    pub values: ArrayView1<'a, f64>,
}

/// Divergent and non-divergent draws of a fit.  Together they hold every
/// sampling draw exactly once, each side in chain-then-iteration order.
#[derive(Debug, Clone)]
pub struct DivergencePartition<'a> {
    parameter_names: &'a [String],
    pub divergent: Vec<DrawRef<'a>>,
    pub nondivergent: Vec<DrawRef<'a>>,
}

impl<'a> DivergencePartition<'a> {
    pub fn parameter_names(&self) -> &'a [String] {
        self.parameter_names
    }

    /// Total number of draws on both sides.
    pub fn len(&self) -> usize {
        self.divergent.len() + self.nondivergent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of parameter `name` over the divergent draws.
    pub fn divergent_values(&self, name: &str) -> Option<Vec<f64>> {
        self.values(&self.divergent, name)
    }

    /// Values of parameter `name` over the non-divergent draws.
    pub fn nondivergent_values(&self, name: &str) -> Option<Vec<f64>> {
        self.values(&self.nondivergent, name)
    }

    fn values(&self, draws: &[DrawRef<'a>], name: &str) -> Option<Vec<f64>> {
        let index = self.parameter_names.iter().position(|n| n == name)?;
        Some(draws.iter().map(|d| d.values[index]).collect())
    }
}

/// Partitions every sampling draw of `fit` by its iteration's divergence
/// flag.
pub fn partition_divergences(fit: &FitResult) -> DivergencePartition<'_> {
    let mut divergent = Vec::new();
    let mut nondivergent = Vec::with_capacity(fit.total_iterations());
    for (chain, c) in fit.chains().iter().enumerate() {
        for (iteration, meta) in c.metadata().iter().enumerate() {
            let draw = DrawRef {
                chain,
                iteration,
                values: c.draw(iteration),
            };
            if meta.divergent {
                divergent.push(draw);
            } else {
                nondivergent.push(draw);
            }
        }
    }
    DivergencePartition {
        parameter_names: fit.parameter_names(),
        divergent,
        nondivergent,
    }
}
