use crate::error::DiagnosticError;
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::HashSet;

/// Sampler-reported diagnostics for one post-warmup iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IterationMetadata {
    /// Average Metropolis acceptance probability of the transition.
    pub accept_stat: f64,
    /// Whether the simulated trajectory diverged.
    pub divergent: bool,
    /// Depth of the trajectory tree.
    pub treedepth: u32,
    pub stepsize: f64,
    /// Hamiltonian at the start of the transition.
    pub energy: f64,
    /// Number of leapfrog (gradient) evaluations.
    pub n_leapfrog: u32,
    /// Wall-clock seconds spent on the iteration.
    pub elapsed_time: f64,
}

/// Output of a single chain: warmup draws, sampling draws (iteration ×
/// parameter) and one metadata record per sampling iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    parameter_names: Vec<String>,
    warmup: Array2<f64>,
    sampling: Array2<f64>,
    metadata: Vec<IterationMetadata>,
}

impl Chain {
    /// Builds a chain, checking that both draw matrices have one column per
    /// parameter, that there is one metadata record per sampling row, and
    /// that every sampling draw and energy is finite.
    pub fn new(
        parameter_names: Vec<String>,
        warmup: Array2<f64>,
        sampling: Array2<f64>,
        metadata: Vec<IterationMetadata>,
    ) -> Result<Self, DiagnosticError> {
        let num_params = parameter_names.len();
        if sampling.ncols() != num_params {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "sampling draws have {} columns for {} parameters",
                sampling.ncols(),
                num_params
            )));
        }
        if warmup.nrows() > 0 && warmup.ncols() != num_params {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "warmup draws have {} columns for {} parameters",
                warmup.ncols(),
                num_params
            )));
        }
        if metadata.len() != sampling.nrows() {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "{} metadata records for {} sampling iterations",
                metadata.len(),
                sampling.nrows()
            )));
        }
        if let Some(((iteration, param), value)) =
            sampling.indexed_iter().find(|(_, v)| !v.is_finite())
        {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "draw {} of parameter {:?} is not finite ({})",
                iteration, parameter_names[param], value
            )));
        }
        if let Some((iteration, m)) = metadata
            .iter()
            .enumerate()
            .find(|(_, m)| !m.energy.is_finite())
        {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "energy at iteration {} is not finite ({})",
                iteration, m.energy
            )));
        }
        let duplicate = {
            let mut seen = HashSet::with_capacity(num_params);
            parameter_names
                .iter()
                .find(|name| !seen.insert(name.as_str()))
                .cloned()
        };
        if let Some(dup) = duplicate {
            return Err(DiagnosticError::MalformedFitResult(format!(
                "duplicate parameter name {:?}",
                dup
            )));
        }
        Ok(Self {
            parameter_names,
            warmup,
            sampling,
            metadata,
        })
    }

    /// Builds a chain without warmup from row-major sampling draws.
    pub fn from_rows(
        parameter_names: Vec<String>,
        rows: Vec<Vec<f64>>,
        metadata: Vec<IterationMetadata>,
    ) -> Result<Self, DiagnosticError> {
        let num_params = parameter_names.len();
        let sampling = rows_to_array(rows, num_params)?;
        let warmup = Array2::zeros((0, num_params));
        Self::new(parameter_names, warmup, sampling, metadata)
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn warmup(&self) -> &Array2<f64> {
        &self.warmup
    }

    /// Post-warmup draws, iteration × parameter.
    pub fn sampling(&self) -> &Array2<f64> {
        &self.sampling
    }

    pub fn metadata(&self) -> &[IterationMetadata] {
        &self.metadata
    }

    pub fn num_iterations(&self) -> usize {
        self.sampling.nrows()
    }

    /// Draws of parameter `param` in iteration order.
    pub fn parameter_trace(&self, param: usize) -> Vec<f64> {
        self.sampling.column(param).to_vec()
    }

    /// Sampling draw at `iteration`, one value per parameter.
    pub fn draw(&self, iteration: usize) -> ArrayView1<'_, f64> {
        self.sampling.index_axis(Axis(0), iteration)
    }

    pub fn energies(&self) -> Vec<f64> {
        self.metadata.iter().map(|m| m.energy).collect()
    }

    /// Column of each of `names` in this chain, or `None` when the chain
    /// holds a different set of parameters.
    fn column_order(&self, names: &[String]) -> Option<Vec<usize>> {
        if self.parameter_names.len() != names.len() {
            return None;
        }
        names
            .iter()
            .map(|n| self.parameter_names.iter().position(|m| m == n))
            .collect()
    }

    fn with_column_order(self, names: &[String], order: &[usize]) -> Self {
        if order.iter().enumerate().all(|(i, &j)| i == j) {
            return self;
        }
        let warmup = if self.warmup.nrows() > 0 {
            self.warmup.select(Axis(1), order)
        } else {
            Array2::zeros((0, names.len()))
        };
        Self {
            parameter_names: names.to_vec(),
            warmup,
            sampling: self.sampling.select(Axis(1), order),
            metadata: self.metadata,
        }
    }
}

pub(crate) fn rows_to_array(
    rows: Vec<Vec<f64>>,
    num_params: usize,
) -> Result<Array2<f64>, DiagnosticError> {
    let num_rows = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_params) {
        return Err(DiagnosticError::MalformedFitResult(format!(
            "draw {} has {} values for {} parameters",
            i,
            row.len(),
            num_params
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((num_rows, num_params), flat)
        .map_err(|e| DiagnosticError::MalformedFitResult(e.to_string()))
}

/// The complete, immutable output of one sampler run.  Chain order is the
/// order the chains were supplied in.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    chains: Vec<Chain>,
}

impl FitResult {
    /// Validates and wraps a set of chains.  All chains must share the same
    /// set of parameter names and the same sampling-iteration count, and
    /// there must be at least one chain, one parameter and one iteration.
    /// Columns of later chains are reordered to match the first chain.
    pub fn new(chains: Vec<Chain>) -> Result<Self, DiagnosticError> {
        let mut chains = chains.into_iter();
        let first = chains
            .next()
            .ok_or(DiagnosticError::EmptyInput("no chains supplied"))?;
        if first.parameter_names().is_empty() {
            return Err(DiagnosticError::EmptyInput("no parameters supplied"));
        }
        if first.num_iterations() == 0 {
            return Err(DiagnosticError::EmptyInput("no sampling iterations supplied"));
        }
        let names = first.parameter_names().to_vec();
        let iterations = first.num_iterations();

        let mut aligned = Vec::with_capacity(chains.len() + 1);
        aligned.push(first);
        for (index, chain) in chains.enumerate().map(|(i, c)| (i + 1, c)) {
            let order = chain.column_order(&names).ok_or_else(|| {
                DiagnosticError::MalformedFitResult(format!(
                    "chain {} parameters {:?} differ from chain 0 parameters {:?}",
                    index,
                    chain.parameter_names(),
                    names
                ))
            })?;
            if chain.num_iterations() != iterations {
                return Err(DiagnosticError::MalformedFitResult(format!(
                    "chain {} has {} sampling iterations, chain 0 has {}",
                    index,
                    chain.num_iterations(),
                    iterations
                )));
            }
            aligned.push(chain.with_column_order(&names, &order));
        }
        Ok(Self { chains: aligned })
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn parameter_names(&self) -> &[String] {
        self.chains[0].parameter_names()
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameter_names().iter().position(|n| n == name)
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    /// Sampling iterations per chain.
    pub fn num_iterations(&self) -> usize {
        self.chains[0].num_iterations()
    }

    /// Sampling iterations summed over chains.
    pub fn total_iterations(&self) -> usize {
        self.num_chains() * self.num_iterations()
    }

    /// One trace per chain for parameter `param`.
    pub fn parameter_draws(&self, param: usize) -> Vec<Vec<f64>> {
        self.chains.iter().map(|c| c.parameter_trace(param)).collect()
    }

    /// Every metadata record tagged with its chain and iteration index.
    pub fn iterations(&self) -> impl Iterator<Item = (usize, usize, &IterationMetadata)> + '_ {
        self.chains.iter().enumerate().flat_map(|(chain, c)| {
            c.metadata()
                .iter()
                .enumerate()
                .map(move |(iteration, m)| (chain, iteration, m))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn chain(params: &[&str], iterations: usize) -> Chain {
        let rows = (0..iterations)
            .map(|i| params.iter().map(|_| i as f64).collect())
            .collect();
        Chain::from_rows(names(params), rows, vec![IterationMetadata::default(); iterations])
            .unwrap()
    }

    #[test]
    fn test_valid_fit() {
        let fit = FitResult::new(vec![chain(&["a", "b"], 5), chain(&["a", "b"], 5)]).unwrap();
        assert_eq!(fit.num_chains(), 2);
        assert_eq!(fit.num_iterations(), 5);
        assert_eq!(fit.total_iterations(), 10);
        assert_eq!(fit.parameter_index("b"), Some(1));
        assert_eq!(fit.parameter_index("c"), None);
        assert_eq!(fit.parameter_draws(0)[1], vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(fit.iterations().count(), 10);
        assert_eq!(fit.chains()[1].draw(3).to_vec(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(
            FitResult::new(vec![]),
            Err(DiagnosticError::EmptyInput(_))
        ));
        assert!(matches!(
            FitResult::new(vec![chain(&["a"], 0)]),
            Err(DiagnosticError::EmptyInput(_))
        ));
        assert!(matches!(
            FitResult::new(vec![chain(&[], 3)]),
            Err(DiagnosticError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_mismatched_chains() {
        let err = FitResult::new(vec![chain(&["a", "b"], 5), chain(&["a", "c"], 5)]);
        assert!(matches!(err, Err(DiagnosticError::MalformedFitResult(_))));

        let err = FitResult::new(vec![chain(&["a", "b"], 5), chain(&["b"], 5)]);
        assert!(matches!(err, Err(DiagnosticError::MalformedFitResult(_))));

        let err = FitResult::new(vec![chain(&["a"], 5), chain(&["a"], 4)]);
        assert!(matches!(err, Err(DiagnosticError::MalformedFitResult(_))));
    }

    #[test]
    fn test_malformed_chain() {
        let meta = vec![IterationMetadata::default(); 2];
        let ragged = Chain::from_rows(names(&["a", "b"]), vec![vec![1.0, 2.0], vec![1.0]], meta);
        assert!(matches!(ragged, Err(DiagnosticError::MalformedFitResult(_))));

        let short_meta = Chain::from_rows(
            names(&["a"]),
            vec![vec![1.0], vec![2.0]],
            vec![IterationMetadata::default()],
        );
        assert!(matches!(short_meta, Err(DiagnosticError::MalformedFitResult(_))));

        let dup = Chain::from_rows(
            names(&["a", "a"]),
            vec![vec![1.0, 2.0]],
            vec![IterationMetadata::default()],
        );
        assert!(matches!(dup, Err(DiagnosticError::MalformedFitResult(_))));
    }

    #[test]
    fn test_permuted_parameters_are_aligned() {
        let meta = vec![IterationMetadata::default(); 2];
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0]];
        let ab = Chain::from_rows(names(&["a", "b"]), rows, meta.clone()).unwrap();
        let ba = Chain::new(
            names(&["b", "a"]),
            Array2::from_shape_vec((1, 2), vec![30.0, 3.0]).unwrap(),
            Array2::from_shape_vec((2, 2), vec![40.0, 4.0, 50.0, 5.0]).unwrap(),
            meta,
        )
        .unwrap();
        let fit = FitResult::new(vec![ab, ba]).unwrap();
        let second = &fit.chains()[1];
        assert_eq!(second.parameter_names(), &["a", "b"]);
        assert_eq!(second.parameter_trace(0), vec![4.0, 5.0]);
        assert_eq!(second.parameter_trace(1), vec![40.0, 50.0]);
        assert_eq!(second.warmup().row(0).to_vec(), vec![3.0, 30.0]);
        assert_eq!(fit.parameter_draws(1), vec![vec![10.0, 20.0], vec![40.0, 50.0]]);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let nan_draw = Chain::from_rows(
            names(&["a", "b"]),
            vec![vec![1.0, 2.0], vec![f64::NAN, 3.0]],
            vec![IterationMetadata::default(); 2],
        );
        assert!(matches!(nan_draw, Err(DiagnosticError::MalformedFitResult(_))));

        let inf_draw = Chain::from_rows(
            names(&["a"]),
            vec![vec![f64::INFINITY]],
            vec![IterationMetadata::default()],
        );
        assert!(matches!(inf_draw, Err(DiagnosticError::MalformedFitResult(_))));

        let nan_energy = Chain::from_rows(
            names(&["a"]),
            vec![vec![1.0], vec![2.0]],
            vec![
                IterationMetadata::default(),
                IterationMetadata {
                    energy: f64::NAN,
                    ..Default::default()
                },
            ],
        );
        assert!(matches!(nan_energy, Err(DiagnosticError::MalformedFitResult(_))));
    }

    #[test]
    fn test_warmup_shape_checked() {
        let err = Chain::new(
            names(&["a", "b"]),
            Array2::zeros((3, 1)),
            Array2::zeros((2, 2)),
            vec![IterationMetadata::default(); 2],
        );
        assert!(matches!(err, Err(DiagnosticError::MalformedFitResult(_))));
    }
}
