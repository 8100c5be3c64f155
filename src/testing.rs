//! Synthetic fits for unit tests.

use crate::fit::{Chain, FitResult, IterationMetadata};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Healthy metadata: shallow trees, no divergences, iid energies.
pub(crate) fn healthy_metadata(iterations: usize, rng: &mut StdRng) -> Vec<IterationMetadata> {
    let normal = Normal::new(10.0, 2.0).unwrap();
    (0..iterations)
        .map(|_| IterationMetadata {
            accept_stat: 0.85,
            divergent: false,
            treedepth: 3,
            stepsize: 0.4,
            energy: normal.sample(rng),
            n_leapfrog: 7,
            elapsed_time: 0.001,
        })
        .collect()
}

/// Fit whose draws are iid standard normal and whose metadata is healthy;
/// `edit` may then adjust each chain's metadata.
pub(crate) fn fit_with<F>(
    num_chains: usize,
    iterations: usize,
    params: &[&str],
    seed: u64,
    mut edit: F,
) -> FitResult
where
    F: FnMut(usize, &mut Vec<IterationMetadata>),
{
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let names: Vec<String> = params.iter().map(|s| s.to_string()).collect();
    let chains = (0..num_chains)
        .map(|c| {
            let rows = (0..iterations)
                .map(|_| params.iter().map(|_| normal.sample(&mut rng)).collect())
                .collect();
            let mut metadata = healthy_metadata(iterations, &mut rng);
            edit(c, &mut metadata);
            Chain::from_rows(names.clone(), rows, metadata).unwrap()
        })
        .collect();
    FitResult::new(chains).unwrap()
}

pub(crate) fn iid_fit(num_chains: usize, iterations: usize, params: &[&str], seed: u64) -> FitResult {
    fit_with(num_chains, iterations, params, seed, |_, _| {})
}

/// Two parameters: `x` iid normal, `c` fixed at `value` in every draw.
pub(crate) fn constant_parameter_fit(
    num_chains: usize,
    iterations: usize,
    value: f64,
    seed: u64,
) -> FitResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let names = vec!["x".to_string(), "c".to_string()];
    let chains = (0..num_chains)
        .map(|_| {
            let rows = (0..iterations)
                .map(|_| vec![normal.sample(&mut rng), value])
                .collect();
            let metadata = healthy_metadata(iterations, &mut rng);
            Chain::from_rows(names.clone(), rows, metadata).unwrap()
        })
        .collect();
    FitResult::new(chains).unwrap()
}

/// One parameter `a` with the given per-chain traces and healthy metadata.
pub(crate) fn fit_from_traces(traces: &[Vec<f64>]) -> FitResult {
    let mut rng = StdRng::seed_from_u64(0);
    let chains = traces
        .iter()
        .map(|trace| {
            let rows = trace.iter().map(|&v| vec![v]).collect();
            let metadata = healthy_metadata(trace.len(), &mut rng);
            Chain::from_rows(vec!["a".to_string()], rows, metadata).unwrap()
        })
        .collect();
    FitResult::new(chains).unwrap()
}
