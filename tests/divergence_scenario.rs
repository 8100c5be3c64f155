//! End-to-end checks on a synthetic four-chain fit whose only pathology is a
//! handful of divergent transitions in one chain.

use mcmc_diag::{
    check_all, partition_divergences, Chain, DiagnosticEvaluator, FitResult, IterationMetadata,
    Warning,
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

const CHAINS: usize = 4;
const ITERATIONS: usize = 1000;
const PARAMS: [&str; 8] = ["mu", "tau", "theta.1", "theta.2", "theta.3", "theta.4", "theta.5", "sigma"];
const DIVERGENT_CHAIN: usize = 1;
const DIVERGENCES: usize = 17;

fn build_fit(seed: u64) -> FitResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let draw = Normal::new(0.0, 1.0).unwrap();
    let energy = Normal::new(20.0, 3.0).unwrap();
    let names: Vec<String> = PARAMS.iter().map(|s| s.to_string()).collect();

    let chains = (0..CHAINS)
        .map(|c| {
            let rows: Vec<Vec<f64>> = (0..ITERATIONS)
                .map(|_| PARAMS.iter().map(|_| draw.sample(&mut rng)).collect())
                .collect();
            let metadata: Vec<IterationMetadata> = (0..ITERATIONS)
                .map(|t| IterationMetadata {
                    accept_stat: 0.9,
                    divergent: c == DIVERGENT_CHAIN && t % 50 == 7 && t / 50 < DIVERGENCES,
                    treedepth: 4,
                    stepsize: 0.3,
                    energy: energy.sample(&mut rng),
                    n_leapfrog: 15,
                    elapsed_time: 0.002,
                })
                .collect();
            Chain::from_rows(names.clone(), rows, metadata).unwrap()
        })
        .collect();
    FitResult::new(chains).unwrap()
}

#[test]
fn test_only_divergences_are_reported() {
    let fit = build_fit(2024);
    let report = check_all(&fit, 10, 0.2);
    assert!(report.is_complete());
    let warnings = report.into_warnings();
    assert_eq!(
        warnings,
        vec![Warning::Divergences {
            count: DIVERGENCES,
            total: CHAINS * ITERATIONS
        }]
    );
    let pct = warnings[0].percentage().unwrap();
    assert!((pct - 0.425).abs() < 1e-12, "percentage = {}", pct);
}

#[test]
fn test_evaluator_matches_check_all() {
    let fit = build_fit(7);
    let evaluator = DiagnosticEvaluator::default();
    assert_eq!(
        evaluator.evaluate(&fit).into_warnings(),
        check_all(&fit, 10, 0.2).into_warnings()
    );
}

#[test]
fn test_divergent_draws_come_from_one_chain() {
    let fit = build_fit(99);
    let partition = partition_divergences(&fit);
    assert_eq!(partition.divergent.len(), DIVERGENCES);
    assert_eq!(partition.nondivergent.len(), CHAINS * ITERATIONS - DIVERGENCES);
    assert!(partition.divergent.iter().all(|d| d.chain == DIVERGENT_CHAIN));

    let mu = partition.divergent_values("mu").unwrap();
    let expected: Vec<f64> = partition
        .divergent
        .iter()
        .map(|d| fit.chains()[d.chain].sampling()[[d.iteration, 0]])
        .collect();
    assert_eq!(mu, expected);
}
