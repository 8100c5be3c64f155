use crate::utils::{mean, sample_variance, split_chains, trim_to_shortest};
use anyhow::{anyhow, Error, Result};

/// Draws per chain needed for split Rhat: each half needs a sample variance.
pub const MIN_SPLIT_RHAT_DRAWS: usize = 4;

/// Computes the potential scale reduction (Rhat) for one parameter across
/// the supplied chains.  Chains are trimmed from the back to match the
/// length of the shortest chain.
///
/// `Rhat = sqrt(((n - 1) / n * W + B / n) / W)` where `W` is the mean
/// within-chain variance and `B` is `n` times the variance of the chain
/// means.  Zero within-chain variance yields a non-finite value rather
/// than an error.
///
/// See the Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
pub fn potential_scale_reduction_factor(chains: &[Vec<f64>]) -> Result<f64, Error> {
    if chains.len() < 2 {
        return Err(anyhow!(
            "Rhat needs at least 2 chains, got {}",
            chains.len()
        ));
    }
    let chains = trim_to_shortest(chains)?;

    let mut chain_mean = Vec::with_capacity(chains.len());
    let mut chain_var = Vec::with_capacity(chains.len());
    for chain in &chains {
        chain_mean.push(mean(chain)?);
        chain_var.push(sample_variance(chain)?);
    }

    let n = chains[0].len() as f64;
    let var_between = n * sample_variance(&chain_mean)?;
    let var_within = mean(&chain_var)?;
    Ok(((var_between / var_within + n - 1.0) / n).sqrt())
}

/// Computes the split potential scale reduction (split Rhat): every chain
/// is cut at its midpoint and the halves are treated as separate chains.
/// When a chain has an odd number of draws the middle one is ignored.
///
/// A single chain is enough for the arithmetic (it yields two halves), but
/// callers comparing an ensemble should require at least two.
pub fn split_potential_scale_reduction_factor(chains: &[Vec<f64>]) -> Result<f64, Error> {
    let trimmed = trim_to_shortest(chains)?;
    let split = split_chains(&trimmed)?;
    potential_scale_reduction_factor(&split)
}
