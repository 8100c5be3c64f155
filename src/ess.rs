use crate::utils::{
    autocovariance, constant_within_chains, flatten, is_constant, mean, sample_variance,
    split_chains, trim_to_shortest,
};
use anyhow::{anyhow, Error, Result};

/// Draws per chain needed for the split effective sample size: each half
/// must hold at least four.
pub const MIN_SPLIT_ESS_DRAWS: usize = 8;

/// Computes the effective sample size (ESS) for one parameter across all
/// supplied chains.  The value returned is the minimum of ESS and
/// `N * log10(N)` where `N` is the total number of draws.
///
/// Chains are trimmed from the back to match the length of the shortest
/// chain.  ESS can not be estimated with fewer than four draws per chain,
/// with non-finite draws, or when every draw has the same value.  When
/// each chain is constant on its own but the chains differ, the
/// within-chain variance is zero and the ESS is reported as zero.
///
/// Follows the Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation):
/// autocorrelations are combined across chains, then truncated with
/// Geyer's initial monotone sequence.
///
/// # Arguments
/// * `chains` - one slice of draws per chain, all for the same parameter
pub fn compute_effective_sample_size(chains: &[Vec<f64>]) -> Result<f64, Error> {
    let chains = trim_to_shortest(chains)?;
    let num_chains = chains.len();
    let num_draws = chains[0].len();

    if num_draws < 4 {
        return Err(anyhow!("Must have at least 4 samples to compute ESS"));
    }
    if let Some(bad) = chains.iter().flatten().find(|v| !v.is_finite()) {
        return Err(anyhow!("All values must be finite to compute ESS (found {})", bad));
    }
    if is_constant(&chains) {
        return Err(anyhow!(
            "No ESS when elements are all constant (value={})",
            chains[0][0]
        ));
    }
    if constant_within_chains(&chains) {
        return Ok(0.0);
    }

    let n = num_draws as f64;
    let mut chain_acov = Vec::with_capacity(num_chains);
    let mut chain_mean = Vec::with_capacity(num_chains);
    let mut chain_var = Vec::with_capacity(num_chains);
    for chain in &chains {
        let acov = autocovariance(chain)?;
        chain_mean.push(mean(chain)?);
        chain_var.push(acov[0] * n / (n - 1.0));
        chain_acov.push(acov);
    }

    let mean_var = mean(&chain_var)?;
    let mut var_plus = mean_var * (n - 1.0) / n;
    if num_chains > 1 {
        var_plus += sample_variance(&chain_mean)?;
    }

    // autocorrelation at `lag`, pooled over chains
    let rho_at = |lag: usize| -> Result<f64, Error> {
        let acov_lag: Vec<f64> = chain_acov.iter().map(|acov| acov[lag]).collect();
        Ok(1.0 - (mean_var - mean(&acov_lag)?) / var_plus)
    };

    let mut rho_hat_s = vec![0.0; num_draws];
    let mut rho_hat_even = 1.0;
    rho_hat_s[0] = rho_hat_even;
    let mut rho_hat_odd = rho_at(1)?;
    rho_hat_s[1] = rho_hat_odd;

    // Geyer's initial positive sequence. The last pair of autocorrelations
    // is left as a bias term for antithetic chains.
    let mut s = 1;
    while s < num_draws - 4 && rho_hat_even + rho_hat_odd > 0.0 {
        rho_hat_even = rho_at(s + 1)?;
        rho_hat_odd = rho_at(s + 2)?;
        if rho_hat_even + rho_hat_odd >= 0.0 {
            rho_hat_s[s + 1] = rho_hat_even;
            rho_hat_s[s + 2] = rho_hat_odd;
        }
        s += 2;
    }

    let max_s = s;
    if rho_hat_even > 0.0 {
        rho_hat_s[max_s + 1] = rho_hat_even;
    }

    // initial positive sequence -> initial monotone sequence
    let mut s = 1;
    while max_s >= 3 && s <= max_s - 3 {
        if rho_hat_s[s + 1] + rho_hat_s[s + 2] > rho_hat_s[s - 1] + rho_hat_s[s] {
            rho_hat_s[s + 1] = (rho_hat_s[s - 1] + rho_hat_s[s]) / 2.0;
            rho_hat_s[s + 2] = rho_hat_s[s + 1];
        }
        s += 2;
    }

    let num_total_draws = num_chains as f64 * n;
    let tau_hat = -1.0 + 2.0 * rho_hat_s.iter().take(max_s).sum::<f64>() + rho_hat_s[max_s + 1];
    Ok((num_total_draws / tau_hat).min(num_total_draws * num_total_draws.log10()))
}

/// Computes the split effective sample size: every chain is cut at its
/// midpoint (dropping the middle draw of odd-length chains) and the halves
/// are passed to [`compute_effective_sample_size`].  Needs at least
/// [`MIN_SPLIT_ESS_DRAWS`] draws per chain.
pub fn compute_split_effective_sample_size(chains: &[Vec<f64>]) -> Result<f64, Error> {
    let trimmed = trim_to_shortest(chains)?;
    let split = split_chains(&trimmed)?;
    compute_effective_sample_size(&split)
}

/// Computes the Monte Carlo standard error of the mean: the standard
/// deviation of all draws over the square root of the split effective
/// sample size.
pub fn compute_estimated_mcse(chains: &[Vec<f64>]) -> Result<f64, Error> {
    let ess = compute_split_effective_sample_size(chains)?;
    let var = sample_variance(&flatten(chains))?;
    Ok((var / ess).sqrt())
}
