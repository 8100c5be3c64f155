use anyhow::{anyhow, Error, Result};
use arima::acf;
use average::Variance;

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take mean of empty array"));
    }
    let acc: Variance = arr.iter().copied().collect();
    Ok(acc.mean())
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64, Error> {
    if arr.len() < 2 {
        return Err(anyhow!(
            "Need at least 2 values for a sample variance, got {}",
            arr.len()
        ));
    }
    let acc: Variance = arr.iter().copied().collect();
    Ok(acc.sample_variance())
}

/// Autocovariance of a single chain at every lag, normalised by the chain
/// length (lag 0 is the population variance).
pub fn autocovariance(chain: &[f64]) -> Result<Vec<f64>, Error> {
    if chain.is_empty() {
        return Err(anyhow!("Can't take autocovariance of empty chain"));
    }
    acf::acf(chain, None, true).map_err(|e| anyhow!("autocovariance failed: {:?}", e))
}

/// Length of the shortest chain, or an error when there are no chains.
pub fn shortest(chains: &[Vec<f64>]) -> Result<usize, Error> {
    chains
        .iter()
        .map(|c| c.len())
        .min()
        .ok_or_else(|| anyhow!("No chains supplied"))
}

/// Trims every chain from the back to the length of the shortest one.
pub fn trim_to_shortest(chains: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, Error> {
    let num_draws = shortest(chains)?;
    Ok(chains.iter().map(|c| c[..num_draws].to_vec()).collect())
}

/// Splits each chain into two chains of equal length.  When the
/// number of total draws N is odd, the (N+1)/2th draw is ignored.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation).
///
/// Chains are assumed to be of equal size; use [`trim_to_shortest`] first
/// otherwise.
pub fn split_chains(chains: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, Error> {
    if chains.is_empty() {
        return Err(anyhow!("Can't split empty array of chains"));
    }
    let num_draws = shortest(chains)?;
    if num_draws < 1 {
        return Err(anyhow!("No samples to split"));
    }
    let half = num_draws / 2;
    let offset = num_draws % 2;
    let mut split_draws = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        split_draws.push(chain[..half].to_vec());
        split_draws.push(chain[(half + offset)..num_draws].to_vec());
    }
    Ok(split_draws)
}

/// Concatenates all chains into a single vector, chain by chain.
pub fn flatten(chains: &[Vec<f64>]) -> Vec<f64> {
    chains.iter().flat_map(|c| c.iter().copied()).collect()
}

/// True when every draw of every chain has the same value.
pub fn is_constant(chains: &[Vec<f64>]) -> bool {
    let mut values = chains.iter().flat_map(|c| c.iter());
    match values.next() {
        Some(first) => values.all(|v| abs_diff_eq!(*v, *first, epsilon = 1e-10)),
        None => true,
    }
}

/// True when every chain is constant on its own, i.e. the within-chain
/// variance is zero.  The chains may still sit at different values.
pub fn constant_within_chains(chains: &[Vec<f64>]) -> bool {
    chains
        .iter()
        .all(|c| is_constant(std::slice::from_ref(c)))
}
