use crate::utils::sample_variance;
use anyhow::{anyhow, Error, Result};

pub const MIN_E_BFMI_DRAWS: usize = 2;

/// Energy Bayesian fraction of missing information for one chain's energy
/// trace:
///
/// `E-BFMI = (sum_t (E_t - E_{t-1})^2 / N) / var(E)`
///
/// with `var` the sample variance.  Low values mean momentum resampling
/// explores the energy level sets poorly.  A flat trace gives NaN.
pub fn energy_bfmi(energies: &[f64]) -> Result<f64, Error> {
    if energies.len() < MIN_E_BFMI_DRAWS {
        return Err(anyhow!(
            "E-BFMI needs at least {} iterations, got {}",
            MIN_E_BFMI_DRAWS,
            energies.len()
        ));
    }
    let numer = energies
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum::<f64>()
        / energies.len() as f64;
    let denom = sample_variance(energies)?;
    Ok(numer / denom)
}
