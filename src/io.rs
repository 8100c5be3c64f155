/*!
# Reading CmdStan output

CmdStan writes one CSV file per chain: `#` comment lines carrying the run
configuration and timing, a header row, then one row per iteration.  The
sampler columns (`accept_stat__`, `stepsize__`, `treedepth__`,
`n_leapfrog__`, `divergent__`, `energy__`) become [`IterationMetadata`];
every other column, `lp__` included, is a parameter.

When the run was configured with `save_warmup`, the first `num_warmup`
rows are kept as warmup draws and excluded from analysis.  CmdStan only
reports elapsed time per phase, so the sampling time is spread evenly over
the sampling iterations.
*/

use crate::error::DiagnosticError;
use crate::fit::{rows_to_array, Chain, FitResult, IterationMetadata};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const SAMPLER_COLUMNS: [&str; 6] = [
    "accept_stat__",
    "stepsize__",
    "treedepth__",
    "n_leapfrog__",
    "divergent__",
    "energy__",
];

#[derive(Debug, Default)]
struct RunConfig {
    num_warmup: usize,
    save_warmup: bool,
    sampling_seconds: Option<f64>,
}

fn parse_comments(text: &str) -> RunConfig {
    let mut config = RunConfig::default();
    for line in text.lines().filter_map(|l| l.trim_start().strip_prefix('#')) {
        let line = line.trim();
        if let Some(seconds) = line.strip_suffix("seconds (Sampling)") {
            let seconds = seconds.trim_start_matches("Elapsed Time:").trim();
            config.sampling_seconds = seconds.parse().ok();
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let (key, value) = match (parts.next(), parts.next()) {
            (Some(k), Some(v)) => (k.trim(), v.split_whitespace().next().unwrap_or("")),
            _ => continue,
        };
        match key {
            "num_warmup" => config.num_warmup = value.parse().unwrap_or(0),
            "save_warmup" => config.save_warmup = matches!(value, "1" | "true"),
            _ => {}
        }
    }
    config
}

fn malformed(msg: String) -> DiagnosticError {
    DiagnosticError::MalformedFitResult(msg)
}

/// Reads one chain from CmdStan CSV output.
pub fn read_stan_csv<R: Read>(mut reader: R) -> Result<Chain, DiagnosticError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let config = parse_comments(&text);

    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut sampler_index = [0usize; 6];
    for (slot, column) in sampler_index.iter_mut().zip(SAMPLER_COLUMNS.iter()) {
        *slot = headers
            .iter()
            .position(|h| h == *column)
            .ok_or_else(|| malformed(format!("missing sampler column {}", column)))?;
    }
    let param_index: Vec<usize> = (0..headers.len())
        .filter(|i| !sampler_index.contains(i))
        .collect();
    let parameter_names: Vec<String> = param_index
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows = Vec::new();
    let mut metadata = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |i: usize| -> Result<f64, DiagnosticError> {
            let raw = record.get(i).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                malformed(format!(
                    "row {}: column {} is not numeric ({:?})",
                    line, &headers[i], raw
                ))
            })
        };
        let count = |i: usize| -> Result<u32, DiagnosticError> {
            let raw = record.get(i).unwrap_or("");
            raw.parse::<u32>().map_err(|_| {
                malformed(format!(
                    "row {}: column {} is not a non-negative integer ({:?})",
                    line, &headers[i], raw
                ))
            })
        };
        let divergent = match count(sampler_index[4])? {
            0 => false,
            1 => true,
            other => {
                return Err(malformed(format!(
                    "row {}: divergent__ must be 0 or 1, got {}",
                    line, other
                )))
            }
        };
        let values = param_index
            .iter()
            .map(|&i| field(i))
            .collect::<Result<Vec<f64>, _>>()?;
        metadata.push(IterationMetadata {
            accept_stat: field(sampler_index[0])?,
            stepsize: field(sampler_index[1])?,
            treedepth: count(sampler_index[2])?,
            n_leapfrog: count(sampler_index[3])?,
            divergent,
            energy: field(sampler_index[5])?,
            elapsed_time: 0.0,
        });
        rows.push(values);
    }

    let warmup_rows = if config.save_warmup {
        config.num_warmup.min(rows.len())
    } else {
        0
    };
    let sampling_rows = rows.split_off(warmup_rows);
    let metadata = metadata.split_off(warmup_rows);
    let metadata = match config.sampling_seconds {
        Some(seconds) if !metadata.is_empty() => {
            let per_iteration = seconds / metadata.len() as f64;
            metadata
                .into_iter()
                .map(|m| IterationMetadata {
                    elapsed_time: per_iteration,
                    ..m
                })
                .collect()
        }
        _ => metadata,
    };
    debug!(
        parameters = parameter_names.len(),
        warmup = warmup_rows,
        sampling = sampling_rows.len(),
        "read CmdStan chain"
    );

    let num_params = parameter_names.len();
    let warmup = rows_to_array(rows, num_params)?;
    let sampling = rows_to_array(sampling_rows, num_params)?;
    Chain::new(parameter_names, warmup, sampling, metadata)
}

/// Reads one chain from a CmdStan CSV file.
pub fn read_stan_csv_file<P: AsRef<Path>>(path: P) -> Result<Chain, DiagnosticError> {
    read_stan_csv(File::open(path)?)
}

/// Reads one file per chain, in order, into a validated fit.
pub fn read_stan_csv_files<P: AsRef<Path>>(paths: &[P]) -> Result<FitResult, DiagnosticError> {
    let chains = paths
        .iter()
        .map(read_stan_csv_file)
        .collect::<Result<Vec<_>, _>>()?;
    FitResult::new(chains)
}
