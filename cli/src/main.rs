//! `mixmax` - print random numbers from a MIXMAX stream
//!
//! ```text
//! mixmax [--n 240] [--special S] [--ids C,M,R,S] [--count 10] [--int]
//!        [--config stream.json] [--load state.txt] [--save state.txt] [--branch]
//! ```
//!
//! Floats are printed one per line with 18 decimals. With `--load`, the
//! stream continues from a saved state instead of being seeded; `--save`
//! writes the state reached after drawing. State files do not record the
//! special parameter, so loading an N=256 state needs `--special` (or a
//! config file that sets it).

use mixmax_core_rs::{
    AnyMixmax, ConfigError, MixmaxVariant, StateError, StreamConfig, StreamError, StreamIds,
};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use thiserror::Error;

const USAGE: &str = "usage: mixmax [--n N] [--special S] [--ids C,M,R,S] [--count K] [--int] \
[--config FILE.json] [--load FILE] [--save FILE] [--branch]
  --load with N=256 also requires --special (-1 or 487013230256099064)";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}\n{}", USAGE)]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("{path}: {source}")]
    State { path: String, source: StateError },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Default)]
struct Options {
    n: Option<usize>,
    special: Option<i64>,
    ids: Option<StreamIds>,
    count: usize,
    integers: bool,
    config: Option<String>,
    load: Option<String>,
    save: Option<String>,
    branch: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::Usage(format!("invalid value '{}' for {}", value, flag)))
}

fn parse_ids(value: &str) -> Result<StreamIds, CliError> {
    let parts = value
        .split(',')
        .map(|part| parse_number::<u32>("--ids", part.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        &[cluster, machine, run, stream] => Ok(StreamIds::new(cluster, machine, run, stream)),
        _ => Err(CliError::Usage(format!(
            "--ids expects four comma-separated values, got '{}'",
            value
        ))),
    }
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Options, CliError> {
    let mut options = Options {
        count: 10,
        ..Options::default()
    };
    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| CliError::Usage(format!("{} needs a value", flag)))
        };
        match flag.as_str() {
            "--n" => options.n = Some(parse_number("--n", &value()?)?),
            "--special" => options.special = Some(parse_number("--special", &value()?)?),
            "--ids" => options.ids = Some(parse_ids(&value()?)?),
            "--count" => options.count = parse_number("--count", &value()?)?,
            "--config" => options.config = Some(value()?),
            "--load" => options.load = Some(value()?),
            "--save" => options.save = Some(value()?),
            "--int" => options.integers = true,
            "--branch" => options.branch = true,
            "--help" | "-h" => return Err(CliError::Usage("help requested".to_string())),
            other => return Err(CliError::Usage(format!("unknown argument '{}'", other))),
        }
    }
    Ok(options)
}

/// Resolve the stream definition: config file first, command line on top.
fn stream_config(options: &Options) -> Result<StreamConfig, CliError> {
    let mut config = match &options.config {
        Some(path) => StreamConfig::from_json(&fs::read_to_string(path)?)?,
        None => StreamConfig::default(),
    };
    if let Some(n) = options.n {
        config.n = n;
    }
    if options.special.is_some() {
        config.special = options.special;
    }
    if let Some(ids) = options.ids {
        config.ids = ids;
    }
    Ok(config)
}

/// True when several parameter sets share dimension `n`
fn needs_special(n: usize) -> bool {
    MixmaxVariant::ALL
        .iter()
        .filter(|variant| variant.dimension() == n)
        .count()
        > 1
}

fn run(options: Options) -> Result<(), CliError> {
    let config = stream_config(&options)?;
    let variant: MixmaxVariant = config.variant()?;

    let mut rng = match &options.load {
        Some(_) if config.special.is_none() && needs_special(config.n) => {
            return Err(CliError::Usage(format!(
                "--load with N={} needs --special to pick the generator",
                config.n
            )));
        }
        Some(path) => {
            let text = fs::read_to_string(path)?;
            AnyMixmax::from_state_str(variant, &text).map_err(|source| CliError::State {
                path: path.clone(),
                source,
            })?
        }
        None => AnyMixmax::from_config(&config)?,
    };

    if std::env::var("MIXMAX_DEBUG").is_ok() {
        eprintln!(
            "[MIXMAX DEBUG] {} ids={:?} fingerprint={}",
            variant,
            config.ids,
            rng.fingerprint()
        );
    }

    if options.branch {
        rng = rng.branch();
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if options.integers {
        for _ in 0..options.count {
            writeln!(out, "{}", rng.next_value())?;
        }
    } else {
        let mut buffer = vec![0.0f64; options.count];
        rng.fill_floats(&mut buffer);
        for u in buffer {
            writeln!(out, "{:.18}", u)?;
        }
    }
    out.flush()?;

    if let Some(path) = &options.save {
        fs::write(path, rng.to_state_string())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mixmax: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_args(args(&[])).unwrap();
        assert_eq!(options.count, 10);
        assert!(!options.integers);
        let config = stream_config(&options).unwrap();
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn test_parse_ids_and_dimension() {
        let options = parse_args(args(&["--n", "17", "--ids", "1,2,3,4", "--int"])).unwrap();
        let config = stream_config(&options).unwrap();
        assert_eq!(config.n, 17);
        assert_eq!(config.ids, StreamIds::new(1, 2, 3, 4));
        assert!(options.integers);
    }

    #[test]
    fn test_parse_rejects_short_ids() {
        let err = parse_args(args(&["--ids", "1,2"])).unwrap_err();
        assert!(matches!(err, CliError::Usage(msg) if msg.contains("four")));
    }

    #[test]
    fn test_parse_rejects_missing_value() {
        let err = parse_args(args(&["--count"])).unwrap_err();
        assert!(matches!(err, CliError::Usage(msg) if msg.contains("needs a value")));
    }

    #[test]
    fn test_load_n256_requires_special() {
        let options = parse_args(args(&["--n", "256", "--load", "state.txt"])).unwrap();
        let err = run(options).unwrap_err();
        assert!(matches!(err, CliError::Usage(msg) if msg.contains("--special")));
    }

    #[test]
    fn test_load_with_special_reaches_file() {
        let options = parse_args(args(&[
            "--n",
            "256",
            "--special",
            "487013230256099064",
            "--load",
            "/nonexistent/mixmax-state.txt",
        ]))
        .unwrap();
        let err = run(options).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_only_n256_is_ambiguous() {
        assert!(needs_special(256));
        assert!(!needs_special(17));
        assert!(!needs_special(240));
    }

    #[test]
    fn test_unsupported_dimension() {
        let options = parse_args(args(&["--n", "64"])).unwrap();
        let err = run(options).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::UnsupportedDimension(64))));
    }
}
