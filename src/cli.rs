//! Command line surface of the host.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "mesh-host")]
#[command(about = "Runs every registered mesh service in one process", long_about = None, version)]
pub struct Cli {
    /// Configuration file (TOML). Optional.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override a configuration key, e.g. `--set logging.level=debug`.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
