//! The command line driver: read a structure, mesh it, map its charges and refine
mod configuration;
mod error;
mod refinement;
mod telemetry;

pub(crate) use configuration::{Configuration, MeshConfiguration, RefinementConfiguration};
pub(crate) use error::FemError;

use crate::{atoms::AtomicStructure, csm::LocatorKind};
use clap::{ArgEnum, Parser};
use color_eyre::eyre::eyre;
use nalgebra::RealField;
use num_traits::ToPrimitive;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// The structure file listing the atoms to map
    file_path: Option<PathBuf>,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    /// Overrides the point location strategy set in the configuration
    #[clap(arg_enum, long)]
    locator: Option<LocatorKind>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
enum LogLevel {
    Trace,
    Info,
    Debug,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Entry point for the binary
pub fn run<T>() -> color_eyre::Result<()>
where
    T: Copy + DeserializeOwned + RealField + ToPrimitive + Send + Sync,
{
    let cli = App::parse();

    let (subscriber, _guard) = telemetry::get_subscriber(cli.log_level);
    telemetry::init_subscriber(subscriber)?;

    let mut config: Configuration<T> = Configuration::build()?;
    if let Some(locator) = cli.locator {
        config.map.locator = locator;
    }
    config.validate().map_err(FemError::from)?;

    let path = cli
        .file_path
        .ok_or(eyre!("A structure file path needs to be passed."))?;
    let atoms: AtomicStructure<T> = AtomicStructure::build(path)?;
    tracing::info!(
        "Read {} atoms with net charge {}",
        atoms.len(),
        atoms.net_charge()
    );

    let outcome = refinement::map_charges(&config, &atoms)?;
    tracing::info!(
        "Finished after {} refinement passes: {}",
        outcome.updates.len(),
        outcome.statistics
    );
    Ok(())
}
