use std::path::PathBuf;

use clap::{Args, ValueEnum};
use ruta_routing::{import::RouteKind, routing::Termination};

use crate::{
    config::load_config,
    parsers,
    route_source::{ProviderArg, import_route},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// From the first recorded point to the last one
    Shortest,

    /// Every waypoint, starting at the first recorded point
    Tour,
}

impl From<ModeArg> for RouteKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Shortest => RouteKind::ShortestPath,
            ModeArg::Tour => RouteKind::Tour,
        }
    }
}

/// Options shared by the commands computing a route.
#[derive(Args)]
pub struct RouteArgs {
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "crow")]
    pub provider: ProviderArg,

    /// Wall-clock cap on the tour improvement (e.g., "2s", "PT1M"), tours may then differ
    /// between runs
    #[arg(short, long, value_parser = parsers::parse_duration)]
    pub timeout: Option<jiff::SignedDuration>,

    /// Maximum number of tour improvement passes
    #[arg(long, short = 'n')]
    pub iterations: Option<usize>,
}

impl RouteArgs {
    /// Configuration file overridden by the command line.
    pub fn load_config(&self) -> anyhow::Result<crate::config::RutaConfig> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(mode) = self.mode {
            config.import.kind = mode.into();
        }

        let termination = &mut config.import.optimizer.termination;
        if let Some(iterations) = self.iterations {
            termination.retain(|budget| !matches!(budget, Termination::Iterations(_)));
            termination.push(Termination::Iterations(iterations));
        }
        if let Some(timeout) = self.timeout {
            termination.retain(|budget| !matches!(budget, Termination::Duration(_)));
            termination.push(Termination::Duration(timeout));
        }

        Ok(config)
    }
}

#[derive(Args)]
pub struct OptimizeArgs {
    /// GPX files or folders of GPX files, one track each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    route: RouteArgs,
}

pub async fn run(args: OptimizeArgs) -> anyhow::Result<()> {
    let config = args.route.load_config()?;
    let imported = import_route(
        &args.files,
        &config.import,
        args.route.provider,
        config.osrm_profile,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&imported.route)?);

    Ok(())
}
