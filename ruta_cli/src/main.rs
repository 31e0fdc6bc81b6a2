use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{optimize::OptimizeArgs, replay::ReplayArgs};

mod config;
mod file_utils;
mod optimize;
mod parsers;
mod replay;
mod route_source;
mod schema;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Computes a route over GPX tracks and prints it as JSON
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },

    /// Follows a route with the positions of a second track
    Replay {
        #[command(flatten)]
        args: ReplayArgs,
    },

    /// Prints the JSON schemas of the configuration and outputs
    Schema,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Optimize { args } => optimize::run(args).await?,
        Commands::Replay { args } => replay::run(args).await?,
        Commands::Schema => println!("{}", schema::generate_json_schemas()?),
    }

    Ok(())
}
