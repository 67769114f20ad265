use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::debug;

use crate::{
    cluster::ClusterArgs, fetch::FetchArgs, generate::GenerateSubcommands,
    nearest::NearestArgs, place::PlaceArgs,
};

mod cluster;
mod fetch;
mod file_utils;
mod generate;
mod nearest;
mod parsers;
mod place;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points
    #[command(visible_alias = "d", allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,

        /// Reject coordinates outside of [-90, 90] / [-180, 180]
        #[arg(long)]
        strict: bool,
    },
    /// Place the records of a file or folder on a headless map
    Place {
        #[command(flatten)]
        args: PlaceArgs,
    },
    /// Select a marker and print the distance line it gets
    Nearest {
        #[command(flatten)]
        args: NearestArgs,
    },
    /// Group the records that overlap at a zoom level
    Cluster {
        #[command(flatten)]
        args: ClusterArgs,
    },
    /// Fetch records from the record service and place them
    Fetch {
        #[command(flatten)]
        args: FetchArgs,
    },
    #[command(visible_alias = "g")]
    Generate {
        #[command(subcommand)]
        commands: GenerateSubcommands,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = file_utils::load_config(cli.config.as_deref())?;
    debug!("Engine config: {:?}", config);

    match cli.command {
        Some(Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
            strict,
        }) => {
            let label = if strict {
                visite_geo::distance::checked_distance(lat1, lon1, lat2, lon2)?
            } else {
                visite_geo::distance(lat1, lon1, lat2, lon2)
            };
            println!("{}", label);
        }
        Some(Commands::Place { args }) => place::run(args, &config)?,
        Some(Commands::Nearest { args }) => nearest::run(args, &config).await?,
        Some(Commands::Cluster { args }) => cluster::run(args, &config)?,
        Some(Commands::Fetch { args }) => fetch::run(args, &config).await?,
        Some(Commands::Generate { commands }) => generate::run(commands)?,
        None => {
            // Handle no command provided
        }
    }

    Ok(())
}
