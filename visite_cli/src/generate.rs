use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde_json::json;

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaKind {
    Records,
    Config,
}

#[derive(Subcommand)]
pub enum GenerateSubcommands {
    JsonSchema {
        /// Output file
        #[arg(long, short = 'o')]
        out: PathBuf,

        #[arg(long, short = 'k', value_enum, default_value_t = SchemaKind::Records)]
        kind: SchemaKind,
    },
    /// Random records around a point, with some unusable positions mixed in
    Records {
        #[arg(long, short = 'o')]
        out: PathBuf,

        #[arg(long, short = 'n', default_value_t = 100)]
        count: usize,

        #[arg(long, default_value_t = 36.75)]
        latitude: f64,

        #[arg(long, default_value_t = 3.06, allow_negative_numbers = true)]
        longitude: f64,

        /// Spread around the center, in degrees
        #[arg(long, default_value_t = 0.5)]
        spread: f64,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn write_output(out: &Path, content: &str) -> Result<(), anyhow::Error> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(out, content)?;
    Ok(())
}

pub fn random_records(
    count: usize,
    latitude: f64,
    longitude: f64,
    spread: f64,
    seed: u64,
) -> Vec<serde_json::Value> {
    let mut rng = SmallRng::seed_from_u64(seed);

    (0..count)
        .map(|id| {
            let (lat, lng) = match rng.random_range(0..20) {
                0 => (json!(null), json!(null)),
                1 => (json!(0), json!(0)),
                _ => (
                    json!(latitude + rng.random_range(-spread..=spread)),
                    json!(longitude + rng.random_range(-spread..=spread)),
                ),
            };

            let status = if rng.random_bool(0.5) {
                "visited"
            } else {
                "pending"
            };

            json!({
                "id": id + 1,
                "name": format!("Point {}", id + 1),
                "status": status,
                "latitude": lat,
                "longitude": lng,
            })
        })
        .collect()
}

pub fn run(subcommand: GenerateSubcommands) -> Result<(), anyhow::Error> {
    match subcommand {
        GenerateSubcommands::JsonSchema { out, kind } => {
            let schema = match kind {
                SchemaKind::Records => visite_geo::schema::generate_records_schema()?,
                SchemaKind::Config => visite_geo::schema::generate_config_schema()?,
            };

            write_output(&out, &schema)?;
        }
        GenerateSubcommands::Records {
            out,
            count,
            latitude,
            longitude,
            spread,
            seed,
        } => {
            let records = random_records(count, latitude, longitude, spread, seed);
            write_output(&out, &serde_json::to_string_pretty(&records)?)?;
        }
    }

    Ok(())
}
