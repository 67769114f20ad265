use std::sync::Arc;

use clap::Args;
use comfy_table::Table;
use tracing::{info, warn};
use visite_geo::{
    client::{RecordEndpoint, RecordServiceClient, RecordServiceParams},
    config::EngineConfig,
    fetch::fetch_tagged,
    map_provider::MapProvider,
};

use crate::place::{create_session, settle};

#[derive(Args)]
pub struct FetchArgs {
    /// Collections to fetch concurrently, e.g. "/sales" "/pharmacies"
    #[arg(required = true)]
    paths: Vec<String>,

    /// Base URL of the record service (defaults to VISITE_API_URL)
    #[arg(long)]
    url: Option<String>,

    /// Keep records located at (0, 0)
    #[arg(long)]
    listing: bool,
}

pub async fn run(args: FetchArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let base_url = args
        .url
        .or_else(|| config.api_url.clone())
        .ok_or_else(|| anyhow::anyhow!("No record service URL, set --url or VISITE_API_URL"))?;

    let client = Arc::new(RecordServiceClient::new(RecordServiceParams {
        base_url,
        token: config.api_token.clone(),
    }));
    let endpoints: Vec<RecordEndpoint> = args
        .paths
        .iter()
        .map(|path| RecordEndpoint::new(Arc::clone(&client), path.as_str()))
        .collect();

    let mut session = create_session(config, args.listing);
    let generation = session.begin_refresh();
    let fetched = fetch_tagged(generation, &endpoints).await?;

    let Some(summary) = session.apply_fetched(fetched) else {
        warn!("Data set changed while fetching, nothing placed");
        return Ok(());
    };
    settle(&mut session);

    info!(
        "Fetched {} collections for {}",
        endpoints.len(),
        summary.generation
    );

    let map = session.map();
    let mut table = Table::new();
    table.set_header(vec!["Placed", "Excluded", "Center", "Zoom"]);
    table.add_row(vec![
        summary.placed.to_string(),
        summary.excluded.to_string(),
        format!(
            "{:.5}, {:.5}",
            map.center().latitude,
            map.center().longitude
        ),
        map.zoom().to_string(),
    ]);
    println!("{table}");

    Ok(())
}
