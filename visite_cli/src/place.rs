use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use tracing::info;
use visite_geo::{
    MapSession, config::EngineConfig, headless_map::HeadlessMap, map_provider::MapProvider,
    placement::PlacementOptions,
};

use crate::file_utils::{json_files, read_records};

#[derive(Args)]
pub struct PlaceArgs {
    /// A records file, or a folder of them
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Keep records located at (0, 0)
    #[arg(long)]
    listing: bool,
}

pub fn create_session(config: &EngineConfig, listing: bool) -> MapSession<HeadlessMap> {
    let mut options = config.session_options();
    if listing {
        options.placement = PlacementOptions {
            max_zoom: options.placement.max_zoom,
            ..PlacementOptions::listing()
        };
    }

    let map = HeadlessMap::new(config.viewport, visite_geo::GeoPoint::new(0.0, 0.0), 2.0);
    MapSession::new(map, options)
}

/// Delivers the events the headless map queued, like a browser event loop.
pub fn settle(session: &mut MapSession<HeadlessMap>) {
    for event in session.map_mut().drain_events() {
        session.handle_event(&event);
    }
}

pub fn run(args: PlaceArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let paths = json_files(&args.input)?;

    let mut table = Table::new();
    table.set_header(vec!["File", "Placed", "Excluded", "Center", "Zoom"]);

    for path in &paths {
        let records = read_records(path)?;
        let mut session = create_session(config, args.listing);

        let summary = session.place_markers(records);
        settle(&mut session);

        let map = session.map();
        table.add_row(vec![
            path.display().to_string(),
            summary.placed.to_string(),
            summary.excluded.to_string(),
            format!(
                "{:.5}, {:.5}",
                map.center().latitude,
                map.center().longitude
            ),
            map.zoom().to_string(),
        ]);
    }

    info!("Placed {} files", paths.len());
    println!("{table}");

    Ok(())
}
