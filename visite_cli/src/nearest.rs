use std::{path::PathBuf, time::Duration};

use clap::Args;
use tracing::{info, warn};
use visite_geo::{
    GeoPoint, MarkerIdx,
    config::EngineConfig,
    info::MarkerPayload,
    reference::{FixedGeolocator, ReferenceLocator},
    session::LinkMode,
};

use crate::{
    file_utils::read_records,
    parsers,
    place::{create_session, settle},
};

#[derive(Args)]
pub struct NearestArgs {
    /// A records file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Index of the marker to select, among the placed markers
    #[arg(short, long, default_value_t = 0)]
    marker: usize,

    /// Link to this device location ("lat,lng") instead of the nearest marker
    #[arg(long, value_parser = parsers::parse_point)]
    from: Option<GeoPoint>,

    /// How long to wait for the device location (e.g. "5s", "PT10S")
    #[arg(long, value_parser = parsers::parse_duration)]
    geolocation_timeout: Option<Duration>,

    /// Keep records located at (0, 0)
    #[arg(long)]
    listing: bool,
}

pub async fn run(args: NearestArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let mut session = create_session(config, args.listing);
    let summary = session.place_markers(read_records(&args.input)?);
    settle(&mut session);

    info!(
        "Placed {} markers ({} excluded)",
        summary.placed, summary.excluded
    );

    if let Some(device) = args.from {
        let timeout = args
            .geolocation_timeout
            .unwrap_or_else(|| config.geolocation_timeout());
        let mut locator = ReferenceLocator::new(FixedGeolocator(device), timeout);

        match locator.locate_once().await {
            Ok(position) => {
                session.set_reference_point(Some(position));
                session.set_link_mode(LinkMode::ReferencePoint);
            }
            Err(err) => warn!("Device location unavailable: {}", err),
        }
    }

    let selection = session.select_marker(MarkerIdx::new(args.marker))?;

    if let Some(marker) = session.marker(selection.marker) {
        println!("{}", marker.payload().info_content().render());
    }

    match selection.line {
        Some(line) => println!(
            "{} ({:.5}, {:.5}) -> ({:.5}, {:.5}), label at ({:.5}, {:.5})",
            line.text,
            line.from.latitude,
            line.from.longitude,
            line.to.latitude,
            line.to.longitude,
            line.anchor.latitude,
            line.anchor.longitude,
        ),
        None => println!("No distance line"),
    }

    Ok(())
}
