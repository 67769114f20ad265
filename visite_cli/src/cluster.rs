use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use serde_json::Value;
use visite_geo::{
    GeoPoint, MarkerRecord,
    cluster::{Cluster, DEFAULT_CLUSTER_RADIUS_PX, cluster_markers},
    config::EngineConfig,
};

use crate::file_utils::read_records;

#[derive(Args)]
pub struct ClusterArgs {
    /// A records file
    #[arg(short = 'i', long)]
    input: PathBuf,

    #[arg(short, long, default_value_t = 10.0)]
    zoom: f64,

    /// Grouping radius in pixels
    #[arg(short, long, default_value_t = DEFAULT_CLUSTER_RADIUS_PX)]
    radius: f64,

    /// Keep records located at (0, 0)
    #[arg(long)]
    listing: bool,
}

/// Records with a usable position, with their index in the file.
fn locate_records(
    records: &[MarkerRecord],
    exclude_zero_coordinate: bool,
) -> Vec<(usize, GeoPoint)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record
                .position(exclude_zero_coordinate)
                .ok()
                .map(|position| (index, position))
        })
        .collect()
}

/// The record `id`, or its position in the file when it has none.
fn record_label(record: &MarkerRecord, index: usize) -> String {
    match record.payload.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => format!("#{}", index),
        Some(id) => id.to_string(),
    }
}

fn member_labels(
    cluster: &Cluster,
    records: &[MarkerRecord],
    located: &[(usize, GeoPoint)],
) -> String {
    cluster
        .members
        .iter()
        .map(|member| {
            let (index, _) = located[member.get()];
            record_label(&records[index], index)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run(args: ClusterArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let records = read_records(&args.input)?;
    let located = locate_records(&records, config.exclude_zero_coordinate && !args.listing);
    let points: Vec<GeoPoint> = located.iter().map(|(_, position)| *position).collect();

    let clusters = cluster_markers(&points, args.zoom, args.radius);

    let mut table = Table::new();
    table.set_header(vec!["Cluster", "Size", "Center", "Members"]);

    for (i, cluster) in clusters.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            cluster.label(),
            format!(
                "{:.5}, {:.5}",
                cluster.center.latitude, cluster.center.longitude
            ),
            member_labels(cluster, &records, &located),
        ]);
    }

    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn sales() -> Vec<MarkerRecord> {
        let path = env::current_dir()
            .unwrap()
            .join("tests/fixtures/records/oran/sales.json");
        read_records(&path).unwrap()
    }

    #[test]
    fn test_zero_pair_follows_exclusion_flag() {
        let records = sales();

        assert_eq!(locate_records(&records, true).len(), 2);
        assert_eq!(locate_records(&records, false).len(), 3);
    }

    #[test]
    fn test_members_are_labelled_with_record_ids() {
        let records = sales();
        let located = locate_records(&records, true);
        let points: Vec<GeoPoint> = located.iter().map(|(_, position)| *position).collect();

        let clusters = cluster_markers(&points, 0.0, DEFAULT_CLUSTER_RADIUS_PX);
        assert_eq!(clusters.len(), 1);

        assert_eq!(member_labels(&clusters[0], &records, &located), "10 12");
    }

    #[test]
    fn test_record_without_id_is_labelled_by_position() {
        let record: MarkerRecord =
            serde_json::from_value(serde_json::json!({ "latitude": 1.0, "longitude": 2.0 }))
                .unwrap();

        assert_eq!(record_label(&record, 7), "#7");
    }
}
