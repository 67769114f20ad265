use std::{future::Future, time::Duration};

use serde_json::{Value, json};

use crate::{
    error::GeoError,
    fetch::RecordSource,
    headless_map::HeadlessMap,
    marker::{MarkerRecord, Payload},
    session::{MapSession, SessionOptions},
};

pub fn raw_record(id: u64, latitude: Value, longitude: Value) -> MarkerRecord {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Record {}", id),
        "latitude": latitude,
        "longitude": longitude,
    }))
    .unwrap()
}

pub fn record(id: u64, latitude: f64, longitude: f64) -> MarkerRecord {
    let mut payload = Payload::new();
    payload.insert("id".to_string(), json!(id));
    payload.insert("name".to_string(), json!(format!("Record {}", id)));

    MarkerRecord::new(latitude, longitude, payload)
}

pub fn create_test_session(options: SessionOptions) -> MapSession<HeadlessMap> {
    MapSession::new(HeadlessMap::default(), options)
}

pub struct StaticSource {
    result: Result<Vec<MarkerRecord>, GeoError>,
    delay: Option<Duration>,
}

impl StaticSource {
    pub fn ok(records: Vec<MarkerRecord>) -> Self {
        Self {
            result: Ok(records),
            delay: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(GeoError::UpstreamFetchFailure(message.to_string())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl RecordSource for StaticSource {
    type Payload = Payload;

    fn fetch_records(
        &self,
    ) -> impl Future<Output = Result<Vec<MarkerRecord>, GeoError>> + Send {
        let result = self.result.clone();
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}
