use serde::Serialize;
use serde_json::Value;

use crate::marker::Payload;

const TITLE_FIELDS: [&str; 3] = ["name", "title", "id"];

/// What an info window shows for one marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoContent {
    pub title: Option<String>,
    pub status: Option<String>,
    pub images: Vec<String>,
    pub metadata: Vec<(String, String)>,
}

impl InfoContent {
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        if let Some(status) = &self.status {
            lines.push(format!("Status: {}", status));
        }
        for (key, value) in &self.metadata {
            lines.push(format!("{}: {}", key, value));
        }
        for image in &self.images {
            lines.push(format!("[image] {}", image));
        }

        lines.join("\n")
    }
}

/// Display fields a marker payload exposes to the map.
pub trait MarkerPayload {
    fn title(&self) -> Option<String>;

    fn info_content(&self) -> InfoContent;
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(image) => image
            .get("url")
            .or_else(|| image.get("path"))
            .and_then(scalar_to_string),
        _ => None,
    }
}

impl MarkerPayload for Payload {
    fn title(&self) -> Option<String> {
        TITLE_FIELDS
            .iter()
            .find_map(|field| self.get(*field).and_then(scalar_to_string))
    }

    fn info_content(&self) -> InfoContent {
        let title = self.title();
        let title_field = TITLE_FIELDS
            .iter()
            .find(|field| self.get(**field).and_then(scalar_to_string).is_some());

        let images = match self.get("images") {
            Some(Value::Array(images)) => images.iter().filter_map(image_url).collect(),
            Some(value) => image_url(value).into_iter().collect(),
            None => vec![],
        };

        let metadata = self
            .iter()
            .filter(|(key, _)| {
                Some(&key.as_str()) != title_field && *key != "status" && *key != "images"
            })
            .filter_map(|(key, value)| scalar_to_string(value).map(|value| (key.clone(), value)))
            .collect();

        InfoContent {
            title,
            status: self.get("status").and_then(scalar_to_string),
            images,
            metadata,
        }
    }
}

impl MarkerPayload for () {
    fn title(&self) -> Option<String> {
        None
    }

    fn info_content(&self) -> InfoContent {
        InfoContent::default()
    }
}
