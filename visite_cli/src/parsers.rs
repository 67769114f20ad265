use std::time::Duration;

use jiff::SpanRelativeTo;

/// Parses "10s", "PT1M", "1m 30s" or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let signed = if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        duration
    } else if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        duration
    } else if let Ok(seconds) = input.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    } else {
        return Err(String::from("Invalid duration"));
    };

    Duration::try_from(signed).map_err(|_| String::from("Duration must not be negative"))
}

/// Parses a "latitude,longitude" pair.
pub fn parse_point(input: &str) -> Result<visite_geo::GeoPoint, String> {
    let (latitude, longitude) = input
        .split_once(',')
        .ok_or_else(|| String::from("Expected latitude,longitude"))?;

    let latitude = latitude
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("Invalid latitude: {}", err))?;
    let longitude = longitude
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("Invalid longitude: {}", err))?;

    Ok(visite_geo::GeoPoint::new(latitude, longitude))
}
