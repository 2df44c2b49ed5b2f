//! Inspection records: what `inspect` learned about a feed, appended to a
//! CSV log or printed as JSON.

use anyhow::Result;
use tracing::{debug, info};

use crate::cluster::LatLon;
use crate::model::Feed;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;

/// One row of the inspection log.
#[derive(Debug, Default, Serialize)]
pub struct InspectRecord {
    pub captured_at: DateTime<Utc>,
    pub source: String,
    pub gtfs_version: String,
    pub feed_timestamp: Option<u64>,
    pub entities: usize,
    pub vehicles: usize,
    pub trip_updates: usize,
    pub alerts: usize,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub region: Option<String>,
}

impl InspectRecord {
    pub fn from_feed(source: &str, feed: &Feed) -> Self {
        InspectRecord {
            captured_at: Utc::now(),
            source: source.to_string(),
            gtfs_version: feed.header.gtfs_version.clone(),
            feed_timestamp: feed.header.timestamp,
            entities: feed.entities.len(),
            vehicles: feed.summary.vehicles,
            trip_updates: feed.summary.trip_updates,
            alerts: feed.summary.alerts,
            center_lat: None,
            center_lon: None,
            region: None,
        }
    }

    pub fn with_center(mut self, center: Option<LatLon>) -> Self {
        self.center_lat = center.map(|c| c.lat);
        self.center_lon = center.map(|c| c.lon);
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// Logs an inspection record as pretty-printed JSON.
pub fn print_json(record: &InspectRecord) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// Appends an [`InspectRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &InspectRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
