//! Recombines edited alerts with the untouched remainder of a feed.

use chrono::Utc;

use crate::model::{Entity, EntityKind, Feed, FeedHeader, FeedSummary};

/// Builds the feed to re-encode after an edit session.
///
/// Vehicles and trip updates are carried over from the original feed
/// unedited; the original alert entities are superseded by `alerts`. The
/// result is ordered `[vehicles…, trip updates…, alerts…]` regardless of
/// the original interleaving, and the header timestamp is set to now.
pub fn assemble(original: &Feed, alerts: Vec<Entity>) -> Feed {
    assemble_at(original, alerts, Utc::now().timestamp().max(0) as u64)
}

/// Deterministic variant of [`assemble`]; `now` becomes the new header
/// timestamp.
pub fn assemble_at(original: &Feed, alerts: Vec<Entity>, now: u64) -> Feed {
    let mut vehicles = Vec::new();
    let mut trip_updates = Vec::new();
    for entity in &original.entities {
        match entity.kind() {
            Some(EntityKind::Vehicle) => vehicles.push(entity.clone()),
            Some(EntityKind::TripUpdate) => trip_updates.push(entity.clone()),
            // Original alerts are replaced wholesale; entities with no
            // payload are dropped.
            Some(EntityKind::Alert) | None => {}
        }
    }

    let summary = FeedSummary {
        vehicles: vehicles.len(),
        trip_updates: trip_updates.len(),
        alerts: alerts.len(),
    };

    let mut entities = vehicles;
    entities.append(&mut trip_updates);
    entities.extend(alerts);

    Feed {
        header: FeedHeader {
            timestamp: Some(now),
            ..original.header.clone()
        },
        summary,
        entities,
    }
}
