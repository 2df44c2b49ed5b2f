//! Codec between raw protobuf bytes and the in-memory [`Feed`] model.
//!
//! Decode is strict about structure (a malformed buffer is surfaced, never
//! partially decoded) and lenient about values: enum fields keep whatever
//! integer was on the wire. Encode never fails for a structurally valid
//! feed and produces a buffer that decodes back to an equal feed.

use prost::Message;
use thiserror::Error;

use crate::gtfs_rt;
use crate::model::{
    Alert, Entity, Feed, FeedHeader, FeedSummary, Position, Scope, StopTimeEvent, StopTimeUpdate,
    TimeRange, TranslatedText, Translation, TripDescriptor, TripUpdate, Vehicle, VehicleDescriptor,
};

#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer is not a well-formed `FeedMessage`: truncated, bad varint,
    /// or an invalid tag/wire type.
    #[error("malformed GTFS-RT buffer: {0}")]
    Malformed(#[from] prost::DecodeError),
}

/// Decodes a protobuf-encoded GTFS-RT feed into a fresh [`Feed`].
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if the bytes are not valid protobuf
/// for the `FeedMessage` schema.
pub fn decode(bytes: &[u8]) -> Result<Feed, CodecError> {
    let message = gtfs_rt::FeedMessage::decode(bytes)?;
    Ok(feed_from_proto(message))
}

/// Encodes a [`Feed`] back to protobuf bytes.
pub fn encode(feed: &Feed) -> Vec<u8> {
    feed_to_proto(feed).encode_to_vec()
}

fn feed_from_proto(message: gtfs_rt::FeedMessage) -> Feed {
    let header = FeedHeader {
        gtfs_version: message.header.gtfs_realtime_version,
        incrementality: message.header.incrementality,
        timestamp: message.header.timestamp,
    };

    let entities: Vec<Entity> = message.entity.into_iter().map(entity_from_proto).collect();
    let summary = FeedSummary::from_entities(&entities);

    Feed {
        header,
        summary,
        entities,
    }
}

fn feed_to_proto(feed: &Feed) -> gtfs_rt::FeedMessage {
    let gtfs_realtime_version = if feed.header.gtfs_version.is_empty() {
        "2.0".to_string()
    } else {
        feed.header.gtfs_version.clone()
    };

    gtfs_rt::FeedMessage {
        header: gtfs_rt::FeedHeader {
            gtfs_realtime_version,
            incrementality: feed.header.incrementality,
            timestamp: feed.header.timestamp,
        },
        entity: feed.entities.iter().map(entity_to_proto).collect(),
    }
}

fn entity_from_proto(entity: gtfs_rt::FeedEntity) -> Entity {
    Entity {
        id: entity.id,
        is_deleted: entity.is_deleted,
        vehicle: entity.vehicle.map(vehicle_from_proto),
        trip_update: entity.trip_update.map(trip_update_from_proto),
        alert: entity.alert.map(alert_from_proto),
    }
}

fn entity_to_proto(entity: &Entity) -> gtfs_rt::FeedEntity {
    gtfs_rt::FeedEntity {
        id: entity.id.clone(),
        is_deleted: entity.is_deleted,
        trip_update: entity.trip_update.as_ref().map(trip_update_to_proto),
        vehicle: entity.vehicle.as_ref().map(vehicle_to_proto),
        alert: entity.alert.as_ref().map(alert_to_proto),
    }
}

fn vehicle_from_proto(vehicle: gtfs_rt::VehiclePosition) -> Vehicle {
    Vehicle {
        trip: vehicle.trip.map(trip_descriptor_from_proto),
        descriptor: vehicle.vehicle.map(vehicle_descriptor_from_proto),
        position: vehicle.position.map(position_from_proto),
        current_stop_sequence: vehicle.current_stop_sequence,
        stop_id: vehicle.stop_id,
        current_status: vehicle.current_status,
        timestamp: vehicle.timestamp,
        congestion_level: vehicle.congestion_level,
        occupancy_status: vehicle.occupancy_status,
    }
}

fn vehicle_to_proto(vehicle: &Vehicle) -> gtfs_rt::VehiclePosition {
    gtfs_rt::VehiclePosition {
        trip: vehicle.trip.as_ref().map(trip_descriptor_to_proto),
        vehicle: vehicle.descriptor.as_ref().map(vehicle_descriptor_to_proto),
        position: vehicle.position.as_ref().map(position_to_proto),
        current_stop_sequence: vehicle.current_stop_sequence,
        stop_id: vehicle.stop_id.clone(),
        current_status: vehicle.current_status,
        timestamp: vehicle.timestamp,
        congestion_level: vehicle.congestion_level,
        occupancy_status: vehicle.occupancy_status,
    }
}

fn position_from_proto(position: gtfs_rt::Position) -> Position {
    Position {
        latitude: f64::from(position.latitude),
        longitude: f64::from(position.longitude),
        bearing: position.bearing.map(f64::from),
        odometer: position.odometer,
        speed: position.speed.map(f64::from),
    }
}

fn position_to_proto(position: &Position) -> gtfs_rt::Position {
    gtfs_rt::Position {
        latitude: position.latitude as f32,
        longitude: position.longitude as f32,
        bearing: position.bearing.map(|b| b as f32),
        odometer: position.odometer,
        speed: position.speed.map(|s| s as f32),
    }
}

fn trip_update_from_proto(update: gtfs_rt::TripUpdate) -> TripUpdate {
    TripUpdate {
        trip: trip_descriptor_from_proto(update.trip),
        descriptor: update.vehicle.map(vehicle_descriptor_from_proto),
        stop_time_updates: update
            .stop_time_update
            .into_iter()
            .map(stop_time_update_from_proto)
            .collect(),
        timestamp: update.timestamp,
        delay: update.delay,
    }
}

fn trip_update_to_proto(update: &TripUpdate) -> gtfs_rt::TripUpdate {
    gtfs_rt::TripUpdate {
        trip: trip_descriptor_to_proto(&update.trip),
        vehicle: update.descriptor.as_ref().map(vehicle_descriptor_to_proto),
        stop_time_update: update
            .stop_time_updates
            .iter()
            .map(stop_time_update_to_proto)
            .collect(),
        timestamp: update.timestamp,
        delay: update.delay,
    }
}

fn stop_time_update_from_proto(update: gtfs_rt::trip_update::StopTimeUpdate) -> StopTimeUpdate {
    StopTimeUpdate {
        stop_sequence: update.stop_sequence,
        stop_id: update.stop_id,
        arrival: update.arrival.map(stop_time_event_from_proto),
        departure: update.departure.map(stop_time_event_from_proto),
        schedule_relationship: update.schedule_relationship,
    }
}

fn stop_time_update_to_proto(update: &StopTimeUpdate) -> gtfs_rt::trip_update::StopTimeUpdate {
    gtfs_rt::trip_update::StopTimeUpdate {
        stop_sequence: update.stop_sequence,
        stop_id: update.stop_id.clone(),
        arrival: update.arrival.as_ref().map(stop_time_event_to_proto),
        departure: update.departure.as_ref().map(stop_time_event_to_proto),
        schedule_relationship: update.schedule_relationship,
    }
}

fn stop_time_event_from_proto(event: gtfs_rt::trip_update::StopTimeEvent) -> StopTimeEvent {
    StopTimeEvent {
        delay: event.delay,
        time: event.time,
        uncertainty: event.uncertainty,
    }
}

fn stop_time_event_to_proto(event: &StopTimeEvent) -> gtfs_rt::trip_update::StopTimeEvent {
    gtfs_rt::trip_update::StopTimeEvent {
        delay: event.delay,
        time: event.time,
        uncertainty: event.uncertainty,
    }
}

fn alert_from_proto(alert: gtfs_rt::Alert) -> Alert {
    Alert {
        active_periods: alert
            .active_period
            .into_iter()
            .map(|range| TimeRange {
                start: range.start,
                end: range.end,
            })
            .collect(),
        informed_entities: alert.informed_entity.into_iter().map(scope_from_proto).collect(),
        cause: alert.cause,
        effect: alert.effect,
        severity_level: alert.severity_level,
        url: alert.url.map(translated_from_proto),
        header_text: alert.header_text.map(translated_from_proto),
        description_text: alert.description_text.map(translated_from_proto),
    }
}

fn alert_to_proto(alert: &Alert) -> gtfs_rt::Alert {
    gtfs_rt::Alert {
        active_period: alert
            .active_periods
            .iter()
            .map(|range| gtfs_rt::TimeRange {
                start: range.start,
                end: range.end,
            })
            .collect(),
        informed_entity: alert.informed_entities.iter().map(scope_to_proto).collect(),
        cause: alert.cause,
        effect: alert.effect,
        severity_level: alert.severity_level,
        url: alert.url.as_ref().map(translated_to_proto),
        header_text: alert.header_text.as_ref().map(translated_to_proto),
        description_text: alert.description_text.as_ref().map(translated_to_proto),
    }
}

fn scope_from_proto(selector: gtfs_rt::EntitySelector) -> Scope {
    Scope {
        agency_id: selector.agency_id,
        route_id: selector.route_id,
        route_type: selector.route_type,
        stop_id: selector.stop_id,
        trip: selector.trip.map(trip_descriptor_from_proto),
    }
}

fn scope_to_proto(scope: &Scope) -> gtfs_rt::EntitySelector {
    gtfs_rt::EntitySelector {
        agency_id: scope.agency_id.clone(),
        route_id: scope.route_id.clone(),
        route_type: scope.route_type,
        stop_id: scope.stop_id.clone(),
        trip: scope.trip.as_ref().map(trip_descriptor_to_proto),
    }
}

fn trip_descriptor_from_proto(trip: gtfs_rt::TripDescriptor) -> TripDescriptor {
    TripDescriptor {
        trip_id: trip.trip_id,
        route_id: trip.route_id,
        direction_id: trip.direction_id,
        start_time: trip.start_time,
        start_date: trip.start_date,
        schedule_relationship: trip.schedule_relationship,
    }
}

fn trip_descriptor_to_proto(trip: &TripDescriptor) -> gtfs_rt::TripDescriptor {
    gtfs_rt::TripDescriptor {
        trip_id: trip.trip_id.clone(),
        route_id: trip.route_id.clone(),
        direction_id: trip.direction_id,
        start_time: trip.start_time.clone(),
        start_date: trip.start_date.clone(),
        schedule_relationship: trip.schedule_relationship,
    }
}

fn vehicle_descriptor_from_proto(descriptor: gtfs_rt::VehicleDescriptor) -> VehicleDescriptor {
    VehicleDescriptor {
        id: descriptor.id,
        label: descriptor.label,
        license_plate: descriptor.license_plate,
    }
}

fn vehicle_descriptor_to_proto(descriptor: &VehicleDescriptor) -> gtfs_rt::VehicleDescriptor {
    gtfs_rt::VehicleDescriptor {
        id: descriptor.id.clone(),
        label: descriptor.label.clone(),
        license_plate: descriptor.license_plate.clone(),
    }
}

fn translated_from_proto(text: gtfs_rt::TranslatedString) -> TranslatedText {
    TranslatedText {
        translations: text
            .translation
            .into_iter()
            .map(|t| Translation {
                text: t.text,
                language: t.language,
            })
            .collect(),
    }
}

fn translated_to_proto(text: &TranslatedText) -> gtfs_rt::TranslatedString {
    gtfs_rt::TranslatedString {
        translation: text
            .translations
            .iter()
            .map(|t| gtfs_rt::translated_string::Translation {
                text: t.text.clone(),
                language: t.language.clone(),
            })
            .collect(),
    }
}
