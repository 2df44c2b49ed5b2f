//! In-memory model of a GTFS-RT feed.
//!
//! A [`Feed`] is built fresh on every decode and owns its entities; editing
//! never mutates a decoded feed in place. Enum-typed wire fields (cause,
//! effect, severity, incrementality, schedule relationship) are carried as
//! raw `i32` values so that values unknown to this tool pass through
//! untouched; known labels are available through the `*_label` lookups.

/// Root value decoded from a feed buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub header: FeedHeader,
    pub summary: FeedSummary,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedHeader {
    pub gtfs_version: String,
    /// Raw `Incrementality` value; `None` means the field was absent and the
    /// proto2 reader-side default (FULL_DATASET) applies.
    pub incrementality: Option<i32>,
    /// POSIX epoch seconds at which the feed was generated.
    pub timestamp: Option<u64>,
}

/// Per-payload entity counts. An entity populating several payloads counts
/// once per populated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedSummary {
    pub vehicles: usize,
    pub trip_updates: usize,
    pub alerts: usize,
}

impl FeedSummary {
    pub fn from_entities(entities: &[Entity]) -> Self {
        FeedSummary {
            vehicles: entities.iter().filter(|e| e.vehicle.is_some()).count(),
            trip_updates: entities.iter().filter(|e| e.trip_update.is_some()).count(),
            alerts: entities.iter().filter(|e| e.alert.is_some()).count(),
        }
    }
}

/// One update record in a feed.
///
/// The protocol says exactly one payload is populated, but a producer can
/// emit more than one and this tool passes such entities through unchanged.
/// [`Entity::kind`] flags the dominant payload for logic that must pick one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub id: String,
    pub is_deleted: Option<bool>,
    pub vehicle: Option<Vehicle>,
    pub trip_update: Option<TripUpdate>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Vehicle,
    TripUpdate,
    Alert,
}

impl Entity {
    /// Dominant payload, by the precedence vehicle > trip update > alert.
    pub fn kind(&self) -> Option<EntityKind> {
        if self.vehicle.is_some() {
            Some(EntityKind::Vehicle)
        } else if self.trip_update.is_some() {
            Some(EntityKind::TripUpdate)
        } else if self.alert.is_some() {
            Some(EntityKind::Alert)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vehicle {
    pub trip: Option<TripDescriptor>,
    pub descriptor: Option<VehicleDescriptor>,
    pub position: Option<Position>,
    pub current_stop_sequence: Option<u32>,
    pub stop_id: Option<String>,
    pub current_status: Option<i32>,
    pub timestamp: Option<u64>,
    pub congestion_level: Option<i32>,
    pub occupancy_status: Option<i32>,
}

/// Geographic position. The wire carries single-precision coordinates;
/// widening to `f64` is exact and narrowing back round-trips wire values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f64>,
    pub odometer: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripDescriptor {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub direction_id: Option<u32>,
    pub start_time: Option<String>,
    pub start_date: Option<String>,
    pub schedule_relationship: Option<i32>,
}

impl TripDescriptor {
    /// True when no field is set, which is how an editor clear leaves it.
    pub fn is_empty(&self) -> bool {
        self.trip_id.is_none()
            && self.route_id.is_none()
            && self.direction_id.is_none()
            && self.start_time.is_none()
            && self.start_date.is_none()
            && self.schedule_relationship.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleDescriptor {
    pub id: Option<String>,
    pub label: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripUpdate {
    pub trip: TripDescriptor,
    pub descriptor: Option<VehicleDescriptor>,
    pub stop_time_updates: Vec<StopTimeUpdate>,
    pub timestamp: Option<u64>,
    /// Seconds; positive means late.
    pub delay: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopTimeUpdate {
    pub stop_sequence: Option<u32>,
    pub stop_id: Option<String>,
    pub arrival: Option<StopTimeEvent>,
    pub departure: Option<StopTimeEvent>,
    pub schedule_relationship: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopTimeEvent {
    pub delay: Option<i32>,
    pub time: Option<i64>,
    pub uncertainty: Option<i32>,
}

/// Service alert.
///
/// Repeated fields use the empty vector as "absent" since the wire format
/// cannot distinguish the two. An empty `informed_entities` means the alert
/// applies network-wide.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alert {
    pub active_periods: Vec<TimeRange>,
    pub informed_entities: Vec<Scope>,
    pub cause: Option<i32>,
    pub effect: Option<i32>,
    pub severity_level: Option<i32>,
    pub url: Option<TranslatedText>,
    pub header_text: Option<TranslatedText>,
    pub description_text: Option<TranslatedText>,
}

/// Epoch-second window during which an alert is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Selector for the part of the network an alert applies to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
    pub route_type: Option<i32>,
    pub stop_id: Option<String>,
    pub trip: Option<TripDescriptor>,
}

impl Scope {
    /// A scope stays alive if any of routeId, stopId, agencyId, trip.routeId
    /// or trip.tripId is set. A trip directionId alone does not keep it.
    pub fn is_empty(&self) -> bool {
        self.route_id.is_none()
            && self.stop_id.is_none()
            && self.agency_id.is_none()
            && self
                .trip
                .as_ref()
                .is_none_or(|t| t.route_id.is_none() && t.trip_id.is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslatedText {
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translation {
    pub text: String,
    pub language: Option<String>,
}

impl TranslatedText {
    /// Single zero-language translation, the only shape this tool produces.
    pub fn plain(text: impl Into<String>) -> Self {
        TranslatedText {
            translations: vec![Translation {
                text: text.into(),
                language: None,
            }],
        }
    }

    /// Text of the first translation, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.translations.first().map(|t| t.text.as_str())
    }
}

pub fn incrementality_label(value: i32) -> Option<&'static str> {
    match value {
        0 => Some("FULL_DATASET"),
        1 => Some("DIFFERENTIAL"),
        _ => None,
    }
}

pub fn cause_label(value: i32) -> Option<&'static str> {
    match value {
        1 => Some("Unknown cause"),
        2 => Some("Other cause"),
        3 => Some("Technical problem"),
        4 => Some("Strike"),
        5 => Some("Demonstration"),
        6 => Some("Accident"),
        7 => Some("Holiday"),
        8 => Some("Weather"),
        9 => Some("Maintenance"),
        10 => Some("Construction"),
        11 => Some("Police activity"),
        12 => Some("Medical emergency"),
        _ => None,
    }
}

pub fn effect_label(value: i32) -> Option<&'static str> {
    match value {
        1 => Some("No service"),
        2 => Some("Reduced service"),
        3 => Some("Significant delays"),
        4 => Some("Detour"),
        5 => Some("Additional service"),
        6 => Some("Modified service"),
        7 => Some("Other effect"),
        8 => Some("Unknown effect"),
        9 => Some("Stop moved"),
        10 => Some("No effect"),
        11 => Some("Accessibility issue"),
        _ => None,
    }
}

pub fn severity_label(value: i32) -> Option<&'static str> {
    match value {
        1 => Some("Unknown severity"),
        2 => Some("Info"),
        3 => Some("Warning"),
        4 => Some("Severe"),
        _ => None,
    }
}
