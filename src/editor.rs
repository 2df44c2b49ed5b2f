//! Pure edit operations over alert entities.
//!
//! Every operation takes the current entity list and returns a new one;
//! the caller's list and its nested values are never touched, so any
//! snapshot handed out earlier stays valid. Operations target an entity by
//! id, and an unknown id (or an id without an alert payload) is a silent
//! no-op: the alert may have vanished from the feed since the caller last
//! looked at it, and that is not an error.

use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Alert, Entity, Scope, TimeRange, TranslatedText, TripDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Alerts cannot be created without header text.
    #[error("alert header text is required")]
    MissingHeader,

    /// A datetime value could not be parsed.
    #[error("unrecognized datetime: {0}")]
    InvalidDatetime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Header,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    Cause,
    Effect,
    SeverityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlField {
    Url,
    HeaderUrl,
    DescriptionUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEdge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeField {
    RouteId,
    StopId,
    AgencyId,
    TripRouteId,
    TripId,
    TripDirectionId,
}

/// Fields of an alert being created from scratch.
#[derive(Debug, Clone, Default)]
pub struct AlertDraft {
    /// Entity id; blank gets a time-based generated id.
    pub id: String,
    pub header_text: String,
    pub description_text: String,
    pub cause: Option<i32>,
    pub effect: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// Sets or clears the header or description text.
///
/// Non-empty text becomes a one-element zero-language translation; `None`
/// or empty clears the field entirely rather than leaving an empty string.
pub fn update_text(
    entities: &[Entity],
    id: &str,
    field: TextField,
    value: Option<&str>,
) -> Vec<Entity> {
    let text = value.filter(|v| !v.is_empty()).map(TranslatedText::plain);
    with_alert(entities, id, |alert| match field {
        TextField::Header => alert.header_text = text,
        TextField::Description => alert.description_text = text,
    })
}

/// Sets or clears one of the open integer fields.
pub fn update_scalar(
    entities: &[Entity],
    id: &str,
    field: ScalarField,
    value: Option<i32>,
) -> Vec<Entity> {
    with_alert(entities, id, |alert| match field {
        ScalarField::Cause => alert.cause = value,
        ScalarField::Effect => alert.effect = value,
        ScalarField::SeverityLevel => alert.severity_level = value,
    })
}

/// Sets or clears a link field, trimming whitespace first.
///
/// Only [`UrlField::Url`] has a slot in the schema; the header and
/// description variants are accepted and dropped.
pub fn update_url(
    entities: &[Entity],
    id: &str,
    field: UrlField,
    value: Option<&str>,
) -> Vec<Entity> {
    let text = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(TranslatedText::plain);
    with_alert(entities, id, |alert| match field {
        UrlField::Url => alert.url = text,
        UrlField::HeaderUrl | UrlField::DescriptionUrl => {}
    })
}

/// Sets or clears one edge of the alert's single active period.
///
/// The datetime is interpreted as UTC and truncated to whole epoch seconds.
/// Once both edges are absent the period list is emptied; a feed never
/// carries a zero-bound active period.
pub fn set_time_window(
    entities: &[Entity],
    id: &str,
    edge: TimeEdge,
    datetime: Option<NaiveDateTime>,
) -> Vec<Entity> {
    let timestamp = datetime.map(epoch_seconds);
    with_alert(entities, id, |alert| {
        let mut period = alert.active_periods.first().copied().unwrap_or_default();
        match edge {
            TimeEdge::Start => period.start = timestamp,
            TimeEdge::End => period.end = timestamp,
        }
        alert.active_periods = if period.start.is_none() && period.end.is_none() {
            Vec::new()
        } else {
            vec![period]
        };
    })
}

/// Appends one empty scope descriptor to the alert.
pub fn add_scope(entities: &[Entity], id: &str) -> Vec<Entity> {
    with_alert(entities, id, |alert| {
        alert.informed_entities.push(Scope::default());
    })
}

/// Sets a leaf field on the scope descriptor at `index`.
///
/// The nested trip selector is created on first write of a trip field and
/// deleted once its routeId and tripId are absent and directionId is unset.
/// Afterwards, descriptors with nothing left to select are pruned; an
/// emptied list means the alert applies network-wide. Out-of-range indexes
/// are no-ops, like unknown ids.
pub fn update_scope(
    entities: &[Entity],
    id: &str,
    index: usize,
    field: ScopeField,
    value: Option<&str>,
) -> Vec<Entity> {
    let value = value.filter(|v| !v.is_empty());
    with_alert(entities, id, |alert| {
        let Some(scope) = alert.informed_entities.get_mut(index) else {
            return;
        };
        match field {
            ScopeField::RouteId => scope.route_id = value.map(str::to_string),
            ScopeField::StopId => scope.stop_id = value.map(str::to_string),
            ScopeField::AgencyId => scope.agency_id = value.map(str::to_string),
            ScopeField::TripRouteId | ScopeField::TripId | ScopeField::TripDirectionId => {
                let trip = scope.trip.get_or_insert_with(TripDescriptor::default);
                match field {
                    ScopeField::TripRouteId => trip.route_id = value.map(str::to_string),
                    ScopeField::TripId => trip.trip_id = value.map(str::to_string),
                    ScopeField::TripDirectionId => {
                        trip.direction_id = value.and_then(|v| v.parse().ok());
                    }
                    _ => unreachable!(),
                }
                if trip.route_id.is_none()
                    && trip.trip_id.is_none()
                    && trip.direction_id.is_none()
                {
                    scope.trip = None;
                }
            }
        }
        alert.informed_entities.retain(|scope| !scope.is_empty());
    })
}

/// Removes the scope descriptor at `index`.
pub fn remove_scope(entities: &[Entity], id: &str, index: usize) -> Vec<Entity> {
    with_alert(entities, id, |alert| {
        if index < alert.informed_entities.len() {
            alert.informed_entities.remove(index);
        }
    })
}

/// Removes the entity with the given id.
pub fn delete_alert(entities: &[Entity], id: &str) -> Vec<Entity> {
    entities
        .iter()
        .filter(|entity| entity.id != id)
        .cloned()
        .collect()
}

/// Appends a freshly created alert entity.
///
/// # Errors
///
/// Returns [`ValidationError::MissingHeader`] when the draft's header text
/// is empty after trimming; the caller's list is unaffected.
pub fn create_alert(entities: &[Entity], draft: &AlertDraft) -> Result<Vec<Entity>, ValidationError> {
    let header = draft.header_text.trim();
    if header.is_empty() {
        return Err(ValidationError::MissingHeader);
    }

    let start = draft.start.map(epoch_seconds);
    let end = draft.end.map(epoch_seconds);
    let active_periods = if start.is_some() || end.is_some() {
        vec![TimeRange { start, end }]
    } else {
        Vec::new()
    };

    let description = draft.description_text.trim();
    let id = match draft.id.trim() {
        "" => generated_id(),
        id => id.to_string(),
    };

    let entity = Entity {
        id,
        alert: Some(Alert {
            header_text: Some(TranslatedText::plain(header)),
            description_text: (!description.is_empty()).then(|| TranslatedText::plain(description)),
            cause: draft.cause,
            effect: draft.effect,
            active_periods,
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut next = entities.to_vec();
    next.push(entity);
    Ok(next)
}

/// Parses the `datetime-local` shape used by edit scripts, with or without
/// seconds.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDatetime`] for any other shape.
pub fn parse_datetime_local(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ValidationError::InvalidDatetime(value.to_string()))
}

fn epoch_seconds(datetime: NaiveDateTime) -> u64 {
    // Timestamps are unsigned on the wire; pre-epoch input clamps to zero.
    datetime.and_utc().timestamp().max(0) as u64
}

fn generated_id() -> String {
    format!("alert:{}", Utc::now().timestamp_millis())
}

fn with_alert<F>(entities: &[Entity], id: &str, mutate: F) -> Vec<Entity>
where
    F: FnOnce(&mut Alert),
{
    let mut next = entities.to_vec();
    if let Some(alert) = next
        .iter_mut()
        .find(|entity| entity.id == id)
        .and_then(|entity| entity.alert.as_mut())
    {
        mutate(alert);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Translation;

    fn alert_entity(id: &str) -> Entity {
        Entity {
            id: id.to_string(),
            alert: Some(Alert {
                header_text: Some(TranslatedText::plain("Planned works")),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn alert_of<'a>(entities: &'a [Entity], id: &str) -> &'a Alert {
        entities
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.alert.as_ref())
            .unwrap()
    }

    #[test]
    fn test_update_text_sets_singleton_translation() {
        let entities = vec![alert_entity("a1")];
        let updated = update_text(&entities, "a1", TextField::Description, Some("Use line 4"));

        let alert = alert_of(&updated, "a1");
        let description = alert.description_text.as_ref().unwrap();
        assert_eq!(
            description.translations,
            vec![Translation {
                text: "Use line 4".to_string(),
                language: None,
            }]
        );
    }

    #[test]
    fn test_update_text_empty_clears_field() {
        let entities = vec![alert_entity("a1")];
        let updated = update_text(&entities, "a1", TextField::Header, Some(""));
        assert!(alert_of(&updated, "a1").header_text.is_none());

        let updated = update_text(&entities, "a1", TextField::Header, None);
        assert!(alert_of(&updated, "a1").header_text.is_none());
    }

    #[test]
    fn test_operations_do_not_mutate_input() {
        let entities = vec![alert_entity("a1")];
        let snapshot = entities.clone();

        let _ = update_text(&entities, "a1", TextField::Header, Some("changed"));
        let _ = update_scalar(&entities, "a1", ScalarField::Cause, Some(4));
        let _ = delete_alert(&entities, "a1");

        assert_eq!(entities, snapshot);
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let entities = vec![alert_entity("a1")];
        let updated = update_text(&entities, "ghost", TextField::Header, Some("nope"));
        assert_eq!(updated, entities);

        let updated = update_scalar(&entities, "ghost", ScalarField::Effect, Some(1));
        assert_eq!(updated, entities);

        let updated = delete_alert(&entities, "ghost");
        assert_eq!(updated, entities);
    }

    #[test]
    fn test_update_scalar_sets_and_clears() {
        let entities = vec![alert_entity("a1")];
        let updated = update_scalar(&entities, "a1", ScalarField::SeverityLevel, Some(3));
        assert_eq!(alert_of(&updated, "a1").severity_level, Some(3));

        let updated = update_scalar(&updated, "a1", ScalarField::SeverityLevel, None);
        assert_eq!(alert_of(&updated, "a1").severity_level, None);
    }

    #[test]
    fn test_update_url_trims_and_clears() {
        let entities = vec![alert_entity("a1")];
        let updated = update_url(&entities, "a1", UrlField::Url, Some("  https://example.com  "));
        assert_eq!(
            alert_of(&updated, "a1").url.as_ref().unwrap().first_text(),
            Some("https://example.com")
        );

        let updated = update_url(&updated, "a1", UrlField::Url, Some("   "));
        assert!(alert_of(&updated, "a1").url.is_none());
    }

    #[test]
    fn test_update_url_has_no_slot_for_header_url() {
        let entities = vec![alert_entity("a1")];
        let updated = update_url(&entities, "a1", UrlField::HeaderUrl, Some("https://x.test"));
        assert_eq!(updated, entities);
    }

    #[test]
    fn test_set_time_window_creates_period() {
        let entities = vec![alert_entity("a1")];
        let start = parse_datetime_local("2024-01-01T10:00").unwrap();
        let updated = set_time_window(&entities, "a1", TimeEdge::Start, Some(start));

        let alert = alert_of(&updated, "a1");
        assert_eq!(
            alert.active_periods,
            vec![TimeRange {
                start: Some(1_704_103_200),
                end: None,
            }]
        );
    }

    #[test]
    fn test_set_time_window_zero_bound_invariant() {
        let entities = vec![alert_entity("a1")];
        let start = parse_datetime_local("2024-01-01T10:00").unwrap();
        let end = parse_datetime_local("2024-01-02T18:30:15").unwrap();

        let updated = set_time_window(&entities, "a1", TimeEdge::Start, Some(start));
        let updated = set_time_window(&updated, "a1", TimeEdge::End, Some(end));
        assert_eq!(alert_of(&updated, "a1").active_periods.len(), 1);

        let updated = set_time_window(&updated, "a1", TimeEdge::End, None);
        assert_eq!(
            alert_of(&updated, "a1").active_periods,
            vec![TimeRange {
                start: Some(1_704_103_200),
                end: None,
            }]
        );

        let updated = set_time_window(&updated, "a1", TimeEdge::Start, None);
        assert!(alert_of(&updated, "a1").active_periods.is_empty());

        // Clearing an edge of an already absent period stays absent.
        let updated = set_time_window(&updated, "a1", TimeEdge::End, None);
        assert!(alert_of(&updated, "a1").active_periods.is_empty());
    }

    #[test]
    fn test_add_and_update_scope() {
        let entities = vec![alert_entity("a1")];
        let updated = add_scope(&entities, "a1");
        assert_eq!(alert_of(&updated, "a1").informed_entities.len(), 1);

        let updated = update_scope(&updated, "a1", 0, ScopeField::RouteId, Some("R4"));
        let alert = alert_of(&updated, "a1");
        assert_eq!(alert.informed_entities[0].route_id.as_deref(), Some("R4"));
    }

    #[test]
    fn test_update_scope_prunes_empty_descriptors() {
        let entities = vec![alert_entity("a1")];
        let with_scope = add_scope(&entities, "a1");
        let with_value = update_scope(&with_scope, "a1", 0, ScopeField::StopId, Some("S1"));

        // Setting then clearing is the same as never having set it.
        let cleared = update_scope(&with_value, "a1", 0, ScopeField::StopId, None);
        assert!(alert_of(&cleared, "a1").informed_entities.is_empty());
        assert_eq!(
            alert_of(&cleared, "a1").informed_entities,
            alert_of(&entities, "a1").informed_entities
        );
    }

    #[test]
    fn test_trip_scope_created_and_deleted() {
        let entities = vec![alert_entity("a1")];
        let updated = add_scope(&entities, "a1");
        let updated = update_scope(&updated, "a1", 0, ScopeField::TripRouteId, Some("R9"));

        let alert = alert_of(&updated, "a1");
        let trip = alert.informed_entities[0].trip.as_ref().unwrap();
        assert_eq!(trip.route_id.as_deref(), Some("R9"));

        // Clearing the only trip field drops the trip selector, and with it
        // the whole now-empty descriptor.
        let updated = update_scope(&updated, "a1", 0, ScopeField::TripRouteId, None);
        assert!(alert_of(&updated, "a1").informed_entities.is_empty());
    }

    #[test]
    fn test_trip_direction_alone_does_not_keep_scope() {
        let entities = vec![alert_entity("a1")];
        let updated = add_scope(&entities, "a1");
        let updated = update_scope(&updated, "a1", 0, ScopeField::TripDirectionId, Some("1"));
        assert!(alert_of(&updated, "a1").informed_entities.is_empty());
    }

    #[test]
    fn test_trip_direction_requires_a_number() {
        let entities = vec![alert_entity("a1")];
        let updated = add_scope(&entities, "a1");
        let updated = update_scope(&updated, "a1", 0, ScopeField::TripId, Some("T1"));
        let updated = update_scope(&updated, "a1", 0, ScopeField::TripDirectionId, Some("north"));

        let alert = alert_of(&updated, "a1");
        let trip = alert.informed_entities[0].trip.as_ref().unwrap();
        assert_eq!(trip.direction_id, None);
        assert_eq!(trip.trip_id.as_deref(), Some("T1"));
    }

    #[test]
    fn test_update_scope_out_of_range_is_a_no_op() {
        let entities = vec![alert_entity("a1")];
        let updated = update_scope(&entities, "a1", 3, ScopeField::RouteId, Some("R1"));
        assert_eq!(updated, entities);
    }

    #[test]
    fn test_remove_scope() {
        let entities = vec![alert_entity("a1")];
        let updated = add_scope(&entities, "a1");
        let updated = update_scope(&updated, "a1", 0, ScopeField::AgencyId, Some("AG"));
        let updated = remove_scope(&updated, "a1", 0);
        assert!(alert_of(&updated, "a1").informed_entities.is_empty());

        let unchanged = remove_scope(&updated, "a1", 5);
        assert_eq!(unchanged, updated);
    }

    #[test]
    fn test_scope_emptiness_invariant_holds_after_edits() {
        let entities = vec![alert_entity("a1")];
        let mut current = add_scope(&entities, "a1");
        current = update_scope(&current, "a1", 0, ScopeField::RouteId, Some("R1"));
        current = add_scope(&current, "a1");
        current = update_scope(&current, "a1", 1, ScopeField::TripId, Some("T7"));
        current = update_scope(&current, "a1", 0, ScopeField::RouteId, None);
        current = remove_scope(&current, "a1", 0);

        let alert = alert_of(&current, "a1");
        assert!(alert.informed_entities.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn test_delete_alert() {
        let entities = vec![alert_entity("a1"), alert_entity("a2")];
        let updated = delete_alert(&entities, "a1");
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, "a2");
    }

    #[test]
    fn test_create_alert_requires_header() {
        let entities = vec![alert_entity("a1")];
        let draft = AlertDraft {
            header_text: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            create_alert(&entities, &draft),
            Err(ValidationError::MissingHeader)
        );
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_create_alert_builds_entity() {
        let entities = vec![];
        let draft = AlertDraft {
            id: "alert:custom".to_string(),
            header_text: "Strike on line 12".to_string(),
            description_text: "No service all day".to_string(),
            cause: Some(4),
            effect: Some(1),
            start: Some(parse_datetime_local("2024-03-01T05:00").unwrap()),
            end: None,
        };

        let updated = create_alert(&entities, &draft).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, "alert:custom");

        let alert = updated[0].alert.as_ref().unwrap();
        assert_eq!(
            alert.header_text.as_ref().unwrap().first_text(),
            Some("Strike on line 12")
        );
        assert_eq!(alert.cause, Some(4));
        assert_eq!(alert.active_periods.len(), 1);
        assert!(alert.active_periods[0].start.is_some());
        assert!(alert.active_periods[0].end.is_none());
    }

    #[test]
    fn test_create_alert_generates_id_when_blank() {
        let draft = AlertDraft {
            header_text: "Weather warning".to_string(),
            ..Default::default()
        };
        let updated = create_alert(&[], &draft).unwrap();
        assert!(updated[0].id.starts_with("alert:"));
        // No dates were given, so the period stays absent.
        assert!(updated[0].alert.as_ref().unwrap().active_periods.is_empty());
    }

    #[test]
    fn test_parse_datetime_local_shapes() {
        assert!(parse_datetime_local("2024-01-01T10:00").is_ok());
        assert!(parse_datetime_local("2024-01-01T10:00:30").is_ok());
        assert_eq!(
            parse_datetime_local("tomorrow"),
            Err(ValidationError::InvalidDatetime("tomorrow".to_string()))
        );
    }
}
