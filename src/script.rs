//! JSON edit scripts, the headless form of an interactive edit session.
//!
//! A script is an array of tagged operations mirroring the editor
//! operations one-to-one, applied left to right:
//!
//! ```json
//! [
//!   { "op": "update_text", "id": "alert:1", "field": "header", "text": "Detour" },
//!   { "op": "set_time_window", "id": "alert:1", "edge": "start", "datetime": "2024-01-01T10:00" },
//!   { "op": "delete_alert", "id": "alert:2" }
//! ]
//! ```

use serde::Deserialize;

use crate::editor::{
    self, AlertDraft, ScalarField, ScopeField, TextField, TimeEdge, UrlField, ValidationError,
};
use crate::model::Entity;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    UpdateText {
        id: String,
        field: TextField,
        #[serde(default)]
        text: Option<String>,
    },
    UpdateScalar {
        id: String,
        field: ScalarField,
        #[serde(default)]
        value: Option<i32>,
    },
    UpdateUrl {
        id: String,
        field: UrlField,
        #[serde(default)]
        url: Option<String>,
    },
    SetTimeWindow {
        id: String,
        edge: TimeEdge,
        #[serde(default)]
        datetime: Option<String>,
    },
    AddScope {
        id: String,
    },
    UpdateScope {
        id: String,
        index: usize,
        field: ScopeField,
        #[serde(default)]
        value: Option<String>,
    },
    RemoveScope {
        id: String,
        index: usize,
    },
    DeleteAlert {
        id: String,
    },
    CreateAlert {
        #[serde(default)]
        id: String,
        header_text: String,
        #[serde(default)]
        description_text: String,
        #[serde(default)]
        cause: Option<i32>,
        #[serde(default)]
        effect: Option<i32>,
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        end: Option<String>,
    },
}

/// Applies a script to the alert entity list, returning the edited list.
///
/// # Errors
///
/// Stops at the first failing operation; the returned error names what the
/// operator has to fix. Unknown ids do not fail, per the editor contract.
pub fn apply(entities: &[Entity], ops: &[EditOp]) -> Result<Vec<Entity>, ValidationError> {
    let mut current = entities.to_vec();
    for op in ops {
        current = apply_op(&current, op)?;
    }
    Ok(current)
}

fn apply_op(entities: &[Entity], op: &EditOp) -> Result<Vec<Entity>, ValidationError> {
    match op {
        EditOp::UpdateText { id, field, text } => Ok(editor::update_text(
            entities,
            id,
            *field,
            text.as_deref(),
        )),
        EditOp::UpdateScalar { id, field, value } => {
            Ok(editor::update_scalar(entities, id, *field, *value))
        }
        EditOp::UpdateUrl { id, field, url } => {
            Ok(editor::update_url(entities, id, *field, url.as_deref()))
        }
        EditOp::SetTimeWindow { id, edge, datetime } => {
            let datetime = parse_optional(datetime.as_deref())?;
            Ok(editor::set_time_window(entities, id, *edge, datetime))
        }
        EditOp::AddScope { id } => Ok(editor::add_scope(entities, id)),
        EditOp::UpdateScope {
            id,
            index,
            field,
            value,
        } => Ok(editor::update_scope(
            entities,
            id,
            *index,
            *field,
            value.as_deref(),
        )),
        EditOp::RemoveScope { id, index } => Ok(editor::remove_scope(entities, id, *index)),
        EditOp::DeleteAlert { id } => Ok(editor::delete_alert(entities, id)),
        EditOp::CreateAlert {
            id,
            header_text,
            description_text,
            cause,
            effect,
            start,
            end,
        } => {
            let draft = AlertDraft {
                id: id.clone(),
                header_text: header_text.clone(),
                description_text: description_text.clone(),
                cause: *cause,
                effect: *effect,
                start: parse_optional(start.as_deref())?,
                end: parse_optional(end.as_deref())?,
            };
            editor::create_alert(entities, &draft)
        }
    }
}

fn parse_optional(
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDateTime>, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(editor::parse_datetime_local(v.trim())?)),
        _ => Ok(None),
    }
}
