use control_tree::{decode_client_message, handle_update, rejection_event};
use shared::{
    domain::{ClientId, ControlId},
    error::{ApiError, UpdateError},
    protocol::{ClientMessage, ControlSnapshot, ServerEvent, UpdateMessage, UpdateReceipt, UpdateSet},
};
use tracing::{debug, info};

use crate::app_state::AppState;

pub(crate) fn parse_control_id(raw: &str) -> Result<ControlId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::from(UpdateError::MalformedMessage(format!(
            "`{raw}` is not a control id"
        )))
    })
}

pub(crate) fn list_controls(state: &AppState) -> Vec<ControlSnapshot> {
    state.registry.tree()
}

pub(crate) fn get_control(state: &AppState, id: ControlId) -> Result<ControlSnapshot, ApiError> {
    state.registry.snapshot(id).map_err(ApiError::from)
}

/// Applies an `updates` object posted over HTTP. Per-pair rejections come back
/// in the receipt; only an unknown target or an unreadable body is an error.
pub(crate) fn apply_updates(
    state: &AppState,
    client_id: ClientId,
    target_id: ControlId,
    body: &str,
) -> Result<UpdateReceipt, ApiError> {
    let updates: UpdateSet = serde_json::from_str(body)
        .map_err(|e| ApiError::from(UpdateError::MalformedMessage(e.to_string())))?;
    let report = handle_update(
        &state.registry,
        client_id,
        &UpdateMessage::new(target_id, updates),
    )?;
    Ok(report.receipt())
}

pub(crate) fn remove_control(state: &AppState, id: ControlId) -> Vec<ControlId> {
    let removed = state.registry.remove(id);
    if !removed.is_empty() {
        info!(%id, count = removed.len(), "controls removed");
    }
    removed
}

/// Handles one websocket text frame and returns the events meant for the
/// sender only. State changes reach every client through the registry stream.
pub(crate) fn process_client_text(
    state: &AppState,
    client_id: ClientId,
    text: &str,
) -> Vec<ServerEvent> {
    let message = match decode_client_message(text) {
        Ok(message) => message,
        Err(err) => {
            debug!(%client_id, error = %err, "undecodable client frame");
            return vec![ServerEvent::Error(err.into())];
        }
    };

    match message {
        ClientMessage::RequestSnapshot => vec![ServerEvent::Snapshot {
            controls: state.registry.tree(),
        }],
        ClientMessage::GuiUpdate(update) => {
            match handle_update(&state.registry, client_id, &update) {
                Ok(report) => report
                    .rejected
                    .into_iter()
                    .map(|err| rejection_event(client_id, update.target_id, err))
                    .collect(),
                Err(err) => vec![rejection_event(client_id, update.target_id, err)],
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
