use serde_json::Value;
use shared::{
    domain::{Attribute, ClientId, ControlId},
    error::{ApiError, UpdateError},
    protocol::{ClientMessage, ServerEvent, UpdateMessage, UpdateReceipt},
};
use tracing::{debug, warn};

use crate::registry::Registry;

/// Outcome of one update message whose target was found.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub target_id: ControlId,
    pub applied: Vec<Attribute>,
    pub rejected: Vec<UpdateError>,
    pub changed: bool,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn receipt(&self) -> UpdateReceipt {
        UpdateReceipt {
            target_id: self.target_id,
            applied: self.applied.clone(),
            rejected: self.rejected.iter().cloned().map(ApiError::from).collect(),
        }
    }
}

pub fn decode_client_message(raw: &str) -> Result<ClientMessage, UpdateError> {
    serde_json::from_str(raw).map_err(|e| UpdateError::MalformedMessage(e.to_string()))
}

fn parse_pair(key: &str, value: &Value) -> Result<(Attribute, bool), UpdateError> {
    let attribute = Attribute::from_key(key)
        .ok_or_else(|| UpdateError::MalformedMessage(format!("unknown attribute `{key}`")))?;
    let value = value.as_bool().ok_or_else(|| {
        UpdateError::MalformedMessage(format!("`{key}` expects a boolean, got {value}"))
    })?;
    Ok((attribute, value))
}

/// Validates and applies one update message.
///
/// Only an unknown target fails the whole message. Every other problem skips
/// the offending pair and is returned in [`UpdateReport::rejected`]. The
/// message is applied under one lock acquisition, in wire order, so later
/// duplicate keys win.
pub fn handle_update(
    registry: &Registry,
    client_id: ClientId,
    message: &UpdateMessage,
) -> Result<UpdateReport, UpdateError> {
    let target_id = message.target_id;
    let mut applied = Vec::new();
    let mut rejected = Vec::new();

    let mut state = registry.write();
    let Some(control) = state.controls.get_mut(&target_id) else {
        let error = UpdateError::NotFound(target_id);
        warn!(%client_id, %target_id, %error, "gui update discarded");
        return Err(error);
    };

    let mut changed = false;
    for (key, value) in message.updates.iter() {
        match parse_pair(key, value).and_then(|(attribute, value)| {
            control.set(attribute, value).map(|c| (attribute, c))
        }) {
            Ok((attribute, did_change)) => {
                changed |= did_change;
                applied.push(attribute);
            }
            Err(error) => rejected.push(error),
        }
    }

    let snapshot = changed.then(|| {
        control.touch();
        control.snapshot()
    });
    if let Some(snapshot) = snapshot {
        state.mark_dirty(target_id);
        registry.publish(ServerEvent::ControlUpdated { control: snapshot });
    }
    drop(state);

    for error in &rejected {
        warn!(%client_id, %target_id, %error, "gui update pair skipped");
    }
    debug!(%client_id, %target_id, applied = applied.len(), changed, "gui update processed");

    Ok(UpdateReport {
        target_id,
        applied,
        rejected,
        changed,
    })
}

/// Event sent back to the client whose update was rejected.
pub fn rejection_event(client_id: ClientId, target_id: ControlId, error: UpdateError) -> ServerEvent {
    ServerEvent::UpdateRejected {
        client_id,
        target_id,
        error: error.into(),
    }
}

#[cfg(test)]
#[path = "tests/update_tests.rs"]
mod tests;
