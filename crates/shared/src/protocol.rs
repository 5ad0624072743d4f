use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

use crate::{
    domain::{Attribute, Category, ClientId, ControlId, ControlKind, ControlProps},
    error::ApiError,
};

/// Attribute updates in the exact order they appeared on the wire.
///
/// Unlike a map, duplicate keys are kept so that the last occurrence wins when
/// the set is applied front to back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet(Vec<(String, Value)>);

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for UpdateSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl Serialize for UpdateSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UpdateSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UpdateSetVisitor;

        impl<'de> Visitor<'de> for UpdateSetVisitor {
            type Value = UpdateSet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<UpdateSet, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(UpdateSet(entries))
            }
        }

        deserializer.deserialize_map(UpdateSetVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub target_id: ControlId,
    pub updates: UpdateSet,
}

impl UpdateMessage {
    pub fn new(target_id: ControlId, updates: UpdateSet) -> Self {
        Self { target_id, updates }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    GuiUpdate(UpdateMessage),
    RequestSnapshot,
}

/// Authoritative state of one control, as published to rendering clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub id: ControlId,
    pub kind: ControlKind,
    pub category: Category,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ControlId>,
    pub order: u64,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ControlId>,
    pub props: ControlProps,
    pub updated_at: DateTime<Utc>,
}

/// Serializable summary of one processed update message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReceipt {
    pub target_id: ControlId,
    pub applied: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    ControlCreated {
        control: ControlSnapshot,
    },
    ControlUpdated {
        control: ControlSnapshot,
    },
    ControlRemoved {
        id: ControlId,
    },
    Snapshot {
        controls: Vec<ControlSnapshot>,
    },
    UpdateRejected {
        client_id: ClientId,
        target_id: ControlId,
        error: ApiError,
    },
    Error(ApiError),
}
