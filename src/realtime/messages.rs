//! Typed realtime messages decoded from event payloads.
//!
//! Event data looks like `{"action": "create", "record": {...}}`. Anything
//! that does not fit that shape (including the initial handshake payload)
//! becomes a [`RealtimeAction::Connect`] message.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// What happened to the record carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeAction {
    Connect,
    Create,
    Update,
    Delete,
}

impl RealtimeAction {
    /// Parse an action name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        const ACTIONS: [(&str, RealtimeAction); 4] = [
            ("connect", RealtimeAction::Connect),
            ("create", RealtimeAction::Create),
            ("update", RealtimeAction::Update),
            ("delete", RealtimeAction::Delete),
        ];
        ACTIONS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, action)| *action)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeAction::Connect => "connect",
            RealtimeAction::Create => "create",
            RealtimeAction::Update => "update",
            RealtimeAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for RealtimeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message delivered to listeners.
///
/// A `Connect` message never carries a payload; every other action always
/// does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeMessage {
    action: RealtimeAction,
    #[serde(rename = "record", skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl RealtimeMessage {
    /// The connect / keep-alive message.
    pub fn connect() -> Self {
        Self {
            action: RealtimeAction::Connect,
            payload: None,
        }
    }

    /// A record change message. Returns a connect message if `action` is
    /// `Connect`, since that action carries no payload.
    pub fn record_change(action: RealtimeAction, record: Value) -> Self {
        match action {
            RealtimeAction::Connect => Self::connect(),
            action => Self {
                action,
                payload: Some(record),
            },
        }
    }

    /// Decode the `data` field of an event.
    ///
    /// Never fails: data that is not a JSON object with a known `action`
    /// and, for record actions, a non-null `record`, yields a connect message.
    pub fn from_event_data(data: &str) -> Self {
        let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(data) else {
            return Self::connect();
        };
        let Some(action) = object
            .get("action")
            .and_then(Value::as_str)
            .and_then(RealtimeAction::parse)
        else {
            return Self::connect();
        };

        match (action, object.remove("record")) {
            (RealtimeAction::Connect, _) => Self::connect(),
            (_, None) | (_, Some(Value::Null)) => Self::connect(),
            (action, Some(record)) => Self::record_change(action, record),
        }
    }

    pub fn action(&self) -> RealtimeAction {
        self.action
    }

    /// Raw record JSON, `None` for connect messages.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn is_connect(&self) -> bool {
        self.action == RealtimeAction::Connect
    }

    /// Decode the record into a typed value.
    pub fn record<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.payload
            .as_ref()
            .map(|payload| T::deserialize(payload))
            .transpose()
    }
}
