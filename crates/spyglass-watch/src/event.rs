//! Watch event types shared between the engine and the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::WatchError;

/// Action that produced a [`WatchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchAction {
    /// A resource appeared.
    Added,
    /// A resource changed.
    Modified,
    /// A resource disappeared.
    Deleted,
    /// An informational error, e.g. a [`RestartNotice`].
    Error,
}

/// A single observed change, immutable after construction.
///
/// Serializes to the client as `{"type": <action>, "object": <payload>}`.
/// Ordering is guaranteed per source stream only; no global ordering exists
/// across resource kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// The action that produced this event.
    #[serde(rename = "type")]
    pub action: WatchAction,
    /// The affected resource, or an error payload for [`WatchAction::Error`].
    pub object: Value,
}

impl WatchEvent {
    /// Create an event from an already-serialized payload.
    #[must_use]
    pub fn new(action: WatchAction, object: Value) -> Self {
        Self { action, object }
    }

    /// Create an event by serializing a typed resource into the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized to JSON.
    pub fn with_payload<T: Serialize>(action: WatchAction, payload: &T) -> Result<Self, WatchError> {
        Ok(Self::new(action, serde_json::to_value(payload)?))
    }

    /// Create the `ERROR` event emitted while a kind's watch is restarting.
    #[must_use]
    pub fn restart_notice(notice: &RestartNotice) -> Self {
        Self::new(WatchAction::Error, notice.to_value())
    }
}

/// Informational payload sent downstream when a kind's subscription is being
/// restarted. Constructed fresh for each heal, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartNotice {
    /// Display name of the affected kind.
    pub kind: String,
    /// The failure that triggered the restart, absent on a clean close.
    pub message: Option<String>,
}

impl RestartNotice {
    /// Create a notice for `kind`, recording the close cause if there was one.
    #[must_use]
    pub fn new(kind: impl Into<String>, cause: Option<&WatchError>) -> Self {
        Self {
            kind: kind.into(),
            message: cause.map(ToString::to_string),
        }
    }

    /// The payload placed in the `object` field of the `ERROR` event.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.kind,
            "message": self.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(WatchAction::Added, "ADDED"; "added")]
    #[test_case(WatchAction::Modified, "MODIFIED"; "modified")]
    #[test_case(WatchAction::Deleted, "DELETED"; "deleted")]
    #[test_case(WatchAction::Error, "ERROR"; "error")]
    fn test_action_serializes_upper_case(action: WatchAction, expected: &str) {
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json, json!(expected));
    }

    #[test]
    fn test_event_wire_shape() {
        let event = WatchEvent::new(WatchAction::Added, json!({"name": "kube-root-ca"}));

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json, json!({"type": "ADDED", "object": {"name": "kube-root-ca"}}));
    }

    #[test]
    fn test_event_round_trip() {
        let event = WatchEvent::new(WatchAction::Deleted, json!({"name": "nginx"}));

        let json = serde_json::to_string(&event).unwrap();
        let back: WatchEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(back, event);
    }

    #[test]
    fn test_event_with_payload() {
        #[derive(Serialize)]
        struct Pod {
            name: String,
        }

        let event = WatchEvent::with_payload(
            WatchAction::Modified,
            &Pod {
                name: "nginx-0".to_string(),
            },
        )
        .unwrap();

        assert_eq!(event.action, WatchAction::Modified);
        assert_eq!(event.object, json!({"name": "nginx-0"}));
    }

    #[test]
    fn test_restart_notice_without_cause() {
        let notice = RestartNotice::new("Pod", None);
        let event = WatchEvent::restart_notice(&notice);

        assert_eq!(event.action, WatchAction::Error);
        assert_eq!(event.object, json!({"type": "Pod", "message": null}));
    }

    #[test]
    fn test_restart_notice_with_cause() {
        let cause = WatchError::Connection("connection reset".to_string());
        let notice = RestartNotice::new("Deployment", Some(&cause));
        let event = WatchEvent::restart_notice(&notice);

        assert_eq!(event.object["type"], json!("Deployment"));
        assert_eq!(
            event.object["message"],
            json!("watch connection failed: connection reset")
        );
    }
}
