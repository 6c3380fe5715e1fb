//! Relay event vocabulary.
//!
//! Every frame on the wire is `{"event": <name>, "data": <payload>}` with
//! camelCase names. Events without a payload (`callEnded`) carry no `data`
//! key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Client -> Server
// ============================================================================

/// Events a connected client may send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Bind a user id to the sending connection.
    #[serde(deserialize_with = "id_string")]
    AddUser(String),
    SendMessage(DirectMessage),
    Typing(TypingNotice),
    UpdatePresence(PresenceChange),
    #[serde(deserialize_with = "id_string")]
    JoinGroup(String),
    #[serde(deserialize_with = "id_string")]
    LeaveGroup(String),
    SendGroupMessage(GroupMessage),
    CallUser(CallOffer),
    AnswerCall(CallAnswer),
    EndCall(CallHangup),
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::AddUser(_) => "addUser",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::UpdatePresence(_) => "updatePresence",
            ClientEvent::JoinGroup(_) => "joinGroup",
            ClientEvent::LeaveGroup(_) => "leaveGroup",
            ClientEvent::SendGroupMessage(_) => "sendGroupMessage",
            ClientEvent::CallUser(_) => "callUser",
            ClientEvent::AnswerCall(_) => "answerCall",
            ClientEvent::EndCall(_) => "endCall",
        }
    }

    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Ids are accepted as JSON strings or numbers and kept as text.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    #[serde(deserialize_with = "id_string")]
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "id_string")]
    pub sender_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    #[serde(deserialize_with = "id_string")]
    pub sender_id: String,
    #[serde(deserialize_with = "id_string")]
    pub receiver_id: String,
    #[serde(default)]
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChange {
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    /// Absent keeps the stored value, so a status-only change leaves the
    /// online flag alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    /// Free-text status ("available", "busy", ...). Absent keeps the stored value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    #[serde(deserialize_with = "id_string")]
    pub group_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "id_string")]
    pub sender_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOffer {
    #[serde(deserialize_with = "id_string")]
    pub caller_id: String,
    #[serde(deserialize_with = "id_string")]
    pub receiver_id: String,
    /// Opaque WebRTC signaling payload, never inspected.
    #[serde(default)]
    pub signal_data: Value,
    /// Media kind, normally "audio" or "video". Forwarded as sent.
    #[serde(default)]
    pub call_type: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnswer {
    #[serde(deserialize_with = "id_string")]
    pub caller_id: String,
    #[serde(default)]
    pub signal_data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallHangup {
    #[serde(deserialize_with = "id_string")]
    pub receiver_id: String,
}

// ============================================================================
// Server -> Client
// ============================================================================

/// Events the relay pushes to connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once when the socket opens.
    Connected(Welcome),
    ReceiveMessage(MessageDelivery),
    UserTyping(TypingDelivery),
    PresenceUpdate(PresenceBroadcast),
    ReceiveGroupMessage(GroupMessageDelivery),
    IncomingCall(IncomingCall),
    CallAnswered(CallAnswered),
    CallEnded,
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => "connected",
            ServerEvent::ReceiveMessage(_) => "receiveMessage",
            ServerEvent::UserTyping(_) => "userTyping",
            ServerEvent::PresenceUpdate(_) => "presenceUpdate",
            ServerEvent::ReceiveGroupMessage(_) => "receiveGroupMessage",
            ServerEvent::IncomingCall(_) => "incomingCall",
            ServerEvent::CallAnswered(_) => "callAnswered",
            ServerEvent::CallEnded => "callEnded",
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDelivery {
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingDelivery {
    pub sender_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceBroadcast {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageDelivery {
    pub group_id: String,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCall {
    pub caller_id: String,
    pub signal_data: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub call_type: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnswered {
    pub signal_data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_event_frames() {
        let event = ClientEvent::decode(r#"{"event":"addUser","data":"u-1"}"#).unwrap();
        assert_eq!(event, ClientEvent::AddUser("u-1".to_string()));

        let event = ClientEvent::decode(
            r#"{"event":"sendMessage","data":{"receiverId":"b","content":"hi","senderId":"a"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage(DirectMessage {
                receiver_id: "b".to_string(),
                content: "hi".to_string(),
                sender_id: "a".to_string(),
            })
        );
    }

    #[test]
    fn call_offer_keeps_signal_data_opaque() {
        let frame = json!({
            "event": "callUser",
            "data": {
                "callerId": "a",
                "receiverId": "b",
                "signalData": {"type": "offer", "sdp": "v=0\r\n", "nested": [1, 2, {"x": null}]},
                "callType": "video"
            }
        });
        let event = ClientEvent::decode(&frame.to_string()).unwrap();
        match event {
            ClientEvent::CallUser(offer) => {
                assert_eq!(offer.signal_data, frame["data"]["signalData"]);
                assert_eq!(offer.call_type, "video");
            }
            other => panic!("expected callUser, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_event_and_missing_ids() {
        assert!(ClientEvent::decode(r#"{"event":"shout","data":"x"}"#).is_err());
        assert!(ClientEvent::decode(r#"{"event":"sendMessage","data":{"content":"x"}}"#).is_err());
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn call_ended_has_no_data() {
        let text = ServerEvent::CallEnded.encode().unwrap();
        assert_eq!(text, r#"{"event":"callEnded"}"#);
    }

    #[test]
    fn offline_presence_omits_status() {
        let event = ServerEvent::PresenceUpdate(PresenceBroadcast {
            user_id: "u".to_string(),
            is_online: Some(false),
            status: None,
            last_seen: Utc::now(),
        });
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value["event"], "presenceUpdate");
        assert_eq!(value["data"]["isOnline"], false);
        assert!(value["data"].get("status").is_none());
        assert!(value["data"]["lastSeen"].is_string());
    }

    #[test]
    fn call_type_is_forwarded_as_sent() {
        let decode = |data: Value| match ClientEvent::decode(
            &json!({"event": "callUser", "data": data}).to_string(),
        ) {
            Ok(ClientEvent::CallUser(offer)) => offer,
            other => panic!("expected callUser, got {:?}", other),
        };

        let missing = decode(json!({"callerId": "a", "receiverId": "b", "signalData": {}}));
        assert!(missing.call_type.is_null());

        let screen = decode(json!({
            "callerId": "a", "receiverId": "b", "signalData": {}, "callType": "screen"
        }));
        assert_eq!(screen.call_type, "screen");

        let incoming = ServerEvent::IncomingCall(IncomingCall {
            caller_id: missing.caller_id,
            signal_data: missing.signal_data,
            call_type: missing.call_type,
        });
        let value: Value = serde_json::from_str(&incoming.encode().unwrap()).unwrap();
        assert!(value["data"].get("callType").is_none());
    }

    #[test]
    fn numeric_ids_are_accepted_as_text() {
        assert_eq!(
            ClientEvent::decode(r#"{"event":"addUser","data":42}"#).unwrap(),
            ClientEvent::AddUser("42".to_string())
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"joinGroup","data":7}"#).unwrap(),
            ClientEvent::JoinGroup("7".to_string())
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"endCall","data":{"receiverId":9}}"#).unwrap(),
            ClientEvent::EndCall(CallHangup {
                receiver_id: "9".to_string()
            })
        );
        assert!(ClientEvent::decode(r#"{"event":"addUser","data":{"id":1}}"#).is_err());
    }

    #[test]
    fn status_only_presence_leaves_online_flag_unset() {
        let event = ClientEvent::decode(
            r#"{"event":"updatePresence","data":{"userId":"u","status":"busy"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::UpdatePresence(PresenceChange {
                user_id: "u".to_string(),
                is_online: None,
                status: Some("busy".to_string()),
            })
        );

        let broadcast = ServerEvent::PresenceUpdate(PresenceBroadcast {
            user_id: "u".to_string(),
            is_online: None,
            status: Some("busy".to_string()),
            last_seen: Utc::now(),
        });
        let value: Value = serde_json::from_str(&broadcast.encode().unwrap()).unwrap();
        assert!(value["data"].get("isOnline").is_none());
        assert_eq!(value["data"]["status"], "busy");
    }
}
