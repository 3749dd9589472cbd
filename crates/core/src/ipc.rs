//! Typed messages exchanged between the engine process and the UI side
//!
//! Every message is `{ "messageType": <tag>, "data": <payload> }` on the wire.
//! The tag set is closed: anything outside [`MESSAGE_TYPES`] is ignored by
//! receivers, never treated as an error.

use crate::config::ConfigRecord;
use crate::types::{Balance, SyncStatus, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Every tag a receiver understands
pub const MESSAGE_TYPES: [&str; 14] = [
    "config",
    "stopRequest",
    "backendStopped",
    "saveWalletResponse",
    "walletActiveStatus",
    "primaryAddress",
    "transactionList",
    "syncStatus",
    "balance",
    "nodeFee",
    "sendTransactionResponse",
    "backendLogLine",
    "openNewWallet",
    "saveWalletAs",
];

/// The two processes the supervisor pairs up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessRole {
    /// Privileged process holding the wallet and sync state
    Engine,
    /// Unprivileged side holding the view-state cache
    Ui,
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Engine => write!(f, "engine"),
            ProcessRole::Ui => write!(f, "ui"),
        }
    }
}

/// Relay messages, one variant per tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType", content = "data", rename_all = "camelCase")]
pub enum RelayMessage {
    /// Supervisor -> both at startup, UI -> engine after a settings change
    Config(ConfigPayload),
    /// UI/tray -> engine: save and shut down
    StopRequest,
    /// Engine -> supervisor: stop finished
    BackendStopped,
    /// Engine -> UI: whether the last save succeeded
    SaveWalletResponse(bool),
    /// Engine -> UI: whether a wallet is open
    WalletActiveStatus(bool),
    /// Engine -> UI
    PrimaryAddress(String),
    /// Engine -> UI: most recent first, as sent
    TransactionList(Vec<Transaction>),
    /// Engine -> UI
    SyncStatus(SyncStatus),
    /// Engine -> UI
    Balance(Balance),
    /// Engine -> UI: node fee in atomic units
    NodeFee(i64),
    /// Engine -> UI
    SendTransactionResponse(SendTransactionResponse),
    /// Engine -> UI: one line of daemon/engine log output
    BackendLogLine(String),
    /// UI -> engine: close the current wallet, optionally naming the next one
    OpenNewWallet(Option<String>),
    /// UI -> engine
    SaveWalletAs(SaveWalletRequest),
}

/// Payload of the `config` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    pub config: ConfigRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

/// Payload of the `saveWalletAs` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWalletRequest {
    pub notify: bool,
    pub save_path: String,
}

/// Payload of `sendTransactionResponse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SendTransactionError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionError {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub custom_message: Option<String>,
}

impl SendTransactionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }

    /// Human-readable failure reason, if the engine supplied one
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref()?.custom_message.as_deref()
    }
}

impl RelayMessage {
    /// Wire tag of this message
    pub fn message_type(&self) -> &'static str {
        match self {
            RelayMessage::Config(_) => "config",
            RelayMessage::StopRequest => "stopRequest",
            RelayMessage::BackendStopped => "backendStopped",
            RelayMessage::SaveWalletResponse(_) => "saveWalletResponse",
            RelayMessage::WalletActiveStatus(_) => "walletActiveStatus",
            RelayMessage::PrimaryAddress(_) => "primaryAddress",
            RelayMessage::TransactionList(_) => "transactionList",
            RelayMessage::SyncStatus(_) => "syncStatus",
            RelayMessage::Balance(_) => "balance",
            RelayMessage::NodeFee(_) => "nodeFee",
            RelayMessage::SendTransactionResponse(_) => "sendTransactionResponse",
            RelayMessage::BackendLogLine(_) => "backendLogLine",
            RelayMessage::OpenNewWallet(_) => "openNewWallet",
            RelayMessage::SaveWalletAs(_) => "saveWalletAs",
        }
    }

    /// Decode a `{messageType, data}` object.
    ///
    /// Unknown tags give `Ok(None)`. A known tag with a payload of the wrong
    /// shape is an error the caller is expected to log and drop.
    pub fn decode(value: Value) -> Result<Option<Self>, serde_json::Error> {
        let known = value
            .get("messageType")
            .and_then(Value::as_str)
            .is_some_and(|tag| MESSAGE_TYPES.contains(&tag));
        if !known {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }

    /// Decode from a JSON string, see [`RelayMessage::decode`]
    pub fn decode_str(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        Self::decode(serde_json::from_str(raw)?)
    }

    /// Messages the engine may receive
    pub fn is_engine_bound(&self) -> bool {
        matches!(
            self,
            RelayMessage::Config(_)
                | RelayMessage::StopRequest
                | RelayMessage::OpenNewWallet(_)
                | RelayMessage::SaveWalletAs(_)
        )
    }

    /// Messages the UI may receive
    pub fn is_ui_bound(&self) -> bool {
        matches!(
            self,
            RelayMessage::Config(_)
                | RelayMessage::SaveWalletResponse(_)
                | RelayMessage::WalletActiveStatus(_)
                | RelayMessage::PrimaryAddress(_)
                | RelayMessage::TransactionList(_)
                | RelayMessage::SyncStatus(_)
                | RelayMessage::Balance(_)
                | RelayMessage::NodeFee(_)
                | RelayMessage::SendTransactionResponse(_)
                | RelayMessage::BackendLogLine(_)
        )
    }
}

/// One line on the engine's stdio pipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "camelCase")]
pub enum EngineFrame {
    /// Engine finished loading and can take messages
    Loaded,
    /// A relay message; kept as raw JSON so unknown tags survive framing
    Message { message: Value },
}

/// What a parsed engine line means to the supervisor
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Loaded,
    Message(RelayMessage),
    /// Well-formed frame carrying a tag nobody handles
    Ignored,
}

/// Parse one line written by the engine
pub fn parse_engine_line(line: &str) -> Result<EngineOutput, serde_json::Error> {
    match serde_json::from_str::<EngineFrame>(line)? {
        EngineFrame::Loaded => Ok(EngineOutput::Loaded),
        EngineFrame::Message { message } => Ok(match RelayMessage::decode(message)? {
            Some(message) => EngineOutput::Message(message),
            None => EngineOutput::Ignored,
        }),
    }
}

/// Encode a message as one engine-bound line (without the trailing newline)
pub fn encode_engine_line(message: &RelayMessage) -> Result<String, serde_json::Error> {
    let frame = EngineFrame::Message {
        message: serde_json::to_value(message)?,
    };
    serde_json::to_string(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_uses_message_type_and_data() {
        let message = RelayMessage::SyncStatus(SyncStatus::new(1, 2, 3));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "messageType": "syncStatus", "data": [1, 2, 3] })
        );
    }

    #[test]
    fn test_unit_messages_have_no_payload() {
        let value = serde_json::to_value(RelayMessage::StopRequest).unwrap();
        assert_eq!(value, json!({ "messageType": "stopRequest" }));
        assert_eq!(
            RelayMessage::decode(json!({ "messageType": "backendStopped" })).unwrap(),
            Some(RelayMessage::BackendStopped)
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let decoded = RelayMessage::decode(json!({ "messageType": "fiatRate", "data": 3 }));
        assert_eq!(decoded.unwrap(), None);
        assert_eq!(RelayMessage::decode(json!({ "data": 3 })).unwrap(), None);
    }

    #[test]
    fn test_known_type_with_bad_payload_is_error() {
        let decoded = RelayMessage::decode(json!({ "messageType": "balance", "data": "lots" }));
        assert!(decoded.is_err());
    }

    #[test]
    fn test_every_variant_tag_is_listed() {
        let samples = vec![
            RelayMessage::Config(ConfigPayload {
                config: ConfigRecord::new(),
                config_path: None,
            }),
            RelayMessage::StopRequest,
            RelayMessage::BackendStopped,
            RelayMessage::SaveWalletResponse(true),
            RelayMessage::WalletActiveStatus(false),
            RelayMessage::PrimaryAddress("TRTL".into()),
            RelayMessage::TransactionList(vec![]),
            RelayMessage::SyncStatus(SyncStatus::default()),
            RelayMessage::Balance(Balance::default()),
            RelayMessage::NodeFee(10),
            RelayMessage::SendTransactionResponse(SendTransactionResponse {
                status: "SUCCESS".into(),
                hash: None,
                error: None,
            }),
            RelayMessage::BackendLogLine("line".into()),
            RelayMessage::OpenNewWallet(None),
            RelayMessage::SaveWalletAs(SaveWalletRequest {
                notify: true,
                save_path: "/tmp/w.wallet".into(),
            }),
        ];
        assert_eq!(samples.len(), MESSAGE_TYPES.len());
        for message in samples {
            let tag = message.message_type();
            assert!(MESSAGE_TYPES.contains(&tag));
            let value = serde_json::to_value(&message).unwrap();
            assert_eq!(value["messageType"], tag);
            assert_eq!(RelayMessage::decode(value).unwrap(), Some(message));
        }
    }

    #[test]
    fn test_config_payload_path_is_optional() {
        let decoded = RelayMessage::decode(json!({
            "messageType": "config",
            "data": { "config": { "darkMode": true } }
        }))
        .unwrap();
        match decoded {
            Some(RelayMessage::Config(payload)) => {
                assert_eq!(payload.config["darkMode"], true);
                assert!(payload.config_path.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_send_transaction_failure_message() {
        let decoded = RelayMessage::decode(json!({
            "messageType": "sendTransactionResponse",
            "data": { "status": "FAILURE", "error": { "errorCode": 8, "customMessage": "Not enough funds" } }
        }))
        .unwrap();
        let Some(RelayMessage::SendTransactionResponse(response)) = decoded else {
            panic!("expected sendTransactionResponse");
        };
        assert!(!response.is_success());
        assert_eq!(response.error_message(), Some("Not enough funds"));
    }

    #[test]
    fn test_direction_tables() {
        assert!(RelayMessage::StopRequest.is_engine_bound());
        assert!(!RelayMessage::StopRequest.is_ui_bound());
        assert!(RelayMessage::NodeFee(1).is_ui_bound());
        assert!(!RelayMessage::BackendStopped.is_ui_bound());
        assert!(!RelayMessage::BackendStopped.is_engine_bound());
    }

    #[test]
    fn test_engine_line_framing() {
        assert_eq!(
            parse_engine_line(r#"{"frame":"loaded"}"#).unwrap(),
            EngineOutput::Loaded
        );
        assert_eq!(
            parse_engine_line(
                r#"{"frame":"message","message":{"messageType":"nodeFee","data":25}}"#
            )
            .unwrap(),
            EngineOutput::Message(RelayMessage::NodeFee(25))
        );
        assert_eq!(
            parse_engine_line(
                r#"{"frame":"message","message":{"messageType":"somethingNew","data":{}}}"#
            )
            .unwrap(),
            EngineOutput::Ignored
        );
        assert!(parse_engine_line("not json").is_err());

        let line = encode_engine_line(&RelayMessage::StopRequest).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&line).unwrap(),
            json!({ "frame": "message", "message": { "messageType": "stopRequest" } })
        );
    }
}
