//! Inbound callback event parsing.
//!
//! The callback body carries a list of events. The dispatcher only cares
//! about two kinds, so everything else collapses into `Unsupported` and is
//! matched exhaustively rather than dropped by an implicit registry.

use serde_json::Value;

use crate::errors::RelayError;

/// One event from a callback delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// User sent a text message; carries the one-time reply token.
    Text { text: String, reply_token: String },
    /// User sent an image; content is fetched separately by message id.
    Image {
        message_id: String,
        reply_token: String,
    },
    /// Anything else (stickers, follows, unsends, ...). Ignored downstream.
    Unsupported,
}

/// Parse a raw callback body into its events.
///
/// A body without an `events` array is malformed; individual events of
/// unknown shape degrade to [`CallbackEvent::Unsupported`] instead of
/// failing the whole delivery.
pub fn parse_callback_events(body: &str) -> Result<Vec<CallbackEvent>, RelayError> {
    let json: Value = serde_json::from_str(body)?;

    let events = json
        .get("events")
        .and_then(|e| e.as_array())
        .ok_or_else(|| RelayError::ParseError("callback body has no events array".to_string()))?;

    Ok(events.iter().map(parse_event).collect())
}

fn parse_event(event: &Value) -> CallbackEvent {
    let event_type = event.get("type").and_then(|t| t.as_str()).unwrap_or("");
    if event_type != "message" {
        return CallbackEvent::Unsupported;
    }

    let Some(reply_token) = event.get("replyToken").and_then(|t| t.as_str()) else {
        return CallbackEvent::Unsupported;
    };

    let message_type = event
        .get("message")
        .and_then(|m| m.get("type"))
        .and_then(|t| t.as_str())
        .unwrap_or("");

    match message_type {
        "text" => {
            let text = event
                .get("message")
                .and_then(|m| m.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or("")
                .to_string();
            CallbackEvent::Text {
                text,
                reply_token: reply_token.to_string(),
            }
        }
        "image" => {
            let Some(message_id) = event
                .get("message")
                .and_then(|m| m.get("id"))
                .and_then(|i| i.as_str())
            else {
                return CallbackEvent::Unsupported;
            };
            CallbackEvent::Image {
                message_id: message_id.to_string(),
                reply_token: reply_token.to_string(),
            }
        }
        _ => CallbackEvent::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_text_event() {
        let body = r#"{
            "destination": "U0000",
            "events": [{
                "type": "message",
                "replyToken": "r-123",
                "message": { "type": "text", "id": "m-1", "text": "show me" }
            }]
        }"#;

        let events = parse_callback_events(body).unwrap();
        assert_eq!(
            events,
            vec![CallbackEvent::Text {
                text: "show me".to_string(),
                reply_token: "r-123".to_string(),
            }]
        );
    }

    #[test]
    fn test_parses_image_event() {
        let body = r#"{
            "events": [{
                "type": "message",
                "replyToken": "r-456",
                "message": { "type": "image", "id": "m-2" }
            }]
        }"#;

        let events = parse_callback_events(body).unwrap();
        assert_eq!(
            events,
            vec![CallbackEvent::Image {
                message_id: "m-2".to_string(),
                reply_token: "r-456".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_events_are_unsupported_not_errors() {
        let body = r#"{
            "events": [
                { "type": "follow", "replyToken": "r-1" },
                { "type": "message", "replyToken": "r-2",
                  "message": { "type": "sticker", "id": "m-3" } }
            ]
        }"#;

        let events = parse_callback_events(body).unwrap();
        assert_eq!(
            events,
            vec![CallbackEvent::Unsupported, CallbackEvent::Unsupported]
        );
    }

    #[test]
    fn test_body_without_events_is_an_error() {
        let err = parse_callback_events(r#"{"destination":"U0"}"#).unwrap_err();
        assert!(err.to_string().contains("no events array"));
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        assert!(parse_callback_events("not json").is_err());
    }
}
