//! The wire protocol of the upstream feed.
//!
//! Subscriptions are declarative: every control frame is a JSON array of the
//! form `[{ticket}, {type, codes}..., {format}]` and fully replaces whatever
//! was subscribed before it. There is no incremental subscribe or unsubscribe
//! on the wire; the registry recomputes the whole desired set instead.

use core_types::{ChannelKey, ChannelKind, MarketMessage};
use serde_json::{json, Value};

/// Builds the control frame for one desired set.
///
/// Channel kinds with no subscribed codes are omitted entirely; an empty
/// desired set still produces a valid frame (ticket and format only), which
/// clears every subscription upstream.
pub fn control_frame(ticket: &str, format: &str, desired: &[ChannelKey]) -> String {
    let mut frame = vec![json!({ "ticket": ticket })];
    for kind in ChannelKind::ALL {
        let codes: Vec<&str> = desired
            .iter()
            .filter(|key| key.kind == kind)
            .map(|key| key.code.as_str())
            .collect();
        if !codes.is_empty() {
            frame.push(json!({ "type": kind.as_str(), "codes": codes }));
        }
    }
    frame.push(json!({ "format": format }));
    Value::Array(frame).to_string()
}

/// Decodes one inbound text or binary frame into a typed message.
pub fn decode_message(payload: &[u8]) -> Result<MarketMessage, serde_json::Error> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_groups_codes_by_channel_kind() {
        let desired = vec![
            ChannelKey::new(ChannelKind::Orderbook, "KRW-BTC"),
            ChannelKey::new(ChannelKind::Ticker, "KRW-BTC"),
            ChannelKey::new(ChannelKind::Ticker, "KRW-ETH"),
        ];
        let frame: Value = serde_json::from_str(&control_frame("uptick", "DEFAULT", &desired)).unwrap();

        let parts = frame.as_array().unwrap();
        assert_eq!(parts[0]["ticket"], "uptick");
        assert_eq!(parts[1]["type"], "ticker");
        assert_eq!(parts[1]["codes"], json!(["KRW-BTC", "KRW-ETH"]));
        assert_eq!(parts[2]["type"], "orderbook");
        assert_eq!(parts[3]["format"], "DEFAULT");
        // No trade subscriptions: no trade element at all.
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn empty_desired_set_still_produces_a_valid_frame() {
        let frame: Value = serde_json::from_str(&control_frame("uptick", "DEFAULT", &[])).unwrap();
        let parts = frame.as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["ticket"], "uptick");
        assert_eq!(parts[1]["format"], "DEFAULT");
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        assert!(decode_message(b"not json").is_err());
        assert!(decode_message(br#"{"type": "unknown", "code": "KRW-BTC"}"#).is_err());
    }
}
