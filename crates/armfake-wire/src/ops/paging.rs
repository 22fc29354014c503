//! Paged list bodies and continuation tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBody<T> {
    pub value: Vec<T>,
    /// Link to the next page; absent on the last page.
    #[serde(rename = "nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// Encode a pager cursor as an opaque skip token.
pub fn encode_skip_token(cursor: usize) -> String {
    URL_SAFE_NO_PAD.encode(cursor.to_string())
}

/// Decode a skip token produced by [`encode_skip_token`].
pub fn decode_skip_token(token: &str) -> Result<usize, WireError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| WireError::SkipTokenEncoding(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| WireError::SkipTokenCursor(e.to_string()))?;
    text.parse::<usize>()
        .map_err(|e| WireError::SkipTokenCursor(format!("{}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_token_roundtrip() {
        for cursor in [0, 1, 42, 10_000] {
            assert_eq!(decode_skip_token(&encode_skip_token(cursor)).unwrap(), cursor);
        }
    }

    #[test]
    fn test_skip_token_rejects_garbage() {
        assert!(matches!(decode_skip_token("!!!"), Err(WireError::SkipTokenEncoding(_))));
        let not_a_number = URL_SAFE_NO_PAD.encode("abc");
        assert!(matches!(decode_skip_token(&not_a_number), Err(WireError::SkipTokenCursor(_))));
    }

    #[test]
    fn test_page_body_next_link_name() {
        let page = PageBody {
            value: vec![1, 2],
            next_link: Some("https://fake.local/pages/x".to_string()),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["nextLink"], "https://fake.local/pages/x");

        let last: PageBody<i32> = serde_json::from_str(r#"{"value": [3]}"#).unwrap();
        assert!(last.next_link.is_none());
    }
}
