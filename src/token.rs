// Bearer token helpers: decode the claims segment of a management API
// token and pull the API base URL out of its audience. No signature
// verification happens here; the token is only read, never trusted.

use base64::engine::general_purpose;
use base64::Engine as _;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Substring the audience must contain to be usable as an API base URL.
pub const API_PATH_MARKER: &str = "/api/v2/";

const AUDIENCE_CLAIM: &str = "aud";

pub type Claims = Map<String, Value>;

/// Decode the middle segment of `token` into its claims object.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(Error::MalformedToken {
            segments: segments.len(),
        });
    }

    let payload = pad_base64(segments[1]);
    // Tokens are base64url, but tolerate the standard alphabet as well.
    let bytes = general_purpose::URL_SAFE
        .decode(&payload)
        .or_else(|_| general_purpose::STANDARD.decode(&payload))
        .map_err(|e| Error::Decode(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(other) => Err(Error::Decode(format!(
            "claims segment is not a JSON object: {other}"
        ))),
        Err(e) => Err(Error::Decode(e.to_string())),
    }
}

/// Return the audience claim verbatim as the API base URL.
///
/// The value is not normalized: a trailing slash stays, so resource paths
/// are concatenated directly onto it (`{url}users`). When the audience is
/// an array, the first entry carrying [`API_PATH_MARKER`] wins.
pub fn api_url_from_claims(claims: &Claims) -> Result<String> {
    let aud = claims
        .get(AUDIENCE_CLAIM)
        .ok_or(Error::MissingClaim(AUDIENCE_CLAIM))?;

    let candidate = match aud {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| s.contains(API_PATH_MARKER)),
        _ => None,
    };

    match candidate {
        Some(url) if url.contains(API_PATH_MARKER) => Ok(url.to_string()),
        _ => Err(Error::InvalidAudience {
            marker: API_PATH_MARKER,
            audience: audience_display(aud),
        }),
    }
}

/// Decode `token` and extract the API base URL in one step.
pub fn extract_api_url(token: &str) -> Result<String> {
    let claims = decode_claims(token)?;
    let url = api_url_from_claims(&claims)?;
    debug!(api_url = %url, "extracted API URL from token audience");
    Ok(url)
}

fn pad_base64(segment: &str) -> String {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    padded
}

fn audience_display(aud: &Value) -> String {
    match aud {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(claims: Value) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("eyJhbGciOiJSUzI1NiJ9.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn extracts_audience_verbatim() {
        let token = token_with(json!({
            "aud": "https://tenant.eu.auth0.com/api/v2/",
            "sub": "client@clients"
        }));
        assert_eq!(
            extract_api_url(&token).unwrap(),
            "https://tenant.eu.auth0.com/api/v2/"
        );
    }

    #[test]
    fn keeps_missing_trailing_slash_as_is() {
        let token = token_with(json!({ "aud": "https://t.auth0.com/api/v2/x" }));
        assert_eq!(extract_api_url(&token).unwrap(), "https://t.auth0.com/api/v2/x");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        match decode_claims("only.two") {
            Err(Error::MalformedToken { segments }) => assert_eq!(segments, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            decode_claims("a.b.c.d"),
            Err(Error::MalformedToken { segments: 4 })
        ));
    }

    #[test]
    fn rejects_undecodable_payload() {
        assert!(matches!(decode_claims("a.!!!.c"), Err(Error::Decode(_))));

        let not_json = general_purpose::URL_SAFE_NO_PAD.encode("not json");
        assert!(matches!(
            decode_claims(&format!("a.{not_json}.c")),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn decodes_unpadded_segments() {
        // encoded lengths needing zero, two and one padding characters
        for aud in [
            "https://a.io/api/v2/",
            "https://ab.io/api/v2/",
            "https://abc.io/api/v2/",
        ] {
            let token = token_with(json!({ "aud": aud }));
            assert_eq!(extract_api_url(&token).unwrap(), aud);
        }
    }

    #[test]
    fn missing_audience() {
        let token = token_with(json!({ "sub": "x" }));
        assert!(matches!(
            extract_api_url(&token),
            Err(Error::MissingClaim("aud"))
        ));
    }

    #[test]
    fn audience_without_api_path() {
        let token = token_with(json!({ "aud": "https://tenant.auth0.com/userinfo" }));
        match extract_api_url(&token) {
            Err(Error::InvalidAudience { audience, .. }) => {
                assert_eq!(audience, "https://tenant.auth0.com/userinfo")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn audience_array_picks_api_entry() {
        let token = token_with(json!({
            "aud": ["https://tenant.auth0.com/userinfo", "https://tenant.auth0.com/api/v2/"]
        }));
        assert_eq!(
            extract_api_url(&token).unwrap(),
            "https://tenant.auth0.com/api/v2/"
        );
    }
}
