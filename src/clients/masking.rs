//! Redaction helpers applied before anything reaches the log.

use serde_json::{Map, Value};

/// Parameter keys whose values are masked in logs.
pub const SENSITIVE_PARAMS: &[&str] = &[
    "first_name",
    "token",
    "subscriber_code",
    "signed_subscriber_id",
    "access_token",
    "refresh_token",
    "code",
    "code_verifier",
    "api_key",
    "api_secret",
    "client_secret",
];

/// Masks all but the last four characters of `value`.
///
/// Values shorter than four characters are returned unchanged.
///
/// ```rust
/// use convertkit_api::clients::mask_string;
///
/// assert_eq!(mask_string("abcdefgh"), "****efgh");
/// assert_eq!(mask_string("abc"), "abc");
/// ```
#[must_use]
pub fn mask_string(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 4 {
        return value.to_string();
    }
    let visible = chars.len() - 4;
    let mut masked = "*".repeat(visible);
    masked.extend(&chars[visible..]);
    masked
}

/// Returns a copy of `params` with sensitive values masked.
#[must_use]
pub fn mask_params(params: &Map<String, Value>) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| {
            let value = if SENSITIVE_PARAMS.contains(&key.as_str()) {
                mask_value(value)
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_string(s)),
        Value::Null => Value::Null,
        other => Value::String(mask_string(&other.to_string())),
    }
}

/// Masks the path segment following `profile/` in an endpoint.
///
/// ```rust
/// use convertkit_api::clients::mask_endpoint;
///
/// assert_eq!(mask_endpoint("profile/abcdefgh"), "profile/****efgh");
/// assert_eq!(mask_endpoint("forms"), "forms");
/// ```
#[must_use]
pub fn mask_endpoint(endpoint: &str) -> String {
    const MARKER: &str = "profile/";
    let Some(start) = endpoint.find(MARKER) else {
        return endpoint.to_string();
    };
    let segment_start = start + MARKER.len();
    let rest = &endpoint[segment_start..];
    let segment_end = rest.find(['/', '?']).unwrap_or(rest.len());
    format!(
        "{}{}{}",
        &endpoint[..segment_start],
        mask_string(&rest[..segment_end]),
        &rest[segment_end..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mask_string_keeps_last_four() {
        assert_eq!(mask_string("abcdefgh"), "****efgh");
        assert_eq!(mask_string("abcdefghij"), "******ghij");
        assert_eq!(mask_string("abcd"), "abcd");
    }

    #[test]
    fn test_mask_string_short_values_unmasked() {
        assert_eq!(mask_string(""), "");
        assert_eq!(mask_string("a"), "a");
        assert_eq!(mask_string("abc"), "abc");
    }

    #[test]
    fn test_mask_string_counts_characters_not_bytes() {
        assert_eq!(mask_string("ééééabcd"), "****abcd");
    }

    #[test]
    fn test_mask_params_only_touches_sensitive_keys() {
        let params = json!({
            "email_address": "jane@example.com",
            "first_name": "Jonathan",
            "token": "tok_1234567890",
            "per_page": 100
        });
        let masked = mask_params(params.as_object().unwrap());

        assert_eq!(masked["email_address"], "jane@example.com");
        assert_eq!(masked["first_name"], "****than");
        assert_eq!(masked["token"], "**********7890");
        assert_eq!(masked["per_page"], 100);
    }

    #[test]
    fn test_mask_endpoint_masks_profile_segment_only() {
        assert_eq!(
            mask_endpoint("profile/signed-subscriber-id"),
            "profile/****************r-id"
        );
        assert_eq!(
            mask_endpoint("wordpress/profile/abcdefgh/extra"),
            "wordpress/profile/****efgh/extra"
        );
        assert_eq!(mask_endpoint("subscribers"), "subscribers");
    }
}
