//! Redaction of sensitive data in captured HTTP exchanges.
//!
//! Three independent, structure-preserving maskers:
//!
//! | Target        | Matched by                               | Fallback on bad input     |
//! |---------------|------------------------------------------|---------------------------|
//! | Headers       | header name, case-insensitive            | n/a                       |
//! | JSON bodies   | dotted field path, fanned out over arrays | body returned unchanged   |
//! | Query strings | parameter name, case-insensitive         | URI returned unchanged    |
//!
//! # Usage
//!
//! ```
//! use wiretap_observability::obfuscator::{mask_json_body, mask_query_parameters, MASK};
//!
//! let body = mask_json_body(r#"{"a":{"b":"secret"}}"#, &["a.b".to_string()]);
//! assert_eq!(body, r#"{"a":{"b":"******"}}"#);
//!
//! let uri: http::Uri = "http://h/p?token=abc&x=1".parse().unwrap();
//! let masked = mask_query_parameters(&uri, &["token".to_string()]);
//! assert_eq!(masked.query(), Some("token=******&x=1"));
//! ```

use http::Uri;
use http::uri::PathAndQuery;
use serde_json::Value;
use wiretap_core::record::HeaderList;

/// Replacement string used for all masked values.
pub const MASK: &str = "******";

fn is_sensitive(name: &str, sensitive: &[String]) -> bool {
    sensitive.iter().any(|s| s.eq_ignore_ascii_case(name))
}

// ─────────────────────────────────────────────────────────────
// Header masking
// ─────────────────────────────────────────────────────────────

/// Replace the values of every sensitive header with a single [`MASK`] value.
///
/// Order is preserved and non-sensitive headers pass through untouched.
pub fn mask_headers(headers: HeaderList, sensitive: &[String]) -> HeaderList {
    headers
        .into_iter()
        .map(|(name, values)| {
            if is_sensitive(&name, sensitive) {
                (name, vec![MASK.to_string()])
            } else {
                (name, values)
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────
// JSON body masking
// ─────────────────────────────────────────────────────────────

/// Mask every dotted `field_paths` entry in a JSON document.
///
/// Missing segments are skipped silently. Arrays met along the way apply the
/// remaining path to each element. A body that is not valid JSON is returned
/// as-is.
pub fn mask_json_body(body: &str, field_paths: &[String]) -> String {
    if field_paths.is_empty() {
        return body.to_string();
    }
    let mut root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.to_string(),
    };
    for path in field_paths {
        let keys: Vec<&str> = path.split('.').collect();
        mask_path(&mut root, &keys);
    }
    serde_json::to_string(&root).unwrap_or_else(|_| body.to_string())
}

fn mask_path(node: &mut Value, keys: &[&str]) {
    let Some((current, rest)) = keys.split_first() else {
        return;
    };
    match node {
        Value::Object(map) => {
            if rest.is_empty() {
                if let Some(value) = map.get_mut(*current) {
                    *value = Value::String(MASK.to_string());
                }
            } else if let Some(child) = map.get_mut(*current) {
                mask_path(child, rest);
            }
        }
        Value::Array(items) => {
            for item in items {
                mask_path(item, keys);
            }
        }
        // Path runs past a scalar leaf: nothing to mask.
        _ => {}
    }
}

// ─────────────────────────────────────────────────────────────
// Query parameter masking
// ─────────────────────────────────────────────────────────────

/// Mask the values of sensitive query parameters, keeping scheme, authority,
/// path and pair order. Pairs without `=` pass through unchanged.
pub fn mask_query_parameters(uri: &Uri, params: &[String]) -> Uri {
    let Some(query) = uri.query() else {
        return uri.clone();
    };
    if params.is_empty() {
        return uri.clone();
    }

    let masked = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive(key, params) => format!("{key}={MASK}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    let path_and_query = match PathAndQuery::try_from(format!("{}?{}", uri.path(), masked)) {
        Ok(pq) => pq,
        Err(e) => {
            tracing::debug!(error = %e, "query masking produced an invalid URI, keeping original");
            return uri.clone();
        }
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).unwrap_or_else(|_| uri.clone())
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
