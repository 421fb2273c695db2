//! Request descriptors: the transient, fully-resolved shape of one upstream call.

use crate::config::{CLIENT_ID, CredentialPlacement, Secret};
use crate::error::{DispatchError, Result};
use crate::redact::{is_sensitive_header, redact_url};
use crate::registry::{Location, Operation};
use crate::validate::ValidatedArgs;
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

/// Everything needed to perform one upstream request. Built per invocation, consumed by
/// [`crate::upstream::Upstream::execute`].
#[derive(Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query pairs in order, decoded.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url.query_pairs().into_owned().collect()
    }
}

// Never print credential values: URL query and sensitive headers are masked.
impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let shown = if is_sensitive_header(k) { "***" } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect();
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &redact_url(&self.url))
            .field("headers", &headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryPair {
    key: String,
    value: String,
}

/// Build the request for `op` from validated arguments.
///
/// `credential` is the effective credential (call argument, else configuration); it is
/// attached only when present.
///
/// # Errors
///
/// Returns [`DispatchError::Internal`] if the operation's mapping rule cannot be applied (an
/// unsubstituted path placeholder, conflicting body destinations, or an unparsable URL).
pub fn build_request(
    base_url: &Url,
    op: &Operation,
    args: &ValidatedArgs,
    credential: Option<&Secret>,
) -> Result<RequestDescriptor> {
    let mut path = op.path.to_string();
    let mut query_params: Vec<QueryPair> = Vec::new();
    let mut headers: Vec<(String, String)> = vec![("User-Agent".to_string(), CLIENT_ID.to_string())];
    let mut body_fields: Map<String, Value> = Map::new();
    let mut raw_body: Option<String> = None;

    for (param, value) in &args.values {
        match param.location {
            Location::Path => {
                let segment = encode_component(&value_to_string(value));
                path = path.replace(&format!("{{{}}}", param.name), &segment);
            }
            Location::Query => query_params.push(QueryPair {
                key: param.name.to_string(),
                value: value_to_string(value),
            }),
            Location::Body => {
                body_fields.insert(param.name.to_string(), value.clone());
            }
            Location::RawBody => raw_body = Some(value_to_string(value)),
            Location::Credential => {}
        }
    }

    if path.contains('{') {
        return Err(DispatchError::Internal(format!(
            "unresolved path template for operation '{}'",
            op.name
        )));
    }

    if let (Some(kind), Some(secret)) = (op.credential, credential) {
        match kind.placement() {
            CredentialPlacement::Query(name) => query_params.push(QueryPair {
                key: name.to_string(),
                value: secret.expose().to_string(),
            }),
            CredentialPlacement::Header(name) => {
                headers.push((name.to_string(), secret.expose().to_string()));
            }
            CredentialPlacement::Bearer => headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", secret.expose()),
            )),
        }
    }

    let body = match (raw_body, body_fields.is_empty()) {
        (Some(_), false) => {
            return Err(DispatchError::Internal(format!(
                "operation '{}' mixes raw and JSON body parameters",
                op.name
            )));
        }
        (Some(text), true) => Some(RequestBody::Text(text)),
        (None, false) => Some(RequestBody::Json(Value::Object(body_fields))),
        (None, true) => None,
    };

    let url = build_url(base_url, &path, &query_params)?;

    Ok(RequestDescriptor {
        method: op.verb.method(),
        url,
        headers,
        body,
    })
}

fn build_url(base_url: &Url, path: &str, query_params: &[QueryPair]) -> Result<Url> {
    let url = format!("{}{}", base_url.as_str().trim_end_matches('/'), path);
    let mut url =
        Url::parse(&url).map_err(|e| DispatchError::Internal(format!("invalid URL: {e}")))?;

    if !query_params.is_empty() {
        let query = query_params
            .iter()
            .map(|p| format!("{}={}", encode_component(&p.key), encode_component(&p.value)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    Ok(url)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_component(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
