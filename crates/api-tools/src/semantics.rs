//! HTTP semantics helpers.
//!
//! Operations are advertised with MCP `ToolAnnotations` derived from RFC 9110 method semantics,
//! so hosts can tell read-only lookups from writes without knowing the upstream.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations based on HTTP method semantics.
///
/// `openWorldHint` is always `true`: every operation talks to the remote API. For methods
/// outside GET/POST/PUT/PATCH/DELETE only `openWorldHint` is set.
#[must_use]
pub fn annotations_for_method(method: &Method) -> ToolAnnotations {
    // (read_only, destructive, idempotent)
    let hints = if [Method::GET, Method::HEAD, Method::OPTIONS].contains(method) {
        Some((true, false, Some(true)))
    } else if method == Method::POST {
        Some((false, false, Some(false)))
    } else if method == Method::PUT || method == Method::DELETE {
        Some((false, true, Some(true)))
    } else if method == Method::PATCH {
        // PATCH may or may not be idempotent; do not guess.
        Some((false, true, None))
    } else {
        None
    };

    let (read_only_hint, destructive_hint, idempotent_hint) = match hints {
        Some((read_only, destructive, idempotent)) => {
            (Some(read_only), Some(destructive), idempotent)
        }
        None => (None, None, None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint,
        destructive_hint,
        idempotent_hint,
        open_world_hint: Some(true),
    }
}
