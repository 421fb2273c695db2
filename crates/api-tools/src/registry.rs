//! Operation registry.
//!
//! Every operation is plain data: a parameter schema plus an upstream mapping rule. The
//! dispatcher interprets these records; nothing here performs I/O.

use crate::catalog::CATALOG;
use crate::config::CredentialKind;
use crate::error::{DispatchError, Result};
use reqwest::Method;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::sync::Arc;

/// Upper bound used for free-text parameters.
pub const MAX_TEXT_CHARS: usize = 2048;
/// Upper bound used for identifier-like parameters (path segments, tokens).
pub const MAX_ID_CHARS: usize = 256;

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
}

impl Verb {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
        }
    }
}

/// Semantic type (and constraints) of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String { max_len: usize },
    Enum(&'static [&'static str]),
    Integer { min: i64, max: i64 },
    StringArray { max_items: usize },
    /// Absolute `http(s)` URL.
    Url,
}

/// Destination of a parameter on the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Query,
    /// Substituted into `{name}` in the path template, percent-encoded.
    Path,
    /// Field of the JSON body.
    Body,
    /// The whole request body, sent as text.
    RawBody,
    /// Per-call override of the operation's credential.
    Credential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Strs(&'static [&'static str]),
}

impl DefaultValue {
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Str(s) => json!(s),
            Self::Int(i) => json!(i),
            Self::Strs(items) => json!(items),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamType,
    pub location: Location,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl Param {
    #[must_use]
    pub const fn new(
        name: &'static str,
        description: &'static str,
        kind: ParamType,
        location: Location,
    ) -> Self {
        Self {
            name,
            description,
            kind,
            location,
            required: false,
            default: None,
        }
    }

    #[must_use]
    pub const fn query(name: &'static str, description: &'static str, kind: ParamType) -> Self {
        Self::new(name, description, kind, Location::Query)
    }

    #[must_use]
    pub const fn body(name: &'static str, description: &'static str, kind: ParamType) -> Self {
        Self::new(name, description, kind, Location::Body)
    }

    /// Path segments are always required identifiers.
    #[must_use]
    pub const fn path(name: &'static str, description: &'static str) -> Self {
        Self::new(
            name,
            description,
            ParamType::String {
                max_len: MAX_ID_CHARS,
            },
            Location::Path,
        )
        .required()
    }

    #[must_use]
    pub const fn raw_body(name: &'static str, description: &'static str) -> Self {
        Self::new(
            name,
            description,
            ParamType::String {
                max_len: MAX_TEXT_CHARS * 32,
            },
            Location::RawBody,
        )
    }

    /// The per-call credential argument, always named `token`. Bounded loosely: bearer
    /// tokens (JWTs) routinely exceed identifier length.
    #[must_use]
    pub const fn token(description: &'static str) -> Self {
        Self::new(
            "token",
            description,
            ParamType::String {
                max_len: MAX_TEXT_CHARS,
            },
            Location::Credential,
        )
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// JSON Schema fragment advertised for this parameter.
    #[must_use]
    pub fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamType::String { max_len } => json!({ "type": "string", "maxLength": max_len }),
            ParamType::Enum(values) => json!({ "type": "string", "enum": values }),
            ParamType::Integer { min, max } => {
                json!({ "type": "integer", "minimum": min, "maximum": max })
            }
            ParamType::StringArray { max_items } => json!({
                "type": "array",
                "items": { "type": "string" },
                "maxItems": max_items,
            }),
            ParamType::Url => json!({
                "type": "string",
                "format": "uri",
                "maxLength": MAX_TEXT_CHARS,
            }),
        };
        schema["description"] = json!(self.description);
        if let Some(default) = self.default {
            schema["default"] = default.to_value();
        }
        schema
    }
}

/// A named, schema-described capability mapping to exactly one upstream request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub description: &'static str,
    pub verb: Verb,
    /// Path template relative to the upstream origin, e.g. `/api/kv/{key}`.
    pub path: &'static str,
    pub params: &'static [Param],
    pub credential: Option<CredentialKind>,
    /// When non-empty, at least one of these parameters must be supplied.
    pub require_any: &'static [&'static str],
}

impl Operation {
    #[must_use]
    pub const fn new(
        name: &'static str,
        description: &'static str,
        verb: Verb,
        path: &'static str,
        params: &'static [Param],
    ) -> Self {
        Self {
            name,
            description,
            verb,
            path,
            params,
            credential: None,
            require_any: &[],
        }
    }

    #[must_use]
    pub const fn credential(mut self, kind: CredentialKind) -> Self {
        self.credential = Some(kind);
        self
    }

    #[must_use]
    pub const fn require_any(mut self, names: &'static [&'static str]) -> Self {
        self.require_any = names;
        self
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'static Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameters a caller must always supply (required and without a default).
    pub fn required_params(&self) -> impl Iterator<Item = &'static Param> + '_ {
        self.params
            .iter()
            .filter(|p| p.required && p.default.is_none())
    }

    /// JSON Schema of the operation's arguments.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in self.params {
            properties.insert(param.name.to_string(), param.schema());
        }
        let required: Vec<&str> = self.required_params().map(|p| p.name).collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        if !self.require_any.is_empty() {
            let any_of: Vec<Value> = self
                .require_any
                .iter()
                .map(|name| json!({ "required": [name] }))
                .collect();
            schema["anyOf"] = json!(any_of);
        }
        schema
    }

    /// MCP tool descriptor for this operation.
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        let schema_obj = self
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name, self.description, Arc::new(schema_obj));
        tool.annotations = Some(crate::semantics::annotations_for_method(
            &self.verb.method(),
        ));
        tool
    }
}

/// Every registered operation, in catalog order.
///
/// The iterator is lazy and finite; clone it (or call again) to restart.
pub fn list_operations() -> impl Iterator<Item = &'static Operation> + Clone {
    CATALOG.iter()
}

/// Look up an operation by name.
///
/// # Errors
///
/// Returns [`DispatchError::UnknownOperation`] if no operation has this name.
pub fn resolve(name: &str) -> Result<&'static Operation> {
    CATALOG
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| DispatchError::UnknownOperation(name.to_string()))
}
