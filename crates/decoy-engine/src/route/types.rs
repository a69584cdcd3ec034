//! Type definitions for mock routes.

use crate::body::Body;
use crate::headers::Headers;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque route identifier, assigned at creation and stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(Uuid);

impl RouteId {
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Method a route applies to: one of the fixed HTTP set, or `*` for any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    #[serde(rename = "*")]
    Any,
}

impl RequestMethod {
    /// Whether an observed method string falls under this rule.
    /// Method names compare case-insensitively.
    pub fn matches(&self, observed: &str) -> bool {
        match self {
            RequestMethod::Any => true,
            _ => self.as_str().eq_ignore_ascii_case(observed),
        }
    }

    /// Parse an observed method string into the fixed set, if it is one of
    /// the known methods. `*` parses to the wildcard.
    pub fn parse(observed: &str) -> Option<Self> {
        let known = [
            RequestMethod::Get,
            RequestMethod::Post,
            RequestMethod::Put,
            RequestMethod::Delete,
            RequestMethod::Patch,
            RequestMethod::Head,
            RequestMethod::Options,
            RequestMethod::Any,
        ];
        known
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(observed))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Any => "*",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored mock rule: request pattern plus the canned response to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub request_url: String,
    pub request_method: RequestMethod,
    pub response_data: Body,
    pub response_headers: Headers,
    pub response_status: u16,
    pub enabled: bool,
}

impl Route {
    pub(crate) fn from_config(id: RouteId, config: RouteConfig) -> Self {
        Self {
            id,
            request_url: config.request_url,
            request_method: config.request_method,
            response_data: config.response_data,
            response_headers: config.response_headers,
            response_status: config.response_status,
            enabled: config.enabled,
        }
    }

    /// Id-less form for export and duplication.
    pub fn to_config(&self) -> RouteConfig {
        RouteConfig {
            request_url: self.request_url.clone(),
            request_method: self.request_method,
            response_data: self.response_data.clone(),
            response_headers: self.response_headers.clone(),
            response_status: self.response_status,
            enabled: self.enabled,
        }
    }
}

fn default_method() -> RequestMethod {
    RequestMethod::Any
}

fn default_status() -> u16 {
    200
}

fn default_enabled() -> bool {
    true
}

/// Authoring form of a route: everything but the id, which the store
/// assigns at insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub request_url: String,
    #[serde(default = "default_method")]
    pub request_method: RequestMethod,
    #[serde(default)]
    pub response_data: Body,
    #[serde(default)]
    pub response_headers: Headers,
    #[serde(default = "default_status")]
    pub response_status: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RouteConfig {
    /// Reject malformed routes before they reach the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_url.is_empty() {
            return Err(ValidationError::new("requestUrl", "must not be empty"));
        }
        if !(100..=599).contains(&self.response_status) {
            return Err(ValidationError::new(
                "responseStatus",
                format!("{} is outside [100, 599]", self.response_status),
            ));
        }
        for (name, _) in self.response_headers.iter() {
            if name.is_empty() {
                return Err(ValidationError::new(
                    "responseHeaders",
                    "header names must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// Partial update applied to an existing route. Unset fields are left
/// untouched; the merged result is re-validated before it lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_method: Option<RequestMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl RoutePatch {
    pub(crate) fn apply_to(&self, route: &mut Route) {
        if let Some(ref url) = self.request_url {
            route.request_url = url.clone();
        }
        if let Some(method) = self.request_method {
            route.request_method = method;
        }
        if let Some(ref data) = self.response_data {
            route.response_data = data.clone();
        }
        if let Some(ref headers) = self.response_headers {
            route.response_headers = headers.clone();
        }
        if let Some(status) = self.response_status {
            route.response_status = status;
        }
        if let Some(enabled) = self.enabled {
            route.enabled = enabled;
        }
    }
}

/// Malformed route fields, rejected at the boundary and never stored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Error types for route store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("route {0} not found")]
    NotFound(RouteId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, status: u16) -> RouteConfig {
        RouteConfig {
            request_url: url.to_string(),
            request_method: RequestMethod::Get,
            response_data: Body::from("{}"),
            response_headers: Headers::new(),
            response_status: status,
            enabled: true,
        }
    }

    #[test]
    fn test_method_matching() {
        assert!(RequestMethod::Get.matches("GET"));
        assert!(RequestMethod::Get.matches("get"));
        assert!(!RequestMethod::Get.matches("POST"));
        assert!(RequestMethod::Any.matches("DELETE"));
        assert!(RequestMethod::Any.matches("anything"));
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(
            serde_json::to_string(&RequestMethod::Options).unwrap(),
            "\"OPTIONS\""
        );
        assert_eq!(serde_json::to_string(&RequestMethod::Any).unwrap(), "\"*\"");
        let any: RequestMethod = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(any, RequestMethod::Any);
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let err = config("", 200).validate().unwrap_err();
        assert_eq!(err.field, "requestUrl");
    }

    #[test]
    fn test_validate_rejects_bad_status() {
        assert!(config("/x", 99).validate().is_err());
        assert!(config("/x", 600).validate().is_err());
        assert!(config("/x", 100).validate().is_ok());
        assert!(config("/x", 599).validate().is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let json = r#"{"requestUrl": "/api/users"}"#;
        let config: RouteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.request_method, RequestMethod::Any);
        assert_eq!(config.response_status, 200);
        assert!(config.enabled);
        assert!(config.response_headers.is_empty());
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut route = Route::from_config(RouteId::fresh(), config("/old", 200));
        let patch = RoutePatch {
            request_url: Some("/new".to_string()),
            response_status: Some(418),
            ..Default::default()
        };
        patch.apply_to(&mut route);
        assert_eq!(route.request_url, "/new");
        assert_eq!(route.response_status, 418);
        assert_eq!(route.request_method, RequestMethod::Get);
        assert!(route.enabled);
    }
}
