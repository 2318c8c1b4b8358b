//! HTTP API (payload format 2.0) event and response shapes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    /// `"METHOD /path"`, e.g. `"GET /files/{fileId}"`, or `"$default"`
    #[serde(default)]
    pub route_key: String,
    #[serde(default)]
    pub raw_path: String,
    #[serde(default)]
    pub request_context: RequestContext,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub http: HttpContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpContext {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl GatewayEvent {
    /// Header lookup by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request method, from the request context or else the route key.
    pub fn method(&self) -> String {
        let method = if self.request_context.http.method.is_empty() {
            self.route_key.split(' ').next().unwrap_or_default()
        } else {
            self.request_context.http.method.as_str()
        };
        method.to_ascii_uppercase()
    }

    /// Route path: the route key's path when it has one, else the raw request path.
    pub fn path(&self) -> &str {
        match self.route_key.split_once(' ') {
            Some((_, path)) => path,
            None if !self.raw_path.is_empty() => &self.raw_path,
            None => &self.request_context.http.path,
        }
    }

    /// The `fileId` path parameter, falling back to the concrete request path.
    pub fn file_id(&self) -> Option<&str> {
        if let Some(id) = self
            .path_parameters
            .as_ref()
            .and_then(|params| params.get("fileId"))
        {
            return Some(id.as_str()).filter(|id| !id.is_empty());
        }
        [self.raw_path.as_str(), self.request_context.http.path.as_str(), self.path()]
            .into_iter()
            .filter_map(|path| path.strip_prefix("/files/"))
            .find(|rest| !rest.is_empty() && !rest.contains('/') && !rest.starts_with('{'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_http_api_v2_events() {
        let event: GatewayEvent = serde_json::from_value(serde_json::json!({
            "version": "2.0",
            "routeKey": "GET /files/{fileId}",
            "rawPath": "/files/abc",
            "requestContext": {"http": {"method": "GET", "path": "/files/abc"}},
            "headers": {"Authorization": "Bearer t"},
            "isBase64Encoded": false,
            "pathParameters": {"fileId": "abc"}
        }))
        .unwrap();

        assert_eq!(event.method(), "GET");
        assert_eq!(event.path(), "/files/{fileId}");
        assert_eq!(event.file_id(), Some("abc"));
        assert_eq!(event.header("authorization"), Some("Bearer t"));
        assert!(event.body.is_none());
    }

    #[test]
    fn default_route_falls_back_to_raw_path() {
        let event = GatewayEvent {
            route_key: "$default".to_string(),
            raw_path: "/files/xyz".to_string(),
            request_context: RequestContext {
                http: HttpContext {
                    method: "delete".to_string(),
                    path: "/files/xyz".to_string(),
                },
            },
            ..Default::default()
        };
        assert_eq!(event.method(), "DELETE");
        assert_eq!(event.path(), "/files/xyz");
        assert_eq!(event.file_id(), Some("xyz"));
    }

    #[test]
    fn response_uses_gateway_field_names() {
        let response = GatewayResponse {
            status_code: 200,
            headers: BTreeMap::new(),
            body: "{}".to_string(),
            is_base64_encoded: false,
        };
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["isBase64Encoded"], false);
    }
}
