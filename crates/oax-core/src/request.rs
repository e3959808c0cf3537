use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::endpoint::{Endpoint, HttpMethod};
use crate::example::ExampleGenerator;
use crate::params::merged_parameters;
use crate::parse::parameter::ParameterLocation;
use crate::resolve::RefResolver;

/// The request an external client would send to exercise an endpoint,
/// filled in from parameter and body examples. Building it performs no I/O.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestShape {
    pub method: HttpMethod,
    pub url: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path_params: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub cookies: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestShape {
    /// Build the shape for `endpoint`. Without an explicit `base_url` the
    /// document's first server (variables at their defaults) is used.
    pub fn build(
        endpoint: &Endpoint<'_>,
        generator: &ExampleGenerator<'_>,
        resolver: RefResolver<'_>,
        base_url: Option<&str>,
    ) -> Self {
        let base = match base_url {
            Some(url) => url.to_string(),
            None => resolver
                .document()
                .servers
                .first()
                .map(|s| s.default_url())
                .unwrap_or_default(),
        };

        let mut shape = RequestShape {
            method: endpoint.method,
            url: String::new(),
            path_params: IndexMap::new(),
            query: IndexMap::new(),
            headers: IndexMap::new(),
            cookies: IndexMap::new(),
            content_type: None,
            body: None,
        };

        for node in merged_parameters(endpoint, resolver) {
            let Some(param) = resolver.resolve_item(node) else {
                continue;
            };
            let Some(value) = generator.parameter_example(node) else {
                continue;
            };
            let rendered = render_param(&value);
            let target = match param.location {
                ParameterLocation::Path => &mut shape.path_params,
                ParameterLocation::Query => &mut shape.query,
                ParameterLocation::Header => &mut shape.headers,
                ParameterLocation::Cookie => &mut shape.cookies,
            };
            target.insert(param.name.clone(), rendered);
        }

        let path = shape
            .path_params
            .iter()
            .fold(endpoint.path.to_string(), |path, (name, value)| {
                path.replace(&format!("{{{name}}}"), value)
            });
        shape.url = format!("{}{}", base.trim_end_matches('/'), path);

        if let Some(body) = endpoint
            .operation
            .request_body
            .as_ref()
            .and_then(|b| resolver.resolve_item(b))
        {
            if let Some((content_type, _)) = body.preferred_content() {
                shape.content_type = Some(content_type.to_string());
            }
            shape.body = generator.request_body_example(endpoint.operation);
        }

        shape
    }
}

/// Strings go out as-is, arrays comma-joined, everything else as compact JSON.
fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_param)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
