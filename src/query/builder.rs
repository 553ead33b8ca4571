//! Turns a type, an optional id and [`RequestOptions`] into a request URL.
//!
//! Segments are emitted in a fixed order: filters, sort, include, fields,
//! then raw params. Values are written as given, without percent-encoding.

use serde_json::Value;

use super::options::{FilterValue, Filters, Param, RequestOptions};
use crate::config::{Config, Headers};
use crate::jsonapi::Id;
use crate::store::ModelType;
use crate::utils::OneOrMany;

/// Everything the transport layer needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub url: String,
    pub data: Option<Value>,
    pub headers: Headers,
}

/// Build the URL, body and headers for a request against `type_name`.
///
/// The path comes from the registered model (`endpoint`, then `base_url`),
/// falling back to the bare type name.
pub fn prepare_query(
    config: &Config,
    model: Option<&ModelType>,
    type_name: &str,
    id: Option<&Id>,
    data: Option<Value>,
    options: Option<&RequestOptions>,
) -> PreparedQuery {
    let path = model.map(ModelType::path).unwrap_or(type_name);
    let url = match id {
        Some(id) => format!("{}/{}", path, id),
        None => path.to_string(),
    };
    let headers = options.and_then(|o| o.headers.clone()).unwrap_or_default();

    let mut params = Vec::new();
    if let Some(options) = options {
        params.extend(prepare_filters(options.filter.as_ref()));
        params.extend(prepare_sort(options.sort.as_ref()));
        params.extend(prepare_includes(options.include.as_ref()));
        params.extend(prepare_fields(options));
        params.extend(options.params.iter().map(Param::to_query));
    }

    PreparedQuery {
        url: append_params(config.prefix_url(&url), &params),
        data,
        headers,
    }
}

pub fn prepare_filters(filters: Option<&Filters>) -> Vec<String> {
    filters
        .map(|filters| {
            parametrize(filters, "")
                .into_iter()
                .map(|(key, value)| format!("filter[{}]={}", key, value))
                .collect()
        })
        .unwrap_or_default()
}

pub fn prepare_sort(sort: Option<&OneOrMany<String>>) -> Vec<String> {
    sort.map(|sort| vec![format!("sort={}", sort.join())])
        .unwrap_or_default()
}

pub fn prepare_includes(include: Option<&OneOrMany<String>>) -> Vec<String> {
    include
        .map(|include| vec![format!("include={}", include.join())])
        .unwrap_or_default()
}

fn prepare_fields(options: &RequestOptions) -> Vec<String> {
    options
        .fields
        .iter()
        .flatten()
        .map(|(type_name, fields)| format!("fields[{}]={}", type_name, fields.join()))
        .collect()
}

/// Flatten a filter tree into `(dotted.key, value)` pairs.
pub fn parametrize(filters: &Filters, scope: &str) -> Vec<(String, String)> {
    let mut list = Vec::new();
    for (key, value) in filters {
        let path = format!("{}{}", scope, key);
        match value {
            FilterValue::Nested(inner) => list.extend(parametrize(inner, &format!("{}.", path))),
            FilterValue::Value(value) => list.push((path, value.clone())),
            FilterValue::List(values) => list.push((path, values.join(","))),
        }
    }
    list
}

/// Append `?a&b` to `url`; no query string when there are no params.
pub fn append_params(mut url: String, params: &[String]) -> String {
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}
