use reqwest::{Client, Method, Request, Url};

use crate::error::HttpError;
use crate::model::{HttpMethod, KeyValue, RequestBody, RequestSpec};
use crate::vars::VariableStore;

use super::builders_auth::{SignTarget, apply_auth};
use super::pool::RequestRecord;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

pub(super) struct BuiltRequest {
    pub(super) request: Request,
    /// Body as rendered text, before the transport took ownership of it.
    pub(super) body_text: String,
}

const fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn rendered_pairs<'spec>(
    pairs: &'spec [KeyValue],
    store: &'spec VariableStore,
) -> impl Iterator<Item = (String, String)> + 'spec {
    pairs
        .iter()
        .filter(|pair| pair.enabled)
        .map(|pair| (store.render(&pair.key), store.render(&pair.value)))
}

/// Builds the outgoing request and records what is sent into `record`.
///
/// The method and rendered URL are recorded before anything can fail, so a
/// trace of a failed build still names its target.
pub(super) fn build_request(
    client: &Client,
    spec: &RequestSpec,
    store: &VariableStore,
    record: &mut RequestRecord,
) -> Result<BuiltRequest, HttpError> {
    let raw_url = store.render(&spec.url);
    record.method.push_str(spec.method.as_str());
    record.url.push_str(&raw_url);

    let mut url = Url::parse(&raw_url).map_err(|source| HttpError::InvalidUrl {
        url: raw_url.clone(),
        source,
    })?;
    let query: Vec<(String, String)> = rendered_pairs(&spec.query, store).collect();
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let mut headers: Vec<(String, String)> = rendered_pairs(&spec.headers, store).collect();
    let cookies: Vec<String> = rendered_pairs(&spec.cookies, store)
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    if !cookies.is_empty() {
        headers.push(("Cookie".to_owned(), cookies.join("; ")));
    }

    let (body_text, content_type) = match &spec.body {
        RequestBody::None => (String::new(), None),
        RequestBody::Raw(text) => (store.render(text), None),
        RequestBody::Form(pairs) => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(rendered_pairs(pairs, store))
                .finish();
            (encoded, Some(FORM_CONTENT_TYPE))
        }
        RequestBody::Json(value) => {
            let text = serde_json::to_string(&store.render_json(value))
                .map_err(|source| HttpError::EncodeJsonBody { source })?;
            (text, Some(JSON_CONTENT_TYPE))
        }
    };
    if let Some(content_type) = content_type
        && !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
    {
        headers.push(("Content-Type".to_owned(), content_type.to_owned()));
    }

    let mut builder = client.request(reqwest_method(spec.method), url.clone());
    for (name, value) in &headers {
        builder = builder.header(name, value);
    }
    if let Some(auth) = spec.auth.as_ref() {
        let target = SignTarget {
            method: spec.method,
            url: &url,
            headers: &headers,
            body: body_text.as_bytes(),
        };
        let (signed_builder, applied) = apply_auth(builder, &target, auth, store)?;
        builder = signed_builder;
        headers.extend(applied);
    }
    if !body_text.is_empty() {
        builder = builder.body(body_text.clone());
    }

    let request = builder
        .build()
        .map_err(|source| HttpError::BuildRequestFailed { source })?;

    record.url.clear();
    record.url.push_str(request.url().as_str());
    record.headers.extend(headers);
    record.body.extend_from_slice(body_text.as_bytes());

    Ok(BuiltRequest { request, body_text })
}
