use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::Engine as _;
use reqwest::{RequestBuilder, Url};

use crate::error::HttpError;
use crate::model::{ApiKeyLocation, AuthConfig, HttpMethod};
use crate::vars::VariableStore;

pub(super) struct SignTarget<'req> {
    pub(super) method: HttpMethod,
    pub(super) url: &'req Url,
    pub(super) headers: &'req [(String, String)],
    pub(super) body: &'req [u8],
}

/// Adds credentials to the builder. Returns extra headers that were applied
/// so the caller can record them on the request side of the exchange.
pub(super) fn apply_auth(
    mut builder: RequestBuilder,
    target: &SignTarget<'_>,
    auth: &AuthConfig,
    store: &VariableStore,
) -> Result<(RequestBuilder, Vec<(String, String)>), HttpError> {
    let mut applied = Vec::new();
    match auth {
        AuthConfig::Basic { username, password } => {
            let token = format!("{}:{}", store.render(username), store.render(password));
            let encoded = base64::engine::general_purpose::STANDARD.encode(token.as_bytes());
            applied.push(("Authorization".to_owned(), format!("Basic {}", encoded)));
        }
        AuthConfig::Bearer { token } => {
            applied.push((
                "Authorization".to_owned(),
                format!("Bearer {}", store.render(token)),
            ));
        }
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => match location {
            ApiKeyLocation::Header => {
                applied.push((store.render(key), store.render(value)));
            }
            ApiKeyLocation::Query => {
                builder = builder.query(&[(store.render(key), store.render(value))]);
            }
        },
        AuthConfig::SigV4 {
            access_key,
            secret_key,
            session_token,
            region,
            service,
        } => {
            applied = sigv4_headers(target, access_key, secret_key, session_token, region, service)?;
        }
    }
    for (name, value) in &applied {
        builder = builder.header(name, value);
    }
    Ok((builder, applied))
}

fn sigv4_headers(
    target: &SignTarget<'_>,
    access_key: &str,
    secret_key: &str,
    session_token: &Option<String>,
    region: &str,
    service: &str,
) -> Result<Vec<(String, String)>, HttpError> {
    let identity: Identity =
        Credentials::new(access_key, secret_key, session_token.clone(), None, "reqtrace").into();
    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(service)
        .time(std::time::SystemTime::now())
        .settings(SigningSettings::default())
        .build()
        .map_err(|err| HttpError::SigV4Params {
            source: Box::new(err),
        })?
        .into();

    let method_str = target.method.as_str();
    let signable = SignableRequest::new(
        method_str,
        target.url.as_str(),
        target
            .headers
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
        SignableBody::Bytes(target.body),
    )
    .map_err(|err| HttpError::SigV4Request {
        source: Box::new(err),
    })?;

    let (instructions, _signature) = sign(signable, &signing_params)
        .map_err(|err| HttpError::SigV4Sign {
            source: Box::new(err),
        })?
        .into_parts();

    let mut http_req = http::Request::builder()
        .method(method_str)
        .uri(target.url.as_str());
    for (key, value) in target.headers {
        http_req = http_req.header(key, value);
    }
    let mut http_req = http_req.body(()).map_err(|err| HttpError::SigV4BuildSign {
        source: Box::new(err),
    })?;
    instructions.apply_to_request_http1x(&mut http_req);

    let signed = http_req
        .headers()
        .iter()
        .filter(|(name, _)| {
            !target
                .headers
                .iter()
                .any(|(key, _)| key.eq_ignore_ascii_case(name.as_str()))
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|text| (name.as_str().to_owned(), text.to_owned()))
        })
        .collect();
    Ok(signed)
}
