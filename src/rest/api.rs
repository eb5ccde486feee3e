/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::config::{Creds, SharePointConfig};
use crate::rest::errors::SharePointError;
use crate::rest::ntlm::{NtlmCreds, challenge_token};
use crate::rest::paths::get_from_json_path;
use crate::rest::properties::{APPLICATION_JSON, APPLICATION_JSON_NOMETADATA};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, WWW_AUTHENTICATE,
};
use reqwest::{Method, Request, Response, StatusCode, Url};
use serde_json::Value;
use tokio::sync::OnceCell;

/// Header carrying the form digest on state changing requests
pub const REQUEST_DIGEST_HEADER: HeaderName = HeaderName::from_static("x-requestdigest");

// Locations of the digest in the context info response (nometadata, then verbose)
const FORM_DIGEST_PATHS: [&[&str]; 2] = [
    &["FormDigestValue"],
    &["d", "GetContextWebInformation", "FormDigestValue"],
];

/// This can be OData query options as well as other parameters the specific API expects
pub type ApiParams<'a> = [(&'a str, &'a str)];

/// Body of a POST request
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Serialized as JSON, `Content-Type: application/json` unless a content type is given
    Json(Value),
    /// Sent as is, e.g. file content
    Bytes(Bytes),
}

// Interchangeable authentication strategy
#[derive(Debug, Clone)]
enum Auth {
    Ntlm(NtlmCreds),
    Bearer(String),
}

/// Directly communicates with the API.
///
/// Every request gets the `Accept` header and the credentials, POST requests also carry the
/// form digest of the site. The digest is requested once, on the first POST, and then reused
/// for the lifetime of the session.
pub struct Session {
    origin: String,
    site: String,
    auth: Auth,
    https_client: reqwest::Client,
    form_digest: OnceCell<String>,
}

impl Session {
    /// Creates a new session for the site described by the configuration
    pub fn new(config: &SharePointConfig) -> Result<Self, SharePointError> {
        let auth = match &config.creds {
            Creds::Ntlm { username, password } => Auth::Ntlm(NtlmCreds::new(username, password)),
            Creds::Bearer(token) => Auth::Bearer(token.clone()),
        };
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.ignore_ssl_check);
        // NTLM authenticates the connection, which IIS only allows over HTTP/1.1
        if matches!(auth, Auth::Ntlm(_)) {
            builder = builder.http1_only();
        }
        let https_client = builder.build()?;
        Ok(Self {
            origin: config.origin.clone(),
            site: config.site.clone(),
            auth,
            https_client,
            form_digest: OnceCell::new(),
        })
    }

    /// Performs an authenticated GET request
    pub async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        params: Option<&ApiParams<'_>>,
    ) -> Result<Response, SharePointError> {
        let req_url = params.map_or(Url::parse(url), |v| Url::parse_with_params(url, v))?;
        self.send(Method::GET, req_url, with_accept(headers), None)
            .await
    }

    /// Performs an authenticated POST request carrying the form digest
    pub async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: Payload,
    ) -> Result<Response, SharePointError> {
        let mut headers = with_accept(headers);
        let digest = self.form_digest().await?;
        headers.insert(REQUEST_DIGEST_HEADER, HeaderValue::from_str(digest)?);

        let body = match payload {
            Payload::Empty => None,
            Payload::Json(value) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(Bytes::from(serde_json::to_vec(&value)?))
            }
            Payload::Bytes(data) => Some(data),
        };
        self.send(Method::POST, Url::parse(url)?, headers, body)
            .await
    }

    /// Returns the form digest of the site, requesting it from the context info endpoint the
    /// first time.
    ///
    /// Fails with [`SharePointError::Auth`] when the response holds no digest, which usually
    /// means the credentials were refused. A failed attempt is not cached.
    pub async fn form_digest(&self) -> Result<&str, SharePointError> {
        self.form_digest
            .get_or_try_init(|| self.request_form_digest())
            .await
            .map(String::as_str)
    }

    /// Url of the context info endpoint that hands out form digests
    pub fn context_info_url(&self) -> String {
        format!("{}/{}/_api/contextinfo", self.origin, self.site)
    }

    async fn request_form_digest(&self) -> Result<String, SharePointError> {
        debug!("Requesting form digest for site {}", self.site);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON_NOMETADATA));
        let resp = self
            .send(Method::POST, Url::parse(&self.context_info_url())?, headers, None)
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        let digest = serde_json::from_slice::<Value>(&body).ok().and_then(|json| {
            FORM_DIGEST_PATHS
                .iter()
                .find_map(|path| get_from_json_path(path, &json))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        digest.ok_or_else(|| {
            warn!("No form digest in context info response (status {status})");
            SharePointError::Auth(format!(
                "Could not get a form digest (status {status}). Please check your account credentials."
            ))
        })
    }

    // Sends the request with the credentials of the session
    async fn send(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response, SharePointError> {
        debug!("{method} {url}");
        let build = |authorization: String| -> Result<Request, SharePointError> {
            let mut req = self
                .https_client
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .header(AUTHORIZATION, authorization);
            match &body {
                Some(data) => req = req.body(data.clone()),
                // IIS answers 411 to a POST without a length
                None if method == Method::POST => {
                    req = req.header(CONTENT_LENGTH, HeaderValue::from_static("0"))
                }
                None => {}
            }
            Ok(req.build()?)
        };

        match &self.auth {
            Auth::Bearer(token) => {
                let req = build(format!("Bearer {token}"))?;
                Ok(self.https_client.execute(req).await?)
            }
            Auth::Ntlm(creds) => {
                let resp = self.https_client.execute(build(creds.negotiate_header())?).await?;
                let Some(token) = ntlm_challenge(&resp) else {
                    return Ok(resp);
                };
                // Read the challenge response fully so its connection is reused
                resp.bytes().await?;
                let req = build(creds.authenticate_header(&token)?)?;
                Ok(self.https_client.execute(req).await?)
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("origin", &self.origin)
            .field("site", &self.site)
            .field("has_form_digest", &self.form_digest.initialized())
            .finish()
    }
}

fn with_accept(mut headers: HeaderMap) -> HeaderMap {
    if !headers.contains_key(ACCEPT) {
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    }
    headers
}

// NTLM challenge token of a 401 response, if the server sent one
fn ntlm_challenge(resp: &Response) -> Option<String> {
    if resp.status() != StatusCode::UNAUTHORIZED {
        return None;
    }
    resp.headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(challenge_token)
        .map(str::to_string)
}
