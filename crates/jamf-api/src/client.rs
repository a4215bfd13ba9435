// Classic API HTTP client
//
// Wraps `reqwest::Client` with JSSResource URL construction, HTTP basic
// auth, and status-code mapping. Reads are JSON, writes are XML; the
// object layer in jamf-core decides what to send.

use std::path::Path;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Path under the server root where the Classic API lives.
const API_ROOT: &str = "JSSResource/";

/// Raw HTTP client for the Jamf Pro Classic API.
///
/// All resource paths are relative to `https://server/JSSResource/`,
/// e.g. `computers/id/4`. Each request carries basic-auth credentials;
/// the Classic API keeps no session state.
#[derive(Clone)]
pub struct ClassicClient {
    http: reqwest::Client,
    api_url: Url,
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for ClassicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassicClient")
            .field("api_url", &self.api_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ClassicClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `server` is the server root, e.g. `https://jss.example.com:8443/`.
    pub fn new(
        server: &Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, server, username, password)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        server: &Url,
        username: String,
        password: SecretString,
    ) -> Result<Self, Error> {
        let mut root = server.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let api_url = root.join(API_ROOT)?;
        Ok(Self {
            http,
            api_url,
            username,
            password,
        })
    }

    /// The `.../JSSResource/` URL all resource paths are joined onto.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The account used for basic auth.
    pub fn username(&self) -> &str {
        &self.username
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build the full URL for a resource path such as `policies/id/7`.
    pub fn resource_url(&self, rsrc: &str) -> Result<Url, Error> {
        Ok(self.api_url.join(rsrc.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    /// GET a resource as untyped JSON.
    pub async fn get_json(&self, rsrc: &str) -> Result<serde_json::Value, Error> {
        self.get(rsrc).await
    }

    /// GET a resource and deserialize the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, rsrc: &str) -> Result<T, Error> {
        let url = self.resource_url(rsrc)?;
        debug!("GET {}", url);

        let resp = self
            .request(Method::GET, url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = Self::check_status(resp, rsrc).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// POST an XML document; returns the response body (normally XML).
    pub async fn post_xml(&self, rsrc: &str, xml: String) -> Result<String, Error> {
        self.send_xml(Method::POST, rsrc, xml).await
    }

    /// PUT an XML document; returns the response body (normally XML).
    pub async fn put_xml(&self, rsrc: &str, xml: String) -> Result<String, Error> {
        self.send_xml(Method::PUT, rsrc, xml).await
    }

    async fn send_xml(&self, method: Method, rsrc: &str, xml: String) -> Result<String, Error> {
        let url = self.resource_url(rsrc)?;
        debug!("{} {}", method, url);

        let resp = self
            .request(method, url)
            .header(CONTENT_TYPE, "text/xml")
            .body(xml)
            .send()
            .await?;
        Self::check_status(resp, rsrc).await
    }

    /// DELETE a resource.
    pub async fn delete(&self, rsrc: &str) -> Result<(), Error> {
        let url = self.resource_url(rsrc)?;
        debug!("DELETE {}", url);

        let resp = self.request(Method::DELETE, url).send().await?;
        Self::check_status(resp, rsrc).await?;
        Ok(())
    }

    /// Upload a local file as multipart form data (field `name`).
    ///
    /// Used with `fileuploads/{type}/id/{id}` resources.
    pub async fn upload(&self, rsrc: &str, path: &Path) -> Result<String, Error> {
        let url = self.resource_url(rsrc)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());
        let bytes = tokio::fs::read(path).await?;
        debug!(file = %file_name, size = bytes.len(), "POST {} (multipart)", url);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("name", part);

        let resp = self.request(Method::POST, url).multipart(form).send().await?;
        Self::check_status(resp, rsrc).await
    }

    /// Map non-success statuses to typed errors; return the body otherwise.
    async fn check_status(resp: Response, rsrc: &str) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = extract_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned()
        });

        Err(match status {
            StatusCode::UNAUTHORIZED => Error::Authentication { message },
            StatusCode::NOT_FOUND => Error::NotFound {
                resource: rsrc.to_owned(),
            },
            StatusCode::CONFLICT => Error::Conflict { message },
            other => Error::Api {
                status: other.as_u16(),
                message,
            },
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// The Classic API answers failures with a small HTML page whose
/// interesting line is `<p>Error: ...</p>`; some proxies answer JSON.
fn extract_error_message(body: &str) -> Option<String> {
    if let Some(start) = body.find("<p>Error") {
        let rest = &body[start + 3..];
        let end = rest.find("</p>").unwrap_or(rest.len());
        let msg = rest[..end].trim_start_matches("Error").trim_start_matches(':');
        return Some(msg.trim().to_owned());
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(serde_json::Value::as_str)
        {
            return Some(msg.to_owned());
        }
    }

    let trimmed = body.trim();
    (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_owned())
}

/// Percent-encode one path segment (names, match terms, usernames).
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
