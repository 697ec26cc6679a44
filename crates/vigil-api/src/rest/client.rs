// REST HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer auth, and the
// uniform status policy. Endpoint groups (zones, sensors, etc.) are
// implemented as inherent methods in sibling files to keep this module
// focused on transport mechanics.

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rest::models::Envelope;
use crate::transport::TransportConfig;

/// HTTP client for the backend REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client that authenticates every request with `token`.
    ///
    /// `base_url` is the API root (e.g. `https://api.vigil.local/api`);
    /// endpoint paths are joined beneath it.
    pub fn new(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_bearer_client(token)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client from a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the `Authorization` header.
    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    /// The API root all endpoint paths are joined to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an endpoint path (leading slash optional) onto the API root.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        parse_json(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        parse_json(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {}", url);
        let resp = self.http.put(url).json(body).send().await?;
        parse_json(resp).await
    }

    /// POST where the response body is irrelevant.
    pub(crate) async fn post_empty(&self, path: &str, body: &impl Serialize) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        check_status(resp).await.map(drop)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        check_status(resp).await.map(drop)
    }
}

/// Fail with `Error::Api` on non-2xx, otherwise hand back the response.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .filter(|m| !m.is_empty())
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_owned()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

    Err(Error::Api {
        status: status.as_u16(),
        message: format!("HTTP {}: {detail}", status.as_u16()),
    })
}

/// Check the status, then decode the body (bare or `{ data }`-wrapped).
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await?;

    let envelope: Envelope<T> =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;
    Ok(envelope.into_inner())
}
