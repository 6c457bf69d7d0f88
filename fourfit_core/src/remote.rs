//! REST backend access.
//!
//! All bodies are JSON. A non-success status is an error just like a
//! transport failure; callers decide whether to fall back to local storage.

use crate::config::ApiConfig;
use crate::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// HTTP verbs used by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Remote API seam
///
/// Returns the decoded response body, or `None` for an empty 2xx body.
pub trait RemoteApi {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Option<Value>>;
}

/// Blocking HTTP client against a base URL such as `http://localhost:8000/api`
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl RemoteApi for HttpRemote {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Option<Value>> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self.client.request(method.into(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Remote that is never reachable; every operation takes the local path
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

impl RemoteApi for OfflineRemote {
    fn request(&self, _method: Method, _path: &str, _body: Option<&Value>) -> Result<Option<Value>> {
        Err(Error::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_remote_always_fails() {
        let remote = OfflineRemote;
        let err = remote.request(Method::Get, "/metas", None).unwrap_err();
        assert!(matches!(err, Error::Offline));
    }

    #[test]
    fn test_url_joining() {
        let remote = HttpRemote::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.base_url(), "http://localhost:8000/api");
        assert_eq!(remote.url("/metas/7"), "http://localhost:8000/api/metas/7");
        assert_eq!(remote.url("treinos"), "http://localhost:8000/api/treinos");
    }

    #[test]
    fn test_unreachable_host_is_http_error() {
        // Port 9 (discard) is not expected to accept connections locally
        let remote = HttpRemote::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = remote.request(Method::Get, "/metas", None).unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
    }
}
