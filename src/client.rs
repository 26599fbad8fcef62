use crate::client::SynoError::*;
use crate::codes;
use crate::entities::{ApiTable, AuthData, SynologyResponse};
use crate::file_station::{API_AUTH, API_INFO};
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const API_ROOT: &str = "/webapi/";
const API_INFO_PATH: &str = "query.cgi";
pub(crate) const SESSION_NAME: &str = "FileStation";

/// Query parameters never written to the log in clear text
const REDACTED_PARAMS: [&str; 2] = ["passwd", "_sid"];

/// Custom error types for the [`SynoClient`] and [`Session`]
#[derive(Error, Debug)]
pub enum SynoError {
    #[error("Network request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {status}")]
    Http { status: u16 },

    #[error("JSON deserialization error: {message}")]
    Decode { message: String, body: String },

    #[error("Synology API error: code={code}, message={message}")]
    Api { code: i32, message: String },

    #[error("API not supported by the server: {0}")]
    CapabilityUnavailable(String),

    #[error("Authentication error: {message}")]
    AuthenticationFailure { code: Option<i32>, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Task {task} did not finish after {attempts} status checks")]
    Timeout { task: String, attempts: u32 },

    #[error("URL parsing error: {0}")]
    UrlParse(String),

    #[error("Invalid input parameter: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the client waits for background tasks on the NAS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two status requests
    pub interval: Duration,
    /// Maximum number of status requests before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 600,
        }
    }
}

/// Issues GET requests against `<host>/webapi/<path>`
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    base: Url,
    client: Client,
    timeout: Duration,
}

impl Transport {
    fn build_url(
        &self,
        path: &str,
        params: &[(&str, &str)],
        sid: Option<&str>,
    ) -> std::result::Result<Url, SynoError> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| UrlParse(format!("{path}: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(params);
            if let Some(sid) = sid {
                query.append_pair("_sid", sid);
            }
        }

        debug!("Making API request to: {}", redact(&url));
        Ok(url)
    }

    /// Sends a request and decodes the `data` member of the response envelope
    pub(crate) async fn get_json<R>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        sid: Option<&str>,
    ) -> std::result::Result<R, SynoError>
    where
        R: DeserializeOwned,
    {
        let url = self.build_url(path, params, sid)?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        debug!("API request status: {status}");
        check_status(status)?;

        let body = response.text().await.map_err(network)?;
        decode_envelope(api_name(params), &body)
    }

    /// Sends a request and copies the raw response body into `writer`
    ///
    /// No overall timeout applies here since downloads may take arbitrarily long.
    /// A JSON body carrying a failed envelope is reported as [`SynoError::Api`]
    /// and nothing is written; any other body is copied unchanged.
    pub(crate) async fn get_stream<W>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        sid: Option<&str>,
        writer: &mut W,
    ) -> std::result::Result<u64, SynoError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self.build_url(path, params, sid)?;

        let mut response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        debug!("API request status: {status}");
        check_status(status)?;

        if is_json(response.headers()) {
            let body = response.bytes().await.map_err(network)?;
            if let Some(error) = envelope_error(api_name(params), &body) {
                return Err(error);
            }
            writer.write_all(&body).await?;
            writer.flush().await?;
            return Ok(body.len() as u64);
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(network)? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        Ok(written)
    }
}

/// Wraps a transport error without the request URL, which carries credentials
fn network(error: reqwest::Error) -> SynoError {
    Network(error.without_url())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Error carried by `body` if it is a failed response envelope
fn envelope_error(api: &str, body: &[u8]) -> Option<SynoError> {
    let envelope: SynologyResponse<Value> = serde_json::from_slice(body).ok()?;
    if envelope.success {
        return None;
    }

    debug!("{api} returned an error: {}", String::from_utf8_lossy(body));
    let error = envelope.error?;
    Some(Api {
        code: error.code,
        message: codes::describe(api, error.code),
    })
}

fn check_status(status: StatusCode) -> std::result::Result<(), SynoError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Http {
            status: status.as_u16(),
        })
    }
}

fn api_name<'a>(params: &[(&str, &'a str)]) -> &'a str {
    params
        .iter()
        .find(|(key, _)| *key == "api")
        .map_or("", |(_, value)| *value)
}

/// Decodes a response envelope, turning `success=false` into [`SynoError::Api`]
pub(crate) fn decode_envelope<R>(api: &str, body: &str) -> std::result::Result<R, SynoError>
where
    R: DeserializeOwned,
{
    let envelope: SynologyResponse<Value> = serde_json::from_str(body).map_err(|e| {
        warn!("Malformed response from {api}: {body}");
        Decode {
            message: e.to_string(),
            body: body.to_string(),
        }
    })?;

    if !envelope.success {
        debug!("{api} returned an error: {body}");
        return match envelope.error {
            Some(error) => Err(Api {
                code: error.code,
                message: codes::describe(api, error.code),
            }),
            None => Err(InvalidResponse(format!(
                "{api} request failed without an error code"
            ))),
        };
    }

    serde_json::from_value(envelope.data.unwrap_or(Value::Null)).map_err(|e| {
        warn!("Unexpected data from {api}: {body}");
        Decode {
            message: e.to_string(),
            body: body.to_string(),
        }
    })
}

/// Copy of `url` with credentials masked, for logging
fn redact(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if REDACTED_PARAMS.contains(&&*key) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

/// Synology client that has not logged in yet
///
/// It can only discover the APIs of the NAS. [`SynoClient::login`] turns it
/// into a [`Session`], which carries every FileStation operation.
#[derive(Clone, Debug)]
pub struct SynoClient {
    transport: Transport,
    polling: PollConfig,
}

impl SynoClient {
    /// Creates a new `SynoClient` with a builder pattern
    #[must_use]
    pub fn builder() -> SynoClientBuilder {
        SynoClientBuilder::default()
    }

    /// Queries every API the NAS supports
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - API returns an error response
    /// - Response cannot be parsed
    pub async fn query_api_info(&self) -> Result<ApiTable> {
        let params = [
            ("api", API_INFO),
            ("version", "1"),
            ("method", "query"),
            ("query", "all"),
        ];

        let apis = self
            .transport
            .get_json::<ApiTable>(API_INFO_PATH, &params, None)
            .await
            .context("Failed to query API info")?;

        debug!("Discovered {} APIs", apis.len());
        Ok(apis)
    }

    /// Discovers the APIs of the NAS and logs in
    ///
    /// The login uses the highest version of `SYNO.API.Auth` the NAS supports.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or password is empty
    /// - API discovery fails
    /// - The NAS does not offer `SYNO.API.Auth`
    /// - Credentials are rejected
    /// - Response cannot be parsed
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() {
            return Err(InvalidInput("Username cannot be empty".into()).into());
        }

        if password.is_empty() {
            return Err(InvalidInput("Password cannot be empty".into()).into());
        }

        let apis = self.query_api_info().await?;

        let auth = apis
            .get(API_AUTH)
            .ok_or_else(|| CapabilityUnavailable(API_AUTH.into()))?;

        let version = auth.max_version.to_string();
        let params = [
            ("api", API_AUTH),
            ("version", version.as_str()),
            ("method", "login"),
            ("account", username),
            ("passwd", password),
            ("session", SESSION_NAME),
            ("format", "sid"),
        ];

        let data = match self
            .transport
            .get_json::<AuthData>(&auth.path, &params, None)
            .await
        {
            Ok(data) => data,
            Err(Api { code, message }) => {
                return Err(AuthenticationFailure {
                    code: Some(code),
                    message,
                }
                .into());
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to authorize")),
        };

        if data.sid.is_empty() {
            return Err(AuthenticationFailure {
                code: None,
                message: "No session ID received".into(),
            }
            .into());
        }

        debug!("Logged in as {username}");
        Ok(Session::new(
            self.transport.clone(),
            data.sid,
            apis,
            self.polling,
        ))
    }
}

/// Builder for [`SynoClient`]
#[derive(Default)]
pub struct SynoClientBuilder {
    host: Option<String>,
    timeout: Option<u64>,
    accept_invalid_certs: bool,
    poll_interval: Option<u64>,
    max_polls: Option<u32>,
}

impl SynoClientBuilder {
    /// Sets the host URL, e.g. `https://nas.local:5001`
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the request timeout in milliseconds
    #[must_use]
    pub fn timeout(mut self, timeout_millis: u64) -> Self {
        self.timeout = Some(timeout_millis);
        self
    }

    /// Accepts self-signed or otherwise invalid TLS certificates
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Sets the pause between background task status checks in milliseconds
    #[must_use]
    pub fn poll_interval(mut self, interval_millis: u64) -> Self {
        self.poll_interval = Some(interval_millis);
        self
    }

    /// Sets how many background task status checks are made before giving up
    #[must_use]
    pub fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Builds the [`SynoClient`]
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Host is not provided or empty
    /// - Host URL doesn't start with "http://" or "https://"
    /// - Maximum number of status checks is zero
    /// - The HTTP client cannot be created
    pub fn build(self) -> Result<SynoClient> {
        let host = self
            .host
            .ok_or_else(|| Configuration("Host URL is required".into()))?;

        if host.is_empty() {
            return Err(Configuration("Host URL cannot be empty".into()).into());
        }

        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(Configuration(format!(
                "Host URL must start with http:// or https://, got: {host}"
            ))
            .into());
        }

        let base = Url::parse(&format!("{}{API_ROOT}", host.trim_end_matches('/')))
            .map_err(|e| UrlParse(format!("{host}: {e}")))?;

        let mut polling = PollConfig::default();
        if let Some(interval) = self.poll_interval {
            polling.interval = Duration::from_millis(interval);
        }
        if let Some(max_polls) = self.max_polls {
            if max_polls == 0 {
                return Err(Configuration("At least one status check is required".into()).into());
            }
            polling.max_attempts = max_polls;
        }

        let timeout = Duration::from_millis(self.timeout.unwrap_or(3000));

        let client = Client::builder()
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(SynoClient {
            transport: Transport {
                base,
                client,
                timeout,
            },
            polling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FileList;

    #[test]
    fn test_build_requires_scheme() {
        let err = SynoClient::builder()
            .host("nas.local:5000")
            .build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SynoError>(),
            Some(Configuration(_))
        ));
    }

    #[test]
    fn test_build_rejects_zero_polls() {
        let result = SynoClient::builder()
            .host("http://nas.local:5000")
            .max_polls(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_url_appends_sid() {
        let client = SynoClient::builder()
            .host("http://nas.local:5000/")
            .build()
            .unwrap();
        let url = client
            .transport
            .build_url(
                "entry.cgi",
                &[("api", "SYNO.FileStation.List"), ("folder_path", "/home")],
                Some("abc"),
            )
            .unwrap();

        assert_eq!(url.path(), "/webapi/entry.cgi");
        assert_eq!(
            url.query(),
            Some("api=SYNO.FileStation.List&folder_path=%2Fhome&_sid=abc")
        );
    }

    #[test]
    fn test_redact_hides_credentials() {
        let url = Url::parse(
            "http://nas.local/webapi/entry.cgi?api=SYNO.API.Auth&account=bob&passwd=secret&_sid=abc",
        )
        .unwrap();
        let redacted = redact(&url).to_string();

        assert!(redacted.contains("account=bob"));
        assert!(!redacted.contains("secret"));
        assert!(!redacted.contains("abc"));
    }

    #[test]
    fn test_decode_envelope_error_code() {
        let body = r#"{"error": {"code": 408}, "success": false}"#;
        let err = decode_envelope::<FileList>("SYNO.FileStation.List", body).unwrap_err();

        match err {
            Api { code, message } => {
                assert_eq!(code, 408);
                assert_eq!(message, "No such file or directory");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_malformed_json() {
        let body = "<html>502 Bad Gateway</html>";
        let err = decode_envelope::<FileList>("SYNO.FileStation.List", body).unwrap_err();

        match err {
            Decode { body: raw, .. } => assert_eq!(raw, body),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_missing_data() {
        let body = r#"{"success": true}"#;
        let err = decode_envelope::<FileList>("SYNO.FileStation.List", body).unwrap_err();
        assert!(matches!(err, Decode { .. }));

        decode_envelope::<()>("SYNO.API.Auth", body).unwrap();
    }

    #[test]
    fn test_envelope_error_only_for_failed_envelopes() {
        let failed = br#"{"error": {"code": 408}, "success": false}"#;
        assert!(matches!(
            envelope_error("SYNO.FileStation.Download", failed),
            Some(Api { code: 408, .. })
        ));

        assert!(envelope_error("SYNO.FileStation.Download", br#"{"success": true}"#).is_none());
        assert!(envelope_error("SYNO.FileStation.Download", br#"{"name": "config"}"#).is_none());
        assert!(envelope_error("SYNO.FileStation.Download", b"\x00\x01binary").is_none());
    }

    #[test]
    fn test_is_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(CONTENT_TYPE, "application/octet-stream".parse().unwrap());
        assert!(!is_json(&headers));

        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));
    }
}
