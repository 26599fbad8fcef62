use crate::client::SynoError::{self, CapabilityUnavailable};
use crate::client::{PollConfig, SESSION_NAME, Transport};
use crate::entities::{ApiInfo, ApiTable};
use crate::file_station::API_AUTH;
use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use std::fmt;
use tokio::io::AsyncWrite;

/// An authenticated session on the NAS
///
/// Created by [`crate::client::SynoClient::login`]. The session ID and the
/// table of APIs discovered before login never change afterwards, so a
/// session can be shared by reference between tasks. There is no automatic
/// renewal: once the NAS drops the session, requests fail with an API error.
#[derive(Clone)]
pub struct Session {
    transport: Transport,
    sid: String,
    apis: ApiTable,
    polling: PollConfig,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("sid", &"***")
            .field("apis", &self.apis.len())
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(transport: Transport, sid: String, apis: ApiTable, polling: PollConfig) -> Self {
        Self {
            transport,
            sid,
            apis,
            polling,
        }
    }

    /// Session ID sent as `_sid` with every request
    #[must_use]
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// All APIs the NAS reported during login
    #[must_use]
    pub fn apis(&self) -> &ApiTable {
        &self.apis
    }

    /// Looks up a single API by name
    #[must_use]
    pub fn api(&self, name: &str) -> Option<&ApiInfo> {
        self.apis.get(name)
    }

    /// Interval and limit used when polling background tasks such as MD5
    #[must_use]
    pub fn polling(&self) -> PollConfig {
        self.polling
    }

    pub(crate) fn require_api(&self, name: &str) -> std::result::Result<&ApiInfo, SynoError> {
        self.apis
            .get(name)
            .ok_or_else(|| CapabilityUnavailable(name.to_string()))
    }

    /// Calls `method` of `api` at its highest supported version
    pub(crate) async fn call<R>(
        &self,
        api: &ApiInfo,
        method: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<R, SynoError>
    where
        R: DeserializeOwned,
    {
        let version = api.max_version.to_string();
        let mut all_params = vec![
            ("api", api.name.as_str()),
            ("version", version.as_str()),
            ("method", method),
        ];
        all_params.extend_from_slice(params);

        self.transport
            .get_json(&api.path, &all_params, Some(&self.sid))
            .await
    }

    /// Like [`Session::call`], but streams the raw body into `writer`
    pub(crate) async fn call_stream<W>(
        &self,
        api: &ApiInfo,
        method: &str,
        params: &[(&str, &str)],
        writer: &mut W,
    ) -> std::result::Result<u64, SynoError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let version = api.max_version.to_string();
        let mut all_params = vec![
            ("api", api.name.as_str()),
            ("version", version.as_str()),
            ("method", method),
        ];
        all_params.extend_from_slice(params);

        self.transport
            .get_stream(&api.path, &all_params, Some(&self.sid), writer)
            .await
    }

    /// Ends the session on the NAS
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - API returns an error response
    pub async fn logout(self) -> Result<()> {
        let api = self.require_api(API_AUTH)?;

        self.call::<()>(api, "logout", &[("session", SESSION_NAME)])
            .await
            .context("Failed to log out")?;

        debug!("Logged out");
        Ok(())
    }
}
