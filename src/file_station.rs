//! FileStation operations: listing, stat, download and server-side MD5.

use crate::client::SynoError::{InvalidInput, InvalidResponse, Timeout};
use crate::entities::{FileInfo, FileInfoList, FileList, Md5Status, Md5Task, ShareList};
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::io::AsyncWrite;
use tokio::time::sleep;

pub const API_INFO: &str = "SYNO.API.Info";
pub const API_AUTH: &str = "SYNO.API.Auth";

pub const FILE_STATION_INFO: &str = "SYNO.FileStation.Info";
pub const FILE_STATION_LIST: &str = "SYNO.FileStation.List";
pub const FILE_STATION_SEARCH: &str = "SYNO.FileStation.Search";
pub const FILE_STATION_VIRTUAL_FOLDER: &str = "SYNO.FileStation.VirtualFolder";
pub const FILE_STATION_FAVORITE: &str = "SYNO.FileStation.Favorite";
pub const FILE_STATION_THUMB: &str = "SYNO.FileStation.Thumb";
pub const FILE_STATION_DIR_SIZE: &str = "SYNO.FileStation.DirSize";
pub const FILE_STATION_MD5: &str = "SYNO.FileStation.MD5";
pub const FILE_STATION_CHECK_PERMISSION: &str = "SYNO.FileStation.CheckPermission";
pub const FILE_STATION_UPLOAD: &str = "SYNO.FileStation.Upload";
pub const FILE_STATION_DOWNLOAD: &str = "SYNO.FileStation.Download";
pub const FILE_STATION_SHARING: &str = "SYNO.FileStation.Sharing";
pub const FILE_STATION_CREATE_FOLDER: &str = "SYNO.FileStation.CreateFolder";
pub const FILE_STATION_RENAME: &str = "SYNO.FileStation.Rename";
pub const FILE_STATION_COPY_MOVE: &str = "SYNO.FileStation.CopyMove";
pub const FILE_STATION_DELETE: &str = "SYNO.FileStation.Delete";
pub const FILE_STATION_EXTRACT: &str = "SYNO.FileStation.Extract";
pub const FILE_STATION_COMPRESS: &str = "SYNO.FileStation.Compress";
pub const FILE_STATION_BACKGROUND_TASK: &str = "SYNO.FileStation.BackgroundTask";

/// Extra attributes requested for every listed or inspected file
const ADDITIONAL: &str = r#"["size","owner","time","perm"]"#;

/// APIs this crate knows how to drive
#[must_use]
pub fn supported_apis() -> &'static [&'static str] {
    &[
        API_INFO,
        API_AUTH,
        FILE_STATION_LIST,
        FILE_STATION_DOWNLOAD,
        FILE_STATION_MD5,
    ]
}

impl Session {
    /// Lists all shared folders visible to the logged-in user
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The NAS does not offer `SYNO.FileStation.List`
    /// - Network request fails
    /// - API returns an error response
    /// - Response cannot be parsed
    pub async fn list_shares(&self) -> Result<Vec<FileInfo>> {
        let api = self.require_api(FILE_STATION_LIST)?;

        let shares = self
            .call::<ShareList>(api, "list_share", &[("additional", ADDITIONAL)])
            .await
            .context("Failed to list shares")?;

        debug!("Listed {} of {} shares", shares.shares.len(), shares.total);
        Ok(shares.shares)
    }

    /// Lists the content of `folder`, e.g. `/home`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Folder path is empty
    /// - The NAS does not offer `SYNO.FileStation.List`
    /// - Network request fails
    /// - API returns an error response, e.g. when the folder doesn't exist
    /// - Response cannot be parsed
    pub async fn list(&self, folder: &str) -> Result<Vec<FileInfo>> {
        if folder.is_empty() {
            return Err(InvalidInput("Folder path cannot be empty".into()).into());
        }

        let api = self.require_api(FILE_STATION_LIST)?;

        let files = self
            .call::<FileList>(
                api,
                "list",
                &[("folder_path", folder), ("additional", ADDITIONAL)],
            )
            .await
            .with_context(|| format!("Failed to list {folder}"))?;

        debug!("Listed {} of {} files in {folder}", files.files.len(), files.total);
        Ok(files.files)
    }

    /// Gets information about the file or folder at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Path is empty
    /// - The NAS does not offer `SYNO.FileStation.List`
    /// - Network request fails
    /// - API returns an error response
    /// - Response cannot be parsed
    pub async fn stat(&self, path: &str) -> Result<Vec<FileInfo>> {
        if path.is_empty() {
            return Err(InvalidInput("Path cannot be empty".into()).into());
        }

        let api = self.require_api(FILE_STATION_LIST)?;

        let info = self
            .call::<FileInfoList>(api, "getinfo", &[("path", path), ("additional", ADDITIONAL)])
            .await
            .with_context(|| format!("Failed to get info for {path}"))?;

        Ok(info.files)
    }

    /// Downloads the file at `path` into `writer`, returning the number of bytes written
    ///
    /// The body is copied chunk by chunk as it arrives and is never held in memory as a whole.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Path is empty
    /// - The NAS does not offer `SYNO.FileStation.Download`
    /// - Network request fails or the NAS answers with a non-success HTTP status
    /// - The NAS answers with an error envelope instead of the file content
    /// - Writing to `writer` fails
    pub async fn download<W>(&self, path: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if path.is_empty() {
            return Err(InvalidInput("Path cannot be empty".into()).into());
        }

        let api = self.require_api(FILE_STATION_DOWNLOAD)?;

        let written = self
            .call_stream(api, "download", &[("path", path), ("mode", "download")], writer)
            .await
            .with_context(|| format!("Failed to download {path}"))?;

        debug!("Downloaded {written} bytes from {path}");
        Ok(written)
    }

    /// Calculates the MD5 hash of the file at `path` on the NAS
    ///
    /// Starts a background task and checks its status until it finishes,
    /// pausing [`crate::client::PollConfig::interval`] between checks. Gives up
    /// after [`crate::client::PollConfig::max_attempts`] checks and asks the NAS
    /// to stop the task.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Path is empty
    /// - The NAS does not offer `SYNO.FileStation.MD5`
    /// - Network request fails
    /// - API returns an error response
    /// - The task finishes without a hash
    /// - The task doesn't finish within the configured number of checks
    pub async fn md5(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(InvalidInput("Path cannot be empty".into()).into());
        }

        let api = self.require_api(FILE_STATION_MD5)?;

        let task = self
            .call::<Md5Task>(api, "start", &[("file_path", path)])
            .await
            .with_context(|| format!("Failed to start MD5 calculation of {path}"))?;

        debug!("Started MD5 task {} for {path}", task.taskid);

        let polling = self.polling();
        for attempt in 1..=polling.max_attempts {
            let status = self
                .call::<Md5Status>(api, "status", &[("taskid", task.taskid.as_str())])
                .await
                .context("Failed to get MD5 task status")?;

            if status.finished {
                debug!("MD5 task {} finished after {attempt} checks", task.taskid);
                return status
                    .md5
                    .filter(|hash| !hash.is_empty())
                    .ok_or_else(|| InvalidResponse("MD5 task finished without a hash".into()).into());
            }

            if attempt < polling.max_attempts {
                sleep(polling.interval).await;
            }
        }

        if let Err(err) = self
            .call::<()>(api, "stop", &[("taskid", task.taskid.as_str())])
            .await
        {
            warn!("Failed to stop MD5 task {}: {err}", task.taskid);
        }

        Err(Timeout {
            task: task.taskid,
            attempts: polling.max_attempts,
        }
        .into())
    }
}
