use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response envelope returned by every Synology web API call
#[derive(Deserialize, Debug)]
pub struct SynologyResponse<D> {
    pub success: bool,
    pub data: Option<D>,
    pub error: Option<ErrorInfo>,
}

/// Error information from Synology API
#[derive(Deserialize, Debug)]
pub struct ErrorInfo {
    pub code: i32,
}

/// Description of a single named API as reported by `SYNO.API.Info`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiInfo {
    /// API name, e.g. `SYNO.FileStation.List`
    #[serde(default)]
    pub name: String,
    #[serde(rename = "minVersion")]
    pub min_version: u32,
    #[serde(rename = "maxVersion")]
    pub max_version: u32,
    /// Path relative to `/webapi/`
    pub path: String,
    #[serde(rename = "requestFormat", alias = "format", default)]
    pub request_format: Option<String>,
}

/// Table of every API the server advertised, keyed by API name
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(from = "BTreeMap<String, ApiInfo>")]
pub struct ApiTable(BTreeMap<String, ApiInfo>);

impl From<BTreeMap<String, ApiInfo>> for ApiTable {
    fn from(mut apis: BTreeMap<String, ApiInfo>) -> Self {
        for (name, api) in &mut apis {
            api.name.clone_from(name);
        }
        Self(apis)
    }
}

impl ApiTable {
    /// Looks up an API by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ApiInfo> {
        self.0.get(name)
    }

    /// Iterates over all APIs ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &ApiInfo> {
        self.0.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Authentication response data
///
/// A missing `sid` decodes as empty so that login can report it as an
/// authentication failure rather than a decode error.
#[derive(Deserialize, Debug)]
pub struct AuthData {
    /// Session ID used for authenticated requests
    #[serde(default)]
    pub sid: String,
}

/// Payload of `SYNO.FileStation.List` method `list_share`
#[derive(Deserialize, Debug)]
pub struct ShareList {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    pub shares: Vec<FileInfo>,
}

/// Payload of `SYNO.FileStation.List` method `list`
#[derive(Deserialize, Debug)]
pub struct FileList {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    pub files: Vec<FileInfo>,
}

/// Payload of `SYNO.FileStation.List` method `getinfo`
#[derive(Deserialize, Debug)]
pub struct FileInfoList {
    pub files: Vec<FileInfo>,
}

/// A shared folder, folder or file on the NAS
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FileInfo {
    pub isdir: bool,
    pub name: String,
    /// Absolute path on the NAS, e.g. `/home/notes.txt`
    pub path: String,
    /// Extra fields requested through the `additional` parameter
    #[serde(default)]
    pub additional: FileAdditional,
}

/// Optional file attributes
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FileAdditional {
    #[serde(default)]
    pub owner: FileOwner,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub time: FileTime,
    #[serde(default)]
    pub perm: Option<FilePermission>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FileOwner {
    #[serde(default)]
    pub uid: u32,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub gid: u32,
    #[serde(default)]
    pub group: String,
}

/// File timestamps, transferred as Unix seconds
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FileTime {
    #[serde(with = "ts_seconds", default)]
    pub atime: DateTime<Utc>,
    #[serde(with = "ts_seconds", default)]
    pub crtime: DateTime<Utc>,
    #[serde(with = "ts_seconds", default)]
    pub ctime: DateTime<Utc>,
    #[serde(with = "ts_seconds", default)]
    pub mtime: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FilePermission {
    /// POSIX mode bits, e.g. `755`
    #[serde(default)]
    pub posix: u32,
    #[serde(default)]
    pub is_acl_mode: bool,
    #[serde(default)]
    pub share_right: Option<String>,
}

/// Handle for a background MD5 task started on the NAS
#[derive(Deserialize, Debug)]
pub struct Md5Task {
    pub taskid: String,
}

/// Progress of a background MD5 task
#[derive(Deserialize, Debug)]
pub struct Md5Status {
    pub finished: bool,
    #[serde(default)]
    pub md5: Option<String>,
}
