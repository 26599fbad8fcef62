//! Descriptions of the numeric error codes returned in the response envelope.
//!
//! Codes below 400 are shared by every API. Codes from 400 upwards are
//! API specific, so the same number means different things for
//! `SYNO.API.Auth` and `SYNO.FileStation.*`.

use crate::file_station::API_AUTH;

/// Describes a common error code shared by all APIs
#[must_use]
pub fn common_error(code: i32) -> Option<&'static str> {
    let message = match code {
        100 => "Unknown error",
        101 => "No parameter of API, method or version",
        102 => "The requested API does not exist",
        103 => "The requested method does not exist",
        104 => "The requested version does not support the functionality",
        105 => "The logged in session does not have permission",
        106 => "Session timeout",
        107 => "Session interrupted by duplicate login",
        119 => "SID not found",
        _ => return None,
    };
    Some(message)
}

#[must_use]
pub fn auth_error(code: i32) -> Option<&'static str> {
    let message = match code {
        400 => "No such account or incorrect password",
        401 => "Account disabled",
        402 => "Permission denied",
        403 => "2-step verification code required",
        404 => "Failed to authenticate 2-step verification code",
        _ => return None,
    };
    Some(message)
}

#[must_use]
pub fn file_station_error(code: i32) -> Option<&'static str> {
    let message = match code {
        400 => "Invalid parameter of file operation",
        401 => "Unknown error of file operation",
        402 => "System is too busy",
        403 => "Invalid user does this file operation",
        404 => "Invalid group does this file operation",
        405 => "Invalid user and group does this file operation",
        406 => "Can't get user/group information from the account server",
        407 => "Operation not permitted",
        408 => "No such file or directory",
        409 => "Non-supported file system",
        410 => "Failed to connect internet-based file system",
        411 => "Read-only file system",
        412 => "Filename too long in the non-encrypted file system",
        413 => "Filename too long in the encrypted file system",
        414 => "File already exists",
        415 => "Disk quota exceeded",
        416 => "No space left on device",
        417 => "Input/output error",
        418 => "Illegal name or path",
        419 => "Illegal file name",
        420 => "Illegal file name on FAT file system",
        421 => "Device or resource busy",
        599 => "No such task of the file operation",
        _ => return None,
    };
    Some(message)
}

/// Describes `code` as returned by the API named `api`
#[must_use]
pub fn describe(api: &str, code: i32) -> String {
    let specific = if api == API_AUTH {
        auth_error(code)
    } else if api.starts_with("SYNO.FileStation.") {
        file_station_error(code)
    } else {
        None
    };

    specific
        .or_else(|| common_error(code))
        .map_or_else(|| format!("Unrecognized error code {code}"), str::to_string)
}
