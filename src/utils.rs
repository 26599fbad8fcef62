use crate::entities::FileInfo;
use byte_unit::{Byte, UnitType};
use chrono::{DateTime, Utc};

impl FileInfo {
    #[must_use]
    pub fn calculate_size(&self) -> String {
        let size = Byte::from(self.additional.size);
        format!("{:#.2}", size.get_appropriate_unit(UnitType::Decimal))
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.isdir { "Directory" } else { "Regular File" }
    }

    /// `ls -l` style permission string, e.g. `drwxr-xr-x`
    ///
    /// Empty when the NAS didn't report permissions.
    #[must_use]
    pub fn mode_string(&self) -> String {
        self.additional
            .perm
            .as_ref()
            .map(|perm| {
                let kind = if self.isdir { 'd' } else { '-' };
                format!("{kind}{}", posix_to_rwx(perm.posix))
            })
            .unwrap_or_default()
    }
}

/// Converts the decimal-coded octal mode the NAS reports (e.g. `755`) into `rwxr-xr-x`
#[must_use]
pub fn posix_to_rwx(posix: u32) -> String {
    [posix / 100 % 10, posix / 10 % 10, posix % 10]
        .iter()
        .map(|digit| {
            let read = if digit & 4 != 0 { 'r' } else { '-' };
            let write = if digit & 2 != 0 { 'w' } else { '-' };
            let execute = if digit & 1 != 0 { 'x' } else { '-' };
            format!("{read}{write}{execute}")
        })
        .collect()
}

#[must_use]
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FileAdditional, FilePermission};
    use chrono::TimeZone;

    impl FileInfo {
        fn create_test_file() -> FileInfo {
            FileInfo {
                isdir: false,
                name: String::from("ubuntu.iso"),
                path: String::from("/home/ubuntu.iso"),
                additional: FileAdditional {
                    size: 1_234_567_890,
                    perm: Some(FilePermission {
                        posix: 644,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            }
        }
    }

    #[test]
    fn test_calculate_size() {
        let file = FileInfo::create_test_file();
        assert_eq!("1.23 GB", file.calculate_size());
    }

    #[test]
    fn test_mode_string() {
        let mut file = FileInfo::create_test_file();
        assert_eq!("-rw-r--r--", file.mode_string());

        file.isdir = true;
        file.additional.perm.as_mut().unwrap().posix = 755;
        assert_eq!("drwxr-xr-x", file.mode_string());
        assert_eq!("Directory", file.kind());

        file.additional.perm = None;
        assert_eq!("", file.mode_string());
    }

    #[test]
    fn test_posix_to_rwx() {
        assert_eq!("rwxrwxrwx", posix_to_rwx(777));
        assert_eq!("rwx------", posix_to_rwx(700));
        assert_eq!("---------", posix_to_rwx(0));
    }

    #[test]
    fn test_format_time() {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!("2023-11-14 22:13:20 UTC", format_time(&time));
    }
}
