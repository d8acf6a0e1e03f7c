//! Error screenshot naming and persistence.

use crate::driver::Screenshot;
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// ISO-8601 UTC timestamp with `:` and `.` replaced by `-`
#[must_use]
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// `error-<context>-<timestamp>.png`
///
/// Path separators in the context are replaced so the file always lands
/// directly in the screenshot directory.
#[must_use]
pub fn error_screenshot_name(context: &str, at: DateTime<Utc>) -> String {
    let context: String = context
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("error-{context}-{}.png", file_timestamp(at))
}

/// Full path of the error screenshot for `context` in `dir`
#[must_use]
pub fn error_screenshot_path(dir: &Path, context: &str, at: DateTime<Utc>) -> PathBuf {
    dir.join(error_screenshot_name(context, at))
}

/// Write PNG bytes to `path`, creating parent directories
///
/// # Errors
///
/// Returns `ScreenshotError` if the file cannot be written
pub async fn write_png(path: &Path, screenshot: &Screenshot) -> ProbeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProbeError::ScreenshotError {
                message: format!("{}: {e}", parent.display()),
            })?;
    }
    tokio::fs::write(path, &screenshot.data)
        .await
        .map_err(|e| ProbeError::ScreenshotError {
            message: format!("{}: {e}", path.display()),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 14, 3).unwrap()
            + chrono::Duration::milliseconds(512)
    }

    #[test]
    fn test_timestamp_has_no_colons_or_dots() {
        assert_eq!(file_timestamp(instant()), "2026-10-19T09-14-03-512Z");
    }

    #[test]
    fn test_name() {
        assert_eq!(
            error_screenshot_name("AuthPage.navigate", instant()),
            "error-AuthPage.navigate-2026-10-19T09-14-03-512Z.png"
        );
    }

    #[test]
    fn test_name_strips_separators() {
        let name = error_screenshot_name("a/b\\c", instant());
        assert!(name.starts_with("error-a-b-c-"));
    }

    #[tokio::test]
    async fn test_write_png_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/shots/x.png");
        let shot = Screenshot::new(Screenshot::PNG_MAGIC.to_vec());
        write_png(&path, &shot).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), Screenshot::PNG_MAGIC.to_vec());
    }
}
