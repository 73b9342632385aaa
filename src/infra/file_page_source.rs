use super::html_tables::parse_tables;
use crate::app::ports::PageSource;
use crate::error::FetchError;
use crate::types::RawTable;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Serves a page saved to disk, whatever URL is asked for. Used for dry runs
/// against a captured page.
pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn fetch(&self, url: &str, ready_timeout: Duration) -> Result<Vec<RawTable>, FetchError> {
        info!("Reading {} in place of {}", self.path.display(), url);
        let html = tokio::time::timeout(ready_timeout, tokio::fs::read_to_string(&self.path))
            .await
            .map_err(|_| FetchError::timeout(format!("reading {} timed out", self.path.display())))?
            .map_err(|e| FetchError::navigation(format!("{}: {}", self.path.display(), e)))?;
        Ok(parse_tables(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    #[tokio::test]
    async fn reads_tables_from_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<table><tr><td>Gold 1g</td><td>250</td><td>255</td></tr></table>").unwrap();

        let source = FilePageSource::new(&path);
        let tables = source.fetch("https://example.test", Duration::from_secs(5)).await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0][2], "255");
    }

    #[tokio::test]
    async fn missing_file_is_a_navigation_failure() {
        let source = FilePageSource::new("/definitely/not/here.html");
        let err = source.fetch("x", Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::NavigationFailed);
    }
}
