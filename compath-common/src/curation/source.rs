//! Reading curation files from disk or over HTTP

use crate::Result;
use tracing::info;

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Contents of a local path or an `http(s)://` URL
pub async fn read_source(source: &str) -> Result<String> {
    if is_remote(source) {
        info!("Downloading curation file {}", source);
        let response = reqwest::get(source).await?.error_for_status()?;
        return Ok(response.text().await?);
    }

    info!("Reading curation file {}", source);
    Ok(tokio::fs::read_to_string(source).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/mappings.tsv"));
        assert!(is_remote("http://example.org/mappings.tsv"));
        assert!(!is_remote("/data/mappings.tsv"));
        assert!(!is_remote("ftp://example.org/mappings.tsv"));
    }

    #[tokio::test]
    async fn test_read_local_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mappings.tsv");
        std::fs::write(&path, "a\tb\n").unwrap();

        let content = read_source(path.to_str().unwrap()).await.unwrap();
        assert_eq!(content, "a\tb\n");

        let missing = dir.path().join("missing.tsv");
        assert!(read_source(missing.to_str().unwrap()).await.is_err());
    }
}
