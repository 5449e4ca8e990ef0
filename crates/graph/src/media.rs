//! Reading media bytes from disk or a remote URL before upload.

use adlaunch_core::types::MediaSource;
use adlaunch_core::RemoteApiError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

/// Fetch the raw bytes behind a media source.
pub async fn load_bytes(http: &reqwest::Client, source: &MediaSource) -> Result<Vec<u8>, RemoteApiError> {
    match source {
        MediaSource::LocalFile { path } => tokio::fs::read(path).await.map_err(|e| {
            RemoteApiError::new(format!("Failed to read media file {}: {e}", path.display()))
        }),
        MediaSource::RemoteUrl { url } => {
            debug!(url = %url, "Downloading media");
            let response = http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| RemoteApiError::new(format!("Failed to download media {url}: {e}")))?;
            let status = response.status();
            if !status.is_success() {
                return Err(RemoteApiError::new(format!(
                    "Failed to download media {url}: status {status}"
                ))
                .with_status(status.as_u16()));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| RemoteApiError::new(format!("Failed to download media {url}: {e}")))?;
            Ok(bytes.to_vec())
        }
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// File name used for multipart uploads.
pub fn file_name(source: &MediaSource, fallback: &str) -> String {
    let name = match source {
        MediaSource::LocalFile { path } => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        MediaSource::RemoteUrl { url } => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };
    name.unwrap_or_else(|| fallback.to_string())
}
