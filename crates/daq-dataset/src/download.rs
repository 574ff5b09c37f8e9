//! Streamed archive transfer.
//!
//! The archive is several gigabytes, so the body is never buffered: chunks
//! are written to `<dest>.part` as they arrive and the file is renamed onto
//! `dest` only once the transfer completed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;
use tracing::{debug, info};

use crate::error::DatasetError;

/// Bytes between two progress log lines.
const PROGRESS_EVERY_BYTES: u64 = 64 << 20;

/// Download `url` to `dest`, returning the number of bytes received.
///
/// On failure the partial file is removed and `dest` is left untouched.
///
/// # Errors
///
/// Returns [`DatasetError::Download`] for HTTP failures (including non-2xx
/// statuses) and [`DatasetError::Io`] if the file cannot be written.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, DatasetError> {
    let part = part_path(dest);
    match stream_to(client, url, &part).await {
        Ok(received) => {
            tokio::fs::rename(&part, dest)
                .await
                .map_err(|e| DatasetError::io(dest, e))?;
            info!(url = url, dest = %dest.display(), bytes = received, "Archive downloaded");
            Ok(received)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                debug!(part = %part.display(), error = %cleanup, "No partial download to remove");
            }
            Err(e)
        }
    }
}

async fn stream_to(client: &reqwest::Client, url: &str, part: &Path) -> Result<u64, DatasetError> {
    let download_error = |source| DatasetError::Download {
        url: url.to_owned(),
        source,
    };

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(download_error)?;

    info!(
        url = url,
        content_length = response.content_length(),
        "Downloading dataset archive"
    );

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| DatasetError::io(part, e))?;

    let mut body = response.bytes_stream();
    let mut received: u64 = 0;
    let mut next_report = PROGRESS_EVERY_BYTES;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(download_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DatasetError::io(part, e))?;

        received = received.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        if received >= next_report {
            info!(received_mib = received >> 20, "Download progress");
            next_report = next_report.saturating_add(PROGRESS_EVERY_BYTES);
        }
    }

    file.flush().await.map_err(|e| DatasetError::io(part, e))?;
    file.sync_all().await.map_err(|e| DatasetError::io(part, e))?;
    Ok(received)
}

/// The in-progress name for a download to `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
