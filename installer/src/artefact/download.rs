//! Source archive download.
//!
//! Provides a trait-based abstraction for fetching the archive named by a
//! formula URL, enabling dependency injection for testing. Remote URLs are
//! fetched with `ureq`; `file://` URLs are copied from the local filesystem
//! so archives can be installed offline.

use log::debug;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for archive downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix identifying local archive URLs.
const FILE_SCHEME: &str = "file://";

/// Trait for downloading source archives.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```no_run
/// use formula_installer::artefact::download::{ArchiveDownloader, UrlDownloader};
/// use std::path::Path;
///
/// let downloader = UrlDownloader;
/// downloader.fetch(
///     "https://example.com/archive/v1.0.0.tar.gz",
///     Path::new("/tmp/v1.0.0.tar.gz"),
/// )?;
/// # Ok::<(), formula_installer::artefact::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveDownloader {
    /// Download the archive at `url` into the file `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or file write fails.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from archive download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404 or missing local file).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that could not be resolved.
        url: String,
    },

    /// The URL scheme is not one this downloader understands.
    #[error("unsupported URL scheme: {url}")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloader dispatching on the URL scheme.
///
/// `https://` and `http://` go through a shared `ureq` agent, `file://`
/// copies a local file.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlDownloader;

impl ArchiveDownloader for UrlDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        if let Some(local) = url.strip_prefix(FILE_SCHEME) {
            return copy_local(url, Path::new(local), dest);
        }
        if url.starts_with("https://") || url.starts_with("http://") {
            return download_to_file(url, dest);
        }
        Err(DownloadError::UnsupportedScheme {
            url: url.to_owned(),
        })
    }
}

/// Copy a `file://` archive into place.
fn copy_local(url: &str, source: &Path, dest: &Path) -> Result<(), DownloadError> {
    if !source.is_file() {
        return Err(DownloadError::NotFound {
            url: url.to_owned(),
        });
    }
    debug!("copying local archive {} to {}", source.display(), dest.display());
    std::fs::copy(source, dest)?;
    Ok(())
}

/// Download a URL and write the body to a file.
fn download_to_file(url: &str, dest: &Path) -> Result<(), DownloadError> {
    debug!("downloading {url} to {}", dest.display());
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| map_ureq_error(url, &e))?;
    let mut file = std::fs::File::create(dest)?;
    std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(DownloadError::Io)?;
    Ok(())
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
