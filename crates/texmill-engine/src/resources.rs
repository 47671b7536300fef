//! Media materialization.
//!
//! The engine can only include files it finds on disk. Before rendering,
//! every image whose locator is not already a local file is fetched and
//! written into the working directory under a name derived from the locator
//! itself, and the image is pointed at the copy. A reference that cannot be
//! fetched is left as it was, with a warning; the engine will then report the
//! missing file itself.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use texmill_doc::{Document, Image};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::error::{TexError, TexResult};

/// Longest base64 stem used for a materialized file name; longer locators
/// fall back to a hash so names stay within file system limits.
pub const MAX_ENCODED_STEM_LEN: usize = 200;

/// Bytes and MIME type returned by a [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Resource contents.
    pub bytes: Vec<u8>,
    /// MIME type, if the source reported or implied one.
    pub mime: Option<String>,
}

/// Errors from fetching a single resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Reading a local file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `data:` URI was malformed.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// A URL could not be parsed or joined onto the base.
    #[error("invalid URL '{locator}': {source}")]
    InvalidUrl {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    /// The locator uses a scheme this fetcher cannot handle.
    #[error("unsupported resource locator: {0}")]
    Unsupported(String),

    /// An HTTP request failed.
    #[cfg(feature = "http")]
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// An HTTP request returned a non-success status.
    #[error("request for {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },
}

/// Fetches the bytes behind a resource locator.
pub trait Fetcher {
    /// Fetches `locator`, resolving relative locators against `base`.
    fn fetch(&self, base: Option<&str>, locator: &str) -> Result<Fetched, FetchError>;
}

/// A reference that was left unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceWarning {
    /// The locator as it appeared in the document.
    pub locator: String,
    /// Why it could not be materialized.
    pub reason: String,
}

impl std::fmt::Display for ResourceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not fetch resource '{}': {}", self.locator, self.reason)
    }
}

/// Result of [`materialize`].
#[derive(Debug, Clone)]
pub struct Materialized {
    /// The rewritten document.
    pub document: Document,
    /// One entry per unresolved reference.
    pub warnings: Vec<ResourceWarning>,
    /// Files written into the working directory.
    pub written: Vec<PathBuf>,
}

/// Makes every non-local image in `document` available inside `work_dir`.
///
/// Only I/O errors while writing into `work_dir` are returned as errors;
/// fetch failures become [`ResourceWarning`]s.
pub fn materialize(
    base: Option<&str>,
    work_dir: &Path,
    document: Document,
    fetcher: &dyn Fetcher,
) -> TexResult<Materialized> {
    let mut warnings = Vec::new();
    let mut written = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    let document = document.try_map_images::<TexError, _>(|image| {
        if Path::new(&image.source).is_file() {
            return Ok(image);
        }
        if let Some(local) = seen.get(&image.source) {
            return Ok(Image {
                source: local.clone(),
                ..image
            });
        }

        let fetched = match fetcher.fetch(base, &image.source) {
            Ok(fetched) => fetched,
            Err(err) => {
                warnings.push(unresolved(&image.source, err.to_string()));
                return Ok(image);
            }
        };

        let extension = fetched
            .mime
            .as_deref()
            .and_then(extension_for_mime)
            .map(str::to_string)
            .or_else(|| locator_extension(&image.source));
        let Some(extension) = extension else {
            warnings.push(unresolved(
                &image.source,
                "could not determine a file extension".to_string(),
            ));
            return Ok(image);
        };

        let path = work_dir.join(materialized_file_name(&image.source, &extension));
        if write_new(&path, &fetched.bytes).map_err(TexError::Io)? {
            debug!(
                locator = %image.source,
                path = %path.display(),
                bytes = fetched.bytes.len(),
                "materialized resource"
            );
            written.push(path.clone());
        }

        let local = local_locator(&path);
        seen.insert(image.source.clone(), local.clone());
        Ok(Image {
            source: local,
            ..image
        })
    })?;

    Ok(Materialized {
        document,
        warnings,
        written,
    })
}

fn unresolved(locator: &str, reason: String) -> ResourceWarning {
    warn!(locator, %reason, "could not fetch resource; leaving reference unchanged");
    ResourceWarning {
        locator: locator.to_string(),
        reason,
    }
}

/// Writes `bytes` to `path` unless a file is already there.
fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    file.write_all(bytes)?;
    Ok(true)
}

#[cfg(windows)]
fn local_locator(path: &Path) -> String {
    // TeX treats backslashes as control sequences.
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(not(windows))]
fn local_locator(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// File name for a materialized resource: the locator itself in URL-safe
/// base64, or its blake3 digest when that would be too long.
pub fn materialized_file_name(locator: &str, extension: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(locator.as_bytes());
    let stem = if encoded.len() > MAX_ENCODED_STEM_LEN {
        blake3::hash(locator.as_bytes()).to_hex().to_string()
    } else {
        encoded
    };
    format!("{}.{}", stem, extension)
}

/// Preferred file extension for a MIME type.
///
/// Common image types use a fixed table so the result is one the engine's
/// graphics drivers recognise; anything else goes through `mime_guess`.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let known = match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/tiff" => Some("tiff"),
        "image/bmp" => Some("bmp"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        "application/postscript" | "application/eps" | "image/eps" | "image/x-eps" => Some("eps"),
        _ => None,
    };
    known.or_else(|| {
        mime_guess::get_mime_extensions_str(&essence).and_then(|exts| exts.first().copied())
    })
}

/// Extension already present on a locator, ignoring any query or fragment.
pub fn locator_extension(locator: &str) -> Option<String> {
    if locator.starts_with("data:") {
        return None;
    }
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

/// Fetcher for `data:` URIs, `file:` URLs, local paths, and (with the `http`
/// feature) `http`/`https` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFetcher;

impl Fetcher for StandardFetcher {
    fn fetch(&self, base: Option<&str>, locator: &str) -> Result<Fetched, FetchError> {
        if locator.starts_with("data:") {
            return decode_data_uri(locator);
        }
        if let Some(url) = absolute_url(locator) {
            return fetch_url(&url);
        }

        match base {
            Some(base) => match absolute_url(base) {
                Some(base_url) => {
                    let joined =
                        base_url
                            .join(locator)
                            .map_err(|source| FetchError::InvalidUrl {
                                locator: locator.to_string(),
                                source,
                            })?;
                    fetch_url(&joined)
                }
                None => read_local(&Path::new(base).join(locator)),
            },
            None => read_local(Path::new(locator)),
        }
    }
}

/// Parses `s` as a URL with a scheme this fetcher knows. Anything else,
/// including Windows drive paths, is treated as a file path.
fn absolute_url(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    match url.scheme() {
        "http" | "https" | "file" => Some(url),
        _ => None,
    }
}

fn fetch_url(url: &Url) -> Result<Fetched, FetchError> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::Unsupported(url.to_string()))?;
            read_local(&path)
        }
        "http" | "https" => fetch_http(url),
        _ => Err(FetchError::Unsupported(url.to_string())),
    }
}

#[cfg(feature = "http")]
fn fetch_http(url: &Url) -> Result<Fetched, FetchError> {
    let http_err = |source| FetchError::Http {
        url: url.to_string(),
        source,
    };
    let response = reqwest::blocking::get(url.as_str()).map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
    let bytes = response.bytes().map_err(http_err)?.to_vec();
    Ok(Fetched { bytes, mime })
}

#[cfg(not(feature = "http"))]
fn fetch_http(url: &Url) -> Result<Fetched, FetchError> {
    Err(FetchError::Unsupported(format!(
        "{} (built without the `http` feature)",
        url
    )))
}

fn read_local(path: &Path) -> Result<Fetched, FetchError> {
    let bytes = std::fs::read(path).map_err(|source| FetchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mime = mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string);
    Ok(Fetched { bytes, mime })
}

/// Decodes `data:[<mime>][;base64],<payload>`. Only base64 payloads are
/// accepted.
fn decode_data_uri(uri: &str) -> Result<Fetched, FetchError> {
    let rest = &uri["data:".len()..];
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUri("missing ','".to_string()))?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(FetchError::InvalidDataUri(
            "only base64 payloads are supported".to_string(),
        ));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FetchError::InvalidDataUri(e.to_string()))?;
    Ok(Fetched { bytes, mime })
}
