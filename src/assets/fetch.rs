use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    assets::decode::decode_base64_payload,
    foundation::error::{PackError, PackResult},
};

/// Default User-Agent sent with HTTP image requests.
pub const DEFAULT_USER_AGENT: &str = concat!("packdoc/", env!("CARGO_PKG_VERSION"));

/// Source of raw image bytes for a source identifier.
///
/// `fetch` is blocking; the resolver calls it from the blocking thread pool, so implementations
/// must be `Send + Sync`.
pub trait ImageFetcher: Send + Sync {
    /// Return the undecoded bytes behind `source`.
    fn fetch(&self, source: &str) -> PackResult<Vec<u8>>;
}

impl<T: ImageFetcher + ?Sized> ImageFetcher for Arc<T> {
    fn fetch(&self, source: &str) -> PackResult<Vec<u8>> {
        (**self).fetch(source)
    }
}

/// Settings for [`SourceFetcher`].
#[derive(Clone, Debug)]
pub struct FetchOpts {
    /// Directory that relative source paths are resolved against.
    pub root: PathBuf,
    /// Whole-request timeout for HTTP sources.
    pub http_timeout: Duration,
    /// User-Agent header for HTTP sources.
    pub user_agent: String,
    /// Largest accepted payload in bytes.
    pub max_bytes: u64,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            http_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Default fetcher treating each source identifier as a URL.
///
/// Supported forms:
/// - `data:` URLs with a base64 payload
/// - `http://` and `https://` URLs
/// - `file://` URLs with an absolute path
/// - anything else as a path relative to [`FetchOpts::root`]
#[derive(Clone)]
pub struct SourceFetcher {
    opts: FetchOpts,
    agent: ureq::Agent,
}

impl std::fmt::Debug for SourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFetcher")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Default for SourceFetcher {
    fn default() -> Self {
        Self::new(FetchOpts::default())
    }
}

impl SourceFetcher {
    /// Build a fetcher from `opts`.
    pub fn new(opts: FetchOpts) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(opts.http_timeout))
            .build()
            .into();
        Self { opts, agent }
    }

    /// Build a fetcher resolving relative paths against `root`, other settings default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(FetchOpts {
            root: root.into(),
            ..FetchOpts::default()
        })
    }

    /// Return the directory relative sources are resolved against.
    pub fn root(&self) -> &Path {
        &self.opts.root
    }

    fn fetch_data(&self, source: &str) -> PackResult<Vec<u8>> {
        let (header, payload) = source
            .split_once(',')
            .ok_or_else(|| PackError::fetch("data URL is missing ','"))?;
        if !header.to_ascii_lowercase().ends_with(";base64") {
            return Err(PackError::fetch("only base64 data URLs are supported"));
        }
        let bytes = decode_base64_payload(payload)?;
        self.check_size(source, bytes.len() as u64)?;
        Ok(bytes)
    }

    fn fetch_http(&self, source: &str) -> PackResult<Vec<u8>> {
        let mut response = self
            .agent
            .get(source)
            .header("User-Agent", &self.opts.user_agent)
            .call()
            .map_err(|e| PackError::fetch(format!("GET '{source}': {e}")))?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.opts.max_bytes)
            .read_to_vec()
            .map_err(|e| PackError::fetch(format!("read body of '{source}': {e}")))?;
        if bytes.is_empty() {
            return Err(PackError::fetch(format!("empty response body for '{source}'")));
        }
        Ok(bytes)
    }

    fn fetch_path(&self, source: &str, path: &Path) -> PackResult<Vec<u8>> {
        let bytes = std::fs::read(path)
            .map_err(|e| PackError::fetch(format!("read '{}': {e}", path.display())))?;
        self.check_size(source, bytes.len() as u64)?;
        Ok(bytes)
    }

    fn check_size(&self, source: &str, len: u64) -> PackResult<()> {
        if len > self.opts.max_bytes {
            return Err(PackError::fetch(format!(
                "'{source}' is {len} bytes, limit is {}",
                self.opts.max_bytes
            )));
        }
        Ok(())
    }
}

impl ImageFetcher for SourceFetcher {
    fn fetch(&self, source: &str) -> PackResult<Vec<u8>> {
        if has_scheme(source, "data:") {
            self.fetch_data(source)
        } else if has_scheme(source, "http://") || has_scheme(source, "https://") {
            self.fetch_http(source)
        } else if let Some(path) = source.strip_prefix("file://") {
            if !path.starts_with('/') {
                return Err(PackError::validation(format!(
                    "file URL must carry an absolute path: '{source}'"
                )));
            }
            self.fetch_path(source, Path::new(path))
        } else {
            let rel = normalize_rel_path(source)?;
            let path = self.opts.root.join(Path::new(&rel));
            self.fetch_path(source, &path)
        }
    }
}

fn has_scheme(source: &str, scheme: &str) -> bool {
    source
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Turn a relative source identifier into a root-relative file path.
///
/// Identifiers are read as relative URL references: a `?query` or `#fragment` suffix is dropped,
/// `%XX` escapes are decoded per segment, `\` counts as a separator, and empty or `.` segments
/// vanish. Absolute paths, drive prefixes (`C:`), `..` and escaped separators are rejected.
pub fn normalize_rel_path(source: &str) -> PackResult<String> {
    let path = source
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .replace('\\', "/");
    if path.starts_with('/') {
        return Err(PackError::validation(format!(
            "image source '{source}' must be relative"
        )));
    }

    let mut segments = Vec::new();
    for raw in path.split('/').filter(|seg| !seg.is_empty() && *seg != ".") {
        let seg = percent_decode(raw).ok_or_else(|| {
            PackError::validation(format!("image source '{source}' has a bad escape"))
        })?;
        if seg == ".." || seg.contains(['/', '\\', '\0']) {
            return Err(PackError::validation(format!(
                "image source '{source}' escapes the asset root"
            )));
        }
        if segments.is_empty() && is_drive_prefix(&seg) {
            return Err(PackError::validation(format!(
                "image source '{source}' must be relative"
            )));
        }
        if seg != "." {
            segments.push(seg);
        }
    }

    if segments.is_empty() {
        return Err(PackError::validation(format!(
            "image source '{source}' names no file"
        )));
    }
    Ok(segments.join("/"))
}

fn is_drive_prefix(seg: &str) -> bool {
    let b = seg.as_bytes();
    b.len() == 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// Decode `%XX` escapes; `None` on a truncated escape or non-UTF-8 result.
fn percent_decode(seg: &str) -> Option<String> {
    if !seg.contains('%') {
        return Some(seg.to_string());
    }
    let bytes = seg.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = seg.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
