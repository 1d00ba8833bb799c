//! Resilient file fetching with a fallback chain of candidate URLs.

use crate::error::FetchError;
use crate::progress::{ProgressSink, ProgressSnapshot, ProgressState};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Browser User-Agent sent with every request. Several SDK mirrors reject
/// requests without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

/// Size of each chunk written to disk between progress updates.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Where to fetch a resource from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchSource {
    /// A single URL.
    Single(String),
    /// Candidate URLs tried in order until one succeeds.
    Candidates(Vec<String>),
}

impl FetchSource {
    /// Checks that there is at least one non-empty URL to try.
    pub fn validate(&self) -> Result<(), FetchError> {
        let urls: &[String] = match self {
            Self::Single(url) => std::slice::from_ref(url),
            Self::Candidates(urls) if urls.is_empty() => {
                return Err(FetchError::InvalidArgument(
                    "candidate URL list is empty".to_string(),
                ));
            }
            Self::Candidates(urls) => urls,
        };

        if urls.iter().any(|url| url.trim().is_empty()) {
            return Err(FetchError::InvalidArgument(
                "URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&str> for FetchSource {
    fn from(url: &str) -> Self {
        Self::Single(url.to_string())
    }
}

impl From<String> for FetchSource {
    fn from(url: String) -> Self {
        Self::Single(url)
    }
}

impl From<Vec<String>> for FetchSource {
    fn from(urls: Vec<String>) -> Self {
        Self::Candidates(urls)
    }
}

impl From<&[&str]> for FetchSource {
    fn from(urls: &[&str]) -> Self {
        Self::Candidates(urls.iter().map(|u| u.to_string()).collect())
    }
}

/// Accepts the loosely typed argument of an external caller: a string or an
/// array of strings.
impl TryFrom<Value> for FetchSource {
    type Error = FetchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let invalid =
            || FetchError::InvalidArgument("url must be a string or a list of strings".to_string());

        match value {
            Value::String(url) => Ok(Self::Single(url)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(url) => Ok(url),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Candidates),
            _ => Err(invalid()),
        }
    }
}

/// An open response body.
pub struct Download {
    /// Declared length of the body, if the server sent one
    pub content_length: Option<u64>,
    /// The body stream
    pub body: Box<dyn Read + Send>,
}

/// Opens a GET request for a URL.
pub trait Transport {
    /// Starts the request; failures map to [`FetchError::Network`].
    fn get(&self, url: &str) -> Result<Download, FetchError>;
}

/// [`Transport`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client, e.g. one with proxies or timeouts set.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Download, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::network(url, e))?;

        Ok(Download {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

/// Downloads resources to disk, one request at a time.
#[derive(Debug, Clone)]
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    chunk_size: usize,
}

impl Fetcher<HttpTransport> {
    /// A fetcher over HTTP with the default browser User-Agent.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, FetchError> {
        Ok(Self::with_transport(HttpTransport::new(user_agent)?))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the chunk size; zero is treated as one byte.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Download `source` to `destination`, returning the absolute destination.
    ///
    /// The destination's parent directories are created first. A failed
    /// attempt never leaves a partial file behind; with
    /// [`FetchSource::Candidates`] the next URL is tried after each failure.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidArgument`] for an empty URL or an empty list
    /// - [`FetchError::Network`] when a single URL fails
    /// - [`FetchError::AllCandidatesExhausted`] when every candidate fails
    pub fn fetch(
        &self,
        source: &FetchSource,
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        source.validate()?;

        let destination = std::path::absolute(destination)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match source {
            FetchSource::Single(url) => {
                self.fetch_url(url, &destination, progress)?;
                Ok(destination)
            }
            FetchSource::Candidates(urls) => {
                for url in urls {
                    match self.fetch_url(url, &destination, progress) {
                        Ok(_) => return Ok(destination),
                        Err(e) => tracing::warn!("{}. Proceeding with backup...", e),
                    }
                }
                Err(FetchError::AllCandidatesExhausted { destination })
            }
        }
    }

    fn fetch_url(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        tracing::info!("Downloading {} to {}", url, destination.display());

        let mut attempt = Attempt {
            sink: progress,
            drawn: false,
        };
        let result = self.stream_to_file(url, destination, &mut attempt);
        if result.is_err() {
            remove_partial(destination);
            // Close the aborted line so the next candidate draws its own
            if attempt.drawn {
                attempt.finish();
            }
        }
        result
    }

    fn stream_to_file(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        let Download {
            content_length,
            mut body,
        } = self.transport.get(url)?;
        let mut file = File::create(destination).map_err(|e| FetchError::network(url, e))?;

        let mut state = ProgressState::new(content_length);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = fill_chunk(&mut body, &mut buffer).map_err(|e| FetchError::network(url, e))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .map_err(|e| FetchError::network(url, e))?;
            state.advance(read as u64);
            progress.update(&state.snapshot());
        }
        file.flush().map_err(|e| FetchError::network(url, e))?;

        let received = state.processed();
        match content_length {
            Some(expected) if received < expected => {
                return Err(FetchError::network(
                    url,
                    format!("truncated stream: received {received} of {expected} bytes"),
                ));
            }
            // An empty body never reached the loop's update
            Some(_) if received == 0 => progress.update(&state.snapshot()),
            Some(_) => {}
            None => {
                state.set_total(Some(received));
                progress.update(&state.snapshot());
            }
        }
        progress.finish();

        tracing::debug!("Downloaded {} bytes from {}", received, url);
        Ok(received)
    }
}

/// Forwards to the caller's sink, remembering whether this attempt drew anything.
struct Attempt<'a> {
    sink: &'a mut dyn ProgressSink,
    drawn: bool,
}

impl ProgressSink for Attempt<'_> {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        self.drawn = true;
        self.sink.update(snapshot);
    }

    fn finish(&mut self) {
        self.drawn = false;
        self.sink.finish();
    }
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove partial download {}: {}",
            path.display(),
            e
        ),
    }
}

/// Reads until `buf` is full or the stream ends, so every chunk but the last
/// has the configured size.
fn fill_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Hands out at most three bytes per read.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.0.len().min(buf.len()).min(3);
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_fill_chunk_fills_across_short_reads() {
        let mut reader = Trickle(b"abcdefghij");
        let mut buf = [0u8; 8];
        assert_eq!(fill_chunk(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"abcdefgh");
        assert_eq!(fill_chunk(&mut reader, &mut buf).unwrap(), 2);
        assert_eq!(fill_chunk(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_source_from_json_string() {
        let source = FetchSource::try_from(json!("https://example.com/a.zip")).unwrap();
        assert_eq!(source, FetchSource::from("https://example.com/a.zip"));
    }

    #[test]
    fn test_source_from_json_array() {
        let source = FetchSource::try_from(json!(["https://a/x.zip", "https://b/x.zip"])).unwrap();
        assert_eq!(
            source,
            FetchSource::Candidates(vec![
                "https://a/x.zip".to_string(),
                "https://b/x.zip".to_string()
            ])
        );
    }

    #[test]
    fn test_source_from_json_rejects_other_shapes() {
        for value in [json!(42), json!(null), json!({"url": "x"}), json!(["ok", 1])] {
            let result = FetchSource::try_from(value);
            assert!(matches!(result, Err(FetchError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_validate_rejects_empty_inputs() {
        assert!(matches!(
            FetchSource::Candidates(vec![]).validate(),
            Err(FetchError::InvalidArgument(_))
        ));
        assert!(matches!(
            FetchSource::from("  ").validate(),
            Err(FetchError::InvalidArgument(_))
        ));
        assert!(FetchSource::from("https://example.com").validate().is_ok());
    }

    #[test]
    fn test_chunk_size_never_zero() {
        struct Never;
        impl Transport for Never {
            fn get(&self, url: &str) -> Result<Download, FetchError> {
                Err(FetchError::network(url, "unreachable"))
            }
        }

        let fetcher = Fetcher::with_transport(Never).chunk_size(0);
        assert_eq!(fetcher.chunk_size, 1);
    }
}
