use super::BlobStore;
use crate::error::{PipelineError, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
const EMULATOR_ENV: &str = "STORAGE_EMULATOR_HOST";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Cloud Storage over the JSON API
pub struct GcsBlobStore {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl GcsBlobStore {
    /// The endpoint is validated on first use; a bare `host:port` is taken as
    /// plain http.
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        let endpoint = endpoint.into();
        let endpoint = if endpoint.contains("://") {
            endpoint
        } else {
            format!("http://{}", endpoint)
        };
        Self { agent, endpoint, token }
    }

    /// Endpoint from `STORAGE_EMULATOR_HOST`, bearer token from
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(EMULATOR_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
        )
    }

    pub(crate) fn from_vars(emulator_host: Option<String>, token: Option<String>) -> Self {
        let endpoint = emulator_host
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint, token.filter(|v| !v.is_empty()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Media download URL of `bucket/object`; `/` inside the object name is
    /// escaped
    pub fn object_url(&self, bucket: &str, object: &str) -> Result<Url> {
        let invalid = |reason: String| {
            PipelineError::FetchError(format!("invalid storage endpoint '{}': {}", self.endpoint, reason))
        };
        let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid("expected an http(s) URL with a host".into()));
        }
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }
}

impl BlobStore for GcsBlobStore {
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()> {
        let url = self.object_url(bucket, object)?;
        info!(bucket, object, dest = %dest.display(), "Downloading object");

        let mut request = self.agent.get(url.as_str());
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                PipelineError::FetchError(format!("gs://{}/{}: HTTP {}", bucket, object, code))
            }
            ureq::Error::Transport(t) => PipelineError::FetchError(format!("gs://{}/{}: {}", bucket, object, t)),
        })?;

        let fetch_io = |e: io::Error| PipelineError::FetchError(format!("{}: {}", dest.display(), e));
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fetch_io)?;
        }

        // `dest` only appears once the whole body is on disk
        let partial = dest.with_extension("part");
        let written = (|| -> io::Result<u64> {
            let mut writer = BufWriter::new(File::create(&partial)?);
            let n = io::copy(&mut response.into_reader(), &mut writer)?;
            writer.flush()?;
            Ok(n)
        })();
        let bytes = match written {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(fetch_io(e));
            }
        };
        fs::rename(&partial, dest).map_err(fetch_io)?;
        debug!(bytes, "Object written");
        Ok(())
    }

    fn location(&self) -> String {
        format!("gcs:{}", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use tempfile::TempDir;

    /// Serve a single HTTP response and hand back the request head
    fn serve_once(status: &'static str, body: &'static [u8]) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            stream.flush().unwrap();
            tx.send(head).unwrap();
        });
        (endpoint, rx)
    }

    #[test]
    fn test_object_url_encoding() {
        let store = GcsBlobStore::new("https://storage.googleapis.com/", None);
        assert_eq!(
            store.object_url("my-bucket", "data/Hotel Reservations.csv").unwrap().as_str(),
            "https://storage.googleapis.com/storage/v1/b/my-bucket/o/data%2FHotel%20Reservations.csv?alt=media"
        );
    }

    #[test]
    fn test_bare_emulator_host_uses_http() {
        let store = GcsBlobStore::from_vars(Some("localhost:4443".into()), None);
        assert_eq!(store.endpoint(), "http://localhost:4443");
        assert_eq!(
            store.object_url("b", "raw.csv").unwrap().as_str(),
            "http://localhost:4443/storage/v1/b/b/o/raw.csv?alt=media"
        );

        let store = GcsBlobStore::from_vars(Some(String::new()), Some(String::new()));
        assert_eq!(store.endpoint(), DEFAULT_ENDPOINT);
        assert!(store.token.is_none());
    }

    #[test]
    fn test_malformed_endpoint_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("raw.csv");
        for endpoint in ["http://[::1", "ftp://example.com", "http://"] {
            let store = GcsBlobStore::new(endpoint, None);
            let err = store.download("b", "raw.csv", &dest).unwrap_err();
            assert!(matches!(err, PipelineError::FetchError(_)), "endpoint {}", endpoint);
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_download_writes_body_verbatim() {
        let body: &'static [u8] = b"Booking_ID,booking_status\nINN1,Canceled\n";
        let (endpoint, requests) = serve_once("200 OK", body);
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("artifacts/raw/raw.csv");

        let store = GcsBlobStore::new(endpoint, Some("t0k3n".into()));
        store.download("b", "dir/raw.csv", &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), body);
        assert!(!dest.with_extension("part").exists());
        let head = requests.recv().unwrap();
        assert!(head.starts_with("GET /storage/v1/b/b/o/dir%2Fraw.csv?alt=media "), "{}", head);
        assert!(head.to_ascii_lowercase().contains("authorization: bearer t0k3n"), "{}", head);
    }

    #[test]
    fn test_no_token_sends_no_authorization() {
        let (endpoint, requests) = serve_once("200 OK", b"x\n");
        let tmp = TempDir::new().unwrap();
        GcsBlobStore::new(endpoint, None)
            .download("b", "raw.csv", &tmp.path().join("raw.csv"))
            .unwrap();
        assert!(!requests.recv().unwrap().to_ascii_lowercase().contains("authorization"));
    }

    #[test]
    fn test_error_status_leaves_nothing_behind() {
        for status in ["404 Not Found", "403 Forbidden"] {
            let (endpoint, _requests) = serve_once(status, b"denied");
            let tmp = TempDir::new().unwrap();
            let dest = tmp.path().join("raw/raw.csv");

            let err = GcsBlobStore::new(endpoint, None)
                .download("b", "raw.csv", &dest)
                .unwrap_err();
            match err {
                PipelineError::FetchError(msg) => assert!(msg.contains(&status[..3]), "{}", msg),
                other => panic!("unexpected error {:?}", other),
            }
            assert!(!dest.exists());
            assert!(!dest.with_extension("part").exists());
        }
    }

    #[test]
    fn test_unreachable_endpoint_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let store = GcsBlobStore::new("http://127.0.0.1:9", None);
        let dest = tmp.path().join("raw/raw.csv");
        let err = store.download("b", "raw.csv", &dest).unwrap_err();
        assert!(matches!(err, PipelineError::FetchError(_)));
        assert!(!dest.exists());
    }
}
