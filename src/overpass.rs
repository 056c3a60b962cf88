//! Overpass API queries.
//!
//! Queries pasted from overpass-turbo carry their own settings and output
//! statements. [`sanitize_query`] strips those so the tools can wrap the
//! body with their own `[out:json]` header and `out` statement.
//!
//! The HTTP client is behind the `http` feature; query building is always
//! available.

use std::fs;
use std::path::Path;

#[cfg(feature = "http")]
pub use client::{OverpassClient, OverpassConfig};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Barcelona, as `south,west,north,east`
pub const DEFAULT_BBOX: &str = "41.32,2.05,41.47,2.23";

/// Read a `south,west,north,east` bounding box from a file.
///
/// Returns `None` if the file does not exist or is empty.
pub fn load_bbox(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let bbox = text.trim();
    if bbox.is_empty() {
        None
    } else {
        Some(bbox.to_string())
    }
}

/// Strip settings, style blocks and output statements from a query body.
pub fn sanitize_query(query: &str) -> String {
    let mut body = strip_blocks(query, "{{style:", "}}");
    for setting in ["[out:", "[timeout:", "[bbox:"] {
        body = strip_blocks(&body, setting, "]");
    }

    let body = body
        .trim()
        .lines()
        .map(strip_output_statement)
        .collect::<Vec<_>>()
        .join("\n");

    collapse_semicolons(body.trim())
        .trim_matches(';')
        .trim()
        .to_string()
}

/// Wrap a sanitized body into a complete JSON query returning way geometry.
pub fn build_way_query(body: &str, bbox: Option<&str>) -> String {
    let bbox_setting = bbox.map(|b| format!("[bbox:{}]", b)).unwrap_or_default();
    format!("[out:json][timeout:300]{};{};out geom;", bbox_setting, body)
}

// Remove every `open ... close` span; an unterminated span is left alone
fn strip_blocks(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(close) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after_open[end + close.len()..];
    }
    out.push_str(rest);
    out
}

// Drop a trailing `out ...;` statement from a line
fn strip_output_statement(line: &str) -> &str {
    let Some(body) = line.trim_end().strip_suffix(';') else {
        return line;
    };
    let start = body.rfind(';').map_or(0, |i| i + 1);
    if is_output_statement(body[start..].trim_start()) {
        &line[..start]
    } else {
        line
    }
}

fn is_output_statement(statement: &str) -> bool {
    statement
        .strip_prefix("out")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn collapse_semicolons(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ';' && out.ends_with(';') {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(feature = "http")]
mod client {
    use std::time::{Duration, Instant};

    use log::{debug, info};
    use reqwest::Client;

    use super::OVERPASS_URL;
    use crate::{Error, OverpassResponse, Result};

    /// Configuration for the Overpass client
    #[derive(Debug, Clone)]
    pub struct OverpassConfig {
        /// Interpreter endpoint (default: overpass-api.de)
        pub endpoint: String,
        /// Whole-request timeout (default: 360s)
        pub timeout: Duration,
    }

    impl Default for OverpassConfig {
        fn default() -> Self {
            Self {
                endpoint: OVERPASS_URL.to_string(),
                timeout: Duration::from_secs(360),
            }
        }
    }

    /// Client posting queries to an Overpass interpreter
    pub struct OverpassClient {
        client: Client,
        endpoint: String,
    }

    impl OverpassClient {
        pub fn new(config: &OverpassConfig) -> Result<Self> {
            let client = Client::builder().timeout(config.timeout).build()?;
            Ok(Self {
                client,
                endpoint: config.endpoint.clone(),
            })
        }

        /// Run a query and decode the JSON response.
        pub async fn fetch(&self, query: &str) -> Result<OverpassResponse> {
            let req_start = Instant::now();
            debug!("[Overpass] query: {}", query);

            let response = self
                .client
                .post(&self.endpoint)
                .form(&[("data", query)])
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                });
            }

            let bytes = response.bytes().await.map_err(classify)?;
            let data: OverpassResponse = serde_json::from_slice(&bytes)?;

            info!(
                "[Overpass] {} elements ({:.1}KB) in {:?}",
                data.elements.len(),
                bytes.len() as f64 / 1024.0,
                req_start.elapsed()
            );
            Ok(data)
        }
    }

    fn classify(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout
        } else if e.is_connect() {
            Error::Connect
        } else {
            Error::Http(e)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // Serve a single canned HTTP response and return the endpoint URL
        async fn serve_once(status: &'static str, body: &'static str) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            });

            format!("http://{}/api/interpreter", addr)
        }

        fn request_complete(request: &[u8]) -> bool {
            let text = String::from_utf8_lossy(request);
            let Some(header_end) = text.find("\r\n\r\n") else {
                return false;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            request.len() >= header_end + 4 + content_length
        }

        fn client_for(endpoint: String) -> OverpassClient {
            OverpassClient::new(&OverpassConfig {
                endpoint,
                timeout: Duration::from_secs(5),
            })
            .unwrap()
        }

        #[tokio::test]
        async fn test_fetch_decodes_elements() {
            let endpoint = serve_once(
                "200 OK",
                r#"{"elements":[{"type":"way","id":7,"geometry":[{"lat":41.0,"lon":2.0}]}]}"#,
            )
            .await;

            let data = client_for(endpoint).fetch("way(1);out geom;").await.unwrap();
            assert_eq!(data.elements.len(), 1);
            assert_eq!(data.elements[0].id, 7);
        }

        #[tokio::test]
        async fn test_fetch_reports_http_status() {
            let endpoint = serve_once("429 Too Many Requests", "rate limited").await;

            let err = client_for(endpoint).fetch("way(1);").await.unwrap_err();
            assert!(matches!(err, Error::HttpStatus { status: 429, ref body } if body == "rate limited"));
        }

        #[tokio::test]
        async fn test_fetch_rejects_invalid_json() {
            let endpoint = serve_once("200 OK", "<html>busy</html>").await;

            let err = client_for(endpoint).fetch("way(1);").await.unwrap_err();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_turbo_query() {
        let query = "[out:json][timeout:25];\n\
                     way[\"surface\"=\"asphalt\"](41.35,2.10,41.42,2.20);\n\
                     out geom;\n\
                     {{style: way { color: red; } }}";
        assert_eq!(
            sanitize_query(query),
            "way[\"surface\"=\"asphalt\"](41.35,2.10,41.42,2.20)"
        );
    }

    #[test]
    fn test_sanitize_keeps_union_body() {
        let query = "[bbox:41.3,2.0,41.5,2.3];\n(\n  way[highway=cycleway];\n  way[highway=path];\n);\nout body;";
        assert_eq!(
            sanitize_query(query),
            "(\n  way[highway=cycleway];\n  way[highway=path];\n)"
        );
    }

    #[test]
    fn test_sanitize_strips_inline_out_and_repeated_semicolons() {
        assert_eq!(sanitize_query("way[surface=asphalt];;;out geom;"), "way[surface=asphalt]");
        assert_eq!(sanitize_query("way[name=Outer];"), "way[name=Outer]");
        assert_eq!(sanitize_query("node[amenity=bench]"), "node[amenity=bench]");
    }

    #[test]
    fn test_build_way_query() {
        assert_eq!(
            build_way_query("way[surface=asphalt]", Some("41.32,2.05,41.47,2.23")),
            "[out:json][timeout:300][bbox:41.32,2.05,41.47,2.23];way[surface=asphalt];out geom;"
        );
        assert_eq!(
            build_way_query("way[surface=asphalt]", None),
            "[out:json][timeout:300];way[surface=asphalt];out geom;"
        );
    }

    #[test]
    fn test_load_bbox() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bbox.overpassql");
        assert_eq!(load_bbox(&path), None);

        std::fs::write(&path, "  41.3,2.0,41.5,2.3\n").unwrap();
        assert_eq!(load_bbox(&path).as_deref(), Some("41.3,2.0,41.5,2.3"));
    }
}
