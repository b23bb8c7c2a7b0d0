use async_trait::async_trait;
use serde_json::Value;
use ureq::{Agent, AgentBuilder, Response};
use urlencoding::encode;

use super::Provider;
use crate::config::RemoteConfig;
use crate::error::{GatewayError, UpstreamFailure};
use crate::models::{ErrorBody, RecommendRequest, SongTitle};
use crate::normalize::parse_suggestions;
use crate::util::preview;

/// Recommender service reached over HTTP
pub struct RemoteProvider {
    agent: Agent,
    base_url: String,
}

impl RemoteProvider {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = AgentBuilder::new().timeout(config.timeout).build();

        RemoteProvider {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run a blocking request on tokio's blocking pool and read a JSON body back
    async fn call<F>(&self, request: F) -> Result<Value, GatewayError>
    where
        F: FnOnce(&Agent) -> Result<Response, ureq::Error> + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || read_json(request(&agent)))
            .await
            .map_err(|e| GatewayError::upstream(format!("request task failed: {e}")))?
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    async fn search(&self, query: &str) -> Result<Vec<SongTitle>, GatewayError> {
        let url = format!("{}/search?q={}", self.base_url, encode(query));

        let payload = self
            .call(move |agent| agent.get(&url).set("Accept", "application/json").call())
            .await?;

        parse_suggestions(&payload)
            .map_err(|e| GatewayError::upstream(format!("unexpected search payload: {e}")))
    }

    async fn recommend(&self, songs: &[SongTitle]) -> Result<Value, GatewayError> {
        let url = format!("{}/recommend", self.base_url);
        let body = RecommendRequest {
            songs: songs.to_vec(),
        };

        self.call(move |agent| {
            agent
                .post(&url)
                .set("Accept", "application/json")
                .send_json(&body)
        })
        .await
    }
}

fn read_json(result: Result<Response, ureq::Error>) -> Result<Value, GatewayError> {
    match result {
        Ok(response) => {
            let status = response.status();
            let text = response.into_string().map_err(|e| {
                GatewayError::upstream(format!("failed to read response body: {e}"))
            })?;

            serde_json::from_str(&text).map_err(|e| {
                GatewayError::Upstream(UpstreamFailure {
                    status: Some(status),
                    message: format!("response is not valid JSON: {e}"),
                    body: Some(preview(&text, 500)),
                    headers: Vec::new(),
                })
            })
        }
        Err(ureq::Error::Status(status, response)) => {
            Err(GatewayError::Upstream(failure_from(status, response)))
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(GatewayError::upstream(transport.to_string()))
        }
    }
}

/// Capture status, headers and body of a non-2xx response
fn failure_from(status: u16, response: Response) -> UpstreamFailure {
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();
    let status_text = response.status_text().to_string();
    let body = response.into_string().ok();

    // Prefer the provider's own `error` message when it sent one
    let message = body
        .as_deref()
        .and_then(|text| serde_json::from_str::<ErrorBody>(text).ok())
        .map(|error_body| error_body.error)
        .unwrap_or(status_text);

    UpstreamFailure {
        status: Some(status),
        message,
        body,
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// Answer exactly one HTTP request with a canned response; yields the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 Content-Type: application/json\r\n\
                 X-Request-Id: test-123\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });

        (format!("http://{addr}"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }

        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);

        let mut body = vec![0; length];
        reader.read_exact(&mut body).unwrap();
        format!("{head}\r\n{}", String::from_utf8(body).unwrap())
    }

    fn provider(base_url: &str) -> RemoteProvider {
        RemoteProvider::new(&RemoteConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn test_search_url_encodes_the_query() {
        let (base_url, server) =
            serve_once("200 OK", r#"["Bohemian Rhapsody","Bohemian Like You"]"#);

        let songs = provider(&base_url).search("Bohemian R&B").await.unwrap();

        assert_eq!(songs, vec!["Bohemian Rhapsody", "Bohemian Like You"]);
        let request = server.join().unwrap();
        assert!(
            request.starts_with("GET /search?q=Bohemian%20R%26B HTTP/1.1"),
            "unexpected request: {request}"
        );
    }

    #[tokio::test]
    async fn test_recommend_posts_the_whole_selection() {
        let (base_url, server) = serve_once("200 OK", r#"{"recommendations":["Song C"]}"#);

        let payload = provider(&base_url)
            .recommend(&["Song A".to_string(), "Song B".to_string()])
            .await
            .unwrap();

        assert_eq!(payload, json!({ "recommendations": ["Song C"] }));
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /recommend HTTP/1.1"));
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, json!({ "songs": ["Song A", "Song B"] }));
    }

    #[tokio::test]
    async fn test_error_status_carries_status_body_and_headers() {
        let (base_url, server) = serve_once(
            "503 Service Unavailable",
            r#"{"error":"model not loaded","details":"warming up"}"#,
        );

        let err = provider(&base_url)
            .recommend(&["Song A".to_string()])
            .await
            .unwrap_err();
        server.join().unwrap();

        match err {
            GatewayError::Upstream(failure) => {
                assert_eq!(failure.status, Some(503));
                assert_eq!(failure.message, "model not loaded");
                assert!(failure.body.unwrap().contains("warming up"));
                assert!(
                    failure
                        .headers
                        .iter()
                        .any(|(name, value)| {
                            name.eq_ignore_ascii_case("x-request-id") && value == "test-123"
                        })
                );
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_upstream_error_without_status() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = provider(&format!("http://127.0.0.1:{port}"))
            .search("anything")
            .await
            .unwrap_err();

        match err {
            GatewayError::Upstream(failure) => assert_eq!(failure.status, None),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_rejects_non_list_payloads() {
        let (base_url, server) = serve_once("200 OK", r#"{"results":["A"]}"#);

        let err = provider(&base_url).search("A").await.unwrap_err();
        server.join().unwrap();

        assert!(err.to_string().contains("unexpected search payload"));
    }
}
