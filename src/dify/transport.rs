use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde_json::Value;

use super::error::Result;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Sends one authenticated JSON request and hands back the raw response body.
pub trait Transport {
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// `GET <base_url>/parameters`, which any app key is allowed to read.
    pub fn check_key(&self, base_url: &str, api_key: &str, timeout: Duration) -> Result<()> {
        self.client
            .get(format!("{base_url}/parameters"))
            .bearer_auth(api_key)
            .timeout(timeout)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .timeout(timeout)
            .send()?
            .error_for_status()?;

        tracing::info!("Dify API response status: {}", response.status());
        Ok(response.text()?)
    }
}

/// Confirms that `api_key` is accepted by the app behind `base_url`.
pub fn healthcheck(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<()> {
    HttpTransport::new()?
        .check_key(base_url, api_key, timeout)
        .context("Failed to validate API key with Dify")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dify::{DifyClient, DifyConfig, DifyError, RewriteMode};
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    fn local_transport() -> HttpTransport {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpTransport::with_client(client)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.is_empty() || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }

        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).unwrap();

        format!("{head}\r\n{}", String::from_utf8_lossy(&body))
    }

    /// Answers one connection with `response` and reports the raw request.
    fn serve_once(response: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            tx.send(request).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
        });
        (format!("http://{addr}/v1"), rx)
    }

    /// Accepts connections and never answers them.
    fn serve_silently() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                held.push(stream);
            }
        });
        format!("http://{addr}/v1")
    }

    fn split_request(request: &str) -> (String, &str) {
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        (head.to_ascii_lowercase(), body)
    }

    #[test]
    fn post_json_sends_bearer_and_json_body() {
        let (base, requests) = serve_once(http_response("200 OK", r#"{"answer":"ok"}"#));
        let body = json!({ "query": "q", "response_mode": "blocking" });

        let raw = local_transport()
            .post_json(
                &format!("{base}/chat-messages"),
                "app-chat",
                &body,
                Duration::from_secs(5),
            )
            .unwrap();
        assert_eq!(raw, r#"{"answer":"ok"}"#);

        let request = requests.recv().unwrap();
        let (head, sent_body) = split_request(&request);
        assert!(head.starts_with("post /v1/chat-messages http/1.1\r\n"), "{head}");
        assert!(head.contains("\r\nauthorization: bearer app-chat\r\n"), "{head}");
        assert!(head.contains("\r\ncontent-type: application/json\r\n"), "{head}");
        assert_eq!(serde_json::from_str::<Value>(sent_body).unwrap(), body);
    }

    #[test]
    fn client_round_trip_over_http() {
        let (base, requests) = serve_once(http_response(
            "200 OK",
            r#"{"data":{"outputs":{"modified_text":"X"}}}"#,
        ));
        let config = DifyConfig::default()
            .with_base_url(&base)
            .with_api_key(RewriteMode::Workflow, "app-wf");
        let client = DifyClient::with_transport(config, local_transport());

        assert_eq!(client.optimize("foo"), "X");

        let request = requests.recv().unwrap();
        let (head, sent_body) = split_request(&request);
        assert!(head.starts_with("post /v1/workflows/run http/1.1\r\n"), "{head}");
        assert!(head.contains("\r\nauthorization: bearer app-wf\r\n"), "{head}");
        let sent: Value = serde_json::from_str(sent_body).unwrap();
        assert_eq!(sent["inputs"]["text"], "foo");
        assert_eq!(sent["response_mode"], "blocking");
    }

    #[test]
    fn server_error_status_is_network_error() {
        let (base, _requests) = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"message":"boom"}"#,
        ));

        let err = local_transport()
            .post_json(
                &format!("{base}/workflows/run"),
                "app-wf",
                &json!({}),
                Duration::from_secs(5),
            )
            .unwrap_err();
        assert!(matches!(err, DifyError::Network(_)), "{err:?}");
        let message = err.to_string();
        assert!(message.starts_with("Dify text rewrite network error: "), "{message}");
        assert!(message.contains("500"), "{message}");
    }

    #[test]
    fn unanswered_request_times_out_in_both_modes() {
        let base = serve_silently();
        let config = DifyConfig::default()
            .with_base_url(&base)
            .with_timeout(Duration::from_secs(1))
            .with_api_key(RewriteMode::Workflow, "app-wf")
            .with_api_key(RewriteMode::Chat, "app-chat");
        let client = DifyClient::with_transport(config, local_transport());

        assert_eq!(client.workflow_rewrite("t", "i"), "Dify text rewrite timed out");
        assert_eq!(client.chat_rewrite("t", "i"), "Dify text rewrite timed out");
    }

    #[test]
    fn check_key_reads_parameters() {
        let (base, requests) = serve_once(http_response("200 OK", r#"{"user_input_form":[]}"#));

        local_transport()
            .check_key(&base, "app-wf", Duration::from_secs(5))
            .unwrap();

        let request = requests.recv().unwrap();
        let (head, _) = split_request(&request);
        assert!(head.starts_with("get /v1/parameters http/1.1\r\n"), "{head}");
        assert!(head.contains("\r\nauthorization: bearer app-wf\r\n"), "{head}");
    }

    #[test]
    fn check_key_rejects_unauthorized() {
        let (base, _requests) = serve_once(http_response(
            "401 Unauthorized",
            r#"{"code":"unauthorized"}"#,
        ));

        let err = local_transport()
            .check_key(&base, "app-bad", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, DifyError::Network(_)), "{err:?}");
    }
}
