//! Remote data store client
//!
//! The hosted store exposes the `faculty` and `reviews` tables through a
//! PostgREST-style HTTP API. Only two operations are consumed: a
//! case-insensitive substring search on faculty names and a single-row
//! insert into reviews.

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::Config;
use crate::directory::{Faculty, ReviewSubmission};

const FACULTY_TABLE: &str = "rest/v1/faculty";
const REVIEWS_TABLE: &str = "rest/v1/reviews";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint path: {0}")]
    Url(#[from] url::ParseError),
}

/// Operations the UI needs from the data store
pub trait FacultyStore: Send + Sync {
    /// Faculty whose name contains `query`, case-insensitive, in store order
    fn search_faculty(&self, query: &str) -> Result<Vec<Faculty>, StoreError>;

    /// Create exactly one review row
    fn insert_review(&self, review: &ReviewSubmission) -> Result<(), StoreError>;
}

/// PostgREST error body (`{"code", "message", "details", "hint"}`)
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

pub struct RemoteStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl RemoteStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(crate::user_agent())
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        Ok(self.endpoint.join(table)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// `ilike` filter value matching `query` anywhere in the column
fn contains_filter(query: &str) -> String {
    format!("ilike.%{}%", query)
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);

    Err(StoreError::Status { status, message })
}

impl FacultyStore for RemoteStore {
    #[instrument(name = "search_faculty", skip_all, fields(query = %query))]
    fn search_faculty(&self, query: &str) -> Result<Vec<Faculty>, StoreError> {
        let url = self.table_url(FACULTY_TABLE)?;
        let filter = contains_filter(query);
        let request = self
            .client
            .get(url)
            .query(&[("select", "*"), ("name", filter.as_str())]);

        let response = check_status(self.authorized(request).send()?)?;
        let body = response.text()?;
        let rows: Vec<Faculty> = serde_json::from_str(&body)?;

        log::debug!("search {:?} returned {} rows", query, rows.len());
        Ok(rows)
    }

    #[instrument(name = "insert_review", skip_all, fields(faculty_id = %review.faculty_id))]
    fn insert_review(&self, review: &ReviewSubmission) -> Result<(), StoreError> {
        let url = self.table_url(REVIEWS_TABLE)?;
        let request = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(review);

        check_status(self.authorized(request).send()?)?;

        log::debug!("review stored for faculty {}", review.faculty_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KEY_VAR, URL_VAR};
    use crate::directory::{FacultyId, RatingScores, Score};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Captured request: (request line, lowercase header lines, body)
    type Captured = (String, Vec<String>, String);

    /// Serve exactly one HTTP response on a local port and hand back the request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                let lower = line.to_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                headers.push(lower);
            }

            let mut body_buf = vec![0u8; content_length];
            reader.read_exact(&mut body_buf).unwrap();

            let mut stream = stream;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            let _ = tx.send((
                request_line.trim_end().to_string(),
                headers,
                String::from_utf8(body_buf).unwrap(),
            ));
        });

        (Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(), rx)
    }

    fn store_for(endpoint: &Url) -> RemoteStore {
        let url = endpoint.to_string();
        let config = Config::from_lookup(|key| match key {
            URL_VAR => Some(url.clone()),
            KEY_VAR => Some("test-key".to_string()),
            _ => None,
        })
        .unwrap();
        let client = Client::builder().no_proxy().build().unwrap();
        RemoteStore::with_client(&config, client)
    }

    #[test]
    fn test_contains_filter() {
        assert_eq!(contains_filter("Jain"), "ilike.%Jain%");
        assert_eq!(contains_filter("sanat j"), "ilike.%sanat j%");
    }

    #[test]
    fn test_search_sends_ilike_filter_and_keeps_order() {
        let (endpoint, rx) = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"id":2,"name":"Reena Jain","cabin":"SJT 101","mobile":null,"teaching_rating":null},
                {"id":1,"name":"Sanat Jain","cabin":"TT 404","mobile":"123","teaching_rating":4.5}]"#,
        );
        let store = store_for(&endpoint);

        let rows = store.search_faculty("jain").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Reena Jain");
        assert_eq!(rows[1].name, "Sanat Jain");

        let (request_line, headers, _) = rx.recv().unwrap();
        assert!(request_line.starts_with("GET /rest/v1/faculty?"));
        assert!(request_line.contains("select=*") || request_line.contains("select=%2A"));
        assert!(request_line.contains("name=ilike.%25jain%25"));
        assert!(headers.contains(&"apikey: test-key".to_string()));
        assert!(headers.contains(&"authorization: bearer test-key".to_string()));
    }

    #[test]
    fn test_insert_posts_one_review() {
        let (endpoint, rx) = serve_once("HTTP/1.1 201 Created", "");
        let store = store_for(&endpoint);

        let mut scores = RatingScores::default();
        scores.teaching = Score::new(3);
        scores.grading = Score::new(4);
        let review = ReviewSubmission::new(FacultyId::new(7), scores);
        store.insert_review(&review).unwrap();

        let (request_line, headers, body) = rx.recv().unwrap();
        assert!(request_line.starts_with("POST /rest/v1/reviews "));
        assert!(headers.contains(&"prefer: return=minimal".to_string()));
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"faculty_id": 7, "teaching": 3, "grading": 4, "behavior": 5})
        );
    }

    #[test]
    fn test_error_status_surfaces_store_message() {
        let (endpoint, _rx) = serve_once(
            "HTTP/1.1 409 Conflict",
            r#"{"code":"23503","message":"violates foreign key constraint","details":null,"hint":null}"#,
        );
        let store = store_for(&endpoint);

        let err = store
            .insert_review(&ReviewSubmission::new(
                FacultyId::new(999),
                RatingScores::default(),
            ))
            .unwrap_err();

        match err {
            StoreError::Status { status, message } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "violates foreign key constraint");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreachable_store_is_http_error() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let store = store_for(&endpoint);

        assert!(matches!(
            store.search_faculty("x"),
            Err(StoreError::Http(_))
        ));
    }
}
