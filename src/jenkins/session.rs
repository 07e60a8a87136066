use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, info, warn};
use regex_lite::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::headers::Headers;
use super::urls::JobUrl;
use crate::auth::Credentials;
use crate::error::{LauncherError, Result};

pub const CHUNK_SIZE: usize = 8192;

/// Knobs for the HTTP layer.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Extra attempts for GET requests that fail before reaching the server.
    pub get_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    /// Ask the server for a CSRF crumb when the session is created.
    pub fetch_crumb: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            get_retries: 5,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            user_agent: concat!("launch-jenkins/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_crumb: true,
        }
    }
}

/// A fully read HTTP response.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub text: String,
}

/// Lazily reads a response body in chunks of at most [`CHUNK_SIZE`] bytes.
pub struct ChunkStream {
    response: reqwest::Response,
    pending: Vec<u8>,
    chunk_size: usize,
}

impl ChunkStream {
    /// Next chunk of the body, or `None` once it is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        while self.pending.is_empty() {
            match self.response.chunk().await? {
                Some(bytes) => self.pending.extend_from_slice(&bytes),
                None => return Ok(None),
            }
        }

        let take = self.pending.len().min(self.chunk_size);
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

/// Authenticated connection to one Jenkins server.
///
/// Holds the basic-auth and crumb headers computed once at creation, plus a
/// cookie jar that picks up whatever cookies the server hands out.
pub struct Session {
    client: Client,
    server_url: String,
    headers: HeaderMap,
    get_retries: u32,
    retry_delay: Duration,
}

impl Session {
    /// Creates a session for the server hosting `job`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the crumb
    /// request fails with anything other than a 404.
    pub async fn new(
        job: &JobUrl,
        credentials: &Credentials,
        settings: &TransportSettings,
    ) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LauncherError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&credentials.basic_header())?);
        headers.insert(USER_AGENT, header_value(&settings.user_agent)?);

        let mut session = Self {
            client,
            server_url: job.server_url().to_string(),
            headers,
            get_retries: settings.get_retries,
            retry_delay: settings.retry_delay,
        };

        if settings.fetch_crumb {
            if let Some((field, crumb)) = session.fetch_crumb().await? {
                info!("Using CSRF crumb header {field}");
                let name = HeaderName::from_bytes(field.as_bytes()).map_err(|e| {
                    LauncherError::Protocol(format!("invalid crumb header name '{field}': {e}"))
                })?;
                session.headers.insert(name, header_value(&crumb)?);
            }
        }

        Ok(session)
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn fetch_crumb(&self) -> Result<Option<(String, String)>> {
        let url = format!("{}/crumbIssuer/api/xml", self.server_url);
        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(LauncherError::Transport { status: 404, .. }) => {
                debug!("No crumb issuer at {url}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let crumb = xml_tag(&response.text, "crumb");
        let field = xml_tag(&response.text, "crumbRequestField");
        match (field, crumb) {
            (Some(field), Some(crumb)) => Ok(Some((field, crumb))),
            _ => Err(LauncherError::Protocol(format!(
                "crumb issuer returned an unexpected document: {}",
                response.text
            ))),
        }
    }

    /// GET, retried on network failures.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self.send(Method::GET, url, None).await?;
        read_response(url, response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        Ok(serde_json::from_str(&response.text)?)
    }

    /// GET whose body is consumed chunk by chunk.
    pub async fn get_stream(&self, url: &str) -> Result<ChunkStream> {
        let response = self.send(Method::GET, url, None).await?;
        let response = error_for_status(url, response).await?;
        Ok(ChunkStream {
            response,
            pending: Vec::new(),
            chunk_size: CHUNK_SIZE,
        })
    }

    /// Form-encoded POST. Never retried; an empty form still sends a POST.
    pub async fn post_form(&self, url: &str, form: &IndexMap<String, String>) -> Result<Response> {
        let response = self.send(Method::POST, url, Some(form)).await?;
        read_response(url, response).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        form: Option<&IndexMap<String, String>>,
    ) -> Result<reqwest::Response> {
        let max_retries = if method == Method::GET {
            self.get_retries
        } else {
            0
        };

        let mut retry_count = 0;
        loop {
            debug!("{method} {url}");
            let request = self.request(method.clone(), url, form);

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) && retry_count < max_retries => {
                    warn!(
                        "Network error ({e}), retrying in {:?} ({}/{max_retries})...",
                        self.retry_delay,
                        retry_count + 1,
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        form: Option<&IndexMap<String, String>>,
    ) -> RequestBuilder {
        let request = self.client.request(method, url).headers(self.headers.clone());
        match form {
            Some(form) => request.form(form),
            None => request,
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LauncherError::Config(format!("Invalid header value: {e}")))
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

async fn error_for_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }

    let headers = Headers::from(response.headers());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    Err(LauncherError::Transport {
        status: status.as_u16(),
        url: url.to_string(),
        body,
        headers,
    })
}

async fn read_response(url: &str, response: reqwest::Response) -> Result<Response> {
    let response = error_for_status(url, response).await?;
    let status = response.status().as_u16();
    let headers = Headers::from(response.headers());
    let bytes = response.bytes().await?;

    Ok(Response {
        status,
        headers,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn xml_tag(document: &str, tag: &str) -> Option<String> {
    let pattern = format!("<{tag}>([^<]*)</{tag}>");
    Regex::new(&pattern)
        .ok()?
        .captures(document)
        .map(|captures| captures[1].trim().to_string())
}
