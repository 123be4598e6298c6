use crate::config::Config;
use crate::error::RemoteError;
use crate::models::Snippet;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Operations the core needs from the remote snippet service
#[async_trait]
pub trait RemoteSnippets: Send + Sync {
    /// Store a snippet remotely and return the server's copy, which carries an `id`
    async fn create(&self, snippet: &Snippet) -> RemoteResult<Snippet>;

    /// All remote snippets, or the server-filtered subset for `query`
    async fn search(&self, query: Option<&str>) -> RemoteResult<Vec<Snippet>>;

    async fn delete(&self, id: &str) -> RemoteResult<()>;
}

/// JSON-over-HTTP client for a single snippet endpoint
pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        HttpRemote {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.api_key.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a single snippet; the id is escaped as one path segment
    fn snippet_url(&self, id: &str) -> RemoteResult<Url> {
        let mut url = Url::parse(&self.url("/snippets"))
            .map_err(|e| RemoteError::Transport(format!("invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("invalid API URL: {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    /// Send a request and return the raw body of a 2xx response
    async fn execute(&self, request: RequestBuilder) -> RemoteResult<String> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        let mut request = request
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        // A JSON body already carries its content type
        request
            .headers_mut()
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "remote response");

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Parse a response body; an empty body is an absent value
fn decode<T: DeserializeOwned>(body: &str) -> RemoteResult<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl RemoteSnippets for HttpRemote {
    async fn create(&self, snippet: &Snippet) -> RemoteResult<Snippet> {
        let mut payload = snippet.clone();
        payload.id = None;

        let url = self.url("/snippets");
        debug!(%url, title = %payload.title, "creating remote snippet");
        let body = self.execute(self.client.post(url).json(&payload)).await?;

        match decode::<Snippet>(&body)? {
            Some(created) if created.is_synced() => Ok(created),
            _ => Err(RemoteError::MissingId),
        }
    }

    async fn search(&self, query: Option<&str>) -> RemoteResult<Vec<Snippet>> {
        let request = match query {
            Some(q) => self
                .client
                .get(self.url("/snippets/search"))
                .query(&[("q", q)]),
            None => self.client.get(self.url("/snippets")),
        };

        debug!(query = ?query, "searching remote snippets");
        let body = self.execute(request).await?;
        Ok(decode::<Vec<Snippet>>(&body)?.unwrap_or_default())
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        let url = self.snippet_url(id)?;
        debug!(%url, "deleting remote snippet");
        self.execute(self.client.delete(url)).await.map(|_| ())
    }
}
