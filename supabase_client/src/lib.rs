//! Thin async client for a Supabase style backend: the identity service
//! (`/auth/v1`), the table service (`/rest/v1`) and object storage
//! (`/storage/v1`). Every request carries the project key in the `apikey`
//! header plus a [Bearer] token that decides which row level security
//! context the request runs in.

use std::sync::Arc;

use reqwest::{RequestBuilder, header};
use url::Url;

pub mod auth;
pub mod error;
pub mod rest;
pub mod storage;

pub use auth::{AuthSession, AuthUser, SignUpOutcome};
pub use error::ClientError;
pub use rest::Query;

const API_KEY_HEADER: &str = "apikey";

/// Which credential authorizes a request.
#[derive(Debug, Clone, Copy)]
pub enum Bearer<'a> {
    /// the project key, i.e. an unauthenticated client
    Anon,
    /// an access token issued to a signed in user
    User(&'a str),
}

#[derive(Clone)]
pub struct SupabaseClient {
    url: String,
    api_key: Arc<str>,
    client: reqwest::Client,
    /// used for documents outside the backend, never carries the api key
    public_client: reqwest::Client,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(url: &str, api_key: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(url)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            api_key
                .parse()
                .map_err(|e| anyhow::anyhow!("api key is not a valid header value: {e}"))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: Arc::from(api_key),
            client,
            public_client: reqwest::Client::new(),
        })
    }

    /// The base url without a trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize(&self, request: RequestBuilder, bearer: Bearer<'_>) -> RequestBuilder {
        let token = match bearer {
            Bearer::Anon => &*self.api_key,
            Bearer::User(token) => token,
        };
        request.bearer_auth(token)
    }

    /// Plain GET of an arbitrary json document, e.g. a file previously uploaded
    /// to public storage. No backend credentials are attached.
    #[tracing::instrument(skip(self), err)]
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        use error::ResponseExt;

        let response = self
            .public_client
            .get(url)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "fetch_json",
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_normalizes_the_base_url() {
        let client = SupabaseClient::new("https://abc.supabase.co/", "anon-key").unwrap();
        assert_eq!(client.url(), "https://abc.supabase.co");
        assert_eq!(
            client.endpoint("/rest/v1/distritos"),
            "https://abc.supabase.co/rest/v1/distritos"
        );
    }

    #[test]
    fn it_rejects_invalid_urls() {
        let err = SupabaseClient::new("not a url", "anon-key").unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn it_does_not_leak_the_key_in_debug_output() {
        let client = SupabaseClient::new("https://abc.supabase.co", "super-secret").unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
