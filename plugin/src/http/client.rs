//! Cloud Controller v3 HTTP client

use cf_api::{ErrorResponse, ListResponse};
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::config::target::ControllerTarget;
use crate::controller::Warned;
use crate::errors::PluginError;

/// Header carrying advisory warnings, comma separated and URL-encoded
pub const WARNINGS_HEADER: &str = "X-Cf-Warnings";

/// HTTP client for the Cloud Controller
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl HttpClient {
    /// Create a new client for the given target
    pub fn new(target: &ControllerTarget) -> Result<Self, PluginError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .user_agent(concat!("cfdeploy/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(target.skip_ssl_validation)
            .build()?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(target.api_url.clone()),
            token: target.token.clone(),
        })
    }

    /// Resolve `path` under the controller URL, keeping any path prefix
    fn url(&self, path: &str) -> Result<Url, PluginError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| PluginError::Internal(format!("invalid request path {}: {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            header::AUTHORIZATION,
            format!("Bearer {}", self.token.expose_secret()),
        )
    }

    /// Send the request, collect warnings, and turn error bodies into `ApiError`
    async fn execute(&self, request: RequestBuilder) -> Result<(Response, Vec<String>), PluginError> {
        let response = self.authorize(request).send().await?;
        let warnings = parse_warnings(response.headers());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Cloud Controller request failed: {} - {}", status, body);
            return Err(PluginError::ApiError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok((response, warnings))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Warned<T>, PluginError> {
        let (response, warnings) = self.execute(request).await?;
        let body = response.json().await?;
        Ok(Warned::with_warnings(body, warnings))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Warned<T>, PluginError> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        self.execute_json(self.client.get(url)).await
    }

    /// GET every page of a list endpoint, following `pagination.next`
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Warned<Vec<T>>, PluginError> {
        let mut url = self.url(path)?;
        url.query_pairs_mut().extend_pairs(query.iter().filter(|(_, v)| !v.is_empty()));

        let mut resources = Vec::new();
        let mut warnings = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            debug!("GET {}", url);
            let page: Warned<ListResponse<T>> = self.execute_json(self.client.get(url)).await?;
            warnings.extend(page.warnings);
            resources.extend(page.value.resources);

            if let Some(link) = page.value.pagination.and_then(|p| p.next) {
                next = Some(Url::parse(&link.href).map_err(|e| {
                    PluginError::Internal(format!("invalid pagination link {}: {}", link.href, e))
                })?);
            }
        }

        Ok(Warned::with_warnings(resources, warnings))
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Warned<T>, PluginError> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        self.execute_json(self.client.post(url).json(body)).await
    }

    /// Make a POST request whose response body is not needed
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Warned<()>, PluginError> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let (_, warnings) = self.execute(self.client.post(url).json(body)).await?;
        Ok(Warned::with_warnings((), warnings))
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Warned<T>, PluginError> {
        let url = self.url(path)?;
        debug!("PATCH {}", url);
        self.execute_json(self.client.patch(url).json(body)).await
    }

    /// Make a DELETE request; asynchronous jobs are not awaited
    pub async fn delete(&self, path: &str) -> Result<Warned<()>, PluginError> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        let (_, warnings) = self.execute(self.client.delete(url)).await?;
        Ok(Warned::with_warnings((), warnings))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_warnings(headers: &header::HeaderMap) -> Vec<String> {
    headers
        .get_all(WARNINGS_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|part| {
            let decoded: String = url::form_urlencoded::parse(part.trim().as_bytes())
                .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{}={}", k, v) })
                .collect();
            (!decoded.is_empty()).then_some(decoded)
        })
        .collect()
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) if !response.errors.is_empty() => response.to_string(),
        _ => body.to_string(),
    }
}
