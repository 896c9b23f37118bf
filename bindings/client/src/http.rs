use anyhow::Context;
use std::time::Duration;
use url::Url;

/// Thin blocking HTTP helper shared by the adapters.
///
/// Call timeouts live here, not in the runner: the batch engine treats a
/// timed-out call like any other failed item.
pub(crate) struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub(crate) fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub(crate) fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .with_context(|| format!("POST {} failed", url))?;
        response
            .json()
            .with_context(|| format!("POST {} returned a non-JSON body", url))
    }

    pub(crate) fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .with_context(|| format!("GET {} failed", url))?;
        response
            .json()
            .with_context(|| format!("GET {} returned a non-JSON body", url))
    }

    pub(crate) fn delete(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<reqwest::StatusCode> {
        let response = self
            .client
            .delete(url)
            .query(query)
            .send()
            .with_context(|| format!("DELETE {} failed", url))?;
        Ok(response.status())
    }
}

/// Validate the endpoint and normalise away a trailing slash.
pub(crate) fn normalise_endpoint(endpoint: &str) -> anyhow::Result<String> {
    Url::parse(endpoint).with_context(|| format!("'{}' is not a valid endpoint URL", endpoint))?;
    Ok(endpoint.trim_end_matches('/').to_string())
}
