use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::{
    IntoUrl,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client shared by a pipeline run.
///
/// When `headers` carries no User-Agent, `<name>/<version> (+<repository>)` is used.
///
/// # Errors
/// Errors when the TLS backend cannot be initialized
pub fn init_http_client(mut headers: HeaderMap) -> Result<reqwest::Client> {
    if !headers.contains_key(USER_AGENT) {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "{}/{} (+{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_REPOSITORY")
            ))?,
        );
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(HTTP_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Building HTTP client")
}

/// GETs `url` with `query` and decodes the body as JSON
///
/// # Errors
/// Errors on network error, timeout, non-success status or a body that doesn't decode into `T`
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: impl IntoUrl,
    query: &[(&str, &str)],
) -> Result<T> {
    let res = client
        .get(url)
        .query(query)
        .send()
        .await
        // The URL carries the API key
        .map_err(reqwest::Error::without_url)
        .context("Sending request")?;

    let status = res.status();
    ensure!(status.is_success(), "Upstream answered with status {status}");

    res.json::<T>()
        .await
        .map_err(reqwest::Error::without_url)
        .context("Parsing JSON response")
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::{Route, client, serve};

    #[test]
    fn keeps_caller_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("custom/1.0"));
        assert!(init_http_client(headers).is_ok());
        assert!(init_http_client(HeaderMap::new()).is_ok());
    }

    #[tokio::test]
    async fn get_json_rejects_non_success() {
        let base = serve(vec![
            Route::json("/ok", json!({ "hello": "world" })),
            Route::status("/forbidden", 403),
        ])
        .await;

        let ok: Value = get_json(&client(), format!("{base}/ok"), &[("a", "b")])
            .await
            .unwrap();
        assert_eq!(ok["hello"], "world");

        let err = get_json::<Value>(&client(), format!("{base}/forbidden"), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn errors_do_not_leak_query() {
        // Nothing listens on the discard port
        let err = get_json::<Value>(
            &client(),
            "http://127.0.0.1:9/search",
            &[("part", "snippet"), ("key", "SECRET-API-KEY")],
        )
        .await
        .unwrap_err();
        assert!(!format!("{err:#}").contains("SECRET-API-KEY"));
        assert!(!format!("{err:?}").contains("SECRET-API-KEY"));

        let base = serve(vec![Route {
            pattern: "/garbled",
            status: 200,
            body: "not json".to_string(),
        }])
        .await;
        let err = get_json::<Value>(
            &client(),
            format!("{base}/garbled"),
            &[("key", "SECRET-API-KEY")],
        )
        .await
        .unwrap_err();
        assert!(!format!("{err:#}").contains("SECRET-API-KEY"));
    }
}
