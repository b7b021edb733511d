//! Shared HTTP request helpers for CLI commands.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

async fn parse<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("beacond returned {}: {}", status, body);
    }
    resp.json::<T>().await.context("failed to parse response")
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;
    parse(resp).await
}

pub async fn post_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::Client::new()
        .post(url)
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;
    parse(resp).await
}

pub async fn post_json_body<T, R>(url: &str, body: &T) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    let resp = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;
    parse(resp).await
}
