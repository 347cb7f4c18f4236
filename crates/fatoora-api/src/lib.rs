// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fatoora_app::{InvoiceDraft, InvoiceRecord, InvoiceSender, SendChannels};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// The backend really does spell it with a double "s".
pub const LISTING_PATH: &str = "/api/invoiceListingss";
pub const DEFAULT_SEND_PATH: &str = "/api/sendInvoice";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    send_path: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed).with_context(|| {
            format!("api.base_url {trimmed:?} is not a valid URL -- use e.g. http://localhost:8080")
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            send_path: DEFAULT_SEND_PATH.to_owned(),
            timeout,
            http,
        })
    }

    pub fn with_send_path(mut self, send_path: &str) -> Result<Self> {
        if !send_path.starts_with('/') {
            bail!("api.send_path must start with '/', got {send_path:?}");
        }
        self.send_path = send_path.to_owned();
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn send_path(&self) -> &str {
        &self.send_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    /// Fetches the full invoice listing. Rows come back in server order.
    pub fn fetch_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        let url = self.endpoint(LISTING_PATH);
        debug!(%url, "fetching invoice listing");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ListingResponse = response
            .json()
            .context("decode invoice listing: no `invoiceObj` array; check api.base_url")?;
        info!(count = parsed.invoices.len(), "invoice listing fetched");
        Ok(parsed.invoices)
    }

    pub fn send_invoice(&self, draft: &InvoiceDraft, channels: SendChannels) -> Result<()> {
        if !channels.any() {
            bail!("no delivery channel selected -- tick SMS, Email or WhatsApp");
        }
        let url = self.endpoint(&self.send_path);
        let request = SendRequest {
            invoice: draft,
            channels: channels
                .selected()
                .into_iter()
                .map(|channel| channel.as_str())
                .collect(),
        };
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }
}

impl InvoiceSender for Client {
    fn send(&mut self, draft: &InvoiceDraft, channels: SendChannels) -> Result<()> {
        self.send_invoice(draft, channels)
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "invoiceObj")]
    invoices: Vec<InvoiceRecord>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    invoice: &'a InvoiceDraft,
    channels: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {base_url} timed out -- raise api.timeout or check the server ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- check api.base_url and that the server is up ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
