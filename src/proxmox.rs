//! Proxmox VE REST client.
//!
//! Authenticates once with a username/password ticket and then issues plain
//! blocking GETs. Every response body is wrapped as `{"data": ...}`.

use crate::inventory::{
    HostRecord, HostStatus, InterfaceRecord, Inventory, NetworkRecord, VmConfig, VmRecord,
    ZoneRecord,
};
use crate::Result;

use anyhow::{Context, anyhow, bail};
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const API_PREFIX: &str = "/api2/json";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct Credentials {
    /// e.g. `https://pve:8006`
    pub host: String,
    pub user: String,
    pub password: String,
    /// Skip TLS certificate verification (self-signed cluster certs).
    pub insecure: bool,
}

pub struct ProxmoxClient {
    http: Client,
    base: Url,
    ticket: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Ticket {
    #[serde(default)]
    ticket: String,
}

impl ProxmoxClient {
    /// Acquire a session ticket. Without one nothing else can be fetched, so
    /// a failure here is returned to the caller.
    pub fn login(creds: &Credentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(creds.insecure)
            .build()
            .context("create HTTP client")?;

        let base = api_base(&creds.host)?;
        let url = endpoint(&base, &["access", "ticket"])?;
        tracing::debug!(%url, user = %creds.user, "login");

        let resp = http
            .post(url.clone())
            .form(&[
                ("username", creds.user.as_str()),
                ("password", creds.password.as_str()),
            ])
            .send()
            .with_context(|| format!("POST {}", url))?;
        let ticket: Ticket = read_envelope(resp, &url)?;
        if ticket.ticket.is_empty() {
            bail!("login to {} returned no ticket", creds.host);
        }

        Ok(Self {
            http,
            base,
            ticket: ticket.ticket,
        })
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.get_url(endpoint(&self.base, segments)?)
    }

    fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");

        let resp = self
            .http
            .get(url.clone())
            .header(COOKIE, format!("PVEAuthCookie={}", self.ticket))
            .send()
            .with_context(|| format!("GET {}", url))?;
        read_envelope(resp, &url)
    }
}

impl Inventory for ProxmoxClient {
    fn zones(&self) -> Result<Vec<ZoneRecord>> {
        self.get(&["cluster", "sdn", "zones"])
    }

    fn networks(&self) -> Result<Vec<NetworkRecord>> {
        self.get(&["cluster", "sdn", "vnets"])
    }

    fn hosts(&self) -> Result<Vec<HostRecord>> {
        self.get(&["nodes"])
    }

    fn host_status(&self, host: &str) -> Result<HostStatus> {
        self.get(&["nodes", host, "status"])
    }

    fn host_interfaces(&self, host: &str) -> Result<Vec<InterfaceRecord>> {
        self.get(&["nodes", host, "network"])
    }

    fn vms(&self) -> Result<Vec<VmRecord>> {
        let mut url = endpoint(&self.base, &["cluster", "resources"])?;
        url.query_pairs_mut().append_pair("type", "vm");
        self.get_url(url)
    }

    fn vm_config(&self, vm: &VmRecord) -> Result<VmConfig> {
        self.get(&[
            "nodes",
            vm.node.trim(),
            vm.kind.as_str(),
            vm.vmid.trim(),
            "config",
        ])
    }
}

/// `https://pve:8006/` -> `https://pve:8006/api2/json`.
fn api_base(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let base = if host.ends_with(API_PREFIX) {
        host.to_string()
    } else {
        format!("{}{}", host, API_PREFIX)
    };
    Url::parse(&base).with_context(|| format!("invalid Proxmox host {:?}", host))
}

/// Append path segments to `base`. Each segment is percent-encoded, so a
/// `/` inside a node name or VMID cannot change the endpoint.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot carry a path", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn read_envelope<T: DeserializeOwned>(resp: Response, url: &Url) -> Result<T> {
    let status = resp.status();
    let body = resp
        .text()
        .with_context(|| format!("read response from {}", url))?;
    if !status.is_success() {
        bail!(
            "{} returned {}: {}",
            url,
            status,
            body.chars().take(ERROR_BODY_LIMIT).collect::<String>()
        );
    }
    decode_envelope(&body).with_context(|| format!("decode response from {}", url))
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.data)
}
