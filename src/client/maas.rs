//! MAAS 1.0 REST API client
//!
//! Implements [`ProvisioningApi`] over HTTP. Every request carries a freshly
//! signed OAuth PLAINTEXT header; no retries happen at this layer.

use super::auth::ApiKey;
use super::token::fetch_api_key;
use crate::config::MaasConfig;
use crate::domain::node::{LinkMode, Node};
use crate::domain::ports::ProvisioningApi;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use urlencoding::encode;

#[derive(Debug, Deserialize)]
struct TagRecord {
    name: String,
}

/// MAAS region API client
#[derive(Debug, Clone)]
pub struct MaasClient {
    http: Client,
    /// e.g. `http://10.40.0.2:5240/MAAS/api/1.0`
    api_url: String,
    /// Scheme and authority of `api_url`, prefix for resource URIs
    base_url: String,
    key: ApiKey,
}

impl MaasClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/').to_string();
        let base_url = base_url_of(&api_url)?;
        let key = ApiKey::parse(token)?;
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_url,
            base_url,
            key,
        })
    }

    /// Build a client from configuration, fetching the API key over SSH
    /// when none is configured
    pub async fn connect(config: &MaasConfig) -> Result<Self> {
        let token = match &config.token {
            Some(token) => token.clone(),
            None => fetch_api_key(config).await?,
        };
        Self::new(
            &config.api_url(),
            &token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Absolute URL of a resource URI such as `/MAAS/api/1.0/nodes/x/`
    fn resource(&self, uri: &str) -> String {
        format!("{}{}", self.base_url, uri)
    }

    fn node_url(&self, system_id: &str) -> String {
        self.api(&format!("/nodes/{}/", encode(system_id)))
    }

    fn tag_url(&self, tag: &str) -> String {
        self.api(&format!("/tags/{}/", encode(tag)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, self.key.authorization())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let url = response.url().clone();
        let text = response.text().await?;
        debug!(url = %url, status = status.as_u16(), "MAAS response");

        if status.is_success() {
            Ok(text)
        } else {
            Err(status_error(status, text))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, op: Option<&str>) -> Result<T> {
        let mut request = self.http.get(url);
        if let Some(op) = op {
            request = request.query(&[("op", op)]);
        }
        let text = self.send(request).await?;
        decode(&text)
    }

    async fn post_form(&self, url: &str, op: &str, form: &[(&str, &str)]) -> Result<()> {
        let request = self.http.post(url).query(&[("op", op)]).form(form);
        self.send(request).await.map(|_| ())
    }
}

/// `scheme://authority` part of an API URL
fn base_url_of(api_url: &str) -> Result<String> {
    let url = Url::parse(api_url)
        .map_err(|e| Error::Configuration(format!("invalid MAAS API URL {}: {}", api_url, e)))?;
    if url.host_str().is_none() {
        return Err(Error::Configuration(format!(
            "MAAS API URL {} has no host",
            api_url
        )));
    }
    Ok(url.origin().ascii_serialization())
}

fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{}: {}", status, body.trim()))
        }
        _ => Error::Server {
            status: status.as_u16(),
            message: body.trim().to_string(),
        },
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "Failed to decode MAAS response");
        Error::MalformedRecord(format!("undecodable response: {}", e))
    })
}

#[async_trait]
impl ProvisioningApi for MaasClient {
    async fn list_node_records(&self) -> Result<Vec<serde_json::Value>> {
        self.get_json(&self.api("/nodes/"), Some("list")).await
    }

    async fn get_node(&self, system_id: &str) -> Result<Node> {
        let record = self.get_json(&self.node_url(system_id), None).await?;
        Node::from_record(record)
    }

    async fn list_tags(&self, prefix: &str) -> Result<Vec<String>> {
        let tags: Vec<TagRecord> = self.get_json(&self.api("/tags/"), Some("list")).await?;
        Ok(tags
            .into_iter()
            .map(|t| t.name)
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    async fn nodes_for_tag(&self, tag: &str) -> Result<Vec<Node>> {
        let records: Vec<serde_json::Value> =
            self.get_json(&self.tag_url(tag), Some("nodes")).await?;
        records.into_iter().map(Node::from_record).collect()
    }

    async fn tag_nodes(&self, system_ids: &[String], tag: &str, remove: bool) -> Result<()> {
        let field = if remove { "remove" } else { "add" };
        let form: Vec<(&str, &str)> = system_ids.iter().map(|id| (field, id.as_str())).collect();
        self.post_form(&self.tag_url(tag), "update_nodes", &form).await
    }

    async fn tag_drive(&self, drive_uri: &str, tag: &str, remove: bool) -> Result<()> {
        let op = if remove { "remove_tag" } else { "add_tag" };
        let request = self
            .http
            .get(self.resource(drive_uri))
            .query(&[("op", op), ("tag", tag)]);
        self.send(request).await.map(|_| ())
    }

    async fn update_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        // the trailing slash of the node URL is mandatory for PUT
        let request = self.http.put(self.node_url(system_id)).form(params);
        self.send(request).await.map(|_| ())
    }

    async fn commission_node(&self, system_id: &str) -> Result<()> {
        self.post_form(&self.node_url(system_id), "commission", &[])
            .await
    }

    async fn acquire_nodes(&self, system_ids: &[String]) -> Result<()> {
        let form: Vec<(&str, &str)> = system_ids.iter().map(|id| ("nodes", id.as_str())).collect();
        self.post_form(&self.api("/nodes/"), "acquire", &form).await
    }

    async fn start_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        let form: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.post_form(&self.node_url(system_id), "start", &form)
            .await
    }

    async fn link_subnet(&self, iface_uri: &str, subnet_id: u64, mode: LinkMode) -> Result<()> {
        let subnet = subnet_id.to_string();
        let form = [("mode", mode.as_str()), ("subnet", subnet.as_str())];
        self.post_form(&self.resource(iface_uri), "link_subnet", &form)
            .await
    }

    async fn unlink_subnet(&self, iface_uri: &str, link_id: u64) -> Result<()> {
        let id = link_id.to_string();
        self.post_form(&self.resource(iface_uri), "unlink_subnet", &[("id", id.as_str())])
            .await
    }
}
