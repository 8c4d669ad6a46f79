//! Typed client for the cluster-management control plane.
//!
//! The client owns the HTTP connection and the token manager. Every
//! operation exposed by the submodules goes through the small set of
//! request helpers here, so authentication, pagination, and error
//! classification behave identically everywhere.

pub mod accounts;
pub mod addons;
pub mod break_glass;
pub mod clusters;
pub mod idps;
pub mod ingresses;
pub mod log_forwarders;
pub mod machine_pools;
pub mod machine_types;
pub mod network_verification;
pub mod oidc_configs;
pub mod regions;
pub mod types;
pub mod upgrade_policies;
pub mod users;
pub mod versions;

use crate::config::{self, Config};
use crate::constants::{
    DEFAULT_URL, DEFAULT_USER_AGENT, FEDRAMP_URL, TOKEN_MIN_VALIDITY,
};
use crate::error::{self, classify, ApiError, Error, Result};
use crate::gate::CapabilitySet;
use crate::reporter::Reporter;
use crate::token::{self, TokenManager};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;
use tokio::sync::OnceCell;

pub struct OcmClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenManager,
    capabilities: OnceCell<CapabilitySet>,
}

/// Contains the information and logic needed to build a connection to the
/// control plane. Don't create instances of this type directly; use
/// [`OcmClient::builder`] instead.
#[derive(Default)]
pub struct OcmClientBuilder {
    config: Option<Config>,
    reporter: Option<Reporter>,
    govcloud: bool,
}

impl OcmClientBuilder {
    /// Set the configuration the connection will authenticate with. When
    /// unset, the persisted config file is loaded.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Force FedRAMP endpoints even when the config does not set the flag.
    pub fn govcloud(mut self, govcloud: bool) -> Self {
        self.govcloud = govcloud;
        self
    }

    pub async fn build(self) -> Result<OcmClient> {
        let cfg = match self.config {
            Some(cfg) => cfg,
            None => config::load()?.ok_or(Error::NotLoggedIn)?,
        };
        let reporter = self.reporter.unwrap_or_default();
        let fedramp = cfg.fedramp || self.govcloud;

        let raw_url = if !cfg.url.is_empty() {
            cfg.url.clone()
        } else if fedramp {
            FEDRAMP_URL.to_string()
        } else {
            DEFAULT_URL.to_string()
        };
        let base_url = Url::parse(&raw_url).context(error::InvalidEndpointSnafu {
            url: raw_url.clone(),
        })?;

        let user_agent = if cfg.user_agent.is_empty() {
            DEFAULT_USER_AGENT
        } else {
            cfg.user_agent.as_str()
        };
        let version = if cfg.version.is_empty() {
            env!("CARGO_PKG_VERSION")
        } else {
            cfg.version.as_str()
        };
        let agent = format!("{}/{} rosa-model/{}", user_agent, version, env!("CARGO_PKG_VERSION"));

        let http = reqwest::Client::builder()
            .user_agent(agent)
            .danger_accept_invalid_certs(cfg.insecure)
            .build()
            .context(error::NetworkSnafu)?;

        let tokens = TokenManager::new(&cfg, http.clone())?;
        let previous_refresh = cfg.refresh_token.clone();
        let pair = tokens.get_or_refresh(TOKEN_MIN_VALIDITY).await?;

        // Warn about deprecated offline tokens only when the refresh token
        // was cycled, so users see this on login rather than on every
        // command.
        if pair.refresh != previous_refresh {
            token::scope_warning(&reporter, &pair.refresh);
        }

        // Make the file reflect the validated (possibly refreshed) pair.
        tokens.persist()?;

        Ok(OcmClient {
            http,
            base_url,
            tokens,
            capabilities: OnceCell::new(),
        })
    }
}

impl OcmClient {
    pub fn builder() -> OcmClientBuilder {
        OcmClientBuilder::default()
    }

    pub fn url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Make sure the session outlives the current command by the default
    /// freshness floor.
    pub async fn keep_alive(&self) -> Result<()> {
        self.tokens.keep_alive().await?;
        Ok(())
    }

    /// A pair valid for at least the requested duration.
    pub async fn connection_tokens(
        &self,
        min_remaining: std::time::Duration,
    ) -> Result<token::TokenPair> {
        self.tokens.get_or_refresh(min_remaining).await
    }

    /// Close the connection, flushing any token state that still needs to
    /// reach the config file. Idempotent.
    pub fn close(&self) -> Result<()> {
        if self.tokens.is_dirty() {
            self.tokens.persist()?;
        }
        Ok(())
    }

    /// The organization's capability flags, fetched once per Runtime.
    pub async fn capabilities(&self) -> Result<&CapabilitySet> {
        self.capabilities
            .get_or_try_init(|| async {
                let organization = self.current_organization().await?;
                self.organization_capabilities(&organization.id).await
            })
            .await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .context(error::InvalidEndpointSnafu { url: path })
    }

    async fn authed(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let pair = self.tokens.get_or_refresh(TOKEN_MIN_VALIDITY).await?;
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(pair.access))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.authed(Method::GET, path).await?.query(query);
        check(request.send().await.context(error::NetworkSnafu)?).await
    }

    /// GET that treats 404 as absence rather than failure.
    pub(crate) async fn get_json_opt<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        match self.get_json(path, query).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == crate::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        let request = self
            .authed(Method::POST, path)
            .await?
            .query(query)
            .json(body);
        check(request.send().await.context(error::NetworkSnafu)?).await
    }

    /// POST with no body whose response body is irrelevant, e.g. hibernate
    /// and resume actions.
    pub(crate) async fn post_empty(&self, path: &str) -> Result<()> {
        let request = self.authed(Method::POST, path).await?;
        check_status(request.send().await.context(error::NetworkSnafu)?).await
    }

    /// POST whose response body is irrelevant, e.g. dry-run validation.
    pub(crate) async fn post_json_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<()> {
        let request = self
            .authed(Method::POST, path)
            .await?
            .query(query)
            .json(body);
        check_status(request.send().await.context(error::NetworkSnafu)?).await
    }

    pub(crate) async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.authed(Method::PATCH, path).await?.json(body);
        check(request.send().await.context(error::NetworkSnafu)?).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let request = self.authed(Method::DELETE, path).await?;
        check_status(request.send().await.context(error::NetworkSnafu)?).await
    }

    pub(crate) async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: i64,
        size: i64,
        search: Option<&str>,
        order: Option<&str>,
    ) -> Result<types::Page<T>> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        self.get_json(path, &query).await
    }

    /// Iterate pages until one comes back short. A non-positive size asks
    /// the server for its maximum and is served in a single page.
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        size: i64,
        search: Option<&str>,
        order: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let response: types::Page<T> = self.list_page(path, page, size, search, order).await?;
            let got = response.items.len() as i64;
            items.extend(response.items);
            if size <= 0 || got < size || got == 0 {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

async fn check<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        response.json().await.context(error::ResponseParseSnafu)
    } else {
        Err(error_from(status, response).await)
    }
}

async fn check_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_from(status, response).await)
    }
}

async fn error_from(status: StatusCode, response: reqwest::Response) -> Error {
    let api = response.json::<ApiError>().await.ok();
    classify(status, api)
}


#[cfg(test)]
mod tests {
    use super::test_support::test_client;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, serde::Deserialize)]
    struct Item {
        id: String,
    }

    fn page_body(ids: &[&str], page: i64, total: i64) -> serde_json::Value {
        json!({
            "kind": "ItemList",
            "page": page,
            "size": ids.len(),
            "total": total,
            "items": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn requests_carry_a_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/things"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[], 1, 0)))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let items: Vec<Item> = client
            .list_all("/api/clusters_mgmt/v1/things", 100, None, None)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn pagination_stops_at_the_first_short_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/things"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a", "b"], 1, 3)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/things"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["c"], 2, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let items: Vec<Item> = client
            .list_all("/api/clusters_mgmt/v1/things", 2, None, None)
            .await
            .unwrap();
        assert_eq!(
            items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn server_chosen_size_is_a_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/things"))
            .and(query_param("size", "-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], 1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let items: Vec<Item> = client
            .list_all("/api/clusters_mgmt/v1/things", -1, None, None)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn search_and_order_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clusters_mgmt/v1/things"))
            .and(query_param("search", "name = 'x'"))
            .and(query_param("order", "cpu asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[], 1, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let _: Vec<Item> = client
            .list_all(
                "/api/clusters_mgmt/v1/things",
                100,
                Some("name = 'x'"),
                Some("cpu asc"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn api_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "kind": "Error",
                "id": "404",
                "code": "CLUSTERS-MGMT-404",
                "reason": "Cluster 'nope' not found",
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .get_json::<Item>("/api/clusters_mgmt/v1/things/nope", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Cluster 'nope' not found");
    }

    #[tokio::test]
    async fn get_json_opt_turns_404_into_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"kind": "Error"})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let found: Option<Item> = client
            .get_json_opt("/api/clusters_mgmt/v1/things/nope", &[])
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
