//! HTTP adapter for the control-plane API.
//!
//! `ControlPlaneClient<Admin>` talks to `/api/application` and implements
//! [`AdminApi`]; `ControlPlaneClient<Owner>` talks to `/api/client` and
//! implements [`OwnerApi`]. The scope is a type parameter, so a status query
//! cannot be issued with an admin-scope client.

use std::marker::PhantomData;

use async_trait::async_trait;
use ptero_common::{Envelope, ListResponse, ManagedServer, ManagedUser, RuntimeState};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::ports::{AdminApi, ControlPlaneConnector, OwnerApi, ScopedClients};
use crate::domain::{Credentials, NewServer, NewUser, OpsError, OpsResult};

// ── Scopes ────────────────────────────────────────────────────────────────────

/// Token privilege level, fixing the API base path.
pub trait Scope: Send + Sync + 'static {
    const BASE_PATH: &'static str;
}

/// Application (admin) scope, `ptla_` tokens.
pub struct Admin;

/// Client (owner) scope, `ptlc_` tokens.
pub struct Owner;

impl Scope for Admin {
    const BASE_PATH: &'static str = "/api/application";
}

impl Scope for Owner {
    const BASE_PATH: &'static str = "/api/client";
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Bearer-authenticated JSON client bound to one scope.
pub struct ControlPlaneClient<S: Scope> {
    http: reqwest::Client,
    base: String,
    token: String,
    _scope: PhantomData<S>,
}

impl<S: Scope> ControlPlaneClient<S> {
    /// `host` must already be normalized (no trailing `/`).
    #[must_use]
    pub fn new(http: reqwest::Client, host: &str, token: &str) -> Self {
        Self {
            http,
            base: format!("{host}{}", S::BASE_PATH),
            token: token.to_string(),
            _scope: PhantomData,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> OpsResult<T> {
        let response = send(self.request(Method::GET, path)).await?;
        parse_response(response).await
    }
}

#[async_trait]
impl AdminApi for ControlPlaneClient<Admin> {
    async fn list_users(&self, per_page: u32) -> OpsResult<Vec<Envelope<ManagedUser>>> {
        let list: ListResponse<ManagedUser> =
            self.get_json(&format!("/users?per_page={per_page}")).await?;
        Ok(list.data)
    }

    async fn list_servers(&self, per_page: u32) -> OpsResult<Vec<Envelope<ManagedServer>>> {
        let list: ListResponse<ManagedServer> =
            self.get_json(&format!("/servers?per_page={per_page}")).await?;
        Ok(list.data)
    }

    async fn create_user(&self, user: &NewUser) -> OpsResult<Envelope<ManagedUser>> {
        let response = send(self.request(Method::POST, "/users").json(user)).await?;
        parse_response(response).await
    }

    async fn create_server(&self, server: &NewServer) -> OpsResult<Envelope<ManagedServer>> {
        let body = server.to_request_body();
        let response = send(self.request(Method::POST, "/servers").json(&body)).await?;
        parse_response(response).await
    }

    async fn delete_user(&self, id: u64) -> OpsResult<()> {
        send(self.request(Method::DELETE, &format!("/users/{id}"))).await?;
        Ok(())
    }

    async fn delete_server(&self, id: u64) -> OpsResult<()> {
        send(self.request(Method::DELETE, &format!("/servers/{id}"))).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct ResourceUsage {
    #[serde(default)]
    current_state: String,
}

#[async_trait]
impl OwnerApi for ControlPlaneClient<Owner> {
    async fn server_state(&self, uuid: &str) -> OpsResult<RuntimeState> {
        let usage: Envelope<ResourceUsage> =
            self.get_json(&format!("/servers/{uuid}/resources")).await?;
        Ok(RuntimeState::parse(&usage.attributes.current_state))
    }
}

// ── Connector ─────────────────────────────────────────────────────────────────

/// Builds request-scoped clients sharing one connection pool.
#[derive(Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ptero-ops/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl ControlPlaneConnector for HttpConnector {
    fn connect(&self, credentials: &Credentials) -> OpsResult<ScopedClients> {
        let admin = ControlPlaneClient::<Admin>::new(
            self.http.clone(),
            credentials.host(),
            credentials.admin_token(),
        );
        let owner = credentials.client_token().map(|token| {
            Box::new(ControlPlaneClient::<Owner>::new(
                self.http.clone(),
                credentials.host(),
                token,
            )) as Box<dyn OwnerApi>
        });
        Ok(ScopedClients {
            admin: Box::new(admin),
            owner,
        })
    }
}

// ── Response handling ─────────────────────────────────────────────────────────

async fn send(builder: RequestBuilder) -> OpsResult<Response> {
    let response = builder.send().await.map_err(transport_error)?;
    ensure_success(response).await
}

async fn ensure_success(response: Response) -> OpsResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(upstream_from_body(status.as_u16(), &body))
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> OpsResult<T> {
    response.json::<T>().await.map_err(transport_error)
}

/// Error for a non-2xx response. A JSON body becomes the detail; any other
/// non-empty body is kept as a string.
#[must_use]
pub fn upstream_from_body(status: u16, body: &str) -> OpsError {
    let detail = if body.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string())))
    };
    OpsError::Upstream {
        message: format!("Request failed with status code {status}"),
        status: Some(status),
        detail,
    }
}

fn transport_error(e: reqwest::Error) -> OpsError {
    let status = e.status().map(|s| s.as_u16());
    OpsError::Upstream {
        message: e.without_url().to_string(),
        status,
        detail: None,
    }
}
