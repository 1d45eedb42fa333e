//! Client organisations, registration and login.

use async_trait::async_trait;
use taskgrid_api_models::{
    ClientListResponse, ClientOrg, LoginRequest, LoginResponse, RegisterClientRequest,
    RegisterResponse, RegisterUserRequest,
};

use crate::error::ApiResult;
use crate::http::ApiClient;

/// Account and organisation endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Organisations a new user may register under.
    async fn list_clients(&self) -> ApiResult<Vec<ClientOrg>>;

    /// Exchange credentials for a token.
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    /// Create a user account inside an existing organisation.
    async fn register_user(&self, request: &RegisterUserRequest) -> ApiResult<RegisterResponse>;

    /// Create a new client organisation and its first account.
    async fn register_client(
        &self,
        request: &RegisterClientRequest,
    ) -> ApiResult<RegisterResponse>;
}

/// [`AuthApi`] over HTTP.
#[derive(Clone)]
pub struct ClientService {
    client: ApiClient,
}

impl ClientService {
    /// Wrap a shared API client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for ClientService {
    async fn list_clients(&self) -> ApiResult<Vec<ClientOrg>> {
        let response: ClientListResponse = self.client.get_json(&["clients"]).await?;
        Ok(response.into_clients())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.client.post_json(&["user", "login"], request).await
    }

    async fn register_user(&self, request: &RegisterUserRequest) -> ApiResult<RegisterResponse> {
        self.client.post_json(&["user", "register"], request).await
    }

    async fn register_client(
        &self,
        request: &RegisterClientRequest,
    ) -> ApiResult<RegisterResponse> {
        self.client.post_json(&["client", "register"], request).await
    }
}
