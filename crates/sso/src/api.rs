//! The identity authority capability and its gRPC implementation.

use crate::error::{SsoError, SsoResult};
use crate::proto::{self, AuthServiceClient, IsAdminRequest, LoginRequest, RegisterRequest};
use async_trait::async_trait;
use tonic::Status;

/// Single-attempt calls to the identity authority.
///
/// Implementations perform exactly one remote call per method invocation and
/// report failures as raw gRPC statuses; retry and timeout handling live in
/// `SsoClient`.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Ask whether `user_id` holds the admin privilege.
    async fn is_admin(&self, user_id: i64) -> Result<bool, Status>;

    /// Create an account, returning the new user ID.
    async fn register(&self, email: &str, password: &str) -> Result<i64, Status>;

    /// Exchange credentials for a signed token scoped to `app_id`.
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, Status>;
}

/// `AuthApi` over a tonic channel.
#[derive(Clone, Debug)]
pub struct GrpcAuthApi {
    client: AuthServiceClient,
}

impl GrpcAuthApi {
    /// Create a client for `address` without connecting yet.
    pub fn connect_lazy(address: &str) -> SsoResult<Self> {
        let channel = proto::lazy_channel(address)
            .map_err(|e| SsoError::Config(format!("invalid sso address {address:?}: {e}")))?;
        Ok(Self {
            client: AuthServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl AuthApi for GrpcAuthApi {
    async fn is_admin(&self, user_id: i64) -> Result<bool, Status> {
        let mut client = self.client.clone();
        let response = client.is_admin(IsAdminRequest { user_id }).await?;
        Ok(response.into_inner().is_admin)
    }

    async fn register(&self, email: &str, password: &str) -> Result<i64, Status> {
        let mut client = self.client.clone();
        let response = client
            .register(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(response.into_inner().user_id)
    }

    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, Status> {
        let mut client = self.client.clone();
        let response = client
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
                app_id,
            })
            .await?;
        Ok(response.into_inner().token)
    }
}
