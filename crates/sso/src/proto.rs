//! Wire messages and service client for the `auth.Auth` gRPC service.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterRequest {
    #[prost(string, tag = "1")]
    pub email: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub password: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterResponse {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub email: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub password: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub app_id: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IsAdminRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IsAdminResponse {
    #[prost(bool, tag = "1")]
    pub is_admin: bool,
}

const REGISTER_PATH: &str = "/auth.Auth/Register";
const LOGIN_PATH: &str = "/auth.Auth/Login";
const IS_ADMIN_PATH: &str = "/auth.Auth/IsAdmin";

/// Build a lazily connecting channel to `address`.
///
/// A bare `host:port` is treated as plaintext HTTP/2. No connection is made
/// until the first call, so an unreachable authority does not block startup.
pub fn lazy_channel(address: &str) -> Result<Channel, tonic::transport::Error> {
    let uri = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    Ok(Endpoint::from_shared(uri)?.connect_lazy())
}

/// Client for the `auth.Auth` service.
#[derive(Clone, Debug)]
pub struct AuthServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl AuthServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn register(
        &mut self,
        request: RegisterRequest,
    ) -> Result<Response<RegisterResponse>, Status> {
        self.unary(Request::new(request), REGISTER_PATH).await
    }

    pub async fn login(&mut self, request: LoginRequest) -> Result<Response<LoginResponse>, Status> {
        self.unary(Request::new(request), LOGIN_PATH).await
    }

    pub async fn is_admin(
        &mut self,
        request: IsAdminRequest,
    ) -> Result<Response<IsAdminResponse>, Status> {
        self.unary(Request::new(request), IS_ADMIN_PATH).await
    }

    async fn unary<Req, Resp>(
        &mut self,
        request: Request<Req>,
        path: &'static str,
    ) -> Result<Response<Resp>, Status>
    where
        Req: ::prost::Message + Send + Sync + 'static,
        Resp: ::prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| {
                let mut status = Status::unavailable(format!("service was not ready: {e}"));
                status.set_source(std::sync::Arc::new(e));
                status
            })?;
        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        self.inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
    }
}
