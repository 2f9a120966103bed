use std::sync::Arc;
use std::{fmt, io};

use bytes::Bytes;
use futures_util::stream::BoxStream;
use jsonwebtoken::{EncodingKey, Header};
use reqwest::{Body, header};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::key::derive_app_key;

/// Erasure-coding parameters for an upload.
///
/// `data_shards` of every slab carry payload, `parity_shards` carry
/// error-correction data. Both counts must be positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redundancy {
    /// Number of data shards per slab.
    pub data_shards: usize,
    /// Number of parity shards per slab.
    pub parity_shards: usize,
}

/// A single slab as stored by the indexer.
#[derive(Debug, Deserialize)]
pub struct Slab {
    /// Identifier assigned by the indexer, for inspection and logging.
    pub id: String,
    /// Length of the slab payload in bytes.
    pub length: u64,
}

/// The receipt returned by the indexer after a completed upload.
#[derive(Debug, Deserialize)]
pub struct UploadReceipt {
    /// The key of the uploaded object.
    pub key: String,
    /// The slabs the backend split the upload into.
    pub slabs: Vec<Slab>,
}

/// Registration details submitted when connecting an application.
#[derive(Debug, Serialize)]
pub struct RegisterAppRequest {
    /// Display name of the application.
    pub name: String,
    /// Short description shown to the user during approval.
    pub description: String,
}

/// The indexer's answer to an app registration.
#[derive(Debug, Deserialize)]
pub struct RegisterAppResponse {
    /// Whether the app is connected and may upload.
    pub connected: bool,
    /// Where the user can approve the connection, when not yet connected.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// A builder for [`Client`]s targeting one indexer service.
pub struct ClientBuilder {
    service_url: Arc<str>,
    http: reqwest::Client,
    jwt_key: EncodingKey,
    app_name: String,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("service_url", &self.service_url)
            .field("http", &self.http)
            .field("jwt_key", &format_args!("[JWT Key]"))
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl ClientBuilder {
    /// Creates a new [`ClientBuilder`] targeting `service_url`.
    ///
    /// The signing key for request tokens is derived from `app_secret`;
    /// an empty secret is rejected here, before any request is made.
    pub fn new(service_url: &str, app_secret: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let jwt_key = EncodingKey::from_secret(&derive_app_key(app_secret)?);

        Ok(Self {
            service_url: service_url.trim_end_matches('/').into(),
            http,
            jwt_key,
            app_name: "junkd".into(),
        })
    }

    /// Sets the application name reported in request tokens.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Creates the [`Client`] instance.
    pub fn build(self) -> Client {
        Client {
            service_url: self.service_url,
            http: self.http,
            jwt_key: self.jwt_key,
            app_name: self.app_name.into(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
struct Claims<'a> {
    exp: u64,
    app: &'a str,
}

/// The type of [`Stream`](futures_util::Stream) carrying an upload body.
pub type ClientStream = BoxStream<'static, io::Result<Bytes>>;

/// A client that uploads erasure-coded slabs to one indexer service.
pub struct Client {
    service_url: Arc<str>,
    http: reqwest::Client,
    jwt_key: EncodingKey,
    app_name: Arc<str>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("service_url", &self.service_url)
            .field("http", &self.http)
            .field("jwt_key", &format_args!("[JWT Key]"))
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl Client {
    fn make_authorization(&self) -> Result<String, ClientError> {
        let claims = Claims {
            exp: jsonwebtoken::get_current_timestamp() + 300,
            app: &self.app_name,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.jwt_key)?;
        Ok(token)
    }

    /// Registers the application with the indexer.
    ///
    /// This is the startup handshake: bad credentials or an unreachable
    /// indexer surface here, before any upload worker is started.
    pub async fn register_app(
        &self,
        app: &RegisterAppRequest,
    ) -> Result<RegisterAppResponse, ClientError> {
        let register_url = format!("{}/api/app/register", self.service_url);
        let authorization = self.make_authorization()?;

        let response = self
            .http
            .post(register_url)
            .header(header::AUTHORIZATION, authorization)
            .json(app)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, message });
        }

        Ok(response.json().await?)
    }

    /// Uploads one object, streaming `body` to the indexer.
    ///
    /// The backend splits the upload into slabs according to `redundancy`
    /// and returns a receipt listing them.
    pub async fn upload(
        &self,
        body: ClientStream,
        redundancy: Redundancy,
    ) -> Result<UploadReceipt, ClientError> {
        let upload_url = format!("{}/api/objects", self.service_url);
        let authorization = self.make_authorization()?;

        let response = self
            .http
            .post(upload_url)
            .header(header::AUTHORIZATION, authorization)
            .query(&[
                ("data_shards", redundancy.data_shards),
                ("parity_shards", redundancy.parity_shards),
            ])
            .body(Body::wrap_stream(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, message });
        }

        Ok(response.json().await?)
    }
}
