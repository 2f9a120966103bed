use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::StreamExt;
use uuid::Uuid;

use super::*;

fn chunks(parts: &[&'static [u8]]) -> ClientStream {
    futures_util::stream::iter(
        parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p)))
            .collect::<Vec<_>>(),
    )
    .boxed()
}

#[tokio::test]
async fn uploads_stream_and_parses_receipt() {
    let server = TestServer::new();
    let client = ClientBuilder::new(&server.url("/"), "test-secret")
        .unwrap()
        .build();

    let receipt = client
        .upload(
            chunks(&[b"oh ", b"hai!"]),
            Redundancy {
                data_shards: 2,
                parity_shards: 4,
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.slabs.len(), 1);
    assert_eq!(receipt.slabs[0].length, 7);
    assert_eq!(receipt.key, receipt.slabs[0].id);

    let uploads = server.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].data_shards, 2);
    assert_eq!(uploads[0].parity_shards, 4);
    assert_eq!(uploads[0].len, 7);
}

#[tokio::test]
async fn requests_carry_a_decodable_token() {
    let server = TestServer::new();
    let client = ClientBuilder::new(&server.url("/"), "test-secret")
        .unwrap()
        .app_name("junkd-tests")
        .build();

    client
        .upload(
            chunks(&[b"payload"]),
            Redundancy {
                data_shards: 1,
                parity_shards: 1,
            },
        )
        .await
        .unwrap();

    #[derive(serde::Deserialize)]
    struct OwnedClaims {
        #[allow(dead_code)]
        exp: u64,
        app: String,
    }

    let uploads = server.uploads.lock().unwrap();
    let key = jsonwebtoken::DecodingKey::from_secret(&derive_app_key("test-secret").unwrap());
    let token = jsonwebtoken::decode::<OwnedClaims>(
        &uploads[0].authorization,
        &key,
        &jsonwebtoken::Validation::default(),
    )
    .unwrap();

    assert_eq!(token.claims.app, "junkd-tests");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let router = Router::new().route(
        "/api/objects",
        routing::post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "no hosts available") }),
    );
    let server = TestServer::with_router(router);
    let client = ClientBuilder::new(&server.url("/"), "test-secret")
        .unwrap()
        .build();

    let err = client
        .upload(
            chunks(&[b"payload"]),
            Redundancy {
                data_shards: 2,
                parity_shards: 4,
            },
        )
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(message, "no hosts available");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn register_app_parses_the_response() {
    async fn register(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> Response {
        assert!(headers.contains_key(axum::http::header::AUTHORIZATION));
        assert_eq!(body["name"], "junkd");
        Json(serde_json::json!({
            "connected": false,
            "response_url": "http://indexer/approve/abc",
        }))
        .into_response()
    }

    let router = Router::new().route("/api/app/register", routing::post(register));
    let server = TestServer::with_router(router);
    let client = ClientBuilder::new(&server.url("/"), "test-secret")
        .unwrap()
        .build();

    let response = client
        .register_app(&RegisterAppRequest {
            name: "junkd".into(),
            description: "load generator".into(),
        })
        .await
        .unwrap();

    assert!(!response.connected);
    assert_eq!(
        response.response_url.as_deref(),
        Some("http://indexer/approve/abc")
    );
}

#[tokio::test]
async fn register_app_surfaces_bad_credentials() {
    let router = Router::new().route(
        "/api/app/register",
        routing::post(|| async { (StatusCode::UNAUTHORIZED, "invalid app key") }),
    );
    let server = TestServer::with_router(router);
    let client = ClientBuilder::new(&server.url("/"), "wrong-secret")
        .unwrap()
        .build();

    let err = client
        .register_app(&RegisterAppRequest {
            name: "junkd".into(),
            description: "load generator".into(),
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "invalid app key");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[derive(Debug)]
struct RecordedUpload {
    authorization: String,
    data_shards: usize,
    parity_shards: usize,
    len: usize,
}

type Uploads = Arc<Mutex<Vec<RecordedUpload>>>;

#[derive(Debug)]
struct TestServer {
    uploads: Uploads,
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
}

impl TestServer {
    /// Creates a server that records uploads and answers with a one-slab receipt.
    fn new() -> Self {
        #[derive(serde::Deserialize)]
        struct RedundancyQuery {
            data_shards: usize,
            parity_shards: usize,
        }

        async fn upload(
            State(uploads): State<Uploads>,
            Query(query): Query<RedundancyQuery>,
            headers: HeaderMap,
            body: Bytes,
        ) -> Response {
            let authorization = headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned();

            uploads.lock().unwrap().push(RecordedUpload {
                authorization,
                data_shards: query.data_shards,
                parity_shards: query.parity_shards,
                len: body.len(),
            });

            let id = Uuid::now_v7().to_string();
            Json(serde_json::json!({
                "key": id,
                "slabs": [{ "id": id, "length": body.len() }],
            }))
            .into_response()
        }

        let uploads: Uploads = Default::default();
        let router = Router::new()
            .route("/api/objects", routing::post(upload))
            .with_state(Arc::clone(&uploads));

        let mut server = Self::with_router(router);
        server.uploads = uploads;
        server
    }

    fn with_router(router: Router) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            uploads: Default::default(),
            handle,
            socket,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
