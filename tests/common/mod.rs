#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::Response,
    Router,
};
use tokio::net::TcpListener;

use requisition_gateway::client::HttpClient;
use requisition_gateway::config::AppConfig;
use requisition_gateway::handlers;

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path plus query, exactly as received
    pub uri: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.uri)
    }
}

/// A canned backend answer
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: vec![("content-type".into(), "application/json".into())],
            body: value.to_string().into_bytes(),
        }
    }

    pub fn text(status: u16, text: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: vec![("content-type".into(), "text/plain".into())],
            body: text.as_bytes().to_vec(),
        }
    }

    pub fn bytes(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type".into(), content_type.into())],
            body,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Default)]
struct Shared {
    routes: HashMap<(Method, String), Canned>,
    requests: Mutex<Vec<Recorded>>,
}

/// Stand-in for the requisition backend; answers by method and path, 404 otherwise
pub struct MockBackend {
    pub base_url: String,
    shared: Arc<Shared>,
}

impl MockBackend {
    pub async fn start(routes: Vec<(Method, &str, Canned)>) -> Result<Self> {
        let shared = Arc::new(Shared {
            routes: routes
                .into_iter()
                .map(|(method, path, canned)| ((method, path.to_string()), canned))
                .collect(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(answer).with_state(shared.clone());
        let addr = serve(app).await?;
        Ok(Self {
            base_url: format!("http://{}", addr),
            shared,
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.requests().iter().map(Recorded::line).collect()
    }
}

async fn answer(State(shared): State<Arc<Shared>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header_string = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    shared.requests.lock().unwrap().push(Recorded {
        method: parts.method.clone(),
        uri: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        authorization: header_string(header::AUTHORIZATION),
        content_type: header_string(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    let canned = shared
        .routes
        .get(&(parts.method, parts.uri.path().to_string()))
        .cloned()
        .unwrap_or_else(|| Canned::text(404, "Not found"));

    let mut response = Response::new(Body::from(canned.body));
    *response.status_mut() = canned.status;
    for (name, value) in canned.headers {
        let name = header::HeaderName::from_bytes(name.as_bytes()).unwrap();
        response.headers_mut().insert(name, HeaderValue::from_str(&value).unwrap());
    }
    response
}

/// The gateway itself, served in-process against `backend_url`
pub struct TestGateway {
    pub base_url: String,
}

impl TestGateway {
    pub async fn start(backend_url: &str) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let app = handlers::app(&AppConfig::for_backend(backend_url, port))?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind gateway port {}", port))?;
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Typed client for the workflow, carrying `token` as a bearer credential
    pub fn client(&self, token: &str) -> HttpClient {
        HttpClient::builder(self.base_url.as_str())
            .token(token)
            .build()
            .expect("gateway URL is valid")
    }
}

/// Backend with `routes` plus a gateway in front of it
pub async fn stack(routes: Vec<(Method, &str, Canned)>) -> Result<(MockBackend, TestGateway)> {
    let backend = MockBackend::start(routes).await?;
    let gateway = TestGateway::start(&backend.base_url).await?;
    Ok((backend, gateway))
}

async fn serve(app: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok(addr)
}
