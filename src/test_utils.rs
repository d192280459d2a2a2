use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// Canned answer of an [`HttpStub`].
#[derive(Debug, Clone)]
pub struct StubReply {
    status: StatusCode,
    content_type: &'static str,
    chunks: Vec<&'static [u8]>,
    streamed: bool,
    delay: Duration,
}

impl StubReply {
    pub fn new(status: u16, content_type: &'static str, body: &'static [u8]) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type,
            chunks: vec![body],
            streamed: false,
            delay: Duration::ZERO,
        }
    }

    /// Sends the body with chunked transfer encoding and no Content-Length.
    pub fn streamed(mut self, chunks: &[&'static [u8]]) -> Self {
        self.chunks = chunks.to_vec();
        self.streamed = true;
        self
    }

    /// Holds every response back for `delay` after the request arrived.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn body(&self) -> Body {
        if self.streamed {
            let chunks: Vec<Result<Bytes, std::io::Error>> = self
                .chunks
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk)))
                .collect();
            Body::from_stream(futures::stream::iter(chunks))
        } else {
            Body::from(self.chunks.concat())
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

struct StubState {
    reply: StubReply,
    requests: Mutex<Vec<RecordedRequest>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Local HTTP server answering every request with the same reply.
pub struct HttpStub {
    pub base_url: String,
    state: Arc<StubState>,
}

impl HttpStub {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Highest number of requests the server was handling at once.
    pub fn peak_concurrency(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

pub async fn spawn_http_stub(
    status: u16,
    content_type: &'static str,
    body: &'static [u8],
) -> std::io::Result<HttpStub> {
    spawn_stub(StubReply::new(status, content_type, body)).await
}

pub async fn spawn_stub(reply: StubReply) -> std::io::Result<HttpStub> {
    let state = Arc::new(StubState {
        reply,
        requests: Mutex::new(Vec::new()),
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let router = Router::new()
        .fallback(record)
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}/", listener.local_addr()?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(HttpStub { base_url, state })
}

async fn record(State(stub): State<Arc<StubState>>, request: Request) -> Response {
    let received_at = Instant::now();
    let active = stub.active.fetch_add(1, Ordering::SeqCst) + 1;
    stub.peak.fetch_max(active, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    stub.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        received_at,
    });

    tokio::time::sleep(stub.reply.delay).await;
    stub.active.fetch_sub(1, Ordering::SeqCst);

    (
        stub.reply.status,
        [(header::CONTENT_TYPE, stub.reply.content_type)],
        stub.reply.body(),
    )
        .into_response()
}
