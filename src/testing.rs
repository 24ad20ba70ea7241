//! An in-memory API server for lifecycle tests.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use hyper::body::Sender;
use hyper::{Body, Request, Response, StatusCode};
use kube::Client;
use serde_json::{json, Value};

pub enum Reply {
    Json(StatusCode, Value),
    /// A response whose body never completes, as an idle watch.
    Pending,
}

pub fn ok(body: Value) -> Reply {
    Reply::Json(StatusCode::OK, body)
}

pub fn not_found() -> Reply {
    Reply::Json(
        StatusCode::NOT_FOUND,
        json!({
            "apiVersion": "v1",
            "kind": "Status",
            "metadata": {},
            "status": "Failure",
            "message": "not found",
            "reason": "NotFound",
            "code": 404,
        }),
    )
}

/// A list response as returned to the initial request of a watch.
pub fn list(items: Vec<Value>) -> Reply {
    ok(json!({
        "apiVersion": "v1",
        "kind": "List",
        "metadata": {"resourceVersion": "1"},
        "items": items,
    }))
}

pub fn is_watch(request: &Request<Body>) -> bool {
    request
        .uri()
        .query()
        .map_or(false, |query| query.contains("watch=true"))
}

/// Requests the server received, as `METHOD path?query`.
#[derive(Clone, Default)]
pub struct Requests(Arc<Mutex<Vec<String>>>);

impl Requests {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        let prefix = format!("{} ", method);
        self.all().iter().filter(|r| r.starts_with(&prefix)).count()
    }
}

/// A client whose requests are answered by `handler`.
pub fn client<F>(handler: F) -> (Client, Requests)
where
    F: Fn(&Request<Body>) -> Reply + Send + 'static,
{
    let requests = Requests::default();
    let seen = requests.clone();
    let mut watches: Vec<Sender> = Vec::new();
    let service = tower::service_fn(move |request: Request<Body>| {
        seen.0
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method(), request.uri()));
        let response = match handler(&request) {
            Reply::Json(status, body) => Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            Reply::Pending => {
                let (sender, body) = Body::channel();
                watches.push(sender);
                Response::new(body)
            }
        };
        async move { Ok::<_, Infallible>(response) }
    });
    (Client::new(service, "default"), requests)
}
