use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use http::{Method, Request, Response, StatusCode};
use hyper::Body;
use kube::Client;
use serde_json::{json, Value};

pub type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// A [`Client`] wired to an in-memory API server driven through the returned verifier.
pub fn mock_client() -> (Client, ApiServerVerifier) {
    let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    (Client::new(mock_service, "default"), ApiServerVerifier(handle))
}

// Writing a script while another test forks can fail the exec with ETXTBSY.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that write executables and then spawn them.
pub fn script_lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Await `future`, failing the test if it takes longer than a second.
pub async fn timeout_after_1s<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(1), future)
        .await
        .expect("timeout on mock apiserver")
}

/// A `Status` body as the API server returns it for failed requests.
pub fn status_body(code: u16, reason: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": format!("request failed with {}", reason),
        "reason": reason,
        "code": code,
    })
}

pub struct ApiServerVerifier(ApiServerHandle);

impl ApiServerVerifier {
    /// Wait for the next request, check its method and path, answer it.
    ///
    /// Returns the JSON body of the request, or [`Value::Null`] when it had none.
    pub async fn expect(
        &mut self,
        method: Method,
        path: &str,
        status: StatusCode,
        response: Value,
    ) -> Value {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), &method, "method of request to {}", path);
        assert_eq!(request.uri().path(), path);
        let body = hyper::body::to_bytes(request.into_body()).await.unwrap();
        send.send_response(
            Response::builder()
                .status(status)
                .body(Body::from(serde_json::to_vec(&response).unwrap()))
                .unwrap(),
        );
        if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        }
    }

    /// Assert that the client was dropped without sending anything else.
    pub async fn expect_no_more_requests(mut self) {
        if let Some((request, _)) = self.0.next_request().await {
            panic!(
                "unexpected request {} {}",
                request.method(),
                request.uri().path()
            );
        }
    }
}
