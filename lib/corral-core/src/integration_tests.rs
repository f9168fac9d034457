//! End-to-end pipeline tests: connector + request through mock dispatch.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde_json::json;

use crate::{
    BasicRequest, BearerAuthenticator, BodyFormat, Connector, CorralError, MockClient,
    MockResponse, PropertyBag, Request, RequestMiddleware, Response, ResponseFactory,
    ResponseInterceptor,
};

struct WarehouseApi {
    mock: MockClient,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl WarehouseApi {
    fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            mock: MockClient::sequence(responses),
            middleware: Vec::new(),
            interceptors: Vec::new(),
        }
    }
}

impl Connector for WarehouseApi {
    fn base_url(&self) -> String {
        "https://warehouse.example.com/api".to_string()
    }

    fn default_headers(&self) -> PropertyBag {
        PropertyBag::new()
            .with("Accept", "application/json")
            .with("X-Client", "corral")
    }

    fn default_query(&self) -> PropertyBag {
        PropertyBag::new().with("region", "eu")
    }

    fn authenticator(&self) -> Option<Arc<dyn crate::Authenticator>> {
        Some(Arc::new(BearerAuthenticator::new("warehouse-token")))
    }

    fn mock_client(&self) -> Option<MockClient> {
        Some(self.mock.clone())
    }

    fn middleware(&self) -> Vec<Arc<dyn RequestMiddleware>> {
        self.middleware.clone()
    }

    fn response_interceptors(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        self.interceptors.clone()
    }
}

#[tokio::test]
async fn merged_and_authenticated_request_reaches_the_mock() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let api = WarehouseApi::new(vec![MockResponse::json(&json!({"items": []}))]);
    let request = BasicRequest::get("stock")
        .with_header("X-Client", "inventory-worker")
        .with_query_param("page", 4);

    let response = api.send(&request).await.expect("dispatch");
    assert!(response.is_success());

    let recorded = api.mock.last_request().expect("recorded request");
    // request layer overrides the connector layer, everything else survives
    assert_eq!(recorded.headers().get_str("Accept"), Some("application/json"));
    assert_eq!(recorded.headers().get_str("X-Client"), Some("inventory-worker"));
    assert_eq!(
        recorded.headers().get_str("Authorization"),
        Some("Bearer warehouse-token")
    );
    assert_eq!(
        recorded.url().expect("url").as_str(),
        "https://warehouse.example.com/api/stock?region=eu&page=4"
    );
}

#[tokio::test]
async fn response_carries_back_reference_to_pending_request() {
    let api = WarehouseApi::new(vec![MockResponse::ok()]);

    let response = api.send(&BasicRequest::get("stock")).await.expect("dispatch");
    assert_eq!(response.pending_request().endpoint(), "stock");
}

#[tokio::test]
async fn unmatched_mock_fails_with_typed_error() {
    let api = WarehouseApi::new(Vec::new());

    let result = api.send(&BasicRequest::get("stock")).await;
    assert!(matches!(result, Err(CorralError::UnmatchedMock { .. })));
    // the attempt is still recorded
    api.mock.assert_sent_count(1);
}

#[tokio::test]
async fn request_level_mock_overrides_connector_mock() {
    let api = WarehouseApi::new(Vec::new());
    let request_mock = MockClient::sequence([MockResponse::ok()]);
    let request = BasicRequest::get("stock").with_mock_client(request_mock.clone());

    api.send(&request).await.expect("dispatch");

    request_mock.assert_sent_count(1);
    api.mock.assert_sent_count(0);
}

#[tokio::test]
async fn middleware_runs_before_dispatch_in_order() {
    let mut api = WarehouseApi::new(vec![MockResponse::ok()]);
    api.middleware.push(Arc::new(|request: &mut crate::PendingRequest| {
        request.headers_mut().add("X-Stage", "connector");
    }));
    let request = BasicRequest::get("stock");

    api.send(&request).await.expect("dispatch");

    let recorded = api.mock.last_request().expect("recorded request");
    assert_eq!(recorded.headers().get_str("X-Stage"), Some("connector"));
}

#[tokio::test]
async fn boot_hook_can_push_middleware() {
    struct SignedRequest;

    impl Request for SignedRequest {
        fn method(&self) -> http::Method {
            http::Method::GET
        }

        fn endpoint(&self) -> String {
            "stock".to_string()
        }

        fn boot(&self, request: &mut crate::PendingRequest) {
            request.push_middleware(Arc::new(|pending: &mut crate::PendingRequest| {
                pending.headers_mut().add("X-Signature", "sig-123");
            }));
        }
    }

    let api = WarehouseApi::new(vec![MockResponse::ok()]);
    api.send(&SignedRequest).await.expect("dispatch");

    let recorded = api.mock.last_request().expect("recorded request");
    assert_eq!(recorded.headers().get_str("X-Signature"), Some("sig-123"));
}

#[tokio::test]
async fn response_interceptors_see_the_response() {
    let seen: Arc<Mutex<Vec<u16>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut api = WarehouseApi::new(vec![MockResponse::ok()]);
    api.interceptors.push(Arc::new(move |response: &mut Response| {
        log.lock().expect("log lock").push(response.status().as_u16());
        response.set_body(Bytes::from_static(b"intercepted"));
    }));

    let response = api.send(&BasicRequest::get("stock")).await.expect("dispatch");

    assert_eq!(seen.lock().expect("log lock").as_slice(), &[200]);
    assert_eq!(response.text(), "intercepted");
}

#[tokio::test]
async fn response_factory_can_reject_the_response() {
    struct StrictRequest;

    impl Request for StrictRequest {
        fn method(&self) -> http::Method {
            http::Method::GET
        }

        fn endpoint(&self) -> String {
            "stock".to_string()
        }

        fn response_factory(&self) -> Option<ResponseFactory> {
            Some(Arc::new(|status, headers, body, pending| {
                if status.is_success() {
                    Ok(Response::new(status, headers, body, pending))
                } else {
                    Err(CorralError::InvalidResponseType {
                        reason: format!("unexpected status {status}"),
                    })
                }
            }))
        }
    }

    let api = WarehouseApi::new(vec![MockResponse::new(http::StatusCode::BAD_GATEWAY)]);
    let result = api.send(&StrictRequest).await;

    assert!(matches!(
        result,
        Err(CorralError::InvalidResponseType { .. })
    ));
}

#[tokio::test]
async fn endpoint_mock_engine_matches_by_path() {
    let mock = MockClient::for_endpoints([
        ("stock", MockResponse::json(&json!({"kind": "stock"}))),
        ("orders", MockResponse::json(&json!({"kind": "orders"}))),
    ]);
    let api = WarehouseApi {
        mock,
        middleware: Vec::new(),
        interceptors: Vec::new(),
    };

    let response = api.send(&BasicRequest::get("orders")).await.expect("dispatch");
    let body: serde_json::Value = response.json().expect("json body");
    assert_eq!(body.get("kind"), Some(&json!("orders")));
}

#[tokio::test]
async fn form_body_request_keeps_connector_defaults_out_of_the_body() {
    let api = WarehouseApi::new(vec![MockResponse::ok()]);
    let request = BasicRequest::post("orders")
        .with_body_format(BodyFormat::Form)
        .with_body_field("sku", "W-17");

    api.send(&request).await.expect("dispatch");

    let recorded = api.mock.last_request().expect("recorded request");
    assert_eq!(recorded.body_format(), BodyFormat::Form);
    assert_eq!(recorded.body().len(), 1);
    assert_eq!(recorded.body().get_str("sku"), Some("W-17"));
}
