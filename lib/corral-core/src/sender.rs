use std::fmt;
use std::future::Future;
use std::pin::Pin;

use headers::HeaderMapExt;
use http::header::{HeaderName, HeaderValue};

use crate::bag::render_value;
use crate::error::CorralError;
use crate::pending::PendingRequest;
use crate::request::BodyFormat;
use crate::response::Response;

/// Boxed response future returned by [`Sender::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, CorralError>> + Send + 'a>>;

/// Transport abstraction performing the actual I/O.
///
/// A sender receives a fully-built [`PendingRequest`] and resolves to a
/// [`Response`] or a transport failure. It owns no merge or authentication
/// logic; by the time it runs, the pipeline is done. Timeouts and
/// cancellation are sender concerns, not pipeline concerns.
pub trait Sender: Send + Sync + fmt::Debug {
    /// Dispatches the request, consuming it into the response.
    fn send(&self, request: PendingRequest) -> SendFuture<'_>;
}

/// Default [`Sender`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    /// Creates a sender with a fresh reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sender reusing an existing reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(pending: &PendingRequest) -> Result<reqwest::Request, CorralError> {
        let url = pending.url()?;
        let mut request = reqwest::Request::new(pending.method().clone(), url);
        let request_headers = request.headers_mut();

        for (name, value) in pending.headers().iter() {
            request_headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&render_value(value)?)?,
            );
        }

        match pending.body_format() {
            BodyFormat::None => {}
            BodyFormat::Json => {
                request_headers.typed_insert(headers::ContentType::json());
                let data = serde_json::to_vec(&pending.body().to_json())?;
                *request.body_mut() = Some(reqwest::Body::from(data));
            }
            BodyFormat::Form => {
                request_headers.typed_insert(headers::ContentType::form_url_encoded());
                let pairs = pending
                    .body()
                    .iter()
                    .map(|(key, value)| Ok((key.to_string(), render_value(value)?)))
                    .collect::<Result<Vec<_>, CorralError>>()?;
                let data = serde_urlencoded::to_string(&pairs)?;
                *request.body_mut() = Some(reqwest::Body::from(data));
            }
        }

        Ok(request)
    }
}

impl Sender for ReqwestSender {
    fn send(&self, request: PendingRequest) -> SendFuture<'_> {
        Box::pin(async move {
            let built = Self::build_request(&request)?;
            let response = self.client.execute(built).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Response::build(status, headers, body, request)
        })
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::bag::PropertyBag;
    use crate::connector::Connector;
    use crate::request::{BasicRequest, Request};

    struct Api;

    impl Connector for Api {
        fn base_url(&self) -> String {
            "https://api.example.com/v2".to_string()
        }

        fn default_headers(&self) -> PropertyBag {
            PropertyBag::new().with("Accept", "application/json")
        }
    }

    #[test]
    fn test_build_request_headers_and_url() {
        let request = BasicRequest::get("widgets").with_query_param("page", 3);
        let pending = Api.build(&request).expect("build");

        let built = ReqwestSender::build_request(&pending).expect("request");
        assert_eq!(built.method(), &Method::GET);
        assert_eq!(built.url().as_str(), "https://api.example.com/v2/widgets?page=3");
        assert_eq!(
            built.headers().get("Accept").map(|value| value.to_str().unwrap_or_default()),
            Some("application/json")
        );
        assert!(built.body().is_none());
    }

    #[test]
    fn test_build_request_json_body() {
        let request = BasicRequest::post("widgets")
            .with_body_format(crate::request::BodyFormat::Json)
            .with_body_field("name", "sprocket")
            .with_body_field("count", 3);
        let pending = Api.build(&request).expect("build");

        let built = ReqwestSender::build_request(&pending).expect("request");
        assert_eq!(
            built.headers().get("content-type").map(|value| value.to_str().unwrap_or_default()),
            Some("application/json")
        );
        let body = built.body().and_then(reqwest::Body::as_bytes).expect("body bytes");
        let parsed: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(parsed, json!({"name": "sprocket", "count": 3}));
    }

    #[test]
    fn test_build_request_form_body_preserves_order() {
        let request = BasicRequest::post("token")
            .with_body_format(crate::request::BodyFormat::Form)
            .with_body_field("grant_type", "authorization_code")
            .with_body_field("code", "abc 123");
        let pending = Api.build(&request).expect("build");

        let built = ReqwestSender::build_request(&pending).expect("request");
        let body = built.body().and_then(reqwest::Body::as_bytes).expect("body bytes");
        assert_eq!(
            std::str::from_utf8(body).expect("utf8 body"),
            "grant_type=authorization_code&code=abc+123"
        );
    }

    #[test]
    fn test_request_method_trait_object_usable() {
        let request = BasicRequest::delete("widgets/3");
        let boxed: Box<dyn Request> = Box::new(request);
        let pending = Api.build(boxed.as_ref()).expect("build");
        assert_eq!(pending.method(), &Method::DELETE);
    }
}
