//! reqwest-backed [`Transport`].
//!
//! Every request carries a Bearer token and `Endpoint-Consistency: strict`,
//! so reads made right after an upload observe the uploaded content.
//! Network failures and elapsed timeouts map to [`ClientError::Transport`];
//! status codes pass through untouched for the protocol layer to judge.

use std::future::Future;
use std::pin::Pin;

use covesync_protocol::constants::{
    CONSISTENCY_STRICT, ENDPOINT_CONSISTENCY, ETAG, RANGE, UPLOAD_ID,
};
use covesync_upload::{ClientError, Method, Request, Response, Transport};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::config::ClientConfig;

#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|_| ClientError::Config("token is not a valid header value".into()))?,
        );
        headers.insert(
            HeaderName::from_bytes(ENDPOINT_CONSISTENCY.as_bytes())
                .map_err(|_| ClientError::Config("invalid consistency header name".into()))?,
            HeaderValue::from_static(CONSISTENCY_STRICT),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn send(&self, req: Request) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, req.path);
        trace!(method = req.method.as_str(), url = %url, "request");

        let mut builder = self.http.request(reqwest_method(req.method), &url);
        for (name, value) in &req.headers {
            builder = builder.header(*name, value);
        }
        let resp = builder
            .body(req.body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let upload_id = header_string(resp.headers(), UPLOAD_ID);
        let range = header_string(resp.headers(), RANGE);
        let etag = header_string(resp.headers(), ETAG);
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?
            .to_vec();

        Ok(Response {
            status,
            upload_id,
            range,
            etag,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, ClientError>> + Send + '_>> {
        Box::pin(self.send(req))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
