use std::future::Future;

use anyhow::Result;

pub type Request = http::Request<Vec<u8>>;
pub type Response = http::Response<Vec<u8>>;

/// Minimal HTTP capability used by credential operations
///
/// An `Err` means the request never got an answer (DNS, connection, timeout).
/// Any HTTP status, including errors, is returned as `Ok`.
pub trait HttpClient {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>>;
}

impl<T: HttpClient> HttpClient for &T {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> {
        (**self).execute(request)
    }
}

impl HttpClient for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let res = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}
