use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use azion_api_client::{
    transport::{Request, Response},
    HttpClient,
};

/// Answers requests by path, unknown paths fail like an unreachable host
#[derive(Default)]
pub struct MockClient {
    routes: HashMap<String, (u16, String)>,
    pub requests: RefCell<Vec<String>>,
}

impl MockClient {
    pub fn route(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(path.to_string(), (status, body.to_string()));
        self
    }
}

impl HttpClient for MockClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        let path = request.uri().path().to_string();
        self.requests.borrow_mut().push(path.clone());

        let Some((status, body)) = self.routes.get(&path) else {
            anyhow::bail!("connection refused");
        };

        let mut response = http::Response::new(body.clone().into_bytes());
        *response.status_mut() = http::StatusCode::from_u16(*status)?;
        Ok(response)
    }
}

pub fn config(dir: &tempfile::TempDir) -> azion_api_client::Config {
    azion_api_client::Config::builder()
        .dir(dir.path().to_path_buf())
        .auth_url("http://auth.test")
        .build()
}
