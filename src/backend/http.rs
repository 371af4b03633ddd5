//! Backend HTTP: delega el cálculo de rutas en un servicio remoto que expone
//! `POST /paths/shortest`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{PathBackend, PathRequest, RawPath};
use crate::error::{PathQueryError, PathQueryResult};

/// El servicio puede devolver `{"paths": [...]}` o directamente la lista.
#[derive(Deserialize)]
#[serde(untagged)]
enum PathsResponse {
    Wrapped { paths: Vec<RawPath> },
    Bare(Vec<RawPath>),
}

impl PathsResponse {
    fn into_paths(self) -> Vec<RawPath> {
        match self {
            PathsResponse::Wrapped { paths } => paths,
            PathsResponse::Bare(paths) => paths,
        }
    }
}

pub struct HttpPathBackend {
    base_url: String,
    client: Client,
}

impl HttpPathBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

fn transport_error(err: reqwest::Error) -> PathQueryError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        PathQueryError::BackendUnavailable(err.to_string())
    } else {
        PathQueryError::BackendError(err.to_string())
    }
}

async fn error_from_response(response: Response) -> PathQueryError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let detail = body
        .get("error")
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .unwrap_or("sin detalle");
    PathQueryError::BackendError(format!("estado {status}: {detail}"))
}

#[async_trait]
impl PathBackend for HttpPathBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn find_paths(&self, request: &PathRequest) -> PathQueryResult<Vec<RawPath>> {
        let url = format!("{}/paths/shortest", self.base_url);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: PathsResponse = serde_json::from_str(&body)
            .map_err(|e| PathQueryError::BackendError(format!("respuesta ilegible: {e}")))?;
        Ok(parsed.into_paths())
    }

    async fn health_check(&self) -> PathQueryResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}
