//! Taxonomía de errores del servicio de rutas.
//!
//! Cada error lleva un `kind` estable y un mensaje legible para que el
//! frontend pueda mostrarlo y decidir si reintenta o usa datos de ejemplo.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathQueryError {
    /// Configuración de consulta mal formada. Siempre corregible por quien llama.
    #[error("Consulta no válida: {0}")]
    Validation(String),

    /// Fallo de red o timeout hablando con el backend de grafo.
    #[error("Backend de grafo no disponible: {0}")]
    BackendUnavailable(String),

    /// El backend respondió con un estado de error o un payload ilegible.
    #[error("Error del backend de grafo: {0}")]
    BackendError(String),

    #[error("Tipo de entidad desconocido: {0}")]
    UnknownEntityType(String),

    #[error("Dominio desconocido: {0}")]
    UnknownDomain(String),

    #[error("Plantilla no encontrada: {0}")]
    TemplateNotFound(String),

    #[error("Entrada de historial no encontrada: {0}")]
    HistoryEntryNotFound(String),

    #[error("Todavía no se ha ejecutado ninguna consulta")]
    NoResult,

    #[error("Error de almacenamiento: {0}")]
    Storage(String),
}

pub type PathQueryResult<T> = Result<T, PathQueryError>;

impl PathQueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::BackendError(_) => "backend_error",
            Self::UnknownEntityType(_) => "unknown_entity_type",
            Self::UnknownDomain(_) => "unknown_domain",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::HistoryEntryNotFound(_) => "history_entry_not_found",
            Self::NoResult => "no_result",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Sólo los fallos de transporte merecen un reintento automático.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownDomain(_) => StatusCode::BAD_REQUEST,
            Self::UnknownEntityType(_)
            | Self::TemplateNotFound(_)
            | Self::HistoryEntryNotFound(_)
            | Self::NoResult => StatusCode::NOT_FOUND,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BackendError(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for PathQueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for PathQueryError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "retryable": self.retryable(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(PathQueryError::BackendUnavailable("timeout".into()).retryable());
        assert!(!PathQueryError::BackendError("500".into()).retryable());
        assert!(!PathQueryError::Validation("maxHops".into()).retryable());
    }

    #[test]
    fn maps_kinds_to_http_status() {
        assert_eq!(
            PathQueryError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PathQueryError::TemplateNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PathQueryError::BackendUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PathQueryError::BackendError("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(PathQueryError::NoResult.kind(), "no_result");
    }
}
