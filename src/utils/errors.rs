//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP con el sobre uniforme
//! `{success, data?, message, error?}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable que viaja en `error.code`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Detalle del error dentro del sobre de respuesta
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Sobre de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    error: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let (message, details) = match self {
            AppError::Database(e) => {
                log::error!("❌ Database error: {}", e);
                ("Error inesperado accediendo a los datos".to_string(), None)
            }
            AppError::Internal(msg) => {
                log::error!("❌ Internal error: {}", msg);
                ("Error inesperado".to_string(), None)
            }
            AppError::Validation(e) => {
                log::warn!("⚠️ Validation error: {}", e);
                ("Los datos enviados no son válidos".to_string(), Some(json!(e)))
            }
            AppError::BadRequest(msg) => {
                log::warn!("⚠️ Bad request: {}", msg);
                (msg, None)
            }
            AppError::NotFound(msg) => {
                log::info!("🔍 Resource not found: {}", msg);
                (msg, None)
            }
            AppError::Conflict(msg) => {
                log::info!("⛔ Conflict: {}", msg);
                (msg, None)
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            error: ErrorBody { code, details },
        };

        (status, Json(body)).into_response()
    }
}

// Los rechazos de extractores de axum salen con el mismo sobre que el resto de errores
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request_error(&format!("JSON inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request_error(&format!("Parámetros inválidos: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        bad_request_error(&format!("Ruta inválida: {}", rejection.body_text()))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación sobre un campo
pub fn validation_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para errores de transición de estado inválida
pub fn invalid_transition_error(resource: &str, current: &str, requested: &str) -> AppError {
    AppError::Conflict(format!(
        "{}: transición inválida de {} a {}",
        resource, current, requested
    ))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Función helper para crear errores internos
pub fn internal_error(message: &str) -> AppError {
    AppError::Internal(message.to_string())
}
