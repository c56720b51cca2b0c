use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use postgres::error::SqlState;
use serde_json::json;
use thiserror::Error;

/// Error único de la API. Cada variante fija el código HTTP que recibe el
/// cliente; el mensaje va prefijado con ese código ("403:...").
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("error de base de datos: {0}")]
    BaseDatos(String),

    #[error("{0}")]
    NoEncontrado(String),

    #[error("{0}")]
    Validacion(String),

    #[error("{0}")]
    Conflicto(String),

    #[error("{0}")]
    NoAutenticado(String),

    #[error("{0}")]
    Prohibido(String),

    #[error("error en bitácora: {0}")]
    Bitacora(String),

    #[error("error de importación: {0}")]
    Importacion(String),

    #[error("error interno: {0}")]
    Interno(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn no_encontrado(entidad: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NoEncontrado(format!("{} {} no encontrado", entidad, id))
    }

    pub fn validacion(msg: impl Into<String>) -> Self {
        ApiError::Validacion(msg.into())
    }

    pub fn conflicto(msg: impl Into<String>) -> Self {
        ApiError::Conflicto(msg.into())
    }
}

impl From<postgres::Error> for ApiError {
    fn from(e: postgres::Error) -> Self {
        match e.code() {
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
                ApiError::Conflicto(format!("registro duplicado: {}", detalle_db(&e)))
            }
            Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
                ApiError::Validacion(format!("referencia inválida: {}", detalle_db(&e)))
            }
            Some(code) if *code == SqlState::CHECK_VIOLATION => {
                ApiError::Validacion(format!("valor fuera de rango: {}", detalle_db(&e)))
            }
            _ => ApiError::BaseDatos(e.to_string()),
        }
    }
}

fn detalle_db(e: &postgres::Error) -> String {
    e.as_db_error()
        .map(|db| db.detail().unwrap_or(db.message()).to_string())
        .unwrap_or_else(|| e.to_string())
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Bitacora(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Interno(format!("json: {}", e))
    }
}

impl From<csv::Error> for ApiError {
    fn from(e: csv::Error) -> Self {
        ApiError::Importacion(e.to_string())
    }
}

impl From<crate::models::ValorDesconocido> for ApiError {
    fn from(e: crate::models::ValorDesconocido) -> Self {
        ApiError::Validacion(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            ApiError::Validacion(_) | ApiError::Importacion(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflicto(_) => StatusCode::CONFLICT,
            ApiError::NoAutenticado(_) => StatusCode::UNAUTHORIZED,
            ApiError::Prohibido(_) => StatusCode::FORBIDDEN,
            ApiError::BaseDatos(_) | ApiError::Bitacora(_) | ApiError::Interno(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "fallo interno atendiendo la solicitud");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "solicitud rechazada");
        }
        HttpResponse::build(status).json(json!({
            "success": false,
            "data": null,
            "message": format!("{}:{}", status.as_u16(), self),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codigos_http_por_variante() {
        assert_eq!(ApiError::validacion("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::no_encontrado("Área", 3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NoAutenticado("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Prohibido("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflicto("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Interno("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn mensaje_de_no_encontrado() {
        assert_eq!(ApiError::no_encontrado("Olimpista", 7).to_string(), "Olimpista 7 no encontrado");
    }
}
