// Sobre de respuesta común de la API: {success, data, message}.

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Respuesta<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Respuesta { success: true, data, message: "ok".to_string() })
}

pub fn ok_con_mensaje<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(Respuesta { success: true, data, message: message.into() })
}

pub fn creado<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Created().json(Respuesta { success: true, data, message: message.into() })
}

/// 409 que además devuelve datos (p. ej. la lista de choques que lo causó).
pub fn conflicto_con_datos<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Conflict().json(Respuesta { success: false, data, message: format!("409:{}", message.into()) })
}
