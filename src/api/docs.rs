use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use super::AppState;
use crate::error::ApiError;
use crate::respuesta;

const AYUDA: &str = r#"Olimpiada: API de gestión

Todas las respuestas JSON usan el sobre {"success", "data", "message"}.
Las rutas del personal exigen Authorization: Bearer <token> (el token lo entrega POST /api/auth/login).

Públicas
  GET  /help
  GET  /api/salud
  POST /api/auth/login                         {email, password} -> {token, expira_en, usuario}
  POST /api/auth/logout
  GET  /api/areas | /api/niveles | /api/unidades-educativas
  GET  /api/publico/resultados/{area_id}/{fase}?gestion=

Catálogos (coordinación)
  POST /api/areas   PUT /api/areas/{id}   POST /api/niveles
  POST /api/unidades-educativas   POST /api/tutores
  GET  /api/tutores/{id}   GET /api/tutores/documento/{documento}

Olimpistas e inscripciones
  GET|POST /api/olimpistas?buscar=&unidad_educativa_id=&limite=
  GET|PUT  /api/olimpistas/{id}   GET /api/olimpistas/{id}/inscripciones
  GET  /api/olimpistas/documento/{documento}
  POST /api/olimpistas/importar                (multipart: CSV o XLSX)
  GET  /api/olimpistas/exportar.csv
  GET|POST /api/inscripciones?area_id=&nivel_id=&estado=&gestion=
  GET  /api/inscripciones/{id}

Evaluación ({fase} = clasificacion | final)
  GET|POST /api/evaluaciones/{fase}            {inscripcion_id, nota, observaciones}
  GET  /api/evaluaciones/{fase}/ranking?area_id=&nivel_id=
  POST /api/evaluaciones/{fase}/finalizar      {area_id, nivel_id}
  GET  /api/evaluaciones/{fase}/inscripcion/{id}
  POST /api/clasificacion/cerrar               {area_id, nivel_id, nota_minima}

Exclusiones ({tipo} = descalificacion | desclasificacion | no_clasificado)
  GET|POST /api/exclusiones/{tipo}             {inscripcion_id, regla_id, motivo}
  POST /api/exclusiones/{tipo}/{id}/revocar
  GET|POST /api/reglas/{tipo}   POST /api/reglas/{tipo}/{id}/desactivar

Medallero y resultados
  GET|PUT /api/medallero   GET /api/premiados?area_id=&nivel_id=
  GET  /api/resultados   POST /api/resultados/confirmar   GET /api/resultados/exportar.csv

Horarios y publicación
  GET|PUT /api/horarios   GET /api/horarios/choques?fase=
  GET  /api/publicacion   PUT /api/publicacion/{area_id}/{fase}  {publicado}

Usuarios (administración)
  GET|POST /api/usuarios   GET|PUT /api/usuarios/{id}
  GET|PUT  /api/usuarios/{id}/areas
  GET  /api/usuarios/plantilla.csv   POST /api/usuarios/importar

Reportes
  GET /api/reportes/inscritos | /api/reportes/progreso/{fase} | /api/reportes/medallero
  GET /api/certificados?area_id=   GET|PUT /api/certificados/estilo
  GET /api/bitacora?limite=&entidad=&entidad_id=   GET /api/bitacora/{entidad}/{id}
"#;

pub async fn help_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(AYUDA)
}

/// Responde 200 aunque la base no esté disponible; `base_datos` indica su estado.
pub async fn salud_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let base_datos = match state.db.ejecutar(|c| Ok(c.simple_query("SELECT 1").is_ok())).await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("salud: base de datos no disponible: {}", e);
            false
        }
    };
    Ok(respuesta::ok(json!({
        "servicio": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "gestion": state.config.gestion,
        "base_datos": base_datos,
    })))
}
