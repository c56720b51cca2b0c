//! Handlers HTTP. Cada módulo agrupa las rutas de una familia de tablas;
//! todos devuelven `Result<HttpResponse, ApiError>` con el sobre
//! `{success, data, message}`.

pub mod auth;
pub mod catalogos;
pub mod certificados;
pub mod docs;
pub mod evaluaciones;
pub mod exclusiones;
pub mod horarios;
pub mod inscripciones;
pub mod olimpistas;
pub mod publicacion;
pub mod reportes;
pub mod resultados;
pub mod usuarios;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, error, web};
use futures_util::stream::StreamExt;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;
use crate::error::{ApiError, ApiResult};

/// Estado compartido por todos los handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Db,
    pub bitacora_url: String,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            db: Db::new(config.database_url.clone(), config.max_conexiones),
            bitacora_url: config.bitacora_url.clone(),
            config: Arc::new(config),
        }
    }
}

/// Tamaño máximo de un archivo de importación.
const MAX_ARCHIVO: usize = 10 * 1024 * 1024;

/// Lee el primer archivo de un formulario multipart.
pub async fn leer_archivo(mut payload: Multipart) -> ApiResult<(String, Vec<u8>)> {
    while let Some(field_res) = payload.next().await {
        let mut field = field_res.map_err(|e| ApiError::Importacion(format!("multipart inválido: {}", e)))?;
        let Some(filename) = field.content_disposition().get_filename().map(|s| s.to_string()) else {
            continue;
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::Importacion(format!("error leyendo '{}': {}", filename, e)))?;
            if bytes.len() + chunk.len() > MAX_ARCHIVO {
                return Err(ApiError::Importacion(format!("'{}' supera el tamaño máximo de 10 MB", filename)));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((filename, bytes));
    }
    Err(ApiError::validacion("no se recibió ningún archivo"))
}

pub(crate) fn csv_adjunto(nombre: &str, contenido: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .append_header(("Content-Disposition", format!("attachment; filename=\"{}\"", nombre)))
        .body(contenido)
}

/// Cuerpos JSON y query strings malformados responden con el mismo sobre
/// que el resto de errores.
fn extractores(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| error::Error::from(ApiError::Validacion(format!("cuerpo JSON inválido: {}", err)))),
    );
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| error::Error::from(ApiError::Validacion(format!("parámetros inválidos: {}", err)))),
    );
}

/// Registra todas las rutas. Las rutas fijas van antes que las que llevan
/// `{id}` en la misma posición.
pub fn configurar_rutas(cfg: &mut web::ServiceConfig) {
    extractores(cfg);
    cfg
        // públicas
        .route("/help", web::get().to(docs::help_handler))
        .route("/api/salud", web::get().to(docs::salud_handler))
        .route("/api/auth/login", web::post().to(usuarios::login_handler))
        .route("/api/auth/logout", web::post().to(usuarios::logout_handler))
        .route("/api/publico/resultados/{area_id}/{fase}", web::get().to(publicacion::resultados_publicos_handler))
        // catálogos
        .route("/api/areas", web::get().to(catalogos::listar_areas_handler))
        .route("/api/areas", web::post().to(catalogos::crear_area_handler))
        .route("/api/areas/{id}", web::put().to(catalogos::actualizar_area_handler))
        .route("/api/niveles", web::get().to(catalogos::listar_niveles_handler))
        .route("/api/niveles", web::post().to(catalogos::crear_nivel_handler))
        .route("/api/unidades-educativas", web::get().to(catalogos::listar_unidades_handler))
        .route("/api/unidades-educativas", web::post().to(catalogos::crear_unidad_handler))
        .route("/api/unidades-educativas/{id}", web::get().to(catalogos::obtener_unidad_handler))
        .route("/api/tutores", web::post().to(catalogos::guardar_tutor_handler))
        .route("/api/tutores/documento/{documento}", web::get().to(catalogos::tutor_por_documento_handler))
        .route("/api/tutores/{id}", web::get().to(catalogos::obtener_tutor_handler))
        // olimpistas e inscripciones
        .route("/api/olimpistas", web::get().to(olimpistas::listar_handler))
        .route("/api/olimpistas", web::post().to(olimpistas::crear_handler))
        .route("/api/olimpistas/exportar.csv", web::get().to(olimpistas::exportar_handler))
        .route("/api/olimpistas/importar", web::post().to(olimpistas::importar_handler))
        .route("/api/olimpistas/documento/{documento}", web::get().to(olimpistas::por_documento_handler))
        .route("/api/olimpistas/{id}", web::get().to(olimpistas::obtener_handler))
        .route("/api/olimpistas/{id}", web::put().to(olimpistas::actualizar_handler))
        .route("/api/olimpistas/{id}/inscripciones", web::get().to(olimpistas::inscripciones_handler))
        .route("/api/inscripciones", web::get().to(inscripciones::listar_handler))
        .route("/api/inscripciones", web::post().to(inscripciones::crear_handler))
        .route("/api/inscripciones/{id}", web::get().to(inscripciones::obtener_handler))
        // evaluación y clasificación
        .route("/api/evaluaciones/{fase}", web::get().to(evaluaciones::listar_handler))
        .route("/api/evaluaciones/{fase}", web::post().to(evaluaciones::registrar_handler))
        .route("/api/evaluaciones/{fase}/ranking", web::get().to(evaluaciones::ranking_handler))
        .route("/api/evaluaciones/{fase}/finalizar", web::post().to(evaluaciones::finalizar_handler))
        .route("/api/evaluaciones/{fase}/inscripcion/{id}", web::get().to(evaluaciones::por_inscripcion_handler))
        .route("/api/clasificacion/cerrar", web::post().to(evaluaciones::cerrar_clasificacion_handler))
        // exclusiones y reglas
        .route("/api/exclusiones/{tipo}", web::get().to(exclusiones::listar_handler))
        .route("/api/exclusiones/{tipo}", web::post().to(exclusiones::registrar_handler))
        .route("/api/exclusiones/{tipo}/{id}/revocar", web::post().to(exclusiones::revocar_handler))
        .route("/api/reglas/{tipo}", web::get().to(exclusiones::listar_reglas_handler))
        .route("/api/reglas/{tipo}", web::post().to(exclusiones::crear_regla_handler))
        .route("/api/reglas/{tipo}/{id}/desactivar", web::post().to(exclusiones::desactivar_regla_handler))
        // medallero y resultados
        .route("/api/medallero", web::get().to(resultados::listar_medallero_handler))
        .route("/api/medallero", web::put().to(resultados::guardar_medallero_handler))
        .route("/api/premiados", web::get().to(resultados::premiados_handler))
        .route("/api/resultados", web::get().to(resultados::listar_handler))
        .route("/api/resultados/confirmar", web::post().to(resultados::confirmar_handler))
        .route("/api/resultados/exportar.csv", web::get().to(resultados::exportar_handler))
        // horarios y publicación
        .route("/api/horarios", web::get().to(horarios::listar_handler))
        .route("/api/horarios", web::put().to(horarios::guardar_handler))
        .route("/api/horarios/choques", web::get().to(horarios::choques_handler))
        .route("/api/publicacion", web::get().to(publicacion::listar_handler))
        .route("/api/publicacion/{area_id}/{fase}", web::put().to(publicacion::cambiar_handler))
        // usuarios
        .route("/api/usuarios", web::get().to(usuarios::listar_handler))
        .route("/api/usuarios", web::post().to(usuarios::crear_handler))
        .route("/api/usuarios/plantilla.csv", web::get().to(usuarios::plantilla_handler))
        .route("/api/usuarios/importar", web::post().to(usuarios::importar_handler))
        .route("/api/usuarios/{id}", web::get().to(usuarios::obtener_handler))
        .route("/api/usuarios/{id}", web::put().to(usuarios::actualizar_handler))
        .route("/api/usuarios/{id}/areas", web::get().to(usuarios::areas_handler))
        .route("/api/usuarios/{id}/areas", web::put().to(usuarios::asignar_areas_handler))
        // reportes, certificados y bitácora
        .route("/api/reportes/inscritos", web::get().to(reportes::inscritos_handler))
        .route("/api/reportes/progreso/{fase}", web::get().to(reportes::progreso_handler))
        .route("/api/reportes/medallero", web::get().to(reportes::medallero_handler))
        .route("/api/certificados", web::get().to(certificados::listar_handler))
        .route("/api/certificados/estilo", web::get().to(certificados::obtener_estilo_handler))
        .route("/api/certificados/estilo", web::put().to(certificados::guardar_estilo_handler))
        .route("/api/bitacora", web::get().to(reportes::bitacora_handler))
        .route("/api/bitacora/{entidad}/{id}", web::get().to(reportes::historial_handler));
}
