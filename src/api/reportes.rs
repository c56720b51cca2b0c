// Reportes agregados y consulta de la bitácora.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use super::AppState;
use super::auth::{COORDINACION, SOLO_ADMIN, exigir_rol};
use super::evaluaciones::fase_de;
use crate::bitacora;
use crate::db::reportes;
use crate::error::ApiResult;
use crate::models::FiltroBitacora;
use crate::respuesta;

#[derive(Debug, Deserialize, Default)]
pub struct FiltroGestion {
    pub gestion: Option<i32>,
}

pub async fn inscritos_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroGestion>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let gestion = query.gestion.unwrap_or(state.config.gestion);
    let filas = state.db.ejecutar(move |c| reportes::inscritos_por_area(c, gestion)).await?;
    Ok(respuesta::ok(filas))
}

pub async fn progreso_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FiltroGestion>,
) -> ApiResult<HttpResponse> {
    let fase = fase_de(&path)?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let gestion = query.gestion.unwrap_or(state.config.gestion);
    let filas = state.db.ejecutar(move |c| reportes::progreso(c, fase, gestion)).await?;
    Ok(respuesta::ok(filas))
}

pub async fn medallero_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroGestion>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let gestion = query.gestion.unwrap_or(state.config.gestion);
    let filas = state.db.ejecutar(move |c| reportes::medallero(c, gestion)).await?;
    Ok(respuesta::ok(filas))
}

pub async fn bitacora_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroBitacora>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let FiltroBitacora { limite, entidad, entidad_id } = query.into_inner();
    let registros = bitacora::con_conexion(state.bitacora_url.clone(), move |conn| {
        bitacora::recientes(conn, limite, entidad.as_deref(), entidad_id)
    })
    .await?;
    Ok(respuesta::ok(registros))
}

/// Historia completa de una entidad, de la más antigua a la más reciente.
pub async fn historial_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let (entidad, id) = path.into_inner();
    let registros =
        bitacora::con_conexion(state.bitacora_url.clone(), move |conn| bitacora::historial(conn, &entidad, id)).await?;
    Ok(respuesta::ok(registros))
}
