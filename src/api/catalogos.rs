// Áreas, niveles, unidades educativas y tutores legales.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use crate::db::catalogos;
use crate::error::{ApiError, ApiResult};
use crate::models::{ActualizarArea, NuevaArea, NuevaUnidadEducativa, NuevoNivel, NuevoTutor};
use crate::respuesta;

#[derive(Debug, Deserialize, Default)]
pub struct FiltroAreas {
    #[serde(default)]
    pub solo_activas: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroUnidades {
    pub buscar: Option<String>,
}

pub async fn listar_areas_handler(
    state: web::Data<AppState>,
    query: web::Query<FiltroAreas>,
) -> ApiResult<HttpResponse> {
    let solo_activas = query.solo_activas;
    let areas = state.db.ejecutar(move |c| catalogos::listar_areas(c, solo_activas)).await?;
    Ok(respuesta::ok(areas))
}

pub async fn crear_area_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevaArea>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let area = state.db.ejecutar(move |c| catalogos::crear_area(c, &datos)).await?;
    tracing::info!(area_id = area.id, nombre = %area.nombre, "área creada");
    Ok(respuesta::creado(area, "área creada"))
}

pub async fn actualizar_area_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<ActualizarArea>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let datos = body.into_inner();
    if let Some(n) = datos.nota_minima_clasificacion {
        crate::models::validar_nota(n)?;
    }
    exigir_rol(&req, &state, COORDINACION).await?;
    let area = state.db.ejecutar(move |c| catalogos::actualizar_area(c, id, &datos)).await?;
    Ok(respuesta::ok_con_mensaje(area, "área actualizada"))
}

pub async fn listar_niveles_handler(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let niveles = state.db.ejecutar(|c| catalogos::listar_niveles(c)).await?;
    Ok(respuesta::ok(niveles))
}

pub async fn crear_nivel_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevoNivel>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    if datos.nombre.trim().is_empty() {
        return Err(ApiError::validacion("el campo 'nombre' es obligatorio"));
    }
    exigir_rol(&req, &state, COORDINACION).await?;
    let nivel = state.db.ejecutar(move |c| catalogos::crear_nivel(c, &datos)).await?;
    Ok(respuesta::creado(nivel, "nivel creado"))
}

pub async fn listar_unidades_handler(
    state: web::Data<AppState>,
    query: web::Query<FiltroUnidades>,
) -> ApiResult<HttpResponse> {
    let buscar = query.into_inner().buscar;
    let unidades = state.db.ejecutar(move |c| catalogos::listar_unidades(c, buscar.as_deref())).await?;
    Ok(respuesta::ok(unidades))
}

pub async fn crear_unidad_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevaUnidadEducativa>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    if datos.nombre.trim().is_empty() {
        return Err(ApiError::validacion("el campo 'nombre' es obligatorio"));
    }
    exigir_rol(&req, &state, COORDINACION).await?;
    let unidad = state.db.ejecutar(move |c| catalogos::crear_unidad(c, &datos)).await?;
    Ok(respuesta::creado(unidad, "unidad educativa creada"))
}

pub async fn obtener_unidad_handler(state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let unidad = state
        .db
        .ejecutar(move |c| catalogos::buscar_unidad(c, id))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Unidad educativa", id))?;
    Ok(respuesta::ok(unidad))
}

pub async fn guardar_tutor_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevoTutor>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let tutor = state.db.ejecutar(move |c| catalogos::guardar_tutor(c, &datos)).await?;
    Ok(respuesta::ok_con_mensaje(tutor, "tutor guardado"))
}

pub async fn obtener_tutor_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let tutor = state
        .db
        .ejecutar(move |c| catalogos::buscar_tutor(c, id))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Tutor", id))?;
    Ok(respuesta::ok(tutor))
}

pub async fn tutor_por_documento_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let documento = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let buscado = documento.clone();
    let tutor = state
        .db
        .ejecutar(move |c| catalogos::buscar_tutor_por_documento(c, &buscado))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Tutor con documento", documento))?;
    Ok(respuesta::ok(tutor))
}
