use actix_web::{HttpRequest, HttpResponse, web};

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use crate::db::inscripciones;
use crate::error::{ApiError, ApiResult};
use crate::models::{FiltroInscripciones, NuevaInscripcion};
use crate::respuesta;

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroInscripciones>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let filtro = query.into_inner();
    let lista = state.db.ejecutar(move |c| inscripciones::listar(c, &filtro)).await?;
    Ok(respuesta::ok(lista))
}

/// Nueva inscripción en estado `inscrito`; sin `gestion` toma la configurada.
pub async fn crear_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevaInscripcion>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let gestion = state.config.gestion;
    let inscripcion = state.db.ejecutar(move |c| inscripciones::crear(c, &datos, gestion)).await?;
    tracing::info!(
        inscripcion_id = inscripcion.id,
        olimpista_id = inscripcion.olimpista_id,
        area_id = inscripcion.area_id,
        "inscripción creada"
    );
    Ok(respuesta::creado(inscripcion, "inscripción creada"))
}

pub async fn obtener_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let detalle = state
        .db
        .ejecutar(move |c| inscripciones::detalle(c, id))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Inscripción", id))?;
    Ok(respuesta::ok(detalle))
}
