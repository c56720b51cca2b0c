use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use super::evaluaciones::fase_de;
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{catalogos, publicacion};
use crate::error::{ApiError, ApiResult};
use crate::respuesta;

#[derive(Debug, Deserialize)]
pub struct CambioPublicacion {
    pub publicado: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroGestion {
    pub gestion: Option<i32>,
}

pub async fn listar_handler(req: HttpRequest, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let lista = state.db.ejecutar(|c| publicacion::listar(c)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn cambiar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(i32, String)>,
    body: web::Json<CambioPublicacion>,
) -> ApiResult<HttpResponse> {
    let (area_id, fase) = path.into_inner();
    let fase = fase_de(&fase)?;
    let publicado = body.publicado;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let usuario_id = usuario.id;
    let estado = state
        .db
        .ejecutar(move |c| {
            if catalogos::buscar_area(c, area_id)?.is_none() {
                return Err(ApiError::no_encontrado("Área", area_id));
            }
            publicacion::cambiar(c, area_id, fase, publicado, usuario_id)
        })
        .await?;

    let accion = if publicado { "publicar_resultados" } else { "ocultar_resultados" };
    tracing::info!(area_id, fase = %fase, publicado, "{}", accion);
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new(accion, "publicacion_resultados")
            .usuario(usuario_id)
            .id(estado.id)
            .detalle(json!({ "area_id": area_id, "fase": fase })),
    )
    .await;
    let mensaje = if publicado { "resultados publicados" } else { "resultados ocultados" };
    Ok(respuesta::ok_con_mensaje(estado, mensaje))
}

/// Sin autenticación. 404 mientras los resultados no sean visibles.
pub async fn resultados_publicos_handler(
    state: web::Data<AppState>,
    path: web::Path<(i32, String)>,
    query: web::Query<FiltroGestion>,
) -> ApiResult<HttpResponse> {
    let (area_id, fase) = path.into_inner();
    let fase = fase_de(&fase)?;
    let gestion = query.gestion.unwrap_or(state.config.gestion);
    let ahora = Local::now().naive_local();
    let filas = state
        .db
        .ejecutar(move |c| publicacion::resultados_publicos(c, area_id, fase, gestion, ahora))
        .await?;
    Ok(respuesta::ok(filas))
}
