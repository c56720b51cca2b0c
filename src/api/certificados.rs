use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{COORDINACION, exigir_rol};
use crate::algorithm::certificados::EstiloCertificado;
use crate::bitacora::{self, EntradaBitacora};
use crate::db::certificados;
use crate::error::ApiResult;
use crate::respuesta;

#[derive(Debug, Deserialize, Default)]
pub struct FiltroCertificados {
    pub area_id: Option<i32>,
    pub gestion: Option<i32>,
}

/// Estilo vigente y un certificado por cada premiado de la gestión.
pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroCertificados>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let FiltroCertificados { area_id, gestion } = query.into_inner();
    let gestion = gestion.unwrap_or(state.config.gestion);
    let (estilo, lista) = state.db.ejecutar(move |c| certificados::de_ganadores(c, area_id, gestion)).await?;
    let total = lista.len();
    Ok(respuesta::ok_con_mensaje(
        json!({ "estilo": estilo, "certificados": lista }),
        format!("{} certificados", total),
    ))
}

pub async fn obtener_estilo_handler(req: HttpRequest, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let estilo = state.db.ejecutar(|c| certificados::obtener_estilo(c)).await?;
    Ok(respuesta::ok(estilo))
}

pub async fn guardar_estilo_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<EstiloCertificado>,
) -> ApiResult<HttpResponse> {
    let estilo = body.into_inner();
    estilo.validar()?;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let guardado = state.db.ejecutar(move |c| certificados::guardar_estilo(c, &estilo)).await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("guardar_estilo_certificado", "estilo_certificado")
            .usuario(usuario.id)
            .id(1)
            .detalle(serde_json::to_value(&guardado)?),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(guardado, "estilo guardado"))
}
