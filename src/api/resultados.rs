// Medallero, vista previa de premiados y resultados finales confirmados.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use super::{AppState, csv_adjunto};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{medallero, resultados};
use crate::error::{ApiError, ApiResult};
use crate::importacion;
use crate::models::{AreaNivelEntrada, MedalleroEntrada};
use crate::respuesta;

#[derive(Debug, Deserialize)]
pub struct FiltroMedallero {
    pub area_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct FiltroPremiados {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
    pub gestion: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroResultados {
    pub area_id: Option<i32>,
    pub nivel_id: Option<i32>,
    pub gestion: Option<i32>,
}

pub async fn listar_medallero_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroMedallero>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let area_id = query.area_id;
    let configs = state.db.ejecutar(move |c| medallero::listar(c, area_id)).await?;
    Ok(respuesta::ok(configs))
}

pub async fn guardar_medallero_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<MedalleroEntrada>,
) -> ApiResult<HttpResponse> {
    let entrada = body.into_inner();
    let m = entrada.medallero();
    if m.oro + m.plata + m.bronce + m.mencion_honor == 0 {
        return Err(ApiError::validacion("el medallero debe otorgar al menos un premio"));
    }
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let config = state.db.ejecutar(move |c| medallero::guardar(c, &entrada)).await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("guardar_medallero", "configuracion_medallero")
            .usuario(usuario.id)
            .id(config.id)
            .detalle(serde_json::to_value(&config)?),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(config, "medallero guardado"))
}

/// Medallas calculadas con las notas finales actuales, sin guardar nada.
pub async fn premiados_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroPremiados>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let FiltroPremiados { area_id, nivel_id, gestion } = query.into_inner();
    let gestion = gestion.unwrap_or(state.config.gestion);
    let premiados = state.db.ejecutar(move |c| resultados::calcular_premiados(c, area_id, nivel_id, gestion)).await?;
    Ok(respuesta::ok(premiados))
}

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroResultados>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let FiltroResultados { area_id, nivel_id, gestion } = query.into_inner();
    let lista = state.db.ejecutar(move |c| resultados::listar(c, area_id, nivel_id, gestion)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn confirmar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AreaNivelEntrada>,
) -> ApiResult<HttpResponse> {
    let AreaNivelEntrada { area_id, nivel_id } = body.into_inner();
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let gestion = state.config.gestion;
    let registrado_por = usuario.id;
    let confirmados = state
        .db
        .transaccion(move |tx| resultados::confirmar(tx, area_id, nivel_id, gestion, registrado_por))
        .await?;

    let premiados = confirmados.iter().filter(|r| r.medalla.es_premio()).count();
    tracing::info!(area_id, ?nivel_id, gestion, total = confirmados.len(), premiados, "resultados confirmados");
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("confirmar_resultados", "areas").usuario(registrado_por).id(area_id).detalle(json!({
            "nivel_id": nivel_id,
            "gestion": gestion,
            "total": confirmados.len(),
            "premiados": premiados,
        })),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(confirmados, format!("{} resultados confirmados", premiados)))
}

pub async fn exportar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroResultados>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let FiltroResultados { area_id, nivel_id, gestion } = query.into_inner();
    let gestion = gestion.unwrap_or(state.config.gestion);
    let lista = state.db.ejecutar(move |c| resultados::listar(c, area_id, nivel_id, Some(gestion))).await?;
    let csv = importacion::exportar::resultados_csv(&lista)?;
    Ok(csv_adjunto(&format!("resultados_{}.csv", gestion), csv))
}
