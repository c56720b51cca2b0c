// Descalificaciones, desclasificaciones, no clasificados y sus reglas.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::exclusiones;
use crate::error::ApiResult;
use crate::models::{FiltroExclusiones, NuevaExclusion, NuevaRegla, TipoExclusion};
use crate::respuesta;

fn tipo_de(texto: &str) -> ApiResult<TipoExclusion> {
    Ok(texto.parse::<TipoExclusion>()?)
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroReglas {
    #[serde(default)]
    pub solo_activas: bool,
}

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FiltroExclusiones>,
) -> ApiResult<HttpResponse> {
    let tipo = tipo_de(&path)?;
    exigir_rol(&req, &state, PERSONAL).await?;
    let filtro = query.into_inner();
    let lista = state.db.ejecutar(move |c| exclusiones::listar(c, tipo, &filtro)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn registrar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NuevaExclusion>,
) -> ApiResult<HttpResponse> {
    let tipo = tipo_de(&path)?;
    let datos = body.into_inner();
    datos.validar()?;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let registrado_por = usuario.id;
    let exclusion = state.db.transaccion(move |tx| exclusiones::registrar(tx, tipo, registrado_por, &datos)).await?;

    tracing::info!(
        tipo = %tipo,
        exclusion_id = exclusion.id,
        inscripcion_id = exclusion.inscripcion_id,
        "exclusión registrada"
    );
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("registrar_exclusion", tipo.tabla()).usuario(registrado_por).id(exclusion.id).detalle(
            json!({
                "inscripcion_id": exclusion.inscripcion_id,
                "regla_id": exclusion.regla_id,
                "motivo": exclusion.motivo,
                "estado_anterior": exclusion.estado_anterior,
            }),
        ),
    )
    .await;
    Ok(respuesta::creado(exclusion, format!("{} registrada", tipo)))
}

pub async fn revocar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> ApiResult<HttpResponse> {
    let (tipo, id) = path.into_inner();
    let tipo = tipo_de(&tipo)?;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let revocado_por = usuario.id;
    let revocacion = state.db.transaccion(move |tx| exclusiones::revocar(tx, tipo, id, revocado_por)).await?;

    tracing::info!(
        tipo = %tipo,
        exclusion_id = id,
        inscripcion_id = revocacion.exclusion.inscripcion_id,
        estado = %revocacion.estado_inscripcion,
        "exclusión revocada"
    );
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("revocar_exclusion", tipo.tabla()).usuario(revocado_por).id(id).detalle(json!({
            "inscripcion_id": revocacion.exclusion.inscripcion_id,
            "estado_inscripcion": revocacion.estado_inscripcion,
        })),
    )
    .await;
    let mensaje = format!("{} revocada; la inscripción queda en '{}'", tipo, revocacion.estado_inscripcion);
    Ok(respuesta::ok_con_mensaje(revocacion, mensaje))
}

pub async fn listar_reglas_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FiltroReglas>,
) -> ApiResult<HttpResponse> {
    let tipo = tipo_de(&path)?;
    exigir_rol(&req, &state, PERSONAL).await?;
    let solo_activas = query.solo_activas;
    let reglas = state.db.ejecutar(move |c| exclusiones::listar_reglas(c, tipo, solo_activas)).await?;
    Ok(respuesta::ok(reglas))
}

pub async fn crear_regla_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NuevaRegla>,
) -> ApiResult<HttpResponse> {
    let tipo = tipo_de(&path)?;
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let regla = state.db.ejecutar(move |c| exclusiones::crear_regla(c, tipo, &datos)).await?;
    Ok(respuesta::creado(regla, "regla creada"))
}

pub async fn desactivar_regla_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> ApiResult<HttpResponse> {
    let (tipo, id) = path.into_inner();
    let tipo = tipo_de(&tipo)?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let regla = state.db.ejecutar(move |c| exclusiones::desactivar_regla(c, tipo, id)).await?;
    Ok(respuesta::ok_con_mensaje(regla, "regla desactivada"))
}
