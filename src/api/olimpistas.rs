use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use super::{AppState, csv_adjunto, leer_archivo};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{catalogos, olimpistas};
use crate::error::{ApiError, ApiResult};
use crate::importacion::{self, Catalogo, ResumenImportacion};
use crate::models::{ActualizarOlimpista, FiltroOlimpistas, NuevoOlimpista};
use crate::respuesta;

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroOlimpistas>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let filtro = query.into_inner();
    let lista = state.db.ejecutar(move |c| olimpistas::listar(c, &filtro)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn crear_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevoOlimpista>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let olimpista = state.db.ejecutar(move |c| olimpistas::crear(c, &datos)).await?;
    tracing::info!(olimpista_id = olimpista.id, "olimpista registrado");
    Ok(respuesta::creado(olimpista, "olimpista registrado"))
}

pub async fn obtener_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let olimpista = state
        .db
        .ejecutar(move |c| olimpistas::buscar(c, id))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Olimpista", id))?;
    Ok(respuesta::ok(olimpista))
}

pub async fn por_documento_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let documento = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let buscado = documento.clone();
    let olimpista = state
        .db
        .ejecutar(move |c| olimpistas::buscar_por_documento(c, &buscado))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Olimpista con documento", documento))?;
    Ok(respuesta::ok(olimpista))
}

pub async fn actualizar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<ActualizarOlimpista>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let datos = body.into_inner();
    datos.validar()?;
    exigir_rol(&req, &state, COORDINACION).await?;
    let olimpista = state.db.ejecutar(move |c| olimpistas::actualizar(c, id, &datos)).await?;
    Ok(respuesta::ok_con_mensaje(olimpista, "olimpista actualizado"))
}

pub async fn inscripciones_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    exigir_rol(&req, &state, PERSONAL).await?;
    let lista = state
        .db
        .ejecutar(move |c| {
            if olimpistas::buscar(c, id)?.is_none() {
                return Err(ApiError::no_encontrado("Olimpista", id));
            }
            olimpistas::inscripciones(c, id)
        })
        .await?;
    Ok(respuesta::ok(lista))
}

/// Carga masiva desde CSV o XLSX. Las filas válidas se guardan en una sola
/// transacción; las inválidas vuelven en `errores` con su número de fila.
pub async fn importar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let (nombre_archivo, bytes) = leer_archivo(payload).await?;
    tracing::info!(archivo = %nombre_archivo, bytes = bytes.len(), "importando olimpistas");

    let gestion = state.config.gestion;
    let archivo = nombre_archivo.clone();
    let resumen = state
        .db
        .transaccion(move |tx| {
            let tabla = importacion::leer_tabla(&archivo, &bytes)?;
            let areas = catalogos::listar_areas(tx, true)?;
            let niveles = catalogos::listar_niveles(tx)?;
            let cat_areas = Catalogo::new(areas.iter().map(|a| (a.nombre.as_str(), a.id)));
            let cat_niveles = Catalogo::new(niveles.iter().map(|n| (n.nombre.as_str(), n.id)));

            let (validas, errores) = importacion::olimpistas::validar_filas(&tabla, &cat_areas, &cat_niveles)?;
            let (olimpistas_guardados, inscripciones_creadas) =
                importacion::olimpistas::guardar(tx, &validas, gestion)?;
            Ok(ResumenImportacion {
                filas_leidas: tabla.len().saturating_sub(1),
                olimpistas_guardados,
                inscripciones_creadas,
                errores,
            })
        })
        .await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("importar_olimpistas", "olimpistas").usuario(usuario.id).detalle(json!({
            "archivo": nombre_archivo,
            "filas": resumen.filas_leidas,
            "guardados": resumen.olimpistas_guardados,
            "inscripciones": resumen.inscripciones_creadas,
            "errores": resumen.errores.len(),
        })),
    )
    .await;

    let mensaje = format!(
        "{} olimpistas guardados, {} inscripciones nuevas, {} filas con error",
        resumen.olimpistas_guardados,
        resumen.inscripciones_creadas,
        resumen.errores.len()
    );
    Ok(respuesta::ok_con_mensaje(resumen, mensaje))
}

pub async fn exportar_handler(req: HttpRequest, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, COORDINACION).await?;
    let lista = state.db.ejecutar(|c| olimpistas::listar_todos(c)).await?;
    let csv = importacion::exportar::olimpistas_csv(&lista)?;
    Ok(csv_adjunto("olimpistas.csv", csv))
}
