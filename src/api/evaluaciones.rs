// Notas de ambas fases, ranking y cierre de la clasificación.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{catalogos, evaluaciones};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AreaNivelEntrada, CerrarClasificacionEntrada, EstadoInscripcion, Fase, FiltroEvaluaciones, NotaEntrada, Rol,
};
use crate::respuesta;

pub(crate) fn fase_de(texto: &str) -> ApiResult<Fase> {
    Ok(texto.parse::<Fase>()?)
}

/// Estados que aparecen en el ranking de cada fase.
fn estados_ranking(fase: Fase) -> &'static [EstadoInscripcion] {
    match fase {
        Fase::Clasificacion => &[
            EstadoInscripcion::Evaluado,
            EstadoInscripcion::Clasificado,
            EstadoInscripcion::NoClasificado,
        ],
        Fase::Final => &[EstadoInscripcion::Clasificado, EstadoInscripcion::Premiado],
    }
}

#[derive(Debug, Deserialize)]
pub struct FiltroRanking {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
    pub gestion: Option<i32>,
}

pub async fn registrar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NotaEntrada>,
) -> ApiResult<HttpResponse> {
    let fase = fase_de(&path)?;
    let entrada = body.into_inner();
    entrada.validar()?;
    let usuario = exigir_rol(&req, &state, PERSONAL).await?;

    // sólo los evaluadores quedan limitados a sus áreas asignadas
    let exigir_asignacion = usuario.rol == Rol::Evaluador;
    let evaluador_id = usuario.id;
    let evaluacion = state
        .db
        .transaccion(move |tx| evaluaciones::registrar(tx, fase, evaluador_id, &entrada, exigir_asignacion))
        .await?;

    let accion = if evaluacion.modificaciones > 0 { "revisar_nota" } else { "registrar_nota" };
    tracing::info!(
        fase = %fase,
        inscripcion_id = evaluacion.inscripcion_id,
        evaluador_id,
        nota = evaluacion.nota,
        "{}",
        accion
    );
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new(accion, fase.tabla_evaluaciones()).usuario(evaluador_id).id(evaluacion.id).detalle(json!({
            "inscripcion_id": evaluacion.inscripcion_id,
            "nota": evaluacion.nota,
            "modificaciones": evaluacion.modificaciones,
        })),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(evaluacion, "nota registrada"))
}

/// Un evaluador sólo ve sus propias notas.
pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FiltroEvaluaciones>,
) -> ApiResult<HttpResponse> {
    let fase = fase_de(&path)?;
    let usuario = exigir_rol(&req, &state, PERSONAL).await?;
    let mut filtro = query.into_inner();
    if usuario.rol == Rol::Evaluador {
        filtro.evaluador_id = Some(usuario.id);
    }
    let lista = state.db.ejecutar(move |c| evaluaciones::listar(c, fase, &filtro)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn por_inscripcion_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> ApiResult<HttpResponse> {
    let (fase, inscripcion_id) = path.into_inner();
    let fase = fase_de(&fase)?;
    exigir_rol(&req, &state, PERSONAL).await?;
    let lista = state.db.ejecutar(move |c| evaluaciones::por_inscripcion(c, fase, inscripcion_id)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn ranking_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FiltroRanking>,
) -> ApiResult<HttpResponse> {
    let fase = fase_de(&path)?;
    exigir_rol(&req, &state, PERSONAL).await?;
    let FiltroRanking { area_id, nivel_id, gestion } = query.into_inner();
    let gestion = gestion.unwrap_or(state.config.gestion);
    let ranking = state
        .db
        .ejecutar(move |c| evaluaciones::puntajes(c, fase, area_id, nivel_id, Some(gestion), estados_ranking(fase)))
        .await?;
    Ok(respuesta::ok(ranking))
}

pub async fn finalizar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AreaNivelEntrada>,
) -> ApiResult<HttpResponse> {
    let fase = fase_de(&path)?;
    let AreaNivelEntrada { area_id, nivel_id } = body.into_inner();
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let finalizadas = state.db.transaccion(move |tx| evaluaciones::finalizar(tx, fase, area_id, nivel_id)).await?;

    tracing::info!(fase = %fase, area_id, ?nivel_id, finalizadas, "evaluaciones finalizadas");
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("finalizar_evaluaciones", "areas")
            .usuario(usuario.id)
            .id(area_id)
            .detalle(json!({ "fase": fase, "nivel_id": nivel_id, "finalizadas": finalizadas })),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(json!({ "finalizadas": finalizadas }), format!("{} evaluaciones finalizadas", finalizadas)))
}

/// Nota mínima efectiva: la del cuerpo, la del área o la configurada.
pub(crate) fn nota_minima_efectiva(pedida: Option<f64>, del_area: Option<f64>, configurada: f64) -> f64 {
    pedida.or(del_area).unwrap_or(configurada)
}

pub async fn cerrar_clasificacion_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CerrarClasificacionEntrada>,
) -> ApiResult<HttpResponse> {
    let entrada = body.into_inner();
    entrada.validar()?;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;

    let gestion = state.config.gestion;
    let configurada = state.config.nota_minima_clasificacion;
    let CerrarClasificacionEntrada { area_id, nivel_id, nota_minima } = entrada;
    let resumen = state
        .db
        .transaccion(move |tx| {
            let area = catalogos::buscar_area(tx, area_id)?.ok_or_else(|| ApiError::no_encontrado("Área", area_id))?;
            let minima = nota_minima_efectiva(nota_minima, area.nota_minima_clasificacion, configurada);
            evaluaciones::cerrar_clasificacion(tx, area_id, nivel_id, gestion, minima)
        })
        .await?;

    tracing::info!(
        area_id,
        ?nivel_id,
        nota_minima = resumen.nota_minima,
        clasificados = resumen.clasificados,
        no_clasificados = resumen.no_clasificados,
        "clasificación cerrada"
    );
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("cerrar_clasificacion", "areas").usuario(usuario.id).id(area_id).detalle(json!({
            "nivel_id": nivel_id,
            "gestion": gestion,
            "nota_minima": resumen.nota_minima,
            "clasificados": resumen.clasificados,
            "no_clasificados": resumen.no_clasificados,
        })),
    )
    .await;
    let mensaje = format!("{} clasificados, {} no clasificados", resumen.clasificados, resumen.no_clasificados);
    Ok(respuesta::ok_con_mensaje(resumen, mensaje))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fase_desconocida_es_error_de_validacion() {
        assert_eq!(fase_de("final").unwrap(), Fase::Final);
        assert_eq!(fase_de("Clasificacion").unwrap(), Fase::Clasificacion);
        assert!(matches!(fase_de("semifinal"), Err(ApiError::Validacion(_))));
    }

    #[test]
    fn nota_minima_prioriza_cuerpo_luego_area() {
        assert_eq!(nota_minima_efectiva(Some(60.0), Some(55.0), 51.0), 60.0);
        assert_eq!(nota_minima_efectiva(None, Some(55.0), 51.0), 55.0);
        assert_eq!(nota_minima_efectiva(None, None, 51.0), 51.0);
    }
}
