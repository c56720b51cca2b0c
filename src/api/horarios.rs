// Ventanas de evaluación por área y detección de choques.
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{COORDINACION, PERSONAL, exigir_rol};
use crate::algorithm::{self, ChoqueHorario, VentanaEvaluacion};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{catalogos, horarios};
use crate::error::{ApiError, ApiResult};
use crate::models::{ConfiguracionAreaEvaluacion, Fase, VentanaEntrada};
use crate::respuesta;

#[derive(Debug, Deserialize, Default)]
pub struct FiltroHorarios {
    pub fase: Option<Fase>,
}

enum Guardado {
    Hecho(ConfiguracionAreaEvaluacion, Vec<ChoqueHorario>),
    Rechazado(Vec<ChoqueHorario>),
}

/// Revisa la entrada y arma la configuración a guardar (sin id ni nombre de área).
fn configuracion_de(entrada: &VentanaEntrada) -> ApiResult<ConfiguracionAreaEvaluacion> {
    if entrada.duracion_minutos <= 0 {
        return Err(ApiError::validacion("la duración debe ser mayor a 0 minutos"));
    }
    let inicio = algorithm::choques::inicio_desde(entrada.fecha, &entrada.hora_inicio)
        .ok_or_else(|| ApiError::validacion(format!("hora de inicio inválida: '{}' (se espera HH:MM)", entrada.hora_inicio)))?;
    if let (Some(desde), Some(hasta)) = (entrada.publicacion_inicio, entrada.publicacion_fin) {
        if hasta < desde {
            return Err(ApiError::validacion("la publicación no puede terminar antes de empezar"));
        }
    }
    Ok(ConfiguracionAreaEvaluacion {
        id: 0,
        area_id: entrada.area_id,
        nombre_area: String::new(),
        fase: entrada.fase,
        fecha_inicio: inicio,
        duracion_minutos: entrada.duracion_minutos,
        publicacion_inicio: entrada.publicacion_inicio,
        publicacion_fin: entrada.publicacion_fin,
    })
}

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroHorarios>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let fase = query.fase;
    let lista = state.db.ejecutar(move |c| horarios::listar(c, fase)).await?;
    Ok(respuesta::ok(lista))
}

/// Guarda la ventana de (área, fase). Si choca con la de otra área responde
/// 409 con los choques, salvo que venga `forzar: true`.
pub async fn guardar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<VentanaEntrada>,
) -> ApiResult<HttpResponse> {
    let entrada = body.into_inner();
    let mut nueva = configuracion_de(&entrada)?;
    let usuario = exigir_rol(&req, &state, COORDINACION).await?;
    let forzar = entrada.forzar;

    let resultado = state
        .db
        .transaccion(move |tx| {
            let area = catalogos::buscar_area(tx, nueva.area_id)?
                .ok_or_else(|| ApiError::no_encontrado("Área", nueva.area_id))?;
            nueva.nombre_area = area.nombre;
            let existentes: Vec<VentanaEvaluacion> =
                horarios::listar(tx, None)?.iter().map(VentanaEvaluacion::from).collect();
            let choques = algorithm::choques_con(&VentanaEvaluacion::from(&nueva), &existentes);
            if !choques.is_empty() && !forzar {
                return Ok(Guardado::Rechazado(choques));
            }
            Ok(Guardado::Hecho(horarios::guardar(tx, &nueva)?, choques))
        })
        .await?;

    match resultado {
        Guardado::Rechazado(choques) => {
            tracing::warn!(area_id = entrada.area_id, choques = choques.len(), "ventana rechazada por choques");
            let mensaje = format!("la ventana choca con {} ventana(s) de otras áreas; reenviar con forzar=true", choques.len());
            Ok(respuesta::conflicto_con_datos(choques, mensaje))
        }
        Guardado::Hecho(config, choques) => {
            if !choques.is_empty() {
                tracing::warn!(area_id = config.area_id, choques = choques.len(), "ventana guardada con choques (forzada)");
            }
            bitacora::anotar(
                &state.bitacora_url,
                EntradaBitacora::new("guardar_horario", "configuracion_areas_evaluacion")
                    .usuario(usuario.id)
                    .id(config.id)
                    .detalle(json!({
                        "area_id": config.area_id,
                        "fase": config.fase,
                        "fecha_inicio": config.fecha_inicio,
                        "duracion_minutos": config.duracion_minutos,
                        "forzado": !choques.is_empty(),
                    })),
            )
            .await;
            Ok(respuesta::ok_con_mensaje(json!({ "horario": config, "choques": choques }), "horario guardado"))
        }
    }
}

pub async fn choques_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroHorarios>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, PERSONAL).await?;
    let fase = query.fase;
    let lista = state.db.ejecutar(move |c| horarios::listar(c, fase)).await?;
    let ventanas: Vec<VentanaEvaluacion> = lista.iter().map(VentanaEvaluacion::from).collect();
    let choques = algorithm::validar_choques_horarios(&ventanas);
    Ok(respuesta::ok(choques))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entrada(hora: &str, duracion: i32) -> VentanaEntrada {
        VentanaEntrada {
            area_id: 1,
            fase: Fase::Clasificacion,
            fecha: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
            hora_inicio: hora.to_string(),
            duracion_minutos: duracion,
            publicacion_inicio: None,
            publicacion_fin: None,
            forzar: false,
        }
    }

    #[test]
    fn arma_la_configuracion_desde_fecha_y_hora() {
        let c = configuracion_de(&entrada("10:00", 120)).unwrap();
        assert_eq!(c.fecha_inicio, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap().and_hms_opt(10, 0, 0).unwrap());
        assert_eq!(c.duracion_minutos, 120);
    }

    #[test]
    fn rechaza_hora_y_duracion_invalidas() {
        assert!(matches!(configuracion_de(&entrada("25:00", 60)), Err(ApiError::Validacion(_))));
        assert!(matches!(configuracion_de(&entrada("10:00", 0)), Err(ApiError::Validacion(_))));
    }
}
