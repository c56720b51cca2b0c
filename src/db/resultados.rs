//! Premiados y resultados finales.
//!
//! `calcular_premiados` es la vista previa: promedios de la fase final de las
//! inscripciones clasificadas y medallas según la configuración del área.
//! `confirmar` guarda esa vista como snapshot inmutable en
//! `resultados_finales` y marca `premiado` a quienes recibieron medalla.

use chrono::Local;
use postgres::{GenericClient, Row};

use super::{columna_enum, evaluaciones, inscripciones, medallero};
use crate::algorithm;
use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoInscripcion, Fase, Premiado, ResultadoFinal};

const SELECT: &str = "SELECT r.id, r.inscripcion_id, (o.nombres || ' ' || o.apellidos) AS nombre_completo,
        r.area_id, a.nombre AS area, r.nivel_id, n.nombre AS nivel, r.grado_escolaridad,
        r.promedio, r.posicion, r.medalla, r.gestion, r.creado_en
     FROM resultados_finales r
     JOIN inscripciones_areas i ON i.id = r.inscripcion_id
     JOIN olimpistas o ON o.id = i.olimpista_id
     JOIN areas a ON a.id = r.area_id
     JOIN niveles n ON n.id = r.nivel_id";

pub(crate) fn desde_fila(row: &Row) -> ApiResult<ResultadoFinal> {
    Ok(ResultadoFinal {
        id: row.try_get("id")?,
        inscripcion_id: row.try_get("inscripcion_id")?,
        nombre_completo: row.try_get("nombre_completo")?,
        area_id: row.try_get("area_id")?,
        area: row.try_get("area")?,
        nivel_id: row.try_get("nivel_id")?,
        nivel: row.try_get("nivel")?,
        grado_escolaridad: row.try_get("grado_escolaridad")?,
        promedio: row.try_get("promedio")?,
        posicion: row.try_get("posicion")?,
        medalla: columna_enum(row, "medalla")?,
        gestion: row.try_get("gestion")?,
        creado_en: row.try_get("creado_en")?,
    })
}

/// Estados que compiten en la final.
const ESTADOS_FINAL: [EstadoInscripcion; 2] = [EstadoInscripcion::Clasificado, EstadoInscripcion::Premiado];

pub fn calcular_premiados(
    c: &mut impl GenericClient,
    area_id: i32,
    nivel_id: Option<i32>,
    gestion: i32,
) -> ApiResult<Vec<Premiado>> {
    let competidores = evaluaciones::puntajes(c, Fase::Final, area_id, nivel_id, Some(gestion), &ESTADOS_FINAL)?;
    let configs = medallero::listar(c, area_id)?;
    let por_defecto = algorithm::medallero_por_defecto(&configs, area_id, nivel_id);
    Ok(algorithm::calcular_premiados(competidores, &por_defecto, |grado| {
        algorithm::medallero_de_grado(&configs, area_id, nivel_id, grado)
    }))
}

fn hay_snapshot(c: &mut impl GenericClient, area_id: i32, nivel_id: Option<i32>, gestion: i32) -> ApiResult<bool> {
    let row = c.query_one(
        "SELECT EXISTS (
            SELECT 1 FROM resultados_finales
            WHERE area_id = $1 AND ($2::INT IS NULL OR nivel_id = $2) AND gestion = $3
         ) AS existe",
        &[&area_id, &nivel_id, &gestion],
    )?;
    Ok(row.try_get("existe")?)
}

/// Guarda el snapshot del área/nivel. Llamar dentro de una transacción.
pub fn confirmar(
    c: &mut impl GenericClient,
    area_id: i32,
    nivel_id: Option<i32>,
    gestion: i32,
    registrado_por: i32,
) -> ApiResult<Vec<ResultadoFinal>> {
    if hay_snapshot(c, area_id, nivel_id, gestion)? {
        return Err(ApiError::conflicto(format!(
            "los resultados del área {} ya fueron confirmados para la gestión {}",
            area_id, gestion
        )));
    }
    let premiados = calcular_premiados(c, area_id, nivel_id, gestion)?;
    if premiados.is_empty() {
        return Err(ApiError::validacion("no hay competidores con notas finales para confirmar"));
    }

    let ahora = Local::now().naive_local();
    for p in &premiados {
        let posicion = i32::try_from(p.posicion).unwrap_or(i32::MAX);
        c.execute(
            "INSERT INTO resultados_finales
                (inscripcion_id, area_id, nivel_id, grado_escolaridad, promedio, posicion, medalla, gestion,
                 registrado_por, creado_en)
             SELECT i.id, i.area_id, i.nivel_id, o.grado_escolaridad, $2, $3, $4, i.gestion, $5, $6
             FROM inscripciones_areas i JOIN olimpistas o ON o.id = i.olimpista_id
             WHERE i.id = $1",
            &[&p.inscripcion_id, &p.promedio, &posicion, &p.medalla.as_str(), &registrado_por, &ahora],
        )?;
        if p.medalla.es_premio() {
            inscripciones::cambiar_estado(c, p.inscripcion_id, EstadoInscripcion::Premiado)?;
        }
    }
    evaluaciones::finalizar(c, Fase::Final, area_id, nivel_id)?;
    listar(c, Some(area_id), nivel_id, Some(gestion))
}

pub fn listar(
    c: &mut impl GenericClient,
    area_id: Option<i32>,
    nivel_id: Option<i32>,
    gestion: Option<i32>,
) -> ApiResult<Vec<ResultadoFinal>> {
    let sql = format!(
        "{} WHERE ($1::INT IS NULL OR r.area_id = $1)
              AND ($2::INT IS NULL OR r.nivel_id = $2)
              AND ($3::INT IS NULL OR r.gestion = $3)
            ORDER BY a.nombre, n.nombre, r.grado_escolaridad NULLS LAST, r.posicion",
        SELECT
    );
    let rows = c.query(sql.as_str(), &[&area_id, &nivel_id, &gestion])?;
    rows.iter().map(desde_fila).collect()
}
