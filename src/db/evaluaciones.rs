//! Notas de clasificación y de la final.
//!
//! Las dos fases usan tablas con la misma forma; la tabla sale de
//! `Fase::tabla_evaluaciones`. Una fila por (inscripción, evaluador): la
//! primera nota inserta, las siguientes revisan y suman `modificaciones`.
//! Una evaluación `finalizada` ya no se toca.

use chrono::Local;
use postgres::{GenericClient, Row};

use super::{inscripciones, usuarios};
use crate::algorithm::{ResumenClasificacion, clasificar};
use crate::error::{ApiError, ApiResult};
use crate::models::{CompetidorPuntaje, EstadoInscripcion, Evaluacion, Fase, FiltroEvaluaciones, NotaEntrada};

const COLUMNAS: &str =
    "e.id, e.inscripcion_id, e.evaluador_id, e.nota, e.observaciones, e.finalizada, e.modificaciones, e.creado_en, e.actualizado_en";

fn desde_fila(row: &Row, fase: Fase) -> ApiResult<Evaluacion> {
    Ok(Evaluacion {
        id: row.try_get("id")?,
        fase,
        inscripcion_id: row.try_get("inscripcion_id")?,
        evaluador_id: row.try_get("evaluador_id")?,
        nota: row.try_get("nota")?,
        observaciones: row.try_get("observaciones")?,
        finalizada: row.try_get("finalizada")?,
        modificaciones: row.try_get("modificaciones")?,
        creado_en: row.try_get("creado_en")?,
        actualizado_en: row.try_get("actualizado_en")?,
    })
}

/// Registra o revisa la nota de `evaluador_id`. Con `exigir_asignacion` el
/// evaluador debe tener asignada el área (y nivel) de la inscripción.
/// Llamar dentro de una transacción: bloquea la inscripción.
pub fn registrar(
    c: &mut impl GenericClient,
    fase: Fase,
    evaluador_id: i32,
    entrada: &NotaEntrada,
    exigir_asignacion: bool,
) -> ApiResult<Evaluacion> {
    entrada.validar()?;
    let inscripcion = inscripciones::obtener_para_actualizar(c, entrada.inscripcion_id)?;

    if !inscripcion.estado.admite_evaluacion(fase) {
        return Err(ApiError::conflicto(format!(
            "la inscripción {} está en estado '{}' y no admite notas de {}",
            inscripcion.id, inscripcion.estado, fase
        )));
    }
    if exigir_asignacion && !usuarios::evaluador_asignado(c, evaluador_id, inscripcion.area_id, inscripcion.nivel_id)? {
        return Err(ApiError::Prohibido(format!(
            "el evaluador {} no tiene asignada el área {} / nivel {}",
            evaluador_id, inscripcion.area_id, inscripcion.nivel_id
        )));
    }

    let tabla = fase.tabla_evaluaciones();
    let sql = format!(
        "INSERT INTO {t} AS e (inscripcion_id, evaluador_id, nota, observaciones, creado_en)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (inscripcion_id, evaluador_id) DO UPDATE SET
            nota = EXCLUDED.nota,
            observaciones = EXCLUDED.observaciones,
            modificaciones = e.modificaciones + 1,
            actualizado_en = EXCLUDED.creado_en
         WHERE e.finalizada = FALSE
         RETURNING {c}",
        t = tabla,
        c = COLUMNAS
    );
    let row = c.query_opt(
        sql.as_str(),
        &[&entrada.inscripcion_id, &evaluador_id, &entrada.nota, &entrada.observaciones, &Local::now().naive_local()],
    )?;
    let evaluacion = match row {
        Some(r) => desde_fila(&r, fase)?,
        None => {
            return Err(ApiError::conflicto(format!(
                "la evaluación de la inscripción {} ya está finalizada",
                entrada.inscripcion_id
            )));
        }
    };

    if fase == Fase::Clasificacion && inscripcion.estado == EstadoInscripcion::Inscrito {
        inscripciones::cambiar_estado(c, inscripcion.id, EstadoInscripcion::Evaluado)?;
    }
    Ok(evaluacion)
}

pub fn listar(c: &mut impl GenericClient, fase: Fase, filtro: &FiltroEvaluaciones) -> ApiResult<Vec<Evaluacion>> {
    let sql = format!(
        "SELECT {c} FROM {t} e
         JOIN inscripciones_areas i ON i.id = e.inscripcion_id
         WHERE ($1::INT IS NULL OR i.area_id = $1)
           AND ($2::INT IS NULL OR i.nivel_id = $2)
           AND ($3::INT IS NULL OR e.evaluador_id = $3)
         ORDER BY e.inscripcion_id, e.evaluador_id",
        c = COLUMNAS,
        t = fase.tabla_evaluaciones()
    );
    let rows = c.query(sql.as_str(), &[&filtro.area_id, &filtro.nivel_id, &filtro.evaluador_id])?;
    rows.iter().map(|r| desde_fila(r, fase)).collect()
}

pub fn por_inscripcion(c: &mut impl GenericClient, fase: Fase, inscripcion_id: i32) -> ApiResult<Vec<Evaluacion>> {
    let sql = format!(
        "SELECT {c} FROM {t} e WHERE e.inscripcion_id = $1 ORDER BY e.evaluador_id",
        c = COLUMNAS,
        t = fase.tabla_evaluaciones()
    );
    let rows = c.query(sql.as_str(), &[&inscripcion_id])?;
    rows.iter().map(|r| desde_fila(r, fase)).collect()
}

/// Marca como finalizadas las evaluaciones de un área (y nivel). Devuelve
/// cuántas filas cambiaron.
pub fn finalizar(c: &mut impl GenericClient, fase: Fase, area_id: i32, nivel_id: Option<i32>) -> ApiResult<u64> {
    let sql = format!(
        "UPDATE {t} SET finalizada = TRUE, actualizado_en = $3
         WHERE finalizada = FALSE
           AND inscripcion_id IN (
               SELECT id FROM inscripciones_areas WHERE area_id = $1 AND ($2::INT IS NULL OR nivel_id = $2)
           )",
        t = fase.tabla_evaluaciones()
    );
    Ok(c.execute(sql.as_str(), &[&area_id, &nivel_id, &Local::now().naive_local()])?)
}

/// Promedio por inscripción, ordenado de mayor a menor; el empate lo
/// resuelve el id de inscripción. Solo entran inscripciones en `estados`.
pub fn puntajes(
    c: &mut impl GenericClient,
    fase: Fase,
    area_id: i32,
    nivel_id: Option<i32>,
    gestion: Option<i32>,
    estados: &[EstadoInscripcion],
) -> ApiResult<Vec<CompetidorPuntaje>> {
    let estados: Vec<&str> = estados.iter().map(|e| e.as_str()).collect();
    let sql = format!(
        "SELECT i.id AS inscripcion_id, o.id AS olimpista_id,
                (o.nombres || ' ' || o.apellidos) AS nombre_completo, o.grado_escolaridad,
                AVG(e.nota) AS promedio, COUNT(e.id) AS evaluaciones
         FROM inscripciones_areas i
         JOIN olimpistas o ON o.id = i.olimpista_id
         JOIN {t} e ON e.inscripcion_id = i.id
         WHERE i.area_id = $1
           AND ($2::INT IS NULL OR i.nivel_id = $2)
           AND ($3::INT IS NULL OR i.gestion = $3)
           AND i.estado = ANY($4)
         GROUP BY i.id, o.id, o.nombres, o.apellidos, o.grado_escolaridad
         ORDER BY promedio DESC, i.id ASC",
        t = fase.tabla_evaluaciones()
    );
    let rows = c.query(sql.as_str(), &[&area_id, &nivel_id, &gestion, &estados])?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        let promedio: Option<f64> = r.try_get("promedio")?;
        out.push(CompetidorPuntaje {
            inscripcion_id: r.try_get("inscripcion_id")?,
            olimpista_id: r.try_get("olimpista_id")?,
            nombre_completo: r.try_get("nombre_completo")?,
            grado_escolaridad: r.try_get("grado_escolaridad")?,
            promedio: promedio.unwrap_or(0.0),
            evaluaciones: r.try_get("evaluaciones")?,
        });
    }
    Ok(out)
}

/// Cierra la fase de clasificación de un área/nivel: cada inscripción
/// evaluada pasa a `clasificado` o `no_clasificado` según su promedio y sus
/// notas quedan finalizadas. Llamar dentro de una transacción.
pub fn cerrar_clasificacion(
    c: &mut impl GenericClient,
    area_id: i32,
    nivel_id: Option<i32>,
    gestion: i32,
    nota_minima: f64,
) -> ApiResult<ResumenClasificacion> {
    let puntajes = puntajes(c, Fase::Clasificacion, area_id, nivel_id, Some(gestion), &[EstadoInscripcion::Evaluado])?;
    let resumen = clasificar(&puntajes, nota_minima);
    for d in &resumen.decisiones {
        inscripciones::cambiar_estado(c, d.inscripcion_id, d.estado)?;
    }
    finalizar(c, Fase::Clasificacion, area_id, nivel_id)?;
    Ok(resumen)
}
