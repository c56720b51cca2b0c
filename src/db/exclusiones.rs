//! Descalificaciones, desclasificaciones y no clasificados.
//!
//! Las tres tablas tienen la misma forma. Registrar una exclusión es siempre
//! el mismo paso fijo dentro de una transacción: insertar el registro y
//! cambiar el estado de la inscripción. Cada registro guarda el estado que
//! tenía la inscripción antes de la primera exclusión activa, para poder
//! devolverlo al revocar la última.

use chrono::Local;
use postgres::{GenericClient, Row};
use serde::Serialize;

use super::{columna_enum, inscripciones};
use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoInscripcion, Exclusion, FiltroExclusiones, NuevaExclusion, NuevaRegla, Regla, TipoExclusion};

const COLUMNAS: &str = "id, inscripcion_id, regla_id, motivo, registrado_por, estado_anterior, activo, creado_en, \
     revocado_en, revocado_por";

fn desde_fila(row: &Row, tipo: TipoExclusion) -> ApiResult<Exclusion> {
    Ok(Exclusion {
        id: row.try_get("id")?,
        tipo,
        inscripcion_id: row.try_get("inscripcion_id")?,
        regla_id: row.try_get("regla_id")?,
        motivo: row.try_get("motivo")?,
        registrado_por: row.try_get("registrado_por")?,
        estado_anterior: columna_enum(row, "estado_anterior")?,
        activo: row.try_get("activo")?,
        creado_en: row.try_get("creado_en")?,
        revocado_en: row.try_get("revocado_en")?,
        revocado_por: row.try_get("revocado_por")?,
    })
}

/// Resultado de una revocación: el registro revocado y el estado en que
/// quedó la inscripción.
#[derive(Debug, Clone, Serialize)]
pub struct Revocacion {
    pub exclusion: Exclusion,
    pub estado_inscripcion: EstadoInscripcion,
}

/// Exclusiones activas de una inscripción en las tres tablas, la más
/// reciente primero.
pub fn activas(c: &mut impl GenericClient, inscripcion_id: i32) -> ApiResult<Vec<Exclusion>> {
    let mut out = Vec::new();
    for tipo in TipoExclusion::TODOS {
        let sql = format!(
            "SELECT {} FROM {} WHERE inscripcion_id = $1 AND activo ORDER BY creado_en DESC, id DESC",
            COLUMNAS,
            tipo.tabla()
        );
        for r in c.query(sql.as_str(), &[&inscripcion_id])? {
            out.push(desde_fila(&r, tipo)?);
        }
    }
    out.sort_by(|a, b| b.creado_en.cmp(&a.creado_en).then(b.id.cmp(&a.id)));
    Ok(out)
}

fn verificar_regla(c: &mut impl GenericClient, tipo: TipoExclusion, regla_id: i32) -> ApiResult<()> {
    let Some(tabla) = tipo.tabla_reglas() else {
        return Ok(());
    };
    let sql = format!("SELECT activo FROM {} WHERE id = $1", tabla);
    match c.query_opt(sql.as_str(), &[&regla_id])? {
        Some(r) if r.try_get::<_, bool>("activo")? => Ok(()),
        Some(_) => Err(ApiError::validacion(format!("la regla {} está desactivada", regla_id))),
        None => Err(ApiError::validacion(format!("la regla {} no existe", regla_id))),
    }
}

/// Registra la exclusión y cambia el estado de la inscripción. Llamar dentro
/// de una transacción.
pub fn registrar(
    c: &mut impl GenericClient,
    tipo: TipoExclusion,
    registrado_por: i32,
    datos: &NuevaExclusion,
) -> ApiResult<Exclusion> {
    datos.validar()?;
    if let Some(regla_id) = datos.regla_id {
        verificar_regla(c, tipo, regla_id)?;
    }
    let inscripcion = inscripciones::obtener_para_actualizar(c, datos.inscripcion_id)?;

    let vigentes = activas(c, inscripcion.id)?;
    if vigentes.iter().any(|e| e.tipo == tipo) {
        return Err(ApiError::conflicto(format!("la inscripción {} ya tiene una {} activa", inscripcion.id, tipo)));
    }
    // si ya estaba excluida, el estado a restaurar es el de antes de la primera
    let estado_anterior = match vigentes.first() {
        Some(e) => e.estado_anterior,
        None if inscripcion.estado.es_exclusion() => EstadoInscripcion::Evaluado,
        None => inscripcion.estado,
    };

    let sql = format!(
        "INSERT INTO {} (inscripcion_id, regla_id, motivo, registrado_por, estado_anterior, creado_en)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        tipo.tabla(),
        COLUMNAS
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &inscripcion.id,
            &datos.regla_id,
            &datos.motivo.trim(),
            &registrado_por,
            &estado_anterior.as_str(),
            &Local::now().naive_local(),
        ],
    )?;
    let exclusion = desde_fila(&row, tipo)?;
    inscripciones::cambiar_estado(c, inscripcion.id, tipo.estado_resultante())?;
    Ok(exclusion)
}

/// Desactiva la exclusión. Si no queda otra activa, la inscripción vuelve a
/// su estado anterior; si queda alguna, toma el estado de la más reciente.
pub fn revocar(c: &mut impl GenericClient, tipo: TipoExclusion, id: i32, revocado_por: i32) -> ApiResult<Revocacion> {
    let sql = format!("SELECT {} FROM {} WHERE id = $1 FOR UPDATE", COLUMNAS, tipo.tabla());
    let actual = match c.query_opt(sql.as_str(), &[&id])? {
        Some(r) => desde_fila(&r, tipo)?,
        None => return Err(ApiError::no_encontrado("Exclusión", id)),
    };
    if !actual.activo {
        return Err(ApiError::conflicto(format!("la {} {} ya fue revocada", tipo, id)));
    }
    // bloquea la inscripción antes de mirar las demás exclusiones
    inscripciones::obtener_para_actualizar(c, actual.inscripcion_id)?;

    let sql = format!(
        "UPDATE {} SET activo = FALSE, revocado_en = $2, revocado_por = $3 WHERE id = $1 RETURNING {}",
        tipo.tabla(),
        COLUMNAS
    );
    let row = c.query_one(sql.as_str(), &[&id, &Local::now().naive_local(), &revocado_por])?;
    let revocada = desde_fila(&row, tipo)?;

    let estado = match activas(c, revocada.inscripcion_id)?.first() {
        Some(otra) => otra.tipo.estado_resultante(),
        None => revocada.estado_anterior,
    };
    inscripciones::cambiar_estado(c, revocada.inscripcion_id, estado)?;
    Ok(Revocacion { exclusion: revocada, estado_inscripcion: estado })
}

pub fn listar(c: &mut impl GenericClient, tipo: TipoExclusion, filtro: &FiltroExclusiones) -> ApiResult<Vec<Exclusion>> {
    let sql = format!(
        "SELECT {} FROM {}
         WHERE ($1::INT IS NULL OR inscripcion_id = $1) AND ($2 = FALSE OR activo)
         ORDER BY creado_en DESC, id DESC",
        COLUMNAS,
        tipo.tabla()
    );
    let rows = c.query(sql.as_str(), &[&filtro.inscripcion_id, &filtro.solo_activas])?;
    rows.iter().map(|r| desde_fila(r, tipo)).collect()
}

fn tabla_reglas(tipo: TipoExclusion) -> ApiResult<&'static str> {
    tipo.tabla_reglas()
        .ok_or_else(|| ApiError::validacion(format!("'{}' no tiene catálogo de reglas", tipo)))
}

fn regla_desde_fila(row: &Row) -> ApiResult<Regla> {
    Ok(Regla {
        id: row.try_get("id")?,
        codigo: row.try_get("codigo")?,
        descripcion: row.try_get("descripcion")?,
        activo: row.try_get("activo")?,
    })
}

pub fn crear_regla(c: &mut impl GenericClient, tipo: TipoExclusion, datos: &NuevaRegla) -> ApiResult<Regla> {
    datos.validar()?;
    let sql = format!(
        "INSERT INTO {} (codigo, descripcion) VALUES ($1, $2) RETURNING id, codigo, descripcion, activo",
        tabla_reglas(tipo)?
    );
    let row = c.query_one(sql.as_str(), &[&datos.codigo.trim(), &datos.descripcion.trim()])?;
    regla_desde_fila(&row)
}

pub fn listar_reglas(c: &mut impl GenericClient, tipo: TipoExclusion, solo_activas: bool) -> ApiResult<Vec<Regla>> {
    let sql = format!(
        "SELECT id, codigo, descripcion, activo FROM {} WHERE ($1 = FALSE OR activo) ORDER BY codigo",
        tabla_reglas(tipo)?
    );
    let rows = c.query(sql.as_str(), &[&solo_activas])?;
    rows.iter().map(regla_desde_fila).collect()
}

pub fn desactivar_regla(c: &mut impl GenericClient, tipo: TipoExclusion, id: i32) -> ApiResult<Regla> {
    let sql = format!(
        "UPDATE {} SET activo = FALSE WHERE id = $1 RETURNING id, codigo, descripcion, activo",
        tabla_reglas(tipo)?
    );
    match c.query_opt(sql.as_str(), &[&id])? {
        Some(r) => regla_desde_fila(&r),
        None => Err(ApiError::no_encontrado("Regla", id)),
    }
}
