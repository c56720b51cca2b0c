use rusqlite::params;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::db::ConexionBitacora;
use crate::error::{ApiError, ApiResult};

pub const LIMITE_POR_DEFECTO: i64 = 50;
const LIMITE_MAXIMO: i64 = 1000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegistroBitacora {
    pub id: i64,
    pub ts: String,
    pub usuario_id: Option<i32>,
    pub accion: String,
    pub entidad: String,
    pub entidad_id: Option<i64>,
    pub detalle: JsonValue,
}

fn parsear_detalle(raw: Option<String>) -> JsonValue {
    match raw {
        Some(s) => serde_json::from_str(&s).unwrap_or(JsonValue::String(s)),
        None => JsonValue::Null,
    }
}

type Fila = (i64, String, Option<i32>, String, String, Option<i64>, Option<String>);

fn a_registro(f: Fila) -> RegistroBitacora {
    let (id, ts, usuario_id, accion, entidad, entidad_id, detalle) = f;
    RegistroBitacora { id, ts, usuario_id, accion, entidad, entidad_id, detalle: parsear_detalle(detalle) }
}

fn consultar(
    conn: &mut ConexionBitacora,
    entidad: Option<&str>,
    entidad_id: Option<i64>,
    limite: i64,
    ascendente: bool,
) -> ApiResult<Vec<RegistroBitacora>> {
    let orden = if ascendente { "ASC" } else { "DESC" };
    let filas: Vec<Fila> = match conn {
        ConexionBitacora::Sqlite(c) => {
            let sql = format!(
                "SELECT id, ts, usuario_id, accion, entidad, entidad_id, detalle_json FROM bitacora
                 WHERE (?1 IS NULL OR entidad = ?1) AND (?2 IS NULL OR entidad_id = ?2)
                 ORDER BY id {} LIMIT ?3",
                orden
            );
            let mut stmt = c.prepare(&sql)?;
            let rows_iter = stmt.query_map(params![entidad, entidad_id, limite], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
            })?;
            let mut out: Vec<Fila> = Vec::new();
            for r in rows_iter {
                out.push(r?);
            }
            out
        }
        ConexionBitacora::Postgres(client) => {
            let sql = format!(
                "SELECT id, ts, usuario_id, accion, entidad, entidad_id, detalle_json FROM bitacora
                 WHERE ($1::TEXT IS NULL OR entidad = $1) AND ($2::BIGINT IS NULL OR entidad_id = $2)
                 ORDER BY id {} LIMIT $3",
                orden
            );
            let rows = client
                .query(sql.as_str(), &[&entidad, &entidad_id, &limite])
                .map_err(|e| ApiError::Bitacora(e.to_string()))?;
            let mut out: Vec<Fila> = Vec::with_capacity(rows.len());
            for r in rows.iter() {
                out.push((r.get(0), r.get(1), r.get(2), r.get(3), r.get(4), r.get(5), r.get(6)));
            }
            out
        }
    };
    Ok(filas.into_iter().map(a_registro).collect())
}

/// Entradas más recientes primero, opcionalmente de una entidad.
pub fn recientes(
    conn: &mut ConexionBitacora,
    limite: Option<i64>,
    entidad: Option<&str>,
    entidad_id: Option<i64>,
) -> ApiResult<Vec<RegistroBitacora>> {
    let limite = limite.unwrap_or(LIMITE_POR_DEFECTO).clamp(1, LIMITE_MAXIMO);
    consultar(conn, entidad, entidad_id, limite, false)
}

/// Historia completa de una entidad en orden cronológico.
pub fn historial(conn: &mut ConexionBitacora, entidad: &str, entidad_id: i64) -> ApiResult<Vec<RegistroBitacora>> {
    consultar(conn, Some(entidad), Some(entidad_id), LIMITE_MAXIMO, true)
}
