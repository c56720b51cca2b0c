use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::db::ConexionBitacora;
use crate::error::{ApiError, ApiResult};

/// Evento de negocio a registrar.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntradaBitacora {
    pub usuario_id: Option<i32>,
    pub accion: String,
    pub entidad: String,
    pub entidad_id: Option<i64>,
    pub detalle: JsonValue,
}

impl EntradaBitacora {
    pub fn new(accion: &str, entidad: &str) -> Self {
        EntradaBitacora {
            usuario_id: None,
            accion: accion.to_string(),
            entidad: entidad.to_string(),
            entidad_id: None,
            detalle: JsonValue::Null,
        }
    }

    pub fn usuario(mut self, id: i32) -> Self {
        self.usuario_id = Some(id);
        self
    }

    pub fn id(mut self, id: impl Into<i64>) -> Self {
        self.entidad_id = Some(id.into());
        self
    }

    pub fn detalle(mut self, detalle: JsonValue) -> Self {
        self.detalle = detalle;
        self
    }
}

/// Inserta la entrada y devuelve su id.
pub fn registrar(conn: &mut ConexionBitacora, entrada: &EntradaBitacora) -> ApiResult<i64> {
    let ts = Utc::now().to_rfc3339();
    let detalle = if entrada.detalle.is_null() { None } else { Some(entrada.detalle.to_string()) };
    match conn {
        ConexionBitacora::Sqlite(c) => {
            c.execute(
                "INSERT INTO bitacora (ts, usuario_id, accion, entidad, entidad_id, detalle_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![ts, entrada.usuario_id, entrada.accion, entrada.entidad, entrada.entidad_id, detalle],
            )?;
            Ok(c.last_insert_rowid())
        }
        ConexionBitacora::Postgres(client) => {
            let row = client
                .query_one(
                    "INSERT INTO bitacora (ts, usuario_id, accion, entidad, entidad_id, detalle_json)
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
                    &[&ts, &entrada.usuario_id, &entrada.accion, &entrada.entidad, &entrada.entidad_id, &detalle],
                )
                .map_err(|e| ApiError::Bitacora(e.to_string()))?;
            row.try_get(0).map_err(|e| ApiError::Bitacora(e.to_string()))
        }
    }
}
