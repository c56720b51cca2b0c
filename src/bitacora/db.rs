use postgres::{Client, NoTls};
use rusqlite::Connection;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};

/// Conexión a la bitácora: archivo SQLite local o PostgreSQL remoto, según
/// el esquema de la URL.
pub enum ConexionBitacora {
    Sqlite(Connection),
    Postgres(Client),
}

impl fmt::Debug for ConexionBitacora {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConexionBitacora::Sqlite(_) => write!(f, "ConexionBitacora::Sqlite(..)"),
            ConexionBitacora::Postgres(_) => write!(f, "ConexionBitacora::Postgres(..)"),
        }
    }
}

/// Ruta del archivo SQLite para `sqlite://`, `file://` o una ruta simple.
/// `None` para URLs de PostgreSQL.
pub fn ruta_sqlite(url: &str) -> ApiResult<Option<PathBuf>> {
    let url = url.trim();
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(None);
    }
    if let Some(p) = url.strip_prefix("sqlite://") {
        return Ok(Some(PathBuf::from(p)));
    }
    if let Some(p) = url.strip_prefix("file://") {
        return Ok(Some(PathBuf::from(p)));
    }
    if url.contains("://") {
        return Err(ApiError::Bitacora(format!("esquema de URL no soportado: {}", url)));
    }
    Ok(Some(PathBuf::from(url)))
}

/// Abre una conexión de corta vida. Bloqueante: desde código async usar
/// `bitacora::con_conexion`.
pub fn abrir_conexion(url: &str) -> ApiResult<ConexionBitacora> {
    match ruta_sqlite(url)? {
        Some(ruta) => {
            if let Some(dir) = ruta.parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    fs::create_dir_all(dir).map_err(|e| ApiError::Bitacora(format!("{}: {}", dir.display(), e)))?;
                }
            }
            Ok(ConexionBitacora::Sqlite(Connection::open(ruta)?))
        }
        None => {
            let client = Client::connect(url.trim(), NoTls).map_err(|e| ApiError::Bitacora(e.to_string()))?;
            Ok(ConexionBitacora::Postgres(client))
        }
    }
}

/// Crea la tabla `bitacora` si no existe.
pub fn init_db(conn: &mut ConexionBitacora) -> ApiResult<()> {
    match conn {
        ConexionBitacora::Sqlite(c) => {
            c.execute(
                "CREATE TABLE IF NOT EXISTS bitacora (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ts TEXT NOT NULL,
                    usuario_id INTEGER,
                    accion TEXT NOT NULL,
                    entidad TEXT NOT NULL,
                    entidad_id INTEGER,
                    detalle_json TEXT
                )",
                [],
            )?;
            c.execute("CREATE INDEX IF NOT EXISTS ix_bitacora_entidad ON bitacora (entidad, entidad_id)", [])?;
        }
        ConexionBitacora::Postgres(client) => {
            client
                .batch_execute(
                    "CREATE TABLE IF NOT EXISTS bitacora (
                        id BIGSERIAL PRIMARY KEY,
                        ts TEXT NOT NULL,
                        usuario_id INTEGER,
                        accion TEXT NOT NULL,
                        entidad TEXT NOT NULL,
                        entidad_id BIGINT,
                        detalle_json TEXT
                    );
                    CREATE INDEX IF NOT EXISTS ix_bitacora_entidad ON bitacora (entidad, entidad_id);",
                )
                .map_err(|e| ApiError::Bitacora(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rutas_segun_esquema() {
        assert_eq!(ruta_sqlite("sqlite://bitacora/b.db").unwrap(), Some(PathBuf::from("bitacora/b.db")));
        assert_eq!(ruta_sqlite("file:///tmp/b.db").unwrap(), Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(ruta_sqlite("datos/b.db").unwrap(), Some(PathBuf::from("datos/b.db")));
        assert_eq!(ruta_sqlite("postgres://u:p@localhost/bitacora").unwrap(), None);
        assert!(ruta_sqlite("mysql://localhost/b").is_err());
    }
}
