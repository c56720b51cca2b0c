//! Bitácora de auditoría. Vive fuera de la base principal (SQLite por
//! defecto) y su escritura nunca hace fallar la operación que la origina.

pub mod db;
pub mod insertions;
pub mod queries;

pub use db::{ConexionBitacora, abrir_conexion, init_db};
pub use insertions::{EntradaBitacora, registrar};
pub use queries::{RegistroBitacora, historial, recientes};

use crate::error::{ApiError, ApiResult};

/// Abre una conexión en el pool bloqueante y ejecuta `f` con ella.
pub async fn con_conexion<T, F>(url: String, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut ConexionBitacora) -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = abrir_conexion(&url)?;
        f(&mut conn)
    })
    .await
    .map_err(|e| ApiError::Interno(format!("task join error: {}", e)))?
}

/// Registra la entrada; un fallo sólo queda en el log.
pub async fn anotar(url: &str, entrada: EntradaBitacora) {
    let accion = entrada.accion.clone();
    match con_conexion(url.to_string(), move |c| registrar(c, &entrada)).await {
        Ok(id) => tracing::debug!(accion = %accion, id, "bitácora"),
        Err(e) => tracing::warn!(accion = %accion, "no se pudo escribir en la bitácora: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conexion_temporal(dir: &tempfile::TempDir) -> ConexionBitacora {
        let url = format!("sqlite://{}", dir.path().join("sub").join("bitacora.db").display());
        let mut conn = abrir_conexion(&url).unwrap();
        init_db(&mut conn).unwrap();
        conn
    }

    #[test]
    fn registra_y_lee_en_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = conexion_temporal(&dir);

        registrar(&mut conn, &EntradaBitacora::new("nota_registrada", "inscripcion").usuario(7).id(10)).unwrap();
        registrar(
            &mut conn,
            &EntradaBitacora::new("exclusion_registrada", "inscripcion").id(10).detalle(json!({"tipo": "descalificacion"})),
        )
        .unwrap();
        registrar(&mut conn, &EntradaBitacora::new("resultados_publicados", "area").id(3)).unwrap();

        let ultimas = recientes(&mut conn, Some(2), None, None).unwrap();
        assert_eq!(ultimas.len(), 2);
        assert_eq!(ultimas[0].accion, "resultados_publicados");
        assert_eq!(ultimas[1].detalle, json!({"tipo": "descalificacion"}));

        let hist = historial(&mut conn, "inscripcion", 10).unwrap();
        assert_eq!(hist.iter().map(|r| r.accion.as_str()).collect::<Vec<_>>(), vec![
            "nota_registrada",
            "exclusion_registrada"
        ]);
        assert_eq!(hist[0].usuario_id, Some(7));
        assert_eq!(hist[0].detalle, serde_json::Value::Null);
    }

    #[test]
    fn init_es_idempotente() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = conexion_temporal(&dir);
        init_db(&mut conn).unwrap();
        assert!(recientes(&mut conn, None, Some("area"), None).unwrap().is_empty());
    }
}
