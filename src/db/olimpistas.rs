use chrono::Local;
use postgres::{GenericClient, Row};

use super::patron_busqueda;
use crate::error::{ApiError, ApiResult};
use crate::models::{ActualizarOlimpista, FiltroOlimpistas, InscripcionDetalle, NuevoOlimpista, Olimpista};

const COLUMNAS: &str = "id, nombres, apellidos, documento, fecha_nacimiento, email, telefono, grado_escolaridad, \
     departamento, unidad_educativa_id, tutor_legal_id, creado_en, actualizado_en";

const LIMITE_MAXIMO: i64 = 500;

pub(crate) fn desde_fila(row: &Row) -> ApiResult<Olimpista> {
    Ok(Olimpista {
        id: row.try_get("id")?,
        nombres: row.try_get("nombres")?,
        apellidos: row.try_get("apellidos")?,
        documento: row.try_get("documento")?,
        fecha_nacimiento: row.try_get("fecha_nacimiento")?,
        email: row.try_get("email")?,
        telefono: row.try_get("telefono")?,
        grado_escolaridad: row.try_get("grado_escolaridad")?,
        departamento: row.try_get("departamento")?,
        unidad_educativa_id: row.try_get("unidad_educativa_id")?,
        tutor_legal_id: row.try_get("tutor_legal_id")?,
        creado_en: row.try_get("creado_en")?,
        actualizado_en: row.try_get("actualizado_en")?,
    })
}

pub fn crear(c: &mut impl GenericClient, datos: &NuevoOlimpista) -> ApiResult<Olimpista> {
    let ahora = Local::now().naive_local();
    let sql = format!(
        "INSERT INTO olimpistas (nombres, apellidos, documento, fecha_nacimiento, email, telefono,
            grado_escolaridad, departamento, unidad_educativa_id, tutor_legal_id, creado_en)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {}",
        COLUMNAS
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &datos.nombres.trim(),
            &datos.apellidos.trim(),
            &datos.documento.trim(),
            &datos.fecha_nacimiento,
            &datos.email,
            &datos.telefono,
            &datos.grado_escolaridad,
            &datos.departamento,
            &datos.unidad_educativa_id,
            &datos.tutor_legal_id,
            &ahora,
        ],
    )?;
    desde_fila(&row)
}

/// Alta o actualización por documento; la usa la importación masiva.
pub fn guardar_por_documento(c: &mut impl GenericClient, datos: &NuevoOlimpista) -> ApiResult<Olimpista> {
    let ahora = Local::now().naive_local();
    let sql = format!(
        "INSERT INTO olimpistas (nombres, apellidos, documento, fecha_nacimiento, email, telefono,
            grado_escolaridad, departamento, unidad_educativa_id, tutor_legal_id, creado_en)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (documento) DO UPDATE SET
            nombres = EXCLUDED.nombres,
            apellidos = EXCLUDED.apellidos,
            fecha_nacimiento = COALESCE(EXCLUDED.fecha_nacimiento, olimpistas.fecha_nacimiento),
            email = COALESCE(EXCLUDED.email, olimpistas.email),
            telefono = COALESCE(EXCLUDED.telefono, olimpistas.telefono),
            grado_escolaridad = COALESCE(EXCLUDED.grado_escolaridad, olimpistas.grado_escolaridad),
            departamento = COALESCE(EXCLUDED.departamento, olimpistas.departamento),
            unidad_educativa_id = COALESCE(EXCLUDED.unidad_educativa_id, olimpistas.unidad_educativa_id),
            tutor_legal_id = COALESCE(EXCLUDED.tutor_legal_id, olimpistas.tutor_legal_id),
            actualizado_en = EXCLUDED.creado_en
         RETURNING {}",
        COLUMNAS
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &datos.nombres.trim(),
            &datos.apellidos.trim(),
            &datos.documento.trim(),
            &datos.fecha_nacimiento,
            &datos.email,
            &datos.telefono,
            &datos.grado_escolaridad,
            &datos.departamento,
            &datos.unidad_educativa_id,
            &datos.tutor_legal_id,
            &ahora,
        ],
    )?;
    desde_fila(&row)
}

pub fn actualizar(c: &mut impl GenericClient, id: i32, datos: &ActualizarOlimpista) -> ApiResult<Olimpista> {
    let ahora = Local::now().naive_local();
    let sql = format!(
        "UPDATE olimpistas SET
            nombres = COALESCE($2, nombres),
            apellidos = COALESCE($3, apellidos),
            fecha_nacimiento = COALESCE($4, fecha_nacimiento),
            email = COALESCE($5, email),
            telefono = COALESCE($6, telefono),
            grado_escolaridad = COALESCE($7, grado_escolaridad),
            departamento = COALESCE($8, departamento),
            unidad_educativa_id = COALESCE($9, unidad_educativa_id),
            tutor_legal_id = COALESCE($10, tutor_legal_id),
            actualizado_en = $11
         WHERE id = $1
         RETURNING {}",
        COLUMNAS
    );
    let row = c.query_opt(
        sql.as_str(),
        &[
            &id,
            &datos.nombres,
            &datos.apellidos,
            &datos.fecha_nacimiento,
            &datos.email,
            &datos.telefono,
            &datos.grado_escolaridad,
            &datos.departamento,
            &datos.unidad_educativa_id,
            &datos.tutor_legal_id,
            &ahora,
        ],
    )?;
    match row {
        Some(r) => desde_fila(&r),
        None => Err(ApiError::no_encontrado("Olimpista", id)),
    }
}

pub fn buscar(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<Olimpista>> {
    let sql = format!("SELECT {} FROM olimpistas WHERE id = $1", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(desde_fila).transpose()
}

pub fn buscar_por_documento(c: &mut impl GenericClient, documento: &str) -> ApiResult<Option<Olimpista>> {
    let sql = format!("SELECT {} FROM olimpistas WHERE documento = $1", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&documento.trim()])?;
    row.as_ref().map(desde_fila).transpose()
}

/// Búsqueda parcial por nombre, apellido o documento.
pub fn listar(c: &mut impl GenericClient, filtro: &FiltroOlimpistas) -> ApiResult<Vec<Olimpista>> {
    let patron = filtro.buscar.as_deref().filter(|s| !s.trim().is_empty()).map(patron_busqueda);
    let limite = filtro.limite.unwrap_or(100).clamp(1, LIMITE_MAXIMO);
    let sql = format!(
        "SELECT {} FROM olimpistas
         WHERE ($1::TEXT IS NULL
                OR nombres ILIKE $1 OR apellidos ILIKE $1 OR documento ILIKE $1
                OR (nombres || ' ' || apellidos) ILIKE $1)
           AND ($2::INT IS NULL OR unidad_educativa_id = $2)
         ORDER BY apellidos, nombres
         LIMIT $3",
        COLUMNAS
    );
    let rows = c.query(sql.as_str(), &[&patron, &filtro.unidad_educativa_id, &limite])?;
    rows.iter().map(desde_fila).collect()
}

/// Todas las filas, para la exportación.
pub fn listar_todos(c: &mut impl GenericClient) -> ApiResult<Vec<Olimpista>> {
    let sql = format!("SELECT {} FROM olimpistas ORDER BY apellidos, nombres", COLUMNAS);
    let rows = c.query(sql.as_str(), &[])?;
    rows.iter().map(desde_fila).collect()
}

pub fn inscripciones(c: &mut impl GenericClient, olimpista_id: i32) -> ApiResult<Vec<InscripcionDetalle>> {
    let sql = format!(
        "{} WHERE i.olimpista_id = $1 ORDER BY i.gestion DESC, a.nombre",
        super::inscripciones::SELECT_DETALLE
    );
    let rows = c.query(sql.as_str(), &[&olimpista_id])?;
    rows.iter().map(super::inscripciones::detalle_desde_fila).collect()
}
