use chrono::Local;
use postgres::{GenericClient, Row};

use super::columna_enum;
use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoInscripcion, FiltroInscripciones, InscripcionArea, InscripcionDetalle, NuevaInscripcion};

const COLUMNAS: &str =
    "id, olimpista_id, area_id, nivel_id, es_grupal, nombre_grupo, estado, gestion, creado_en, actualizado_en";

pub(crate) const SELECT_DETALLE: &str = "SELECT i.id, i.olimpista_id,
        (o.nombres || ' ' || o.apellidos) AS nombre_completo, o.documento, o.grado_escolaridad,
        i.area_id, a.nombre AS area, i.nivel_id, n.nombre AS nivel,
        i.es_grupal, i.nombre_grupo, i.estado, i.gestion
     FROM inscripciones_areas i
     JOIN olimpistas o ON o.id = i.olimpista_id
     JOIN areas a ON a.id = i.area_id
     JOIN niveles n ON n.id = i.nivel_id";

fn desde_fila(row: &Row) -> ApiResult<InscripcionArea> {
    Ok(InscripcionArea {
        id: row.try_get("id")?,
        olimpista_id: row.try_get("olimpista_id")?,
        area_id: row.try_get("area_id")?,
        nivel_id: row.try_get("nivel_id")?,
        es_grupal: row.try_get("es_grupal")?,
        nombre_grupo: row.try_get("nombre_grupo")?,
        estado: columna_enum(row, "estado")?,
        gestion: row.try_get("gestion")?,
        creado_en: row.try_get("creado_en")?,
        actualizado_en: row.try_get("actualizado_en")?,
    })
}

pub(crate) fn detalle_desde_fila(row: &Row) -> ApiResult<InscripcionDetalle> {
    Ok(InscripcionDetalle {
        id: row.try_get("id")?,
        olimpista_id: row.try_get("olimpista_id")?,
        nombre_completo: row.try_get("nombre_completo")?,
        documento: row.try_get("documento")?,
        grado_escolaridad: row.try_get("grado_escolaridad")?,
        area_id: row.try_get("area_id")?,
        area: row.try_get("area")?,
        nivel_id: row.try_get("nivel_id")?,
        nivel: row.try_get("nivel")?,
        es_grupal: row.try_get("es_grupal")?,
        nombre_grupo: row.try_get("nombre_grupo")?,
        estado: columna_enum(row, "estado")?,
        gestion: row.try_get("gestion")?,
    })
}

/// Nueva inscripción en estado `inscrito`. Una segunda inscripción del mismo
/// olimpista en la misma área y gestión es un conflicto.
pub fn crear(c: &mut impl GenericClient, datos: &NuevaInscripcion, gestion_actual: i32) -> ApiResult<InscripcionArea> {
    let gestion = datos.gestion.unwrap_or(gestion_actual);
    let nombre_grupo = if datos.es_grupal { datos.nombre_grupo.as_deref().map(str::trim) } else { None };
    let sql = format!(
        "INSERT INTO inscripciones_areas (olimpista_id, area_id, nivel_id, es_grupal, nombre_grupo, estado, gestion, creado_en)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {}",
        COLUMNAS
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &datos.olimpista_id,
            &datos.area_id,
            &datos.nivel_id,
            &datos.es_grupal,
            &nombre_grupo,
            &EstadoInscripcion::Inscrito.as_str(),
            &gestion,
            &Local::now().naive_local(),
        ],
    )?;
    desde_fila(&row)
}

/// Inscribe si no existe ya; devuelve `true` cuando se creó.
pub fn crear_si_no_existe(
    c: &mut impl GenericClient,
    olimpista_id: i32,
    area_id: i32,
    nivel_id: i32,
    gestion: i32,
) -> ApiResult<bool> {
    let creada = c.execute(
        "INSERT INTO inscripciones_areas (olimpista_id, area_id, nivel_id, estado, gestion, creado_en)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (olimpista_id, area_id, gestion) DO NOTHING",
        &[&olimpista_id, &area_id, &nivel_id, &EstadoInscripcion::Inscrito.as_str(), &gestion, &Local::now().naive_local()],
    )?;
    Ok(creada > 0)
}

pub fn buscar(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<InscripcionArea>> {
    let sql = format!("SELECT {} FROM inscripciones_areas WHERE id = $1", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(desde_fila).transpose()
}

pub fn obtener(c: &mut impl GenericClient, id: i32) -> ApiResult<InscripcionArea> {
    buscar(c, id)?.ok_or_else(|| ApiError::no_encontrado("Inscripción", id))
}

/// Igual que `obtener` pero bloquea la fila hasta el final de la transacción.
pub fn obtener_para_actualizar(c: &mut impl GenericClient, id: i32) -> ApiResult<InscripcionArea> {
    let sql = format!("SELECT {} FROM inscripciones_areas WHERE id = $1 FOR UPDATE", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    match row {
        Some(r) => desde_fila(&r),
        None => Err(ApiError::no_encontrado("Inscripción", id)),
    }
}

pub fn detalle(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<InscripcionDetalle>> {
    let sql = format!("{} WHERE i.id = $1", SELECT_DETALLE);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(detalle_desde_fila).transpose()
}

pub fn listar(c: &mut impl GenericClient, filtro: &FiltroInscripciones) -> ApiResult<Vec<InscripcionDetalle>> {
    let estado = filtro.estado.map(|e| e.as_str());
    let sql = format!(
        "{} WHERE ($1::INT IS NULL OR i.area_id = $1)
              AND ($2::INT IS NULL OR i.nivel_id = $2)
              AND ($3::TEXT IS NULL OR i.estado = $3)
              AND ($4::INT IS NULL OR i.gestion = $4)
            ORDER BY a.nombre, n.nombre, o.apellidos, o.nombres",
        SELECT_DETALLE
    );
    let rows = c.query(sql.as_str(), &[&filtro.area_id, &filtro.nivel_id, &estado, &filtro.gestion])?;
    rows.iter().map(detalle_desde_fila).collect()
}

pub fn cambiar_estado(c: &mut impl GenericClient, id: i32, estado: EstadoInscripcion) -> ApiResult<()> {
    let n = c.execute(
        "UPDATE inscripciones_areas SET estado = $2, actualizado_en = $3 WHERE id = $1",
        &[&id, &estado.as_str(), &Local::now().naive_local()],
    )?;
    if n == 0 {
        return Err(ApiError::no_encontrado("Inscripción", id));
    }
    Ok(())
}
