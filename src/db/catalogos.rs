// Catálogos: áreas, niveles, unidades educativas y tutores legales.
use postgres::{GenericClient, Row};

use crate::error::{ApiError, ApiResult};
use crate::models::{ActualizarArea, Area, Nivel, NuevaArea, NuevaUnidadEducativa, NuevoNivel, NuevoTutor, TutorLegal, UnidadEducativa};

fn area_desde_fila(row: &Row) -> ApiResult<Area> {
    Ok(Area {
        id: row.try_get("id")?,
        nombre: row.try_get("nombre")?,
        descripcion: row.try_get("descripcion")?,
        activo: row.try_get("activo")?,
        nota_minima_clasificacion: row.try_get("nota_minima_clasificacion")?,
    })
}

pub fn crear_area(c: &mut impl GenericClient, datos: &NuevaArea) -> ApiResult<Area> {
    let row = c.query_one(
        "INSERT INTO areas (nombre, descripcion, nota_minima_clasificacion)
         VALUES ($1, $2, $3)
         RETURNING id, nombre, descripcion, activo, nota_minima_clasificacion",
        &[&datos.nombre.trim(), &datos.descripcion, &datos.nota_minima_clasificacion],
    )?;
    area_desde_fila(&row)
}

pub fn actualizar_area(c: &mut impl GenericClient, id: i32, datos: &ActualizarArea) -> ApiResult<Area> {
    let row = c.query_opt(
        "UPDATE areas SET
            nombre = COALESCE($2, nombre),
            descripcion = COALESCE($3, descripcion),
            activo = COALESCE($4, activo),
            nota_minima_clasificacion = COALESCE($5, nota_minima_clasificacion)
         WHERE id = $1
         RETURNING id, nombre, descripcion, activo, nota_minima_clasificacion",
        &[&id, &datos.nombre, &datos.descripcion, &datos.activo, &datos.nota_minima_clasificacion],
    )?;
    match row {
        Some(r) => area_desde_fila(&r),
        None => Err(ApiError::no_encontrado("Área", id)),
    }
}

pub fn buscar_area(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<Area>> {
    let row = c.query_opt(
        "SELECT id, nombre, descripcion, activo, nota_minima_clasificacion FROM areas WHERE id = $1",
        &[&id],
    )?;
    row.as_ref().map(area_desde_fila).transpose()
}

pub fn listar_areas(c: &mut impl GenericClient, solo_activas: bool) -> ApiResult<Vec<Area>> {
    let rows = c.query(
        "SELECT id, nombre, descripcion, activo, nota_minima_clasificacion
         FROM areas WHERE ($1 = FALSE OR activo) ORDER BY nombre",
        &[&solo_activas],
    )?;
    rows.iter().map(area_desde_fila).collect()
}

fn nivel_desde_fila(row: &Row) -> ApiResult<Nivel> {
    Ok(Nivel { id: row.try_get("id")?, nombre: row.try_get("nombre")?, descripcion: row.try_get("descripcion")? })
}

pub fn crear_nivel(c: &mut impl GenericClient, datos: &NuevoNivel) -> ApiResult<Nivel> {
    if datos.nombre.trim().is_empty() {
        return Err(ApiError::validacion("el campo 'nombre' es obligatorio"));
    }
    let row = c.query_one(
        "INSERT INTO niveles (nombre, descripcion) VALUES ($1, $2) RETURNING id, nombre, descripcion",
        &[&datos.nombre.trim(), &datos.descripcion],
    )?;
    nivel_desde_fila(&row)
}

pub fn listar_niveles(c: &mut impl GenericClient) -> ApiResult<Vec<Nivel>> {
    let rows = c.query("SELECT id, nombre, descripcion FROM niveles ORDER BY nombre", &[])?;
    rows.iter().map(nivel_desde_fila).collect()
}

fn unidad_desde_fila(row: &Row) -> ApiResult<UnidadEducativa> {
    Ok(UnidadEducativa {
        id: row.try_get("id")?,
        nombre: row.try_get("nombre")?,
        codigo_sie: row.try_get("codigo_sie")?,
        departamento: row.try_get("departamento")?,
        municipio: row.try_get("municipio")?,
        dependencia: row.try_get("dependencia")?,
    })
}

const COLUMNAS_UNIDAD: &str = "id, nombre, codigo_sie, departamento, municipio, dependencia";

pub fn crear_unidad(c: &mut impl GenericClient, datos: &NuevaUnidadEducativa) -> ApiResult<UnidadEducativa> {
    if datos.nombre.trim().is_empty() {
        return Err(ApiError::validacion("el campo 'nombre' es obligatorio"));
    }
    let sql = format!(
        "INSERT INTO unidades_educativas (nombre, codigo_sie, departamento, municipio, dependencia)
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        COLUMNAS_UNIDAD
    );
    let row = c.query_one(
        sql.as_str(),
        &[&datos.nombre.trim(), &datos.codigo_sie, &datos.departamento, &datos.municipio, &datos.dependencia],
    )?;
    unidad_desde_fila(&row)
}

pub fn buscar_unidad(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<UnidadEducativa>> {
    let sql = format!("SELECT {} FROM unidades_educativas WHERE id = $1", COLUMNAS_UNIDAD);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(unidad_desde_fila).transpose()
}

/// Unidad con el mismo nombre (sin distinguir mayúsculas) o una nueva.
pub fn obtener_o_crear_unidad(c: &mut impl GenericClient, nombre: &str) -> ApiResult<i32> {
    let existente = c.query_opt(
        "SELECT id FROM unidades_educativas WHERE LOWER(TRIM(nombre)) = LOWER(TRIM($1)) ORDER BY id LIMIT 1",
        &[&nombre],
    )?;
    if let Some(r) = existente {
        return Ok(r.try_get("id")?);
    }
    let row = c.query_one("INSERT INTO unidades_educativas (nombre) VALUES ($1) RETURNING id", &[&nombre.trim()])?;
    Ok(row.try_get("id")?)
}

pub fn listar_unidades(c: &mut impl GenericClient, buscar: Option<&str>) -> ApiResult<Vec<UnidadEducativa>> {
    let patron = buscar.map(super::patron_busqueda);
    let sql = format!(
        "SELECT {} FROM unidades_educativas WHERE ($1::TEXT IS NULL OR nombre ILIKE $1) ORDER BY nombre",
        COLUMNAS_UNIDAD
    );
    let rows = c.query(sql.as_str(), &[&patron])?;
    rows.iter().map(unidad_desde_fila).collect()
}

fn tutor_desde_fila(row: &Row) -> ApiResult<TutorLegal> {
    Ok(TutorLegal {
        id: row.try_get("id")?,
        nombres: row.try_get("nombres")?,
        apellidos: row.try_get("apellidos")?,
        documento: row.try_get("documento")?,
        telefono: row.try_get("telefono")?,
        email: row.try_get("email")?,
        parentesco: row.try_get("parentesco")?,
    })
}

const COLUMNAS_TUTOR: &str = "id, nombres, apellidos, documento, telefono, email, parentesco";

/// Crea el tutor o actualiza sus datos de contacto si el documento ya existe.
pub fn guardar_tutor(c: &mut impl GenericClient, datos: &NuevoTutor) -> ApiResult<TutorLegal> {
    let sql = format!(
        "INSERT INTO tutores_legales (nombres, apellidos, documento, telefono, email, parentesco)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (documento) DO UPDATE SET
            nombres = EXCLUDED.nombres,
            apellidos = EXCLUDED.apellidos,
            telefono = COALESCE(EXCLUDED.telefono, tutores_legales.telefono),
            email = COALESCE(EXCLUDED.email, tutores_legales.email),
            parentesco = COALESCE(EXCLUDED.parentesco, tutores_legales.parentesco)
         RETURNING {}",
        COLUMNAS_TUTOR
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &datos.nombres.trim(),
            &datos.apellidos.trim(),
            &datos.documento.trim(),
            &datos.telefono,
            &datos.email,
            &datos.parentesco,
        ],
    )?;
    tutor_desde_fila(&row)
}

pub fn buscar_tutor(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<TutorLegal>> {
    let sql = format!("SELECT {} FROM tutores_legales WHERE id = $1", COLUMNAS_TUTOR);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(tutor_desde_fila).transpose()
}

pub fn buscar_tutor_por_documento(c: &mut impl GenericClient, documento: &str) -> ApiResult<Option<TutorLegal>> {
    let sql = format!("SELECT {} FROM tutores_legales WHERE documento = $1", COLUMNAS_TUTOR);
    let row = c.query_opt(sql.as_str(), &[&documento.trim()])?;
    row.as_ref().map(tutor_desde_fila).transpose()
}
