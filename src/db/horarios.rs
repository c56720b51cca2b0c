// Ventanas de evaluación y de publicación por (área, fase).
use postgres::{GenericClient, Row};

use super::columna_enum;
use crate::error::ApiResult;
use crate::models::{ConfiguracionAreaEvaluacion, Fase};

const SELECT: &str = "SELECT h.id, h.area_id, a.nombre AS nombre_area, h.fase, h.fecha_inicio, h.duracion_minutos,
        h.publicacion_inicio, h.publicacion_fin
     FROM configuracion_areas_evaluacion h
     JOIN areas a ON a.id = h.area_id";

fn desde_fila(row: &Row) -> ApiResult<ConfiguracionAreaEvaluacion> {
    Ok(ConfiguracionAreaEvaluacion {
        id: row.try_get("id")?,
        area_id: row.try_get("area_id")?,
        nombre_area: row.try_get("nombre_area")?,
        fase: columna_enum(row, "fase")?,
        fecha_inicio: row.try_get("fecha_inicio")?,
        duracion_minutos: row.try_get("duracion_minutos")?,
        publicacion_inicio: row.try_get("publicacion_inicio")?,
        publicacion_fin: row.try_get("publicacion_fin")?,
    })
}

pub fn listar(c: &mut impl GenericClient, fase: Option<Fase>) -> ApiResult<Vec<ConfiguracionAreaEvaluacion>> {
    let fase = fase.map(|f| f.as_str());
    let sql = format!("{} WHERE ($1::TEXT IS NULL OR h.fase = $1) ORDER BY h.fecha_inicio, h.area_id", SELECT);
    let rows = c.query(sql.as_str(), &[&fase])?;
    rows.iter().map(desde_fila).collect()
}

pub fn buscar(c: &mut impl GenericClient, area_id: i32, fase: Fase) -> ApiResult<Option<ConfiguracionAreaEvaluacion>> {
    let sql = format!("{} WHERE h.area_id = $1 AND h.fase = $2", SELECT);
    let row = c.query_opt(sql.as_str(), &[&area_id, &fase.as_str()])?;
    row.as_ref().map(desde_fila).transpose()
}

/// Crea o reemplaza la ventana de (área, fase).
pub fn guardar(c: &mut impl GenericClient, v: &ConfiguracionAreaEvaluacion) -> ApiResult<ConfiguracionAreaEvaluacion> {
    c.execute(
        "INSERT INTO configuracion_areas_evaluacion
            (area_id, fase, fecha_inicio, duracion_minutos, publicacion_inicio, publicacion_fin)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (area_id, fase) DO UPDATE SET
            fecha_inicio = EXCLUDED.fecha_inicio,
            duracion_minutos = EXCLUDED.duracion_minutos,
            publicacion_inicio = EXCLUDED.publicacion_inicio,
            publicacion_fin = EXCLUDED.publicacion_fin",
        &[
            &v.area_id,
            &v.fase.as_str(),
            &v.fecha_inicio,
            &v.duracion_minutos,
            &v.publicacion_inicio,
            &v.publicacion_fin,
        ],
    )?;
    let sql = format!("{} WHERE h.area_id = $1 AND h.fase = $2", SELECT);
    let row = c.query_one(sql.as_str(), &[&v.area_id, &v.fase.as_str()])?;
    desde_fila(&row)
}
