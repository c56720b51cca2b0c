// Publicación de resultados por (área, fase) y su lectura pública.
use chrono::{Local, NaiveDateTime};
use postgres::{GenericClient, Row};
use serde::Serialize;

use super::{columna_enum, horarios};
use crate::algorithm::publicacion::publicacion_visible;
use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoInscripcion, Fase, Medalla, PublicacionResultados};

fn desde_fila(row: &Row) -> ApiResult<PublicacionResultados> {
    Ok(PublicacionResultados {
        id: row.try_get("id")?,
        area_id: row.try_get("area_id")?,
        fase: columna_enum(row, "fase")?,
        publicado: row.try_get("publicado")?,
        fecha_publicacion: row.try_get("fecha_publicacion")?,
        publicado_por: row.try_get("publicado_por")?,
    })
}

pub fn cambiar(
    c: &mut impl GenericClient,
    area_id: i32,
    fase: Fase,
    publicado: bool,
    usuario_id: i32,
) -> ApiResult<PublicacionResultados> {
    let fecha = if publicado { Some(Local::now().naive_local()) } else { None };
    let row = c.query_one(
        "INSERT INTO publicacion_resultados (area_id, fase, publicado, fecha_publicacion, publicado_por)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (area_id, fase) DO UPDATE SET
            publicado = EXCLUDED.publicado,
            fecha_publicacion = EXCLUDED.fecha_publicacion,
            publicado_por = EXCLUDED.publicado_por
         RETURNING id, area_id, fase, publicado, fecha_publicacion, publicado_por",
        &[&area_id, &fase.as_str(), &publicado, &fecha, &usuario_id],
    )?;
    desde_fila(&row)
}

pub fn listar(c: &mut impl GenericClient) -> ApiResult<Vec<PublicacionResultados>> {
    let rows = c.query(
        "SELECT id, area_id, fase, publicado, fecha_publicacion, publicado_por
         FROM publicacion_resultados ORDER BY area_id, fase",
        &[],
    )?;
    rows.iter().map(desde_fila).collect()
}

pub fn buscar(c: &mut impl GenericClient, area_id: i32, fase: Fase) -> ApiResult<Option<PublicacionResultados>> {
    let row = c.query_opt(
        "SELECT id, area_id, fase, publicado, fecha_publicacion, publicado_por
         FROM publicacion_resultados WHERE area_id = $1 AND fase = $2",
        &[&area_id, &fase.as_str()],
    )?;
    row.as_ref().map(desde_fila).transpose()
}

/// Fila de resultados visible sin autenticación: sin documento ni contacto.
#[derive(Debug, Clone, Serialize)]
pub struct FilaPublica {
    pub nombre_completo: String,
    pub unidad_educativa: Option<String>,
    pub nivel: String,
    pub grado_escolaridad: Option<String>,
    pub estado: EstadoInscripcion,
    pub posicion: Option<i32>,
    pub medalla: Option<Medalla>,
}

fn fila_publica(row: &Row) -> ApiResult<FilaPublica> {
    let medalla: Option<String> = row.try_get("medalla")?;
    let medalla = match medalla {
        Some(m) => Some(m.parse::<Medalla>().map_err(|e| ApiError::Interno(e.to_string()))?),
        None => None,
    };
    Ok(FilaPublica {
        nombre_completo: row.try_get("nombre_completo")?,
        unidad_educativa: row.try_get("unidad_educativa")?,
        nivel: row.try_get("nivel")?,
        grado_escolaridad: row.try_get("grado_escolaridad")?,
        estado: columna_enum(row, "estado")?,
        posicion: row.try_get("posicion")?,
        medalla,
    })
}

/// Resultados publicados de un área y fase. Si no están publicados, o `ahora`
/// cae fuera de la ventana de publicación configurada, responde 404.
pub fn resultados_publicos(
    c: &mut impl GenericClient,
    area_id: i32,
    fase: Fase,
    gestion: i32,
    ahora: NaiveDateTime,
) -> ApiResult<Vec<FilaPublica>> {
    let publicado = buscar(c, area_id, fase)?.map(|p| p.publicado).unwrap_or(false);
    let ventana = horarios::buscar(c, area_id, fase)?;
    let (inicio, fin) = ventana.map(|v| (v.publicacion_inicio, v.publicacion_fin)).unwrap_or((None, None));
    if !publicacion_visible(publicado, inicio, fin, ahora) {
        return Err(ApiError::NoEncontrado(format!("los resultados de {} del área {} no están publicados", fase, area_id)));
    }

    let sql = match fase {
        Fase::Clasificacion => {
            "SELECT (o.nombres || ' ' || o.apellidos) AS nombre_completo, u.nombre AS unidad_educativa,
                    n.nombre AS nivel, o.grado_escolaridad, i.estado,
                    NULL::INT AS posicion, NULL::TEXT AS medalla
             FROM inscripciones_areas i
             JOIN olimpistas o ON o.id = i.olimpista_id
             JOIN niveles n ON n.id = i.nivel_id
             LEFT JOIN unidades_educativas u ON u.id = o.unidad_educativa_id
             WHERE i.area_id = $1 AND i.gestion = $2 AND i.estado IN ('clasificado', 'premiado')
             ORDER BY n.nombre, o.apellidos, o.nombres"
        }
        Fase::Final => {
            "SELECT (o.nombres || ' ' || o.apellidos) AS nombre_completo, u.nombre AS unidad_educativa,
                    n.nombre AS nivel, r.grado_escolaridad, i.estado,
                    r.posicion, r.medalla
             FROM resultados_finales r
             JOIN inscripciones_areas i ON i.id = r.inscripcion_id
             JOIN olimpistas o ON o.id = i.olimpista_id
             JOIN niveles n ON n.id = r.nivel_id
             LEFT JOIN unidades_educativas u ON u.id = o.unidad_educativa_id
             WHERE r.area_id = $1 AND r.gestion = $2
             ORDER BY n.nombre, r.grado_escolaridad NULLS LAST, r.posicion"
        }
    };
    let rows = c.query(sql, &[&area_id, &gestion])?;
    rows.iter().map(fila_publica).collect()
}
