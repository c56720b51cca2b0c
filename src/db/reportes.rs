// Reportes agregados para coordinación.
use postgres::GenericClient;
use serde::Serialize;

use crate::error::ApiResult;
use crate::models::Fase;

#[derive(Debug, Clone, Serialize)]
pub struct InscritosPorEstado {
    pub area_id: i32,
    pub area: String,
    pub estado: String,
    pub total: i64,
}

pub fn inscritos_por_area(c: &mut impl GenericClient, gestion: i32) -> ApiResult<Vec<InscritosPorEstado>> {
    let rows = c.query(
        "SELECT a.id AS area_id, a.nombre AS area, i.estado, COUNT(*) AS total
         FROM inscripciones_areas i JOIN areas a ON a.id = i.area_id
         WHERE i.gestion = $1
         GROUP BY a.id, a.nombre, i.estado
         ORDER BY a.nombre, i.estado",
        &[&gestion],
    )?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(InscritosPorEstado {
            area_id: r.try_get("area_id")?,
            area: r.try_get("area")?,
            estado: r.try_get("estado")?,
            total: r.try_get("total")?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgresoArea {
    pub area_id: i32,
    pub area: String,
    pub inscripciones: i64,
    pub evaluadas: i64,
    pub evaluaciones: i64,
    pub finalizadas: i64,
    pub promedio: Option<f64>,
}

/// Avance de la evaluación por área en una fase.
pub fn progreso(c: &mut impl GenericClient, fase: Fase, gestion: i32) -> ApiResult<Vec<ProgresoArea>> {
    let sql = format!(
        "SELECT a.id AS area_id, a.nombre AS area,
                COUNT(DISTINCT i.id) AS inscripciones,
                COUNT(DISTINCT e.inscripcion_id) AS evaluadas,
                COUNT(e.id) AS evaluaciones,
                COUNT(e.id) FILTER (WHERE e.finalizada) AS finalizadas,
                AVG(e.nota) AS promedio
         FROM areas a
         LEFT JOIN inscripciones_areas i ON i.area_id = a.id AND i.gestion = $1
         LEFT JOIN {t} e ON e.inscripcion_id = i.id
         GROUP BY a.id, a.nombre
         ORDER BY a.nombre",
        t = fase.tabla_evaluaciones()
    );
    let rows = c.query(sql.as_str(), &[&gestion])?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(ProgresoArea {
            area_id: r.try_get("area_id")?,
            area: r.try_get("area")?,
            inscripciones: r.try_get("inscripciones")?,
            evaluadas: r.try_get("evaluadas")?,
            evaluaciones: r.try_get("evaluaciones")?,
            finalizadas: r.try_get("finalizadas")?,
            promedio: r.try_get("promedio")?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct MedalleroArea {
    pub area_id: i32,
    pub area: String,
    pub oro: i64,
    pub plata: i64,
    pub bronce: i64,
    pub mencion_honor: i64,
}

/// Medallas confirmadas por área.
pub fn medallero(c: &mut impl GenericClient, gestion: i32) -> ApiResult<Vec<MedalleroArea>> {
    let rows = c.query(
        "SELECT a.id AS area_id, a.nombre AS area,
                COUNT(*) FILTER (WHERE r.medalla = 'oro') AS oro,
                COUNT(*) FILTER (WHERE r.medalla = 'plata') AS plata,
                COUNT(*) FILTER (WHERE r.medalla = 'bronce') AS bronce,
                COUNT(*) FILTER (WHERE r.medalla = 'mencion_honor') AS mencion_honor
         FROM resultados_finales r JOIN areas a ON a.id = r.area_id
         WHERE r.gestion = $1
         GROUP BY a.id, a.nombre
         ORDER BY a.nombre",
        &[&gestion],
    )?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(MedalleroArea {
            area_id: r.try_get("area_id")?,
            area: r.try_get("area")?,
            oro: r.try_get("oro")?,
            plata: r.try_get("plata")?,
            bronce: r.try_get("bronce")?,
            mencion_honor: r.try_get("mencion_honor")?,
        });
    }
    Ok(out)
}
