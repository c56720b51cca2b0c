// Configuración del medallero por área / nivel / grado.
use postgres::{GenericClient, Row};

use crate::error::{ApiError, ApiResult};
use crate::models::{ConfiguracionMedallero, Medallero, MedalleroEntrada};

fn cupo(row: &Row, columna: &str) -> ApiResult<u32> {
    let v: i32 = row.try_get(columna)?;
    u32::try_from(v).map_err(|_| ApiError::Interno(format!("cupo negativo en '{}': {}", columna, v)))
}

fn desde_fila(row: &Row) -> ApiResult<ConfiguracionMedallero> {
    let grado: String = row.try_get("grado_escolaridad")?;
    Ok(ConfiguracionMedallero {
        id: row.try_get("id")?,
        area_id: row.try_get("area_id")?,
        nivel_id: row.try_get("nivel_id")?,
        // '' en la columna = configuración general del área/nivel
        grado_escolaridad: if grado.is_empty() { None } else { Some(grado) },
        medallero: Medallero {
            oro: cupo(row, "oro")?,
            plata: cupo(row, "plata")?,
            bronce: cupo(row, "bronce")?,
            mencion_honor: cupo(row, "mencion_honor")?,
        },
    })
}

fn a_i32(campo: &str, v: u32) -> ApiResult<i32> {
    i32::try_from(v).map_err(|_| ApiError::validacion(format!("'{}' fuera de rango: {}", campo, v)))
}

/// Crea o reemplaza la configuración de (área, nivel, grado).
pub fn guardar(c: &mut impl GenericClient, entrada: &MedalleroEntrada) -> ApiResult<ConfiguracionMedallero> {
    let m = entrada.medallero();
    let grado = entrada.grado().unwrap_or_default();
    let row = c.query_one(
        "INSERT INTO configuracion_medallero (area_id, nivel_id, grado_escolaridad, oro, plata, bronce, mencion_honor)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (area_id, (COALESCE(nivel_id, 0)), grado_escolaridad) DO UPDATE SET
            oro = EXCLUDED.oro,
            plata = EXCLUDED.plata,
            bronce = EXCLUDED.bronce,
            mencion_honor = EXCLUDED.mencion_honor
         RETURNING id, area_id, nivel_id, grado_escolaridad, oro, plata, bronce, mencion_honor",
        &[
            &entrada.area_id,
            &entrada.nivel_id,
            &grado,
            &a_i32("oro", m.oro)?,
            &a_i32("plata", m.plata)?,
            &a_i32("bronce", m.bronce)?,
            &a_i32("mencion_honor", m.mencion_honor)?,
        ],
    )?;
    desde_fila(&row)
}

/// Todas las configuraciones de un área; la resolución por nivel y grado la
/// hace `algorithm::medallero`.
pub fn listar(c: &mut impl GenericClient, area_id: i32) -> ApiResult<Vec<ConfiguracionMedallero>> {
    let rows = c.query(
        "SELECT id, area_id, nivel_id, grado_escolaridad, oro, plata, bronce, mencion_honor
         FROM configuracion_medallero WHERE area_id = $1
         ORDER BY nivel_id NULLS FIRST, grado_escolaridad",
        &[&area_id],
    )?;
    rows.iter().map(desde_fila).collect()
}
