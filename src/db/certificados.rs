// Estilo de certificado (fila única JSONB) y datos de los ganadores.
use chrono::Local;
use postgres::GenericClient;
use serde::Serialize;

use super::resultados;
use crate::algorithm::certificados::{DatosCertificado, EstiloCertificado, renderizar_texto};
use crate::error::ApiResult;

pub fn obtener_estilo(c: &mut impl GenericClient) -> ApiResult<EstiloCertificado> {
    match c.query_opt("SELECT estilo FROM configuracion_certificado WHERE id = 1", &[])? {
        Some(r) => {
            let valor: serde_json::Value = r.try_get("estilo")?;
            Ok(serde_json::from_value(valor)?)
        }
        None => Ok(EstiloCertificado::default()),
    }
}

pub fn guardar_estilo(c: &mut impl GenericClient, estilo: &EstiloCertificado) -> ApiResult<EstiloCertificado> {
    estilo.validar()?;
    let valor = serde_json::to_value(estilo)?;
    c.execute(
        "INSERT INTO configuracion_certificado (id, estilo, actualizado_en) VALUES (1, $1, $2)
         ON CONFLICT (id) DO UPDATE SET estilo = EXCLUDED.estilo, actualizado_en = EXCLUDED.actualizado_en",
        &[&valor, &Local::now().naive_local()],
    )?;
    obtener_estilo(c)
}

/// Lo que el cliente necesita para dibujar un certificado.
#[derive(Debug, Clone, Serialize)]
pub struct Certificado {
    pub inscripcion_id: i32,
    pub datos: DatosCertificado,
    pub texto: String,
}

/// Certificados de quienes obtuvieron medalla o mención en la gestión.
pub fn de_ganadores(
    c: &mut impl GenericClient,
    area_id: Option<i32>,
    gestion: i32,
) -> ApiResult<(EstiloCertificado, Vec<Certificado>)> {
    let estilo = obtener_estilo(c)?;
    let certificados = resultados::listar(c, area_id, None, Some(gestion))?
        .into_iter()
        .filter(|r| r.medalla.es_premio())
        .map(|r| {
            let datos = DatosCertificado {
                nombre: r.nombre_completo,
                area: r.area,
                nivel: r.nivel,
                puesto: r.posicion,
                medalla: r.medalla.etiqueta().to_string(),
                gestion: r.gestion,
            };
            let texto = renderizar_texto(&estilo.plantilla_texto, &datos);
            Certificado { inscripcion_id: r.inscripcion_id, datos, texto }
        })
        .collect();
    Ok((estilo, certificados))
}
