// Exportación a CSV de olimpistas y resultados.
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{Olimpista, ResultadoFinal};

fn escribir<T: Serialize>(filas: impl IntoIterator<Item = T>) -> ApiResult<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    for f in filas {
        w.serialize(f)?;
    }
    let bytes = w.into_inner().map_err(|e| ApiError::Importacion(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Importacion(e.to_string()))
}

#[derive(Serialize)]
struct FilaOlimpista<'a> {
    documento: &'a str,
    nombres: &'a str,
    apellidos: &'a str,
    fecha_nacimiento: String,
    email: &'a str,
    telefono: &'a str,
    grado_escolaridad: &'a str,
    departamento: &'a str,
    unidad_educativa_id: Option<i32>,
}

pub fn olimpistas_csv(olimpistas: &[Olimpista]) -> ApiResult<String> {
    escribir(olimpistas.iter().map(|o| FilaOlimpista {
        documento: &o.documento,
        nombres: &o.nombres,
        apellidos: &o.apellidos,
        fecha_nacimiento: o.fecha_nacimiento.map(|f| f.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        email: o.email.as_deref().unwrap_or(""),
        telefono: o.telefono.as_deref().unwrap_or(""),
        grado_escolaridad: o.grado_escolaridad.as_deref().unwrap_or(""),
        departamento: o.departamento.as_deref().unwrap_or(""),
        unidad_educativa_id: o.unidad_educativa_id,
    }))
}

#[derive(Serialize)]
struct FilaResultado<'a> {
    area: &'a str,
    nivel: &'a str,
    grado_escolaridad: &'a str,
    posicion: i32,
    nombre_completo: &'a str,
    promedio: String,
    medalla: &'static str,
    gestion: i32,
}

pub fn resultados_csv(resultados: &[ResultadoFinal]) -> ApiResult<String> {
    escribir(resultados.iter().map(|r| FilaResultado {
        area: &r.area,
        nivel: &r.nivel,
        grado_escolaridad: r.grado_escolaridad.as_deref().unwrap_or(""),
        posicion: r.posicion,
        nombre_completo: &r.nombre_completo,
        promedio: format!("{:.2}", r.promedio),
        medalla: r.medalla.etiqueta(),
        gestion: r.gestion,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn exporta_olimpistas_con_encabezado() {
        let creado_en = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let o = Olimpista {
            id: 1,
            nombres: "Ana".into(),
            apellidos: "Quispe, Mamani".into(),
            documento: "123".into(),
            fecha_nacimiento: NaiveDate::from_ymd_opt(2009, 4, 2),
            email: None,
            telefono: Some("700".into()),
            grado_escolaridad: Some("5to".into()),
            departamento: None,
            unidad_educativa_id: Some(4),
            tutor_legal_id: None,
            creado_en,
            actualizado_en: None,
        };
        let csv = olimpistas_csv(&[o]).unwrap();
        let mut lineas = csv.lines();
        assert_eq!(
            lineas.next(),
            Some("documento,nombres,apellidos,fecha_nacimiento,email,telefono,grado_escolaridad,departamento,unidad_educativa_id")
        );
        assert_eq!(lineas.next(), Some("123,Ana,\"Quispe, Mamani\",2009-04-02,,700,5to,,4"));
    }

    #[test]
    fn lista_vacia_es_texto_vacio() {
        assert_eq!(olimpistas_csv(&[]).unwrap(), "");
    }
}
