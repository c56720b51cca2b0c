//! Datos y estilo de certificados. El PDF lo dibuja el cliente; aquí sólo se
//! valida el estilo y se arma el texto de cada certificado.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Fuentes estándar que el generador de PDF del cliente trae incorporadas.
pub const FUENTES_ESTANDAR: [&str; 3] = ["helvetica", "times", "courier"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstiloCertificado {
    pub titulo: String,
    pub color_primario: String,
    pub color_secundario: String,
    pub color_texto: String,
    pub fuente_titulo: String,
    pub fuente_cuerpo: String,
    pub logo_url: Option<String>,
    pub plantilla_texto: String,
    #[serde(default = "orientacion_por_defecto")]
    pub orientacion: String,
}

fn orientacion_por_defecto() -> String {
    "landscape".to_string()
}

impl Default for EstiloCertificado {
    fn default() -> Self {
        EstiloCertificado {
            titulo: "Certificado".to_string(),
            color_primario: "#1F3A93".to_string(),
            color_secundario: "#C9A227".to_string(),
            color_texto: "#222222".to_string(),
            fuente_titulo: "times".to_string(),
            fuente_cuerpo: "helvetica".to_string(),
            logo_url: None,
            plantilla_texto: "Se otorga a {nombre} la {medalla} por obtener el puesto {puesto} en el área de {area}, nivel {nivel}, gestión {gestion}."
                .to_string(),
            orientacion: orientacion_por_defecto(),
        }
    }
}

fn color_hex_valido(c: &str) -> bool {
    let c = c.trim();
    c.len() == 7 && c.starts_with('#') && c[1..].chars().all(|ch| ch.is_ascii_hexdigit())
}

impl EstiloCertificado {
    pub fn validar(&self) -> ApiResult<()> {
        for (campo, valor) in [
            ("color_primario", &self.color_primario),
            ("color_secundario", &self.color_secundario),
            ("color_texto", &self.color_texto),
        ] {
            if !color_hex_valido(valor) {
                return Err(ApiError::validacion(format!("{} debe tener la forma #RRGGBB (recibido '{}')", campo, valor)));
            }
        }
        for (campo, valor) in [("fuente_titulo", &self.fuente_titulo), ("fuente_cuerpo", &self.fuente_cuerpo)] {
            if !FUENTES_ESTANDAR.contains(&valor.trim().to_lowercase().as_str()) {
                return Err(ApiError::validacion(format!(
                    "{} '{}' no soportada; use una de {:?}",
                    campo, valor, FUENTES_ESTANDAR
                )));
            }
        }
        if self.plantilla_texto.trim().is_empty() {
            return Err(ApiError::validacion("plantilla_texto no puede estar vacía"));
        }
        if !matches!(self.orientacion.as_str(), "landscape" | "portrait") {
            return Err(ApiError::validacion("orientacion debe ser 'landscape' o 'portrait'"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatosCertificado {
    pub nombre: String,
    pub area: String,
    pub nivel: String,
    pub puesto: i32,
    pub medalla: String,
    pub gestion: i32,
}

/// Sustituye `{nombre}`, `{puesto}`, `{medalla}`, `{area}`, `{nivel}` y
/// `{gestion}`. Cualquier otra llave queda tal cual.
pub fn renderizar_texto(plantilla: &str, datos: &DatosCertificado) -> String {
    let mut out = String::with_capacity(plantilla.len() + 32);
    let mut resto = plantilla;
    while let Some(ini) = resto.find('{') {
        out.push_str(&resto[..ini]);
        let tras = &resto[ini..];
        match tras.find('}') {
            Some(fin) => {
                let clave = &tras[1..fin];
                match clave {
                    "nombre" => out.push_str(&datos.nombre),
                    "puesto" => out.push_str(&datos.puesto.to_string()),
                    "medalla" => out.push_str(&datos.medalla),
                    "area" => out.push_str(&datos.area),
                    "nivel" => out.push_str(&datos.nivel),
                    "gestion" => out.push_str(&datos.gestion.to_string()),
                    _ => out.push_str(&tras[..=fin]),
                }
                resto = &tras[fin + 1..];
            }
            None => {
                out.push_str(tras);
                resto = "";
            }
        }
    }
    out.push_str(resto);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datos() -> DatosCertificado {
        DatosCertificado {
            nombre: "Ana Rojas".into(),
            area: "Química".into(),
            nivel: "3P".into(),
            puesto: 1,
            medalla: "Medalla de Oro".into(),
            gestion: 2025,
        }
    }

    #[test]
    fn sustituye_marcadores_conocidos() {
        let t = renderizar_texto("{nombre}: {medalla} ({puesto}) en {area} {gestion}", &datos());
        assert_eq!(t, "Ana Rojas: Medalla de Oro (1) en Química 2025");
    }

    #[test]
    fn llaves_desconocidas_o_abiertas_se_conservan() {
        assert_eq!(renderizar_texto("{firma} y {nivel", &datos()), "{firma} y {nivel");
    }

    #[test]
    fn estilo_por_defecto_es_valido() {
        assert!(EstiloCertificado::default().validar().is_ok());
        let mut e = EstiloCertificado::default();
        e.color_primario = "azul".into();
        assert!(e.validar().is_err());
        let mut e = EstiloCertificado::default();
        e.fuente_cuerpo = "Comic Sans".into();
        assert!(e.validar().is_err());
    }
}
