// Plantilla y carga masiva de usuarios del personal (CSV).
use std::collections::HashMap;

use super::io::{Tabla, normalizar_encabezado};
use super::olimpistas::ErrorFila;
use crate::error::{ApiError, ApiResult};
use crate::models::{NuevoUsuario, Rol};

const ENCABEZADOS: [&str; 4] = ["nombre", "email", "password", "rol"];

/// CSV con los encabezados esperados y una fila de ejemplo por rol.
pub fn plantilla_csv() -> ApiResult<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(ENCABEZADOS)?;
    w.write_record(["Ana Coordinadora", "ana@ejemplo.bo", "cambiar123", "coordinador"])?;
    w.write_record(["Luis Evaluador", "luis@ejemplo.bo", "cambiar123", "evaluador"])?;
    let bytes = w.into_inner().map_err(|e| ApiError::Importacion(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Importacion(e.to_string()))
}

fn indice(encabezados: &[String], alias: &[&str]) -> Option<usize> {
    encabezados.iter().position(|h| alias.contains(&normalizar_encabezado(h).as_str()))
}

/// Valida las filas de la carga. Un email repetido dentro del archivo es
/// error en la segunda aparición.
pub fn validar_filas(tabla: &Tabla) -> ApiResult<(Vec<(usize, NuevoUsuario)>, Vec<ErrorFila>)> {
    let Some((encabezados, datos)) = tabla.split_first() else {
        return Err(ApiError::Importacion("el archivo está vacío".to_string()));
    };
    let (Some(i_nombre), Some(i_email), Some(i_password), Some(i_rol)) = (
        indice(encabezados, &["nombre", "nombres"]),
        indice(encabezados, &["email", "correo"]),
        indice(encabezados, &["password", "contrasena", "clave"]),
        indice(encabezados, &["rol"]),
    ) else {
        return Err(ApiError::Importacion(format!("se esperan las columnas: {}", ENCABEZADOS.join(", "))));
    };

    let celda = |fila: &[String], i: usize| fila.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
    let mut validas = Vec::new();
    let mut errores = Vec::new();
    let mut vistos: HashMap<String, usize> = HashMap::new();

    for (i, fila) in datos.iter().enumerate() {
        let numero = i + 2;
        let email = celda(fila, i_email).to_lowercase();
        let error = |motivo: String| ErrorFila { fila: numero, documento: Some(email.clone()), motivo };

        let rol = match celda(fila, i_rol).parse::<Rol>() {
            Ok(r) => r,
            Err(e) => {
                errores.push(error(e.to_string()));
                continue;
            }
        };
        let usuario = NuevoUsuario { nombre: celda(fila, i_nombre), email: email.clone(), password: celda(fila, i_password), rol };
        if let Err(e) = usuario.validar() {
            errores.push(error(e.to_string()));
            continue;
        }
        if let Some(previa) = vistos.get(&email) {
            errores.push(error(format!("email repetido (ver fila {})", previa)));
            continue;
        }
        vistos.insert(email.clone(), numero);
        validas.push((numero, usuario));
    }
    Ok((validas, errores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importacion::io::leer_csv;

    #[test]
    fn la_plantilla_se_puede_volver_a_importar() {
        let plantilla = plantilla_csv().unwrap();
        assert!(plantilla.starts_with("nombre,email,password,rol\n"));
        let (validas, errores) = validar_filas(&leer_csv(plantilla.as_bytes()).unwrap()).unwrap();
        assert!(errores.is_empty());
        assert_eq!(validas.len(), 2);
        assert_eq!(validas[1].1.rol, Rol::Evaluador);
    }

    #[test]
    fn reporta_rol_invalido_y_email_repetido() {
        let csv = "nombre,correo,clave,rol\n\
                   Ana,ana@umss.edu.bo,secreta123,evaluador\n\
                   Eva,eva@umss.edu.bo,secreta123,director\n\
                   Ana B,ANA@umss.edu.bo,secreta123,coordinador\n";
        let (validas, errores) = validar_filas(&leer_csv(csv.as_bytes()).unwrap()).unwrap();
        assert_eq!(validas.len(), 1);
        assert_eq!(errores.len(), 2);
        assert_eq!(errores[0].fila, 3);
        assert!(errores[0].motivo.contains("director"));
        assert!(errores[1].motivo.contains("fila 2"));
    }
}
