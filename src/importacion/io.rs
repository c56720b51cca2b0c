use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

use crate::error::{ApiError, ApiResult};

/// Hoja leída como filas de texto; la primera fila son los encabezados.
pub type Tabla = Vec<Vec<String>>;

/// Convierte una celda de calamine a texto. Los números enteros se escriben
/// sin decimales (un CI leído como 1234567.0 vuelve a ser "1234567").
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty | Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn quitar_acento(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        other => other,
    }
}

/// Minúsculas, sin acentos y con los espacios colapsados.
pub fn normalizar_nombre(s: &str) -> String {
    s.to_lowercase().chars().map(quitar_acento).collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Para comparar encabezados: además quita espacios, guiones y '_'.
pub fn normalizar_encabezado(s: &str) -> String {
    normalizar_nombre(s).chars().filter(|c| c.is_alphanumeric()).collect()
}

fn fila_vacia(fila: &[String]) -> bool {
    fila.iter().all(|c| c.trim().is_empty())
}

/// Primera hoja de un libro XLSX/XLS/ODS en memoria.
pub fn leer_xlsx(bytes: &[u8]) -> ApiResult<Tabla> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ApiError::Importacion(format!("no se pudo abrir el libro: {}", e)))?;
    let Some(hoja) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&hoja)
        .map_err(|e| ApiError::Importacion(format!("no se pudo leer la hoja '{}': {}", hoja, e)))?;
    Ok(range.rows().map(|r| r.iter().map(cell_to_string).collect::<Vec<_>>()).filter(|f| !fila_vacia(f)).collect())
}

/// Exige UTF-8. Un byte inválido se reporta con su fila (1-based) en lugar
/// de reemplazarse, para no guardar nombres corruptos.
fn texto_utf8(bytes: &[u8]) -> ApiResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let fila = bytes[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
        ApiError::Importacion(format!(
            "el archivo no está en UTF-8 (fila {}); guárdelo como \"CSV UTF-8\" o súbalo como .xlsx",
            fila
        ))
    })
}

/// CSV con ',' o ';' como separador (Excel en español exporta con ';').
pub fn leer_csv(bytes: &[u8]) -> ApiResult<Tabla> {
    let texto = texto_utf8(bytes)?.trim_start_matches('\u{feff}');
    let primera = texto.lines().next().unwrap_or("");
    let separador = if primera.matches(';').count() > primera.matches(',').count() { b';' } else { b',' };

    let mut lector = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separador)
        .trim(csv::Trim::All)
        .from_reader(texto.as_bytes());
    let mut tabla = Vec::new();
    for registro in lector.records() {
        let registro = registro?;
        let fila: Vec<String> = registro.iter().map(str::to_string).collect();
        if !fila_vacia(&fila) {
            tabla.push(fila);
        }
    }
    Ok(tabla)
}

/// Elige el lector por la extensión del archivo subido.
pub fn leer_tabla(nombre_archivo: &str, bytes: &[u8]) -> ApiResult<Tabla> {
    let ext = nombre_archivo.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => leer_xlsx(bytes),
        "csv" | "txt" => leer_csv(bytes),
        _ => Err(ApiError::Importacion(format!(
            "formato no soportado: '{}' (se aceptan .csv, .xlsx, .xls, .ods)",
            nombre_archivo
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celdas_numericas_sin_decimales() {
        assert_eq!(cell_to_string(&Data::Float(1234567.0)), "1234567");
        assert_eq!(cell_to_string(&Data::Float(51.5)), "51.5");
        assert_eq!(cell_to_string(&Data::String("  Física ".into())), "Física");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn normaliza_acentos_y_espacios() {
        assert_eq!(normalizar_nombre("  Matemáticas   Aplicadas "), "matematicas aplicadas");
        assert_eq!(normalizar_encabezado("Fecha de Nacimiento"), "fechadenacimiento");
        assert_eq!(normalizar_encabezado("Grado_Escolaridad"), "gradoescolaridad");
    }

    #[test]
    fn csv_con_punto_y_coma_y_bom() {
        let datos = "\u{feff}nombres;apellidos\nAna;Quispe\n;\nLuis;Mamani\n";
        let tabla = leer_csv(datos.as_bytes()).unwrap();
        assert_eq!(tabla.len(), 3);
        assert_eq!(tabla[0], vec!["nombres", "apellidos"]);
        assert_eq!(tabla[2], vec!["Luis", "Mamani"]);
    }

    #[test]
    fn csv_en_windows_1252_se_rechaza_con_la_fila() {
        let datos = b"nombres;apellidos\nAna;Quispe\nJos\xe9;P\xe9rez\n";
        match leer_csv(datos) {
            Err(ApiError::Importacion(msg)) => {
                assert!(msg.contains("UTF-8"), "{}", msg);
                assert!(msg.contains("fila 3"), "{}", msg);
            }
            otro => panic!("se esperaba error de importación, llegó {:?}", otro),
        }
    }

    #[test]
    fn extension_desconocida_es_error() {
        assert!(leer_tabla("datos.pdf", b"%PDF").is_err());
    }
}
