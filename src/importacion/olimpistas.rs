//! Importación masiva de olimpistas desde CSV/XLSX.
//!
//! Cada fila trae al olimpista, su inscripción (área y nivel por nombre) y
//! opcionalmente su unidad educativa y tutor. Las filas se validan una por
//! una; las válidas se guardan juntas y las inválidas vuelven con su número
//! de fila y motivo.

use chrono::{Duration, NaiveDate};
use postgres::GenericClient;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use strsim::jaro_winkler;

use super::io::{Tabla, normalizar_encabezado, normalizar_nombre};
use crate::db::{catalogos, inscripciones, olimpistas};
use crate::error::{ApiError, ApiResult};
use crate::models::{NuevoOlimpista, NuevoTutor};

/// Similitud mínima para aceptar un nombre de área o nivel aproximado.
pub const UMBRAL_SIMILITUD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Columna {
    Nombres,
    Apellidos,
    Documento,
    FechaNacimiento,
    Email,
    Telefono,
    Grado,
    Departamento,
    UnidadEducativa,
    Area,
    Nivel,
    TutorNombres,
    TutorApellidos,
    TutorDocumento,
    TutorTelefono,
    TutorEmail,
    Parentesco,
}

const ALIAS: &[(&str, Columna)] = &[
    ("nombres", Columna::Nombres),
    ("nombre", Columna::Nombres),
    ("apellidos", Columna::Apellidos),
    ("apellido", Columna::Apellidos),
    ("documento", Columna::Documento),
    ("ci", Columna::Documento),
    ("carnet", Columna::Documento),
    ("cedula", Columna::Documento),
    ("carnetdeidentidad", Columna::Documento),
    ("fechanacimiento", Columna::FechaNacimiento),
    ("fechadenacimiento", Columna::FechaNacimiento),
    ("email", Columna::Email),
    ("correo", Columna::Email),
    ("correoelectronico", Columna::Email),
    ("telefono", Columna::Telefono),
    ("celular", Columna::Telefono),
    ("grado", Columna::Grado),
    ("gradoescolaridad", Columna::Grado),
    ("curso", Columna::Grado),
    ("departamento", Columna::Departamento),
    ("unidadeducativa", Columna::UnidadEducativa),
    ("colegio", Columna::UnidadEducativa),
    ("area", Columna::Area),
    ("nivel", Columna::Nivel),
    ("categoria", Columna::Nivel),
    ("tutornombres", Columna::TutorNombres),
    ("nombrestutor", Columna::TutorNombres),
    ("tutorapellidos", Columna::TutorApellidos),
    ("apellidostutor", Columna::TutorApellidos),
    ("tutordocumento", Columna::TutorDocumento),
    ("documentotutor", Columna::TutorDocumento),
    ("citutor", Columna::TutorDocumento),
    ("tutortelefono", Columna::TutorTelefono),
    ("telefonotutor", Columna::TutorTelefono),
    ("tutoremail", Columna::TutorEmail),
    ("emailtutor", Columna::TutorEmail),
    ("correotutor", Columna::TutorEmail),
    ("parentesco", Columna::Parentesco),
];

const OBLIGATORIAS: [(Columna, &str); 5] = [
    (Columna::Nombres, "nombres"),
    (Columna::Apellidos, "apellidos"),
    (Columna::Documento, "documento"),
    (Columna::Area, "area"),
    (Columna::Nivel, "nivel"),
];

#[derive(Debug, Clone, Default)]
pub struct MapaColumnas {
    indices: HashMap<Columna, usize>,
}

impl MapaColumnas {
    fn valor<'a>(&self, fila: &'a [String], col: Columna) -> Option<&'a str> {
        self.indices.get(&col).and_then(|&i| fila.get(i)).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Ubica cada columna conocida; faltar una obligatoria es error de archivo.
pub fn mapear_encabezados(encabezados: &[String]) -> ApiResult<MapaColumnas> {
    let mut mapa = MapaColumnas::default();
    for (i, h) in encabezados.iter().enumerate() {
        let norm = normalizar_encabezado(h);
        if let Some((_, col)) = ALIAS.iter().find(|(alias, _)| *alias == norm) {
            mapa.indices.entry(*col).or_insert(i);
        }
    }
    let faltan: Vec<&str> =
        OBLIGATORIAS.iter().filter(|(col, _)| !mapa.indices.contains_key(col)).map(|(_, nombre)| *nombre).collect();
    if !faltan.is_empty() {
        return Err(ApiError::Importacion(format!("faltan columnas obligatorias: {}", faltan.join(", "))));
    }
    Ok(mapa)
}

/// Nombres de un catálogo (áreas o niveles) con su id.
#[derive(Debug, Clone, Default)]
pub struct Catalogo {
    entradas: Vec<(String, i32)>,
}

impl Catalogo {
    pub fn new<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        Catalogo { entradas: items.into_iter().map(|(n, id)| (normalizar_nombre(n), id)).collect() }
    }

    /// Coincidencia exacta (normalizada) o la más parecida por Jaro-Winkler
    /// si supera el umbral.
    pub fn resolver(&self, nombre: &str) -> Option<i32> {
        let norm = normalizar_nombre(nombre);
        if let Some((_, id)) = self.entradas.iter().find(|(n, _)| *n == norm) {
            return Some(*id);
        }
        let mut mejor: Option<(i32, f64)> = None;
        for (n, id) in &self.entradas {
            let similitud = jaro_winkler(&norm, n);
            if similitud >= UMBRAL_SIMILITUD && mejor.map(|(_, s)| similitud > s).unwrap_or(true) {
                mejor = Some((*id, similitud));
            }
        }
        mejor.map(|(id, _)| id)
    }
}

/// Acepta `AAAA-MM-DD`, `DD/MM/AAAA`, `DD-MM-AAAA` y el número de serie de
/// fecha de Excel.
pub fn parsear_fecha(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for formato in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(f) = NaiveDate::parse_from_str(s, formato) {
            return Some(f);
        }
    }
    let serial = s.parse::<f64>().ok()?;
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorFila {
    pub fila: usize,
    pub documento: Option<String>,
    pub motivo: String,
}

#[derive(Debug, Clone)]
pub struct FilaOlimpista {
    pub fila: usize,
    pub olimpista: NuevoOlimpista,
    pub tutor: Option<NuevoTutor>,
    pub unidad_educativa: Option<String>,
    pub area_id: i32,
    pub nivel_id: i32,
}

fn validar_fila(
    mapa: &MapaColumnas,
    fila: &[String],
    areas: &Catalogo,
    niveles: &Catalogo,
) -> Result<(NuevoOlimpista, Option<NuevoTutor>, Option<String>, i32, i32), String> {
    let v = |col| mapa.valor(fila, col);
    let opt = |col| v(col).map(str::to_string);

    let fecha_nacimiento = match v(Columna::FechaNacimiento) {
        Some(t) => Some(parsear_fecha(t).ok_or_else(|| format!("fecha de nacimiento inválida: '{}'", t))?),
        None => None,
    };
    let olimpista = NuevoOlimpista {
        nombres: opt(Columna::Nombres).unwrap_or_default(),
        apellidos: opt(Columna::Apellidos).unwrap_or_default(),
        documento: opt(Columna::Documento).unwrap_or_default(),
        fecha_nacimiento,
        email: opt(Columna::Email),
        telefono: opt(Columna::Telefono),
        grado_escolaridad: opt(Columna::Grado),
        departamento: opt(Columna::Departamento),
        unidad_educativa_id: None,
        tutor_legal_id: None,
    };
    olimpista.validar().map_err(|e| e.to_string())?;

    let area = v(Columna::Area).ok_or("el campo 'area' es obligatorio")?;
    let area_id = areas.resolver(area).ok_or_else(|| format!("área desconocida: '{}'", area))?;
    let nivel = v(Columna::Nivel).ok_or("el campo 'nivel' es obligatorio")?;
    let nivel_id = niveles.resolver(nivel).ok_or_else(|| format!("nivel desconocido: '{}'", nivel))?;

    let tutor = match v(Columna::TutorDocumento) {
        Some(doc) => {
            let t = NuevoTutor {
                nombres: opt(Columna::TutorNombres).unwrap_or_default(),
                apellidos: opt(Columna::TutorApellidos).unwrap_or_default(),
                documento: doc.to_string(),
                telefono: opt(Columna::TutorTelefono),
                email: opt(Columna::TutorEmail),
                parentesco: opt(Columna::Parentesco),
            };
            t.validar().map_err(|e| format!("tutor: {}", e))?;
            Some(t)
        }
        None => None,
    };

    Ok((olimpista, tutor, opt(Columna::UnidadEducativa), area_id, nivel_id))
}

/// Separa filas válidas e inválidas. Los números de fila son los de la hoja
/// (el encabezado es la fila 1).
pub fn validar_filas(tabla: &Tabla, areas: &Catalogo, niveles: &Catalogo) -> ApiResult<(Vec<FilaOlimpista>, Vec<ErrorFila>)> {
    let Some((encabezados, datos)) = tabla.split_first() else {
        return Err(ApiError::Importacion("el archivo está vacío".to_string()));
    };
    let mapa = mapear_encabezados(encabezados)?;

    let mut validas = Vec::new();
    let mut errores = Vec::new();
    let mut vistos: HashMap<(String, i32), usize> = HashMap::new();

    for (i, fila) in datos.iter().enumerate() {
        let numero = i + 2;
        let documento = mapa.valor(fila, Columna::Documento).map(str::to_string);
        match validar_fila(&mapa, fila, areas, niveles) {
            Ok((olimpista, tutor, unidad_educativa, area_id, nivel_id)) => {
                let clave = (olimpista.documento.clone(), area_id);
                if let Some(previa) = vistos.get(&clave) {
                    errores.push(ErrorFila {
                        fila: numero,
                        documento,
                        motivo: format!("inscripción repetida en el área (ver fila {})", previa),
                    });
                    continue;
                }
                vistos.insert(clave, numero);
                validas.push(FilaOlimpista { fila: numero, olimpista, tutor, unidad_educativa, area_id, nivel_id });
            }
            Err(motivo) => errores.push(ErrorFila { fila: numero, documento, motivo }),
        }
    }
    Ok((validas, errores))
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ResumenImportacion {
    pub filas_leidas: usize,
    pub olimpistas_guardados: usize,
    pub inscripciones_creadas: usize,
    pub errores: Vec<ErrorFila>,
}

/// Guarda las filas válidas. Llamar dentro de una transacción: un error de
/// base de datos revierte todo el lote.
pub fn guardar(c: &mut impl GenericClient, filas: &[FilaOlimpista], gestion: i32) -> ApiResult<(usize, usize)> {
    let mut guardados = HashSet::new();
    let mut inscripciones_creadas = 0;
    for f in filas {
        let mut datos = f.olimpista.clone();
        if let Some(nombre) = &f.unidad_educativa {
            datos.unidad_educativa_id = Some(catalogos::obtener_o_crear_unidad(c, nombre)?);
        }
        if let Some(t) = &f.tutor {
            datos.tutor_legal_id = Some(catalogos::guardar_tutor(c, t)?.id);
        }
        let olimpista = olimpistas::guardar_por_documento(c, &datos)?;
        guardados.insert(olimpista.id);
        if inscripciones::crear_si_no_existe(c, olimpista.id, f.area_id, f.nivel_id, gestion)? {
            inscripciones_creadas += 1;
        }
    }
    Ok((guardados.len(), inscripciones_creadas))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fila(celdas: &[&str]) -> Vec<String> {
        celdas.iter().map(|s| s.to_string()).collect()
    }

    fn catalogos() -> (Catalogo, Catalogo) {
        (
            Catalogo::new([("Matemáticas", 1), ("Física", 2), ("Química", 3)]),
            Catalogo::new([("Primaria", 10), ("Secundaria", 20)]),
        )
    }

    #[test]
    fn resuelve_nombres_exactos_y_aproximados() {
        let (areas, niveles) = catalogos();
        assert_eq!(areas.resolver("MATEMATICAS"), Some(1));
        assert_eq!(areas.resolver("Matematica"), Some(1));
        assert_eq!(niveles.resolver("secundaria "), Some(20));
        assert_eq!(areas.resolver("Robótica"), None);
    }

    #[test]
    fn faltan_columnas_obligatorias() {
        let err = mapear_encabezados(&fila(&["Nombres", "Apellidos", "CI"])).unwrap_err();
        assert!(err.to_string().contains("area"));
    }

    #[test]
    fn separa_filas_validas_e_invalidas() {
        let (areas, niveles) = catalogos();
        let tabla = vec![
            fila(&["Nombres", "Apellidos", "CI", "Área", "Nivel", "Fecha de nacimiento", "Colegio"]),
            fila(&["Ana", "Quispe", "123", "Física", "Secundaria", "2009-04-02", "San Simón"]),
            fila(&["Luis", "", "456", "Física", "Secundaria", "", ""]),
            fila(&["Eva", "Rojas", "789", "Robótica", "Primaria", "", ""]),
            fila(&["Ana", "Quispe", "123", "fisica", "Secundaria", "", ""]),
            fila(&["Juan", "Pérez", "321", "Química", "Primaria", "31/02/2010", ""]),
        ];
        let (validas, errores) = validar_filas(&tabla, &areas, &niveles).unwrap();
        assert_eq!(validas.len(), 1);
        assert_eq!(validas[0].fila, 2);
        assert_eq!(validas[0].area_id, 2);
        assert_eq!(validas[0].unidad_educativa.as_deref(), Some("San Simón"));
        assert_eq!(validas[0].olimpista.fecha_nacimiento, NaiveDate::from_ymd_opt(2009, 4, 2));

        let filas: Vec<usize> = errores.iter().map(|e| e.fila).collect();
        assert_eq!(filas, vec![3, 4, 5, 6]);
        assert!(errores[0].motivo.contains("apellidos"));
        assert!(errores[1].motivo.contains("Robótica"));
        assert!(errores[2].motivo.contains("fila 2"));
    }

    #[test]
    fn fechas_en_varios_formatos() {
        let esperado = NaiveDate::from_ymd_opt(2010, 3, 15);
        assert_eq!(parsear_fecha("2010-03-15"), esperado);
        assert_eq!(parsear_fecha("15/03/2010"), esperado);
        assert_eq!(parsear_fecha("40252"), esperado);
        assert_eq!(parsear_fecha("ayer"), None);
    }
}
