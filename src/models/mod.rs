// Estructuras de datos principales de la olimpiada.
//
// Los enumerados se guardan en la base como TEXT en minúsculas; `as_str` y
// `FromStr` son la única conversión entre ambos mundos.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod dto;
pub use dto::*;

/// Error de conversión de texto a uno de los enumerados del dominio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValorDesconocido {
    pub tipo: &'static str,
    pub valor: String,
}

impl fmt::Display for ValorDesconocido {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valor desconocido para {}: '{}'", self.tipo, self.valor)
    }
}

impl std::error::Error for ValorDesconocido {}

macro_rules! enum_texto {
    ($nombre:ident, $tipo:literal, { $($variante:ident => $texto:literal),+ $(,)? }) => {
        impl $nombre {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($nombre::$variante => $texto),+
                }
            }
        }

        impl FromStr for $nombre {
            type Err = ValorDesconocido;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($texto => Ok($nombre::$variante),)+
                    other => Err(ValorDesconocido { tipo: $tipo, valor: other.to_string() }),
                }
            }
        }

        impl fmt::Display for $nombre {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Estado del ciclo de vida de una inscripción en un área.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoInscripcion {
    Inscrito,
    Evaluado,
    Clasificado,
    NoClasificado,
    Descalificado,
    Desclasificado,
    Premiado,
}

enum_texto!(EstadoInscripcion, "estado de inscripción", {
    Inscrito => "inscrito",
    Evaluado => "evaluado",
    Clasificado => "clasificado",
    NoClasificado => "no_clasificado",
    Descalificado => "descalificado",
    Desclasificado => "desclasificado",
    Premiado => "premiado",
});

impl EstadoInscripcion {
    /// Estados producidos por una exclusión (descalificación, desclasificación
    /// o no clasificación registrada a mano).
    pub fn es_exclusion(&self) -> bool {
        matches!(
            self,
            EstadoInscripcion::Descalificado | EstadoInscripcion::Desclasificado | EstadoInscripcion::NoClasificado
        )
    }

    /// La inscripción puede recibir notas en la fase indicada.
    pub fn admite_evaluacion(&self, fase: Fase) -> bool {
        match fase {
            Fase::Clasificacion => matches!(self, EstadoInscripcion::Inscrito | EstadoInscripcion::Evaluado),
            Fase::Final => matches!(self, EstadoInscripcion::Clasificado),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medalla {
    Oro,
    Plata,
    Bronce,
    MencionHonor,
    SinMedalla,
}

enum_texto!(Medalla, "medalla", {
    Oro => "oro",
    Plata => "plata",
    Bronce => "bronce",
    MencionHonor => "mencion_honor",
    SinMedalla => "sin_medalla",
});

impl Medalla {
    /// Texto para certificados.
    pub fn etiqueta(&self) -> &'static str {
        match self {
            Medalla::Oro => "Medalla de Oro",
            Medalla::Plata => "Medalla de Plata",
            Medalla::Bronce => "Medalla de Bronce",
            Medalla::MencionHonor => "Mención de Honor",
            Medalla::SinMedalla => "Participación",
        }
    }

    pub fn es_premio(&self) -> bool {
        !matches!(self, Medalla::SinMedalla)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fase {
    Clasificacion,
    Final,
}

enum_texto!(Fase, "fase", {
    Clasificacion => "clasificacion",
    Final => "final",
});

impl Fase {
    pub fn tabla_evaluaciones(&self) -> &'static str {
        match self {
            Fase::Clasificacion => "evaluaciones_clasificacion",
            Fase::Final => "evaluaciones_finales",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rol {
    Administrador,
    Coordinador,
    Evaluador,
}

enum_texto!(Rol, "rol", {
    Administrador => "administrador",
    Coordinador => "coordinador",
    Evaluador => "evaluador",
});

/// Las tres variantes de exclusión comparten flujo y forma de tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoExclusion {
    Descalificacion,
    Desclasificacion,
    NoClasificado,
}

enum_texto!(TipoExclusion, "tipo de exclusión", {
    Descalificacion => "descalificacion",
    Desclasificacion => "desclasificacion",
    NoClasificado => "no_clasificado",
});

impl TipoExclusion {
    pub const TODOS: [TipoExclusion; 3] =
        [TipoExclusion::Descalificacion, TipoExclusion::Desclasificacion, TipoExclusion::NoClasificado];

    pub fn tabla(&self) -> &'static str {
        match self {
            TipoExclusion::Descalificacion => "descalificaciones",
            TipoExclusion::Desclasificacion => "desclasificaciones",
            TipoExclusion::NoClasificado => "no_clasificados",
        }
    }

    /// Tabla de reglas asociada, si la variante tiene catálogo propio.
    pub fn tabla_reglas(&self) -> Option<&'static str> {
        match self {
            TipoExclusion::Descalificacion => Some("reglas_descalificacion"),
            TipoExclusion::Desclasificacion => Some("reglas_desclasificacion"),
            TipoExclusion::NoClasificado => None,
        }
    }

    pub fn estado_resultante(&self) -> EstadoInscripcion {
        match self {
            TipoExclusion::Descalificacion => EstadoInscripcion::Descalificado,
            TipoExclusion::Desclasificacion => EstadoInscripcion::Desclasificado,
            TipoExclusion::NoClasificado => EstadoInscripcion::NoClasificado,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Area {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub activo: bool,
    pub nota_minima_clasificacion: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nivel {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnidadEducativa {
    pub id: i32,
    pub nombre: String,
    pub codigo_sie: Option<String>,
    pub departamento: Option<String>,
    pub municipio: Option<String>,
    pub dependencia: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorLegal {
    pub id: i32,
    pub nombres: String,
    pub apellidos: String,
    pub documento: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub parentesco: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Olimpista {
    pub id: i32,
    pub nombres: String,
    pub apellidos: String,
    pub documento: String,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub grado_escolaridad: Option<String>,
    pub departamento: Option<String>,
    pub unidad_educativa_id: Option<i32>,
    pub tutor_legal_id: Option<i32>,
    pub creado_en: NaiveDateTime,
    pub actualizado_en: Option<NaiveDateTime>,
}

impl Olimpista {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombres.trim(), self.apellidos.trim())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InscripcionArea {
    pub id: i32,
    pub olimpista_id: i32,
    pub area_id: i32,
    pub nivel_id: i32,
    pub es_grupal: bool,
    pub nombre_grupo: Option<String>,
    pub estado: EstadoInscripcion,
    pub gestion: i32,
    pub creado_en: NaiveDateTime,
    pub actualizado_en: Option<NaiveDateTime>,
}

/// Fila de listado de inscripciones con los datos del olimpista ya unidos.
#[derive(Debug, Clone, Serialize)]
pub struct InscripcionDetalle {
    pub id: i32,
    pub olimpista_id: i32,
    pub nombre_completo: String,
    pub documento: String,
    pub grado_escolaridad: Option<String>,
    pub area_id: i32,
    pub area: String,
    pub nivel_id: i32,
    pub nivel: String,
    pub es_grupal: bool,
    pub nombre_grupo: Option<String>,
    pub estado: EstadoInscripcion,
    pub gestion: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluacion {
    pub id: i32,
    pub fase: Fase,
    pub inscripcion_id: i32,
    pub evaluador_id: i32,
    pub nota: f64,
    pub observaciones: Option<String>,
    pub finalizada: bool,
    pub modificaciones: i32,
    pub creado_en: NaiveDateTime,
    pub actualizado_en: Option<NaiveDateTime>,
}

/// Promedio de una inscripción en una fase, base de rankings y medallero.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompetidorPuntaje {
    pub inscripcion_id: i32,
    pub olimpista_id: i32,
    pub nombre_completo: String,
    pub grado_escolaridad: Option<String>,
    pub promedio: f64,
    pub evaluaciones: i64,
}

/// Cupos de medallas de un área/nivel/grado.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medallero {
    pub oro: u32,
    pub plata: u32,
    pub bronce: u32,
    pub mencion_honor: u32,
}

impl Default for Medallero {
    fn default() -> Self {
        Medallero { oro: 1, plata: 1, bronce: 1, mencion_honor: 0 }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfiguracionMedallero {
    pub id: i32,
    pub area_id: i32,
    pub nivel_id: Option<i32>,
    pub grado_escolaridad: Option<String>,
    pub medallero: Medallero,
}

/// Medalla calculada para un competidor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Premiado {
    pub inscripcion_id: i32,
    pub olimpista_id: i32,
    pub nombre_completo: String,
    pub grado_escolaridad: Option<String>,
    pub promedio: f64,
    pub posicion: u32,
    pub medalla: Medalla,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfiguracionAreaEvaluacion {
    pub id: i32,
    pub area_id: i32,
    pub nombre_area: String,
    pub fase: Fase,
    pub fecha_inicio: NaiveDateTime,
    pub duracion_minutos: i32,
    pub publicacion_inicio: Option<NaiveDateTime>,
    pub publicacion_fin: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Regla {
    pub id: i32,
    pub codigo: String,
    pub descripcion: String,
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exclusion {
    pub id: i32,
    pub tipo: TipoExclusion,
    pub inscripcion_id: i32,
    pub regla_id: Option<i32>,
    pub motivo: String,
    pub registrado_por: Option<i32>,
    pub estado_anterior: EstadoInscripcion,
    pub activo: bool,
    pub creado_en: NaiveDateTime,
    pub revocado_en: Option<NaiveDateTime>,
    pub revocado_por: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultadoFinal {
    pub id: i32,
    pub inscripcion_id: i32,
    pub nombre_completo: String,
    pub area_id: i32,
    pub area: String,
    pub nivel_id: i32,
    pub nivel: String,
    pub grado_escolaridad: Option<String>,
    pub promedio: f64,
    pub posicion: i32,
    pub medalla: Medalla,
    pub gestion: i32,
    pub creado_en: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicacionResultados {
    pub id: i32,
    pub area_id: i32,
    pub fase: Fase,
    pub publicado: bool,
    pub fecha_publicacion: Option<NaiveDateTime>,
    pub publicado_por: Option<i32>,
}

/// Usuario del personal. `password_hash` nunca se serializa hacia el cliente.
#[derive(Debug, Clone, Serialize)]
pub struct Usuario {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub rol: Rol,
    pub activo: bool,
    pub creado_en: NaiveDateTime,
}

/// Sesión abierta en el login. El token sólo viaja en esta respuesta.
#[derive(Debug, Clone, Serialize)]
pub struct Sesion {
    pub token: String,
    pub expira_en: NaiveDateTime,
    pub usuario: Usuario,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estados_se_convierten_en_ambos_sentidos() {
        for estado in [
            EstadoInscripcion::Inscrito,
            EstadoInscripcion::Evaluado,
            EstadoInscripcion::Clasificado,
            EstadoInscripcion::NoClasificado,
            EstadoInscripcion::Descalificado,
            EstadoInscripcion::Desclasificado,
            EstadoInscripcion::Premiado,
        ] {
            assert_eq!(estado.as_str().parse::<EstadoInscripcion>(), Ok(estado));
        }
        assert!("retirado".parse::<EstadoInscripcion>().is_err());
    }

    #[test]
    fn serde_usa_el_mismo_texto_que_la_base() {
        let json = serde_json::to_string(&Medalla::MencionHonor).unwrap();
        assert_eq!(json, "\"mencion_honor\"");
        assert_eq!(Medalla::MencionHonor.as_str(), "mencion_honor");
    }

    #[test]
    fn fases_admitidas_por_estado() {
        assert!(EstadoInscripcion::Inscrito.admite_evaluacion(Fase::Clasificacion));
        assert!(EstadoInscripcion::Evaluado.admite_evaluacion(Fase::Clasificacion));
        assert!(!EstadoInscripcion::Descalificado.admite_evaluacion(Fase::Clasificacion));
        assert!(EstadoInscripcion::Clasificado.admite_evaluacion(Fase::Final));
        assert!(!EstadoInscripcion::Evaluado.admite_evaluacion(Fase::Final));
    }

    #[test]
    fn medallero_por_defecto_es_uno_uno_uno_cero() {
        assert_eq!(Medallero::default(), Medallero { oro: 1, plata: 1, bronce: 1, mencion_honor: 0 });
    }
}
