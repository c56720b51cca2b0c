// Cuerpos de solicitud y filtros de consulta. Cada operación recibe su propio
// struct tipado; los campos opcionales quedan en `None` si no llegan.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{EstadoInscripcion, Fase, Medallero, Rol};
use crate::error::{ApiError, ApiResult};

fn requerido(campo: &str, valor: &str) -> ApiResult<()> {
    if valor.trim().is_empty() {
        return Err(ApiError::validacion(format!("el campo '{}' es obligatorio", campo)));
    }
    Ok(())
}

fn email_valido(email: &str) -> bool {
    let e = email.trim();
    match e.split_once('@') {
        Some((local, dominio)) => !local.is_empty() && dominio.contains('.') && !dominio.starts_with('.'),
        None => false,
    }
}

fn validar_email_opcional(email: &Option<String>) -> ApiResult<()> {
    if let Some(e) = email {
        if !e.trim().is_empty() && !email_valido(e) {
            return Err(ApiError::validacion(format!("email inválido: '{}'", e)));
        }
    }
    Ok(())
}

/// Nota válida: número finito dentro de [0, 100].
pub fn validar_nota(nota: f64) -> ApiResult<()> {
    if !nota.is_finite() || !(0.0..=100.0).contains(&nota) {
        return Err(ApiError::validacion(format!("la nota debe estar entre 0 y 100 (recibido {})", nota)));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct NuevaArea {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub nota_minima_clasificacion: Option<f64>,
}

impl NuevaArea {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("nombre", &self.nombre)?;
        if let Some(n) = self.nota_minima_clasificacion {
            validar_nota(n)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ActualizarArea {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub activo: Option<bool>,
    pub nota_minima_clasificacion: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NuevoNivel {
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NuevaUnidadEducativa {
    pub nombre: String,
    pub codigo_sie: Option<String>,
    pub departamento: Option<String>,
    pub municipio: Option<String>,
    pub dependencia: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoTutor {
    pub nombres: String,
    pub apellidos: String,
    pub documento: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub parentesco: Option<String>,
}

impl NuevoTutor {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("nombres", &self.nombres)?;
        requerido("apellidos", &self.apellidos)?;
        requerido("documento", &self.documento)?;
        validar_email_opcional(&self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoOlimpista {
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
}

impl NuevoOlimpista {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("nombres", &self.nombres)?;
        requerido("apellidos", &self.apellidos)?;
        requerido("documento", &self.documento)?;
        validar_email_opcional(&self.email)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ActualizarOlimpista {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub grado_escolaridad: Option<String>,
    pub departamento: Option<String>,
    pub unidad_educativa_id: Option<i32>,
    pub tutor_legal_id: Option<i32>,
}

impl ActualizarOlimpista {
    pub fn validar(&self) -> ApiResult<()> {
        if let Some(n) = &self.nombres {
            requerido("nombres", n)?;
        }
        if let Some(a) = &self.apellidos {
            requerido("apellidos", a)?;
        }
        validar_email_opcional(&self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct NuevaInscripcion {
    pub olimpista_id: i32,
    pub area_id: i32,
    pub nivel_id: i32,
    #[serde(default)]
    pub es_grupal: bool,
    pub nombre_grupo: Option<String>,
    pub gestion: Option<i32>,
}

impl NuevaInscripcion {
    pub fn validar(&self) -> ApiResult<()> {
        if self.es_grupal && self.nombre_grupo.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(ApiError::validacion("una inscripción grupal necesita 'nombre_grupo'"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NotaEntrada {
    pub inscripcion_id: i32,
    pub nota: f64,
    pub observaciones: Option<String>,
}

impl NotaEntrada {
    pub fn validar(&self) -> ApiResult<()> {
        validar_nota(self.nota)
    }
}

#[derive(Debug, Deserialize)]
pub struct AreaNivelEntrada {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CerrarClasificacionEntrada {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
    pub nota_minima: Option<f64>,
}

impl CerrarClasificacionEntrada {
    pub fn validar(&self) -> ApiResult<()> {
        if let Some(n) = self.nota_minima {
            validar_nota(n)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct NuevaExclusion {
    pub inscripcion_id: i32,
    pub regla_id: Option<i32>,
    pub motivo: String,
}

impl NuevaExclusion {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("motivo", &self.motivo)
    }
}

#[derive(Debug, Deserialize)]
pub struct NuevaRegla {
    pub codigo: String,
    pub descripcion: String,
}

impl NuevaRegla {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("codigo", &self.codigo)?;
        requerido("descripcion", &self.descripcion)
    }
}

/// Cupos del medallero; los que no llegan toman el valor por defecto (1/1/1/0).
#[derive(Debug, Deserialize)]
pub struct MedalleroEntrada {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
    pub grado_escolaridad: Option<String>,
    pub oro: Option<u32>,
    pub plata: Option<u32>,
    pub bronce: Option<u32>,
    pub mencion_honor: Option<u32>,
}

impl MedalleroEntrada {
    pub fn medallero(&self) -> Medallero {
        let d = Medallero::default();
        Medallero {
            oro: self.oro.unwrap_or(d.oro),
            plata: self.plata.unwrap_or(d.plata),
            bronce: self.bronce.unwrap_or(d.bronce),
            mencion_honor: self.mencion_honor.unwrap_or(d.mencion_honor),
        }
    }

    /// Grado normalizado: vacío o espacios equivale a "sin grado".
    pub fn grado(&self) -> Option<String> {
        self.grado_escolaridad.as_deref().map(str::trim).filter(|g| !g.is_empty()).map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
pub struct VentanaEntrada {
    pub area_id: i32,
    pub fase: Fase,
    pub fecha: NaiveDate,
    pub hora_inicio: String,
    pub duracion_minutos: i32,
    pub publicacion_inicio: Option<NaiveDateTime>,
    pub publicacion_fin: Option<NaiveDateTime>,
    #[serde(default)]
    pub forzar: bool,
}

#[derive(Debug, Deserialize)]
pub struct NuevoUsuario {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub rol: Rol,
}

impl NuevoUsuario {
    pub fn validar(&self) -> ApiResult<()> {
        requerido("nombre", &self.nombre)?;
        requerido("email", &self.email)?;
        if !email_valido(&self.email) {
            return Err(ApiError::validacion(format!("email inválido: '{}'", self.email)));
        }
        if self.password.chars().count() < 8 {
            return Err(ApiError::validacion("la contraseña debe tener al menos 8 caracteres"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ActualizarUsuario {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

impl ActualizarUsuario {
    pub fn validar(&self) -> ApiResult<()> {
        if let Some(e) = &self.email {
            if !email_valido(e) {
                return Err(ApiError::validacion(format!("email inválido: '{}'", e)));
            }
        }
        if let Some(p) = &self.password {
            if p.chars().count() < 8 {
                return Err(ApiError::validacion("la contraseña debe tener al menos 8 caracteres"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginEntrada {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AsignacionArea {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AsignarAreasEntrada {
    pub areas: Vec<AsignacionArea>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroOlimpistas {
    pub buscar: Option<String>,
    pub unidad_educativa_id: Option<i32>,
    pub limite: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroInscripciones {
    pub area_id: Option<i32>,
    pub nivel_id: Option<i32>,
    pub estado: Option<EstadoInscripcion>,
    pub gestion: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroEvaluaciones {
    pub area_id: Option<i32>,
    pub nivel_id: Option<i32>,
    pub evaluador_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct FiltroAreaNivel {
    pub area_id: i32,
    pub nivel_id: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroUsuarios {
    pub rol: Option<Rol>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroExclusiones {
    pub inscripcion_id: Option<i32>,
    #[serde(default)]
    pub solo_activas: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct FiltroBitacora {
    pub limite: Option<i64>,
    pub entidad: Option<String>,
    pub entidad_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notas_fuera_de_rango_se_rechazan() {
        assert!(validar_nota(0.0).is_ok());
        assert!(validar_nota(100.0).is_ok());
        assert!(validar_nota(-0.5).is_err());
        assert!(validar_nota(100.01).is_err());
        assert!(validar_nota(f64::NAN).is_err());
    }

    #[test]
    fn medallero_entrada_rellena_por_defecto() {
        let entrada: MedalleroEntrada =
            serde_json::from_str(r#"{"area_id": 1, "oro": 3, "grado_escolaridad": "  "}"#).unwrap();
        assert_eq!(entrada.medallero(), Medallero { oro: 3, plata: 1, bronce: 1, mencion_honor: 0 });
        assert_eq!(entrada.grado(), None);
    }

    #[test]
    fn inscripcion_grupal_exige_nombre_de_grupo() {
        let sin_nombre = NuevaInscripcion {
            olimpista_id: 1,
            area_id: 1,
            nivel_id: 1,
            es_grupal: true,
            nombre_grupo: Some(" ".into()),
            gestion: None,
        };
        assert!(sin_nombre.validar().is_err());
    }

    #[test]
    fn usuario_valida_email_y_contrasena() {
        let mut u = NuevoUsuario {
            nombre: "Ana".into(),
            email: "ana@umss.edu.bo".into(),
            password: "secreta123".into(),
            rol: Rol::Evaluador,
        };
        assert!(u.validar().is_ok());
        u.email = "ana.umss".into();
        assert!(u.validar().is_err());
        u.email = "ana@umss.edu.bo".into();
        u.password = "corta".into();
        assert!(u.validar().is_err());
    }
}
