// Identificación del personal por token de sesión y control de roles.
use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use chrono::Local;

use super::AppState;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Rol, Usuario};

pub const ESQUEMA_BEARER: &str = "Bearer";

pub const SOLO_ADMIN: &[Rol] = &[Rol::Administrador];
pub const COORDINACION: &[Rol] = &[Rol::Administrador, Rol::Coordinador];
pub const PERSONAL: &[Rol] = &[Rol::Administrador, Rol::Coordinador, Rol::Evaluador];

/// Token de `Authorization: Bearer <token>`. Sin cabecera, con otro esquema
/// o con el token vacío responde 401.
pub fn token_de(req: &HttpRequest) -> ApiResult<String> {
    let valor = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::NoAutenticado("falta la cabecera Authorization".to_string()))?;
    let valor = valor
        .to_str()
        .map_err(|_| ApiError::NoAutenticado("cabecera Authorization inválida".to_string()))?
        .trim();
    let (esquema, token) = valor.split_once(' ').unwrap_or((valor, ""));
    let token = token.trim();
    if !esquema.eq_ignore_ascii_case(ESQUEMA_BEARER) || token.is_empty() {
        return Err(ApiError::NoAutenticado(format!("se espera 'Authorization: {} <token>'", ESQUEMA_BEARER)));
    }
    Ok(token.to_string())
}

/// Comprueba un rol ya cargado. El administrador pasa siempre.
pub fn verificar_rol(usuario: &Usuario, permitidos: &[Rol]) -> ApiResult<()> {
    if usuario.rol == Rol::Administrador || permitidos.contains(&usuario.rol) {
        return Ok(());
    }
    Err(ApiError::Prohibido(format!("el rol '{}' no puede realizar esta operación", usuario.rol)))
}

/// Resuelve el dueño del token y exige uno de los roles indicados.
pub async fn exigir_rol(req: &HttpRequest, state: &AppState, permitidos: &[Rol]) -> ApiResult<Usuario> {
    let token = token_de(req)?;
    let ahora = Local::now().naive_local();
    let usuario = state
        .db
        .ejecutar(move |c| db::sesiones::usuario_de_token(c, &token, ahora))
        .await?
        .ok_or_else(|| ApiError::NoAutenticado("sesión inválida o vencida".to_string()))?;
    verificar_rol(&usuario, permitidos)?;
    Ok(usuario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::NaiveDate;

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: 1,
            nombre: "Ana".into(),
            email: "ana@umss.edu.bo".into(),
            password_hash: String::new(),
            rol,
            activo: true,
            creado_en: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn cabecera_ausente_o_invalida_es_401() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(token_de(&req), Err(ApiError::NoAutenticado(_))));

        let req = TestRequest::default().insert_header((AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")).to_http_request();
        assert!(matches!(token_de(&req), Err(ApiError::NoAutenticado(_))));

        let req = TestRequest::default().insert_header((AUTHORIZATION, "Bearer   ")).to_http_request();
        assert!(matches!(token_de(&req), Err(ApiError::NoAutenticado(_))));

        let req = TestRequest::default().insert_header((AUTHORIZATION, "1")).to_http_request();
        assert!(matches!(token_de(&req), Err(ApiError::NoAutenticado(_))));

        let req = TestRequest::default().insert_header((AUTHORIZATION, " bearer abc123 ")).to_http_request();
        assert_eq!(token_de(&req).unwrap(), "abc123");
    }

    #[test]
    fn un_id_en_otra_cabecera_no_identifica() {
        let req = TestRequest::default().insert_header(("X-Usuario-Id", "1")).to_http_request();
        assert!(matches!(token_de(&req), Err(ApiError::NoAutenticado(_))));
    }

    #[test]
    fn administrador_pasa_cualquier_control() {
        assert!(verificar_rol(&usuario(Rol::Administrador), &[Rol::Evaluador]).is_ok());
        assert!(verificar_rol(&usuario(Rol::Coordinador), COORDINACION).is_ok());
        assert!(matches!(verificar_rol(&usuario(Rol::Evaluador), COORDINACION), Err(ApiError::Prohibido(_))));
    }
}
