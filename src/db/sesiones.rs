// Sesiones del personal: token opaco entregado en el login. En la base sólo
// se guarda su sha256, así una copia de la tabla no sirve para entrar.
use chrono::{Duration, Local, NaiveDateTime};
use postgres::GenericClient;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::usuarios;
use crate::error::ApiResult;
use crate::models::{Sesion, Usuario};

const BYTES_TOKEN: usize = 32;

/// 32 bytes del generador del sistema, en hex.
pub fn nuevo_token() -> String {
    let mut bytes = [0u8; BYTES_TOKEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

/// Abre una sesión para el usuario y de paso borra sus sesiones vencidas.
pub fn abrir(c: &mut impl GenericClient, usuario: Usuario, duracion_horas: i64) -> ApiResult<Sesion> {
    let ahora = Local::now().naive_local();
    let expira_en = ahora + Duration::hours(duracion_horas);
    let token = nuevo_token();
    c.execute("DELETE FROM sesiones WHERE usuario_id = $1 AND expira_en <= $2", &[&usuario.id, &ahora])?;
    c.execute(
        "INSERT INTO sesiones (token_hash, usuario_id, creada_en, expira_en) VALUES ($1, $2, $3, $4)",
        &[&hash_token(&token), &usuario.id, &ahora, &expira_en],
    )?;
    Ok(Sesion { token, expira_en, usuario })
}

/// Usuario activo dueño de un token vigente en `ahora`.
pub fn usuario_de_token(c: &mut impl GenericClient, token: &str, ahora: NaiveDateTime) -> ApiResult<Option<Usuario>> {
    let row = c.query_opt(
        "SELECT s.usuario_id FROM sesiones s
         JOIN users u ON u.id = s.usuario_id
         WHERE s.token_hash = $1 AND s.expira_en > $2 AND u.activo",
        &[&hash_token(token), &ahora],
    )?;
    match row {
        Some(r) => {
            let id: i32 = r.try_get("usuario_id")?;
            usuarios::buscar(c, id)
        }
        None => Ok(None),
    }
}

/// Cierra una sesión. Devuelve si existía.
pub fn cerrar(c: &mut impl GenericClient, token: &str) -> ApiResult<bool> {
    let n = c.execute("DELETE FROM sesiones WHERE token_hash = $1", &[&hash_token(token)])?;
    Ok(n > 0)
}

pub fn cerrar_de_usuario(c: &mut impl GenericClient, usuario_id: i32) -> ApiResult<u64> {
    Ok(c.execute("DELETE FROM sesiones WHERE usuario_id = $1", &[&usuario_id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_distintos_y_en_hex() {
        let a = nuevo_token();
        let b = nuevo_token();
        assert_eq!(a.len(), BYTES_TOKEN * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_del_token_no_es_el_token() {
        let t = nuevo_token();
        assert_ne!(hash_token(&t), t);
        assert_eq!(hash_token(&t), hash_token(&format!(" {} ", t)));
    }
}
