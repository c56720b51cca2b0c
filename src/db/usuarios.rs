// Usuarios del personal y asignación de evaluadores a áreas.
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Local;
use postgres::{GenericClient, Row};
use rand_core::OsRng;

use super::columna_enum;
use crate::error::{ApiError, ApiResult};
use crate::models::{ActualizarUsuario, AsignacionArea, NuevoUsuario, Rol, Usuario};

const COLUMNAS: &str = "id, nombre, email, password_hash, rol, activo, creado_en";

/// Hash Argon2id con sal aleatoria, en formato PHC (`$argon2id$...`).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let sal = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &sal)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Interno(format!("no se pudo derivar la contraseña: {}", e)))
}

/// Un hash guardado que no se puede leer cuenta como contraseña incorrecta.
pub fn verificar_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(h) => Argon2::default().verify_password(password.as_bytes(), &h).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "hash de contraseña ilegible");
            false
        }
    }
}

fn desde_fila(row: &Row) -> ApiResult<Usuario> {
    Ok(Usuario {
        id: row.try_get("id")?,
        nombre: row.try_get("nombre")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        rol: columna_enum(row, "rol")?,
        activo: row.try_get("activo")?,
        creado_en: row.try_get("creado_en")?,
    })
}

pub fn crear(c: &mut impl GenericClient, datos: &NuevoUsuario) -> ApiResult<Usuario> {
    let email = datos.email.trim().to_lowercase();
    let sql = format!(
        "INSERT INTO users (nombre, email, password_hash, rol, creado_en)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        COLUMNAS
    );
    let row = c.query_one(
        sql.as_str(),
        &[
            &datos.nombre.trim(),
            &email,
            &hash_password(&datos.password)?,
            &datos.rol.as_str(),
            &Local::now().naive_local(),
        ],
    )?;
    desde_fila(&row)
}

pub fn actualizar(c: &mut impl GenericClient, id: i32, datos: &ActualizarUsuario) -> ApiResult<Usuario> {
    let actual = buscar(c, id)?.ok_or_else(|| ApiError::no_encontrado("Usuario", id))?;
    let email = datos.email.as_deref().map(|e| e.trim().to_lowercase()).unwrap_or_else(|| actual.email.clone());

    let password_hash = match &datos.password {
        Some(p) => hash_password(p)?,
        None => actual.password_hash.clone(),
    };

    let sql = format!(
        "UPDATE users SET
            nombre = COALESCE($2, nombre),
            email = $3,
            password_hash = $4,
            rol = COALESCE($5, rol),
            activo = COALESCE($6, activo)
         WHERE id = $1
         RETURNING {}",
        COLUMNAS
    );
    let rol = datos.rol.map(|r| r.as_str());
    let row = c.query_one(sql.as_str(), &[&id, &datos.nombre, &email, &password_hash, &rol, &datos.activo])?;
    // otra contraseña o la baja invalidan las sesiones abiertas
    if datos.password.is_some() || datos.activo == Some(false) {
        super::sesiones::cerrar_de_usuario(c, id)?;
    }
    desde_fila(&row)
}

pub fn buscar(c: &mut impl GenericClient, id: i32) -> ApiResult<Option<Usuario>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&id])?;
    row.as_ref().map(desde_fila).transpose()
}

pub fn listar(c: &mut impl GenericClient, rol: Option<Rol>) -> ApiResult<Vec<Usuario>> {
    let rol = rol.map(|r| r.as_str());
    let sql = format!("SELECT {} FROM users WHERE ($1::TEXT IS NULL OR rol = $1) ORDER BY nombre", COLUMNAS);
    let rows = c.query(sql.as_str(), &[&rol])?;
    rows.iter().map(desde_fila).collect()
}

/// Usuario activo con esas credenciales, si existe.
pub fn login(c: &mut impl GenericClient, email: &str, password: &str) -> ApiResult<Option<Usuario>> {
    let email = email.trim().to_lowercase();
    let sql = format!("SELECT {} FROM users WHERE email = $1 AND activo", COLUMNAS);
    let row = c.query_opt(sql.as_str(), &[&email])?;
    let usuario = match row {
        Some(r) => desde_fila(&r)?,
        None => return Ok(None),
    };
    if verificar_password(&usuario.password_hash, password) {
        Ok(Some(usuario))
    } else {
        Ok(None)
    }
}

/// Reemplaza las áreas asignadas a un evaluador.
pub fn asignar_areas(c: &mut impl GenericClient, usuario_id: i32, areas: &[AsignacionArea]) -> ApiResult<Vec<AsignacionArea>> {
    let usuario = buscar(c, usuario_id)?.ok_or_else(|| ApiError::no_encontrado("Usuario", usuario_id))?;
    if usuario.rol != Rol::Evaluador {
        return Err(ApiError::validacion(format!(
            "solo se asignan áreas a evaluadores (el usuario {} es {})",
            usuario_id, usuario.rol
        )));
    }
    c.execute("DELETE FROM evaluadores_areas WHERE usuario_id = $1", &[&usuario_id])?;
    for a in areas {
        c.execute(
            "INSERT INTO evaluadores_areas (usuario_id, area_id, nivel_id) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
            &[&usuario_id, &a.area_id, &a.nivel_id],
        )?;
    }
    areas_asignadas(c, usuario_id)
}

pub fn areas_asignadas(c: &mut impl GenericClient, usuario_id: i32) -> ApiResult<Vec<AsignacionArea>> {
    let rows = c.query(
        "SELECT area_id, nivel_id FROM evaluadores_areas WHERE usuario_id = $1 ORDER BY area_id, nivel_id",
        &[&usuario_id],
    )?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(AsignacionArea { area_id: r.try_get("area_id")?, nivel_id: r.try_get("nivel_id")? });
    }
    Ok(out)
}

/// Una asignación sin nivel cubre todos los niveles del área.
pub fn evaluador_asignado(c: &mut impl GenericClient, usuario_id: i32, area_id: i32, nivel_id: i32) -> ApiResult<bool> {
    let row = c.query_one(
        "SELECT EXISTS (
            SELECT 1 FROM evaluadores_areas
            WHERE usuario_id = $1 AND area_id = $2 AND (nivel_id IS NULL OR nivel_id = $3)
         ) AS asignado",
        &[&usuario_id, &area_id, &nivel_id],
    )?;
    Ok(row.try_get("asignado")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_argon2id_con_sal_propia() {
        let a = hash_password("secreta123").unwrap();
        let b = hash_password("secreta123").unwrap();
        assert!(a.starts_with("$argon2id$"), "{}", a);
        assert_ne!(a, b);
        assert!(verificar_password(&a, "secreta123"));
        assert!(verificar_password(&b, "secreta123"));
        assert!(!verificar_password(&a, "secreta124"));
    }

    #[test]
    fn hash_ilegible_no_autentica() {
        let viejo = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";
        assert!(!verificar_password(viejo, "password"));
    }
}
