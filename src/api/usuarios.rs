// Personal: login, altas, roles, carga masiva y áreas de evaluadores.
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use serde_json::json;

use super::auth::{SOLO_ADMIN, exigir_rol, token_de};
use super::{AppState, csv_adjunto, leer_archivo};
use crate::bitacora::{self, EntradaBitacora};
use crate::db::{sesiones, usuarios};
use crate::error::{ApiError, ApiResult};
use crate::importacion::{self, ErrorFila};
use crate::models::{ActualizarUsuario, AsignarAreasEntrada, FiltroUsuarios, LoginEntrada, NuevoUsuario, Rol, Usuario};
use crate::respuesta;

#[derive(Debug, Serialize, Default)]
pub struct ResumenCargaUsuarios {
    pub filas_leidas: usize,
    pub creados: Vec<Usuario>,
    pub errores: Vec<ErrorFila>,
}

/// Valida las credenciales y abre una sesión. El token devuelto va en
/// `Authorization: Bearer <token>` en las rutas del personal.
pub async fn login_handler(state: web::Data<AppState>, body: web::Json<LoginEntrada>) -> ApiResult<HttpResponse> {
    let LoginEntrada { email, password } = body.into_inner();
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validacion("email y contraseña son obligatorios"));
    }
    let intento = email.clone();
    let horas = state.config.duracion_sesion_horas;
    let sesion = state
        .db
        .transaccion(move |tx| match usuarios::login(tx, &intento, &password)? {
            Some(u) => sesiones::abrir(tx, u, horas).map(Some),
            None => Ok(None),
        })
        .await?;
    match sesion {
        Some(s) => {
            tracing::info!(usuario_id = s.usuario.id, rol = %s.usuario.rol, expira_en = %s.expira_en, "inicio de sesión");
            Ok(respuesta::ok_con_mensaje(s, "sesión iniciada"))
        }
        None => {
            tracing::warn!(email = %email.trim(), "credenciales inválidas");
            Err(ApiError::NoAutenticado("credenciales inválidas".to_string()))
        }
    }
}

pub async fn logout_handler(req: HttpRequest, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let token = token_de(&req)?;
    let cerrada = state.db.ejecutar(move |c| sesiones::cerrar(c, &token)).await?;
    if !cerrada {
        return Err(ApiError::NoAutenticado("sesión inválida o vencida".to_string()));
    }
    Ok(respuesta::ok_con_mensaje(json!({ "cerrada": true }), "sesión cerrada"))
}

pub async fn listar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FiltroUsuarios>,
) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let rol = query.rol;
    let lista = state.db.ejecutar(move |c| usuarios::listar(c, rol)).await?;
    Ok(respuesta::ok(lista))
}

pub async fn crear_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NuevoUsuario>,
) -> ApiResult<HttpResponse> {
    let datos = body.into_inner();
    datos.validar()?;
    let admin = exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let usuario = state.db.ejecutar(move |c| usuarios::crear(c, &datos)).await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("crear_usuario", "usuarios")
            .usuario(admin.id)
            .id(usuario.id)
            .detalle(json!({ "email": usuario.email, "rol": usuario.rol })),
    )
    .await;
    Ok(respuesta::creado(usuario, "usuario creado"))
}

/// Un usuario puede consultar su propia ficha; la de otros sólo el administrador.
pub async fn obtener_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let actual = exigir_rol(&req, &state, &[Rol::Coordinador, Rol::Evaluador]).await?;
    if actual.id != id && actual.rol != Rol::Administrador {
        return Err(ApiError::Prohibido("sólo el administrador consulta otros usuarios".to_string()));
    }
    let usuario = state
        .db
        .ejecutar(move |c| usuarios::buscar(c, id))
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Usuario", id))?;
    Ok(respuesta::ok(usuario))
}

pub async fn actualizar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<ActualizarUsuario>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let datos = body.into_inner();
    datos.validar()?;
    let admin = exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let detalle = json!({ "rol": datos.rol, "activo": datos.activo, "cambia_password": datos.password.is_some() });
    let usuario = state.db.ejecutar(move |c| usuarios::actualizar(c, id, &datos)).await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("actualizar_usuario", "usuarios").usuario(admin.id).id(id).detalle(detalle),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(usuario, "usuario actualizado"))
}

pub async fn areas_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let actual = exigir_rol(&req, &state, &[Rol::Coordinador, Rol::Evaluador]).await?;
    if actual.rol == Rol::Evaluador && actual.id != id {
        return Err(ApiError::Prohibido("un evaluador sólo consulta sus propias áreas".to_string()));
    }
    let areas = state.db.ejecutar(move |c| usuarios::areas_asignadas(c, id)).await?;
    Ok(respuesta::ok(areas))
}

pub async fn asignar_areas_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<AsignarAreasEntrada>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let AsignarAreasEntrada { areas } = body.into_inner();
    let actual = exigir_rol(&req, &state, &[Rol::Coordinador]).await?;
    let asignadas = state.db.transaccion(move |tx| usuarios::asignar_areas(tx, id, &areas)).await?;

    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("asignar_areas", "usuarios")
            .usuario(actual.id)
            .id(id)
            .detalle(serde_json::to_value(&asignadas)?),
    )
    .await;
    Ok(respuesta::ok_con_mensaje(asignadas, "áreas asignadas"))
}

pub async fn plantilla_handler(req: HttpRequest, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    exigir_rol(&req, &state, SOLO_ADMIN).await?;
    Ok(csv_adjunto("plantilla_usuarios.csv", importacion::usuarios::plantilla_csv()?))
}

/// Carga masiva: cada fila válida se crea por separado, así un email ya
/// registrado sólo invalida su fila.
pub async fn importar_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let admin = exigir_rol(&req, &state, SOLO_ADMIN).await?;
    let (nombre_archivo, bytes) = leer_archivo(payload).await?;

    let archivo = nombre_archivo.clone();
    let resumen = state
        .db
        .ejecutar(move |c| {
            let tabla = importacion::leer_tabla(&archivo, &bytes)?;
            let (validas, mut errores) = importacion::usuarios::validar_filas(&tabla)?;
            let mut creados = Vec::with_capacity(validas.len());
            for (fila, nuevo) in validas {
                match usuarios::crear(c, &nuevo) {
                    Ok(u) => creados.push(u),
                    Err(ApiError::Conflicto(_)) => errores.push(ErrorFila {
                        fila,
                        documento: Some(nuevo.email.clone()),
                        motivo: "el email ya está registrado".to_string(),
                    }),
                    Err(e) => return Err(e),
                }
            }
            errores.sort_by_key(|e| e.fila);
            Ok(ResumenCargaUsuarios { filas_leidas: tabla.len().saturating_sub(1), creados, errores })
        })
        .await?;

    tracing::info!(archivo = %nombre_archivo, creados = resumen.creados.len(), errores = resumen.errores.len(), "usuarios importados");
    bitacora::anotar(
        &state.bitacora_url,
        EntradaBitacora::new("importar_usuarios", "usuarios").usuario(admin.id).detalle(json!({
            "archivo": nombre_archivo,
            "creados": resumen.creados.len(),
            "errores": resumen.errores.len(),
        })),
    )
    .await;
    let mensaje = format!("{} usuarios creados, {} filas con error", resumen.creados.len(), resumen.errores.len());
    Ok(respuesta::ok_con_mensaje(resumen, mensaje))
}
