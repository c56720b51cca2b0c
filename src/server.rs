// Arranque del servidor HTTP.
use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, middleware, web};

use crate::api::{self, AppState};
use crate::bitacora;
use crate::config::Config;

fn cors(origenes: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .max_age(3600);
    if origenes.is_empty() {
        return base.allow_any_origin();
    }
    origenes.iter().fold(base, |cors, origen| cors.allowed_origin(origen))
}

/// Crea las tablas de la base principal y de la bitácora. Un fallo sólo se
/// registra: el servidor arranca igual y las rutas devolverán 500.
async fn preparar_esquemas(state: &AppState) {
    if state.config.inicializar_esquema {
        match state.db.ejecutar(|c| crate::db::init_db(c)).await {
            Ok(()) => tracing::info!("esquema de la base principal verificado"),
            Err(e) => tracing::warn!("no se pudo inicializar la base principal: {}", e),
        }
    }
    match bitacora::con_conexion(state.bitacora_url.clone(), |conn| bitacora::init_db(conn)).await {
        Ok(()) => tracing::info!(url = %state.bitacora_url, "bitácora lista"),
        Err(e) => tracing::warn!("no se pudo inicializar la bitácora: {}", e),
    }
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind = config.bind.clone();
    let origenes = config.cors_origenes.clone();
    let state = AppState::new(config);
    preparar_esquemas(&state).await;

    tracing::info!(
        bind = %bind,
        gestion = state.config.gestion,
        max_conexiones = state.config.max_conexiones,
        "iniciando servidor"
    );
    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors(&origenes))
            .app_data(data.clone())
            .configure(api::configurar_rutas)
    })
    .bind(bind.as_str())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn preflight_admite_la_cabecera_de_autorizacion() {
        let app = test::init_service(App::new().wrap(cors(&[])).configure(api::configurar_rutas)).await;
        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/areas")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
