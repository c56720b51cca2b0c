// Rutas HTTP que responden antes de tocar la base de datos. La base
// configurada apunta a un puerto cerrado a propósito.
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use actix_web::http::header::AUTHORIZATION;
use olimpiada::api::{self, AppState};
use olimpiada::config::Config;

fn estado() -> AppState {
    let config = Config::desde_fuente(|k| match k {
        "DATABASE_URL" => Some("postgres://olimpiada@127.0.0.1:1/olimpiada?connect_timeout=2".to_string()),
        "BITACORA_DB_URL" => Some("sqlite://target/tmp-no-usada/bitacora.db".to_string()),
        "OLIMPIADA_GESTION" => Some("2025".to_string()),
        _ => None,
    })
    .unwrap();
    AppState::new(config)
}

macro_rules! app {
    () => {
        test::init_service(App::new().app_data(web::Data::new(estado())).configure(api::configurar_rutas)).await
    };
}

fn mensaje(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}

#[actix_web::test]
async fn test_help_es_texto_plano() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/help").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let texto = String::from_utf8_lossy(&body);
    assert!(texto.contains("Authorization: Bearer"));
    assert!(texto.contains("/api/evaluaciones/{fase}"));
}

#[actix_web::test]
async fn test_sin_cabecera_de_usuario_es_401() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/evaluaciones/clasificacion")
        .set_json(json!({ "inscripcion_id": 1, "nota": 75.5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert!(mensaje(&body).starts_with("401:"));
}

#[actix_web::test]
async fn test_id_de_usuario_declarado_no_autentica() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/olimpistas/exportar.csv")
        .insert_header(("X-Usuario-Id", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_esquema_distinto_de_bearer_es_401() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/usuarios")
        .insert_header((AUTHORIZATION, "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_sin_token_es_401() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/auth/logout").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_nota_fuera_de_rango_es_400_antes_de_autenticar() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/evaluaciones/final")
        .set_json(json!({ "inscripcion_id": 1, "nota": 150 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(mensaje(&body).starts_with("400:"));
    assert!(mensaje(&body).contains("150"));
}

#[actix_web::test]
async fn test_fase_desconocida_es_400() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/evaluaciones/semifinal")
        .set_json(json!({ "inscripcion_id": 1, "nota": 50 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_json_malformado_usa_el_sobre_de_error() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/exclusiones/descalificacion")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"inscripcion_id\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert!(mensaje(&body).starts_with("400:"));
}

#[actix_web::test]
async fn test_exclusion_sin_motivo_es_400() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/exclusiones/desclasificacion")
        .insert_header((AUTHORIZATION, "Bearer token-de-prueba"))
        .set_json(json!({ "inscripcion_id": 3, "motivo": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_horario_con_hora_invalida_es_400() {
    let app = app!();
    let req = test::TestRequest::put()
        .uri("/api/horarios")
        .set_json(json!({
            "area_id": 1,
            "fase": "clasificacion",
            "fecha": "2025-10-04",
            "hora_inicio": "25:99",
            "duracion_minutos": 90
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_base_caida_responde_500_con_el_sobre() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/areas").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(mensaje(&body).starts_with("500:"));
}
