// Biblioteca raíz del crate `olimpiada`: backend de gestión de la olimpiada
// científica (inscripciones, evaluación, medallero y publicación).
pub mod algorithm;
pub mod api;
pub mod bitacora;
pub mod config;
pub mod db;
pub mod error;
pub mod importacion;
pub mod models;
pub mod respuesta;
pub mod server;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
