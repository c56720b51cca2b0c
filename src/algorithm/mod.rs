// Lógica pura del dominio: no toca base de datos ni HTTP.
pub mod certificados;
pub mod choques;
pub mod clasificacion;
pub mod medallero;
pub mod publicacion;

pub use choques::{ChoqueHorario, VentanaEvaluacion, choques_con, validar_choques_horarios};
pub use clasificacion::{ResumenClasificacion, clasificar};
pub use medallero::{SIN_GRADO, calcular_premiados, medallero_de_grado, medallero_por_defecto};
