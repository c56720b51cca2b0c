// Cierre de la fase de clasificación: promedio contra nota mínima.
use serde::Serialize;

use crate::models::{CompetidorPuntaje, EstadoInscripcion};

/// Nota mínima usada cuando ni el área ni la solicitud la fijan.
pub const NOTA_MINIMA_POR_DEFECTO: f64 = 51.0;

pub fn decidir_clasificacion(promedio: f64, nota_minima: f64) -> EstadoInscripcion {
    if promedio >= nota_minima {
        EstadoInscripcion::Clasificado
    } else {
        EstadoInscripcion::NoClasificado
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecisionClasificacion {
    pub inscripcion_id: i32,
    pub promedio: f64,
    pub estado: EstadoInscripcion,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ResumenClasificacion {
    pub nota_minima: f64,
    pub clasificados: usize,
    pub no_clasificados: usize,
    pub decisiones: Vec<DecisionClasificacion>,
}

/// Decide el estado de cada inscripción evaluada. Las que no tienen notas
/// (`evaluaciones == 0`) se dejan fuera y conservan su estado.
pub fn clasificar(puntajes: &[CompetidorPuntaje], nota_minima: f64) -> ResumenClasificacion {
    let mut resumen = ResumenClasificacion { nota_minima, ..Default::default() };
    for p in puntajes.iter().filter(|p| p.evaluaciones > 0) {
        let estado = decidir_clasificacion(p.promedio, nota_minima);
        match estado {
            EstadoInscripcion::Clasificado => resumen.clasificados += 1,
            _ => resumen.no_clasificados += 1,
        }
        resumen.decisiones.push(DecisionClasificacion { inscripcion_id: p.inscripcion_id, promedio: p.promedio, estado });
    }
    resumen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: i32, promedio: f64, evaluaciones: i64) -> CompetidorPuntaje {
        CompetidorPuntaje {
            inscripcion_id: id,
            olimpista_id: id,
            nombre_completo: String::new(),
            grado_escolaridad: None,
            promedio,
            evaluaciones,
        }
    }

    #[test]
    fn limite_inclusivo() {
        assert_eq!(decidir_clasificacion(51.0, 51.0), EstadoInscripcion::Clasificado);
        assert_eq!(decidir_clasificacion(50.99, 51.0), EstadoInscripcion::NoClasificado);
    }

    #[test]
    fn sin_notas_no_se_decide() {
        let r = clasificar(&[p(1, 90.0, 2), p(2, 0.0, 0), p(3, 40.0, 1)], 51.0);
        assert_eq!(r.clasificados, 1);
        assert_eq!(r.no_clasificados, 1);
        assert_eq!(r.decisiones.iter().map(|d| d.inscripcion_id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
