//! Asignación de medallas por grado escolar.
//!
//! Los competidores se agrupan por `grado_escolaridad`; cada grupo se ordena
//! por promedio descendente y se reparte en cubos acumulados: primero los
//! cupos de oro, luego plata, bronce y mención de honor. El resto queda
//! `sin_medalla`. Un grupo más chico que el cupo de oro recibe oro completo,
//! y no hay tope global aunque los cupos sumen más que los participantes.

use std::collections::HashMap;

use crate::models::{CompetidorPuntaje, ConfiguracionMedallero, Medalla, Medallero, Premiado};

/// Clave del grupo de competidores sin grado registrado.
pub const SIN_GRADO: &str = "sin_grado";

impl Medallero {
    /// Medalla que corresponde a la posición `posicion` (1-based) de un
    /// grupo ordenado.
    pub fn medalla_para(&self, posicion: u32) -> Medalla {
        let oro = self.oro as u64;
        let plata = oro + self.plata as u64;
        let bronce = plata + self.bronce as u64;
        let mencion = bronce + self.mencion_honor as u64;
        let p = posicion as u64;
        if p == 0 {
            Medalla::SinMedalla
        } else if p <= oro {
            Medalla::Oro
        } else if p <= plata {
            Medalla::Plata
        } else if p <= bronce {
            Medalla::Bronce
        } else if p <= mencion {
            Medalla::MencionHonor
        } else {
            Medalla::SinMedalla
        }
    }
}

fn clave_grado(grado: Option<&str>) -> String {
    match grado.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => SIN_GRADO.to_string(),
    }
}

/// Calcula la medalla de cada competidor.
///
/// `buscar_por_grado` recibe el grado del grupo y devuelve su medallero
/// específico si existe; si no, se usa `por_defecto`. El grupo `sin_grado`
/// siempre usa `por_defecto`.
///
/// Los empates conservan el orden de entrada (ordenamiento estable), así que
/// quien llama decide el desempate ordenando la entrada.
pub fn calcular_premiados<F>(competidores: Vec<CompetidorPuntaje>, por_defecto: &Medallero, buscar_por_grado: F) -> Vec<Premiado>
where
    F: Fn(&str) -> Option<Medallero>,
{
    // grupos en orden de primera aparición
    let mut orden: Vec<String> = Vec::new();
    let mut grupos: HashMap<String, Vec<CompetidorPuntaje>> = HashMap::new();
    for c in competidores {
        let clave = clave_grado(c.grado_escolaridad.as_deref());
        if !grupos.contains_key(&clave) {
            orden.push(clave.clone());
        }
        grupos.entry(clave).or_default().push(c);
    }

    let mut resultado: Vec<Premiado> = Vec::new();
    for clave in orden {
        let Some(mut grupo) = grupos.remove(&clave) else { continue };
        let medallero = if clave == SIN_GRADO {
            *por_defecto
        } else {
            buscar_por_grado(&clave).unwrap_or(*por_defecto)
        };

        grupo.sort_by(|a, b| b.promedio.total_cmp(&a.promedio));

        for (i, c) in grupo.into_iter().enumerate() {
            let posicion = (i + 1) as u32;
            resultado.push(Premiado {
                inscripcion_id: c.inscripcion_id,
                olimpista_id: c.olimpista_id,
                nombre_completo: c.nombre_completo,
                grado_escolaridad: c.grado_escolaridad,
                promedio: c.promedio,
                posicion,
                medalla: medallero.medalla_para(posicion),
            });
        }
    }
    resultado
}

/// Medallero por defecto de un área/nivel a partir de las configuraciones
/// cargadas: (área, nivel, sin grado) → (área, cualquier nivel, sin grado) →
/// 1/1/1/0.
pub fn medallero_por_defecto(configs: &[ConfiguracionMedallero], area_id: i32, nivel_id: Option<i32>) -> Medallero {
    let sin_grado = |c: &&ConfiguracionMedallero| c.area_id == area_id && c.grado_escolaridad.is_none();
    if let Some(n) = nivel_id {
        if let Some(c) = configs.iter().filter(sin_grado).find(|c| c.nivel_id == Some(n)) {
            return c.medallero;
        }
    }
    configs
        .iter()
        .filter(sin_grado)
        .find(|c| c.nivel_id.is_none())
        .map(|c| c.medallero)
        .unwrap_or_default()
}

/// Medallero específico de un grado: primero con el nivel exacto, luego el
/// que aplica a todos los niveles del área.
pub fn medallero_de_grado(
    configs: &[ConfiguracionMedallero],
    area_id: i32,
    nivel_id: Option<i32>,
    grado: &str,
) -> Option<Medallero> {
    let mismo_grado = |c: &&ConfiguracionMedallero| {
        c.area_id == area_id
            && c.grado_escolaridad.as_deref().map(|g| g.trim().eq_ignore_ascii_case(grado.trim())).unwrap_or(false)
    };
    if let Some(n) = nivel_id {
        if let Some(c) = configs.iter().filter(mismo_grado).find(|c| c.nivel_id == Some(n)) {
            return Some(c.medallero);
        }
    }
    configs.iter().filter(mismo_grado).find(|c| c.nivel_id.is_none()).map(|c| c.medallero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(id: i32, grado: Option<&str>, promedio: f64) -> CompetidorPuntaje {
        CompetidorPuntaje {
            inscripcion_id: id,
            olimpista_id: 100 + id,
            nombre_completo: format!("Olimpista {}", id),
            grado_escolaridad: grado.map(str::to_string),
            promedio,
            evaluaciones: 1,
        }
    }

    #[test]
    fn umbrales_acumulados() {
        let m = Medallero { oro: 2, plata: 1, bronce: 0, mencion_honor: 2 };
        let obtenidas: Vec<Medalla> = (1..=6).map(|p| m.medalla_para(p)).collect();
        assert_eq!(
            obtenidas,
            vec![
                Medalla::Oro,
                Medalla::Oro,
                Medalla::Plata,
                Medalla::MencionHonor,
                Medalla::MencionHonor,
                Medalla::SinMedalla
            ]
        );
    }

    #[test]
    fn grupo_mas_chico_que_el_cupo_de_oro() {
        let m = Medallero { oro: 5, plata: 1, bronce: 1, mencion_honor: 0 };
        let r = calcular_premiados(vec![comp(1, Some("5to"), 70.0), comp(2, Some("5to"), 60.0)], &m, |_| None);
        assert!(r.iter().all(|p| p.medalla == Medalla::Oro));
    }

    #[test]
    fn grupos_en_orden_de_aparicion_y_sin_grado() {
        let entrada = vec![comp(1, Some("6to"), 50.0), comp(2, None, 99.0), comp(3, Some("6to"), 80.0), comp(4, Some(""), 10.0)];
        let r = calcular_premiados(entrada, &Medallero::default(), |_| None);
        let ids: Vec<i32> = r.iter().map(|p| p.inscripcion_id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
        assert_eq!(r[2].posicion, 1);
        assert_eq!(r[3].medalla, Medalla::Plata);
    }

    #[test]
    fn resolucion_de_configuraciones() {
        let cfg = |id, nivel, grado: Option<&str>, oro| ConfiguracionMedallero {
            id,
            area_id: 1,
            nivel_id: nivel,
            grado_escolaridad: grado.map(str::to_string),
            medallero: Medallero { oro, plata: 0, bronce: 0, mencion_honor: 0 },
        };
        let configs = vec![cfg(1, None, None, 2), cfg(2, Some(3), None, 4), cfg(3, None, Some("5to"), 6), cfg(4, Some(3), Some("5to"), 8)];

        assert_eq!(medallero_por_defecto(&configs, 1, Some(3)).oro, 4);
        assert_eq!(medallero_por_defecto(&configs, 1, Some(9)).oro, 2);
        assert_eq!(medallero_por_defecto(&configs, 2, None), Medallero::default());
        assert_eq!(medallero_de_grado(&configs, 1, Some(3), "5TO").map(|m| m.oro), Some(8));
        assert_eq!(medallero_de_grado(&configs, 1, Some(7), "5to").map(|m| m.oro), Some(6));
        assert_eq!(medallero_de_grado(&configs, 1, Some(3), "6to"), None);
    }
}
