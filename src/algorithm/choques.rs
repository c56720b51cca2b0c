// Detección de choques entre ventanas de evaluación de distintas áreas y
// parseo de horas "HH:MM".
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashSet;
use serde::Serialize;

use crate::models::{ConfiguracionAreaEvaluacion, Fase};

/// Convierte "HH:MM" (o "HH.MM", "H:MM") a minutos desde medianoche.
pub fn hora_a_minutos(t: &str) -> Option<u32> {
    let mut tok = t.trim().replace('.', ":");
    if tok.len() == 4 && tok.chars().all(|c| c.is_ascii_digit()) {
        tok = format!("{}:{}", &tok[..2], &tok[2..]);
    }
    let (hh, mm) = tok.split_once(':')?;
    let hh = hh.trim().parse::<u32>().ok()?;
    let mm = mm.trim().parse::<u32>().ok()?;
    if hh > 23 || mm > 59 {
        return None;
    }
    Some(hh * 60 + mm)
}

/// Fecha + "HH:MM" a un instante local.
pub fn inicio_desde(fecha: NaiveDate, hora: &str) -> Option<NaiveDateTime> {
    let minutos = hora_a_minutos(hora)?;
    let t = NaiveTime::from_hms_opt(minutos / 60, minutos % 60, 0)?;
    Some(fecha.and_time(t))
}

/// Intervalo `[inicio, inicio + duración)` de un área en una fase.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VentanaEvaluacion {
    pub area_id: i32,
    pub nombre_area: String,
    pub fase: Fase,
    pub inicio: NaiveDateTime,
    pub duracion_minutos: i64,
}

impl VentanaEvaluacion {
    pub fn fin(&self) -> NaiveDateTime {
        self.inicio + Duration::minutes(self.duracion_minutos)
    }

    /// Solapamiento estricto: dos ventanas que sólo se tocan no chocan.
    pub fn se_solapa_con(&self, otra: &VentanaEvaluacion) -> bool {
        self.inicio < otra.fin() && otra.inicio < self.fin()
    }
}

impl From<&ConfiguracionAreaEvaluacion> for VentanaEvaluacion {
    fn from(c: &ConfiguracionAreaEvaluacion) -> Self {
        VentanaEvaluacion {
            area_id: c.area_id,
            nombre_area: c.nombre_area.clone(),
            fase: c.fase,
            inicio: c.fecha_inicio,
            duracion_minutos: c.duracion_minutos as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChoqueHorario {
    pub area_a: i32,
    pub nombre_area_a: String,
    pub fase_a: Fase,
    pub inicio_a: NaiveDateTime,
    pub fin_a: NaiveDateTime,
    pub area_b: i32,
    pub nombre_area_b: String,
    pub fase_b: Fase,
    pub inicio_b: NaiveDateTime,
    pub fin_b: NaiveDateTime,
    pub minutos_solapados: i64,
}

/// Choque entre dos ventanas con el área de menor id como `area_a`, así el
/// par (A, B) se reporta igual sin importar el orden de la entrada.
fn choque_entre(a: &VentanaEvaluacion, b: &VentanaEvaluacion) -> ChoqueHorario {
    let (a, b) = if b.area_id < a.area_id { (b, a) } else { (a, b) };
    let desde = a.inicio.max(b.inicio);
    let hasta = a.fin().min(b.fin());
    ChoqueHorario {
        area_a: a.area_id,
        nombre_area_a: a.nombre_area.clone(),
        fase_a: a.fase,
        inicio_a: a.inicio,
        fin_a: a.fin(),
        area_b: b.area_id,
        nombre_area_b: b.nombre_area.clone(),
        fase_b: b.fase,
        inicio_b: b.inicio,
        fin_b: b.fin(),
        minutos_solapados: (hasta - desde).num_minutes(),
    }
}

/// Pares de áreas distintas cuyas ventanas se solapan. Cada choque sale con
/// `area_a < area_b` y una sola vez por (área a, área b, fase a, fase b):
/// si un área tiene varias ventanas en la misma fase se conserva el primer
/// solapamiento encontrado.
pub fn validar_choques_horarios(ventanas: &[VentanaEvaluacion]) -> Vec<ChoqueHorario> {
    let mut vistos: HashSet<(i32, i32, Fase, Fase)> = HashSet::new();
    let mut choques = Vec::new();
    for (i, a) in ventanas.iter().enumerate() {
        for b in ventanas.iter().skip(i + 1) {
            if a.area_id == b.area_id || !a.se_solapa_con(b) {
                continue;
            }
            let choque = choque_entre(a, b);
            if vistos.insert((choque.area_a, choque.area_b, choque.fase_a, choque.fase_b)) {
                choques.push(choque);
            }
        }
    }
    choques
}

/// Choques de una ventana candidata contra las ya configuradas. Las ventanas
/// de la misma área se ignoran (la candidata las reemplaza o convive con
/// ellas en otra fase).
pub fn choques_con(candidata: &VentanaEvaluacion, existentes: &[VentanaEvaluacion]) -> Vec<ChoqueHorario> {
    existentes
        .iter()
        .filter(|e| e.area_id != candidata.area_id && candidata.se_solapa_con(e))
        .map(|e| choque_entre(candidata, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hora_a_minutos() {
        assert_eq!(hora_a_minutos("08:30"), Some(510));
        assert_eq!(hora_a_minutos("8.05"), Some(485));
        assert_eq!(hora_a_minutos("1400"), Some(840));
        assert_eq!(hora_a_minutos("23:59"), Some(1439));
        assert_eq!(hora_a_minutos("24:00"), None);
        assert_eq!(hora_a_minutos("mediodía"), None);
    }

    #[test]
    fn inicio_combina_fecha_y_hora() {
        let f = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let esperado = f.and_hms_opt(9, 15, 0).unwrap();
        assert_eq!(inicio_desde(f, "09:15"), Some(esperado));
        assert_eq!(inicio_desde(f, "9-15"), None);
    }
}
