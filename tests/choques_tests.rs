use chrono::NaiveDate;
use olimpiada::algorithm::choques::inicio_desde;
use olimpiada::algorithm::{VentanaEvaluacion, choques_con, validar_choques_horarios};
use olimpiada::models::Fase;

fn ventana(area_id: i32, hora: &str, duracion: i64) -> VentanaEvaluacion {
    let fecha = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
    VentanaEvaluacion {
        area_id,
        nombre_area: format!("Área {}", area_id),
        fase: Fase::Clasificacion,
        inicio: inicio_desde(fecha, hora).unwrap(),
        duracion_minutos: duracion,
    }
}

#[test]
fn test_escenario_solapamiento_parcial() {
    // A 10:00-12:00 y B 11:30-12:30 comparten media hora
    let choques = validar_choques_horarios(&[ventana(1, "10:00", 120), ventana(2, "11:30", 60)]);
    assert_eq!(choques.len(), 1);
    assert_eq!((choques[0].area_a, choques[0].area_b), (1, 2));
    assert_eq!(choques[0].minutos_solapados, 30);
}

#[test]
fn test_ventanas_que_se_tocan_no_chocan() {
    let choques = validar_choques_horarios(&[ventana(1, "08:00", 60), ventana(2, "09:00", 60)]);
    assert!(choques.is_empty());
}

#[test]
fn test_cada_par_una_sola_vez_y_sin_la_misma_area() {
    let ventanas = [
        ventana(1, "09:00", 180),
        ventana(2, "10:00", 60),
        ventana(3, "10:30", 60),
        ventana(1, "10:15", 30),
    ];
    let choques = validar_choques_horarios(&ventanas);
    let pares: Vec<(i32, i32)> = choques.iter().map(|c| (c.area_a, c.area_b)).collect();
    // la segunda ventana del área 1 vuelve a chocar con 2 y 3 en la misma fase
    assert_eq!(pares, vec![(1, 2), (1, 3), (2, 3)]);
    assert!(choques.iter().all(|c| c.area_a < c.area_b));
}

#[test]
fn test_ventanas_de_ambas_fases_no_invierten_el_par() {
    let mut final_area_1 = ventana(1, "10:15", 30);
    final_area_1.fase = Fase::Final;
    let ventanas = [ventana(1, "09:00", 180), ventana(2, "10:00", 60), final_area_1];
    let choques = validar_choques_horarios(&ventanas);
    let pares: Vec<(i32, i32)> = choques.iter().map(|c| (c.area_a, c.area_b)).collect();
    assert_eq!(pares, vec![(1, 2), (1, 2)]);
    assert_eq!((choques[0].fase_a, choques[0].fase_b), (Fase::Clasificacion, Fase::Clasificacion));
    assert_eq!((choques[1].fase_a, choques[1].fase_b), (Fase::Final, Fase::Clasificacion));
    assert_eq!(choques[1].minutos_solapados, 30);
}

#[test]
fn test_simetria() {
    let a = ventana(1, "14:00", 90);
    let b = ventana(2, "15:00", 45);
    assert_eq!(a.se_solapa_con(&b), b.se_solapa_con(&a));
    let ida = validar_choques_horarios(&[a.clone(), b.clone()]);
    let vuelta = validar_choques_horarios(&[b, a]);
    assert_eq!(ida, vuelta);
    assert_eq!((ida[0].area_a, ida[0].area_b), (1, 2));
}

#[test]
fn test_candidata_contra_existentes_ignora_su_area() {
    let existentes = [ventana(1, "10:00", 120), ventana(2, "10:30", 30), ventana(3, "13:00", 60)];
    let candidata = ventana(1, "10:00", 90);
    let choques = choques_con(&candidata, &existentes);
    assert_eq!(choques.len(), 1);
    assert_eq!(choques[0].area_b, 2);
}
