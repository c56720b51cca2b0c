use olimpiada::algorithm::calcular_premiados;
use olimpiada::models::{CompetidorPuntaje, Medalla, Medallero};

fn competidor(id: i32, grado: Option<&str>, promedio: f64) -> CompetidorPuntaje {
    CompetidorPuntaje {
        inscripcion_id: id,
        olimpista_id: id,
        nombre_completo: format!("Competidor {}", id),
        grado_escolaridad: grado.map(str::to_string),
        promedio,
        evaluaciones: 2,
    }
}

fn medallas(premiados: &[olimpiada::models::Premiado]) -> Vec<Medalla> {
    premiados.iter().map(|p| p.medalla).collect()
}

#[test]
fn test_escenario_cinco_competidores_medallero_por_defecto() {
    let competidores: Vec<_> = [95.0, 90.0, 85.0, 80.0, 75.0]
        .iter()
        .enumerate()
        .map(|(i, p)| competidor(i as i32 + 1, Some("5to"), *p))
        .collect();
    let premiados = calcular_premiados(competidores, &Medallero::default(), |_| None);
    assert_eq!(
        medallas(&premiados),
        vec![Medalla::Oro, Medalla::Plata, Medalla::Bronce, Medalla::SinMedalla, Medalla::SinMedalla]
    );
    assert_eq!(premiados.iter().map(|p| p.posicion).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_orden_total_por_cupos_acumulados() {
    let m = Medallero { oro: 2, plata: 3, bronce: 1, mencion_honor: 2 };
    // entrada desordenada: el resultado sale ordenado por promedio
    let promedios = [40.0, 99.0, 71.5, 88.0, 10.0, 65.0, 93.0, 50.0, 77.0, 81.0];
    let competidores: Vec<_> =
        promedios.iter().enumerate().map(|(i, p)| competidor(i as i32 + 1, Some("3ro"), *p)).collect();
    let premiados = calcular_premiados(competidores, &m, |_| None);

    let (g, s, b, h) = (m.oro, m.plata, m.bronce, m.mencion_honor);
    for (i, p) in premiados.iter().enumerate() {
        let i = i as u32 + 1;
        let esperada = if i <= g {
            Medalla::Oro
        } else if i <= g + s {
            Medalla::Plata
        } else if i <= g + s + b {
            Medalla::Bronce
        } else if i <= g + s + b + h {
            Medalla::MencionHonor
        } else {
            Medalla::SinMedalla
        };
        assert_eq!(p.medalla, esperada, "posición {}", i);
    }
    assert!(premiados.windows(2).all(|w| w[0].promedio >= w[1].promedio));
}

#[test]
fn test_grupo_menor_al_cupo_de_oro() {
    let m = Medallero { oro: 5, plata: 1, bronce: 1, mencion_honor: 0 };
    let competidores = vec![competidor(1, None, 60.0), competidor(2, None, 70.0)];
    let premiados = calcular_premiados(competidores, &m, |_| None);
    assert_eq!(medallas(&premiados), vec![Medalla::Oro, Medalla::Oro]);
}

#[test]
fn test_medallero_por_grado_y_grupo_sin_grado() {
    let competidores = vec![
        competidor(1, Some("6to"), 90.0),
        competidor(2, None, 80.0),
        competidor(3, Some("6to"), 85.0),
        competidor(4, Some("6to"), 70.0),
        competidor(5, Some(" "), 75.0),
    ];
    let sexto = Medallero { oro: 2, plata: 0, bronce: 0, mencion_honor: 1 };
    let premiados = calcular_premiados(competidores, &Medallero::default(), |g| (g == "6to").then_some(sexto));

    // grupos en orden de primera aparición: 6to y luego sin grado
    let ids: Vec<i32> = premiados.iter().map(|p| p.inscripcion_id).collect();
    assert_eq!(ids, vec![1, 3, 4, 2, 5]);
    assert_eq!(
        medallas(&premiados),
        vec![Medalla::Oro, Medalla::Oro, Medalla::MencionHonor, Medalla::Oro, Medalla::Plata]
    );
}

#[test]
fn test_empates_conservan_el_orden_de_entrada() {
    let competidores = vec![competidor(7, None, 80.0), competidor(3, None, 80.0), competidor(9, None, 80.0)];
    let premiados = calcular_premiados(competidores, &Medallero::default(), |_| None);
    let ids: Vec<i32> = premiados.iter().map(|p| p.inscripcion_id).collect();
    assert_eq!(ids, vec![7, 3, 9]);
}

#[test]
fn test_asignacion_es_idempotente() {
    let competidores = vec![
        competidor(1, Some("1ro"), 55.0),
        competidor(2, Some("2do"), 91.0),
        competidor(3, Some("1ro"), 77.0),
        competidor(4, Some("2do"), 64.0),
    ];
    let m = Medallero { oro: 1, plata: 1, bronce: 0, mencion_honor: 1 };
    let primera = calcular_premiados(competidores.clone(), &m, |_| None);
    let segunda = calcular_premiados(competidores, &m, |_| None);
    assert_eq!(primera, segunda);
}

#[test]
fn test_lista_vacia() {
    assert!(calcular_premiados(Vec::new(), &Medallero::default(), |_| None).is_empty());
}
