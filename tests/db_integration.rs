// Recorrido completo contra PostgreSQL. Sólo corre si se define
// OLIMPIADA_TEST_DATABASE_URL; todo ocurre en una transacción que no se
// confirma, así la base queda como estaba.
use olimpiada::db::{
    self, Db, catalogos, evaluaciones, exclusiones, inscripciones, medallero, olimpistas, publicacion, resultados,
    sesiones, usuarios,
};
use olimpiada::error::ApiError;
use olimpiada::models::*;

const GESTION: i32 = 2099;

fn url_de_pruebas() -> Option<String> {
    std::env::var("OLIMPIADA_TEST_DATABASE_URL").ok().filter(|u| !u.trim().is_empty())
}

fn olimpista(sufijo: &str, n: u32) -> NuevoOlimpista {
    NuevoOlimpista {
        nombres: format!("Olimpista {}", n),
        apellidos: "De Prueba".to_string(),
        documento: format!("T{}-{}", sufijo, n),
        fecha_nacimiento: None,
        email: None,
        telefono: None,
        grado_escolaridad: Some("5to".to_string()),
        departamento: Some("Cochabamba".to_string()),
        unidad_educativa_id: None,
        tutor_legal_id: None,
    }
}

fn nota(inscripcion_id: i32, nota: f64) -> NotaEntrada {
    NotaEntrada { inscripcion_id, nota, observaciones: None }
}

#[test]
fn test_flujo_completo_de_una_gestion() {
    let Some(url) = url_de_pruebas() else {
        eprintln!("OLIMPIADA_TEST_DATABASE_URL no definida; se omite");
        return;
    };
    let base = Db::new(url, 1);
    let mut client = base.conectar().unwrap();
    db::init_db(&mut client).unwrap();
    let mut tx = client.transaction().unwrap();
    let sufijo = format!("{}{}", std::process::id(), chrono::Local::now().timestamp_millis());

    // catálogos e inscripciones
    let area = catalogos::crear_area(
        &mut tx,
        &NuevaArea { nombre: format!("Robótica {}", sufijo), descripcion: None, nota_minima_clasificacion: Some(60.0) },
    )
    .unwrap();
    let nivel = catalogos::crear_nivel(&mut tx, &NuevoNivel { nombre: format!("Nivel {}", sufijo), descripcion: None })
        .unwrap();
    let mut ids = Vec::new();
    for n in 1..=3 {
        let o = olimpistas::crear(&mut tx, &olimpista(&sufijo, n)).unwrap();
        let i = inscripciones::crear(
            &mut tx,
            &NuevaInscripcion {
                olimpista_id: o.id,
                area_id: area.id,
                nivel_id: nivel.id,
                es_grupal: false,
                nombre_grupo: None,
                gestion: Some(GESTION),
            },
            GESTION,
        )
        .unwrap();
        assert_eq!(i.estado, EstadoInscripcion::Inscrito);
        ids.push(i.id);
    }
    let (i1, i2, i3) = (ids[0], ids[1], ids[2]);

    // evaluadores
    let evaluador = usuarios::crear(
        &mut tx,
        &NuevoUsuario {
            nombre: "Evaluadora".into(),
            email: format!("eval{}@prueba.bo", sufijo),
            password: "secreta123".into(),
            rol: Rol::Evaluador,
        },
    )
    .unwrap();
    usuarios::asignar_areas(&mut tx, evaluador.id, &[AsignacionArea { area_id: area.id, nivel_id: None }]).unwrap();
    let sin_areas = usuarios::crear(
        &mut tx,
        &NuevoUsuario {
            nombre: "Sin áreas".into(),
            email: format!("libre{}@prueba.bo", sufijo),
            password: "secreta123".into(),
            rol: Rol::Evaluador,
        },
    )
    .unwrap();
    assert!(usuarios::login(&mut tx, &evaluador.email, "secreta123").unwrap().is_some());
    assert!(usuarios::login(&mut tx, &evaluador.email, "otra-clave").unwrap().is_none());
    assert!(evaluador.password_hash.starts_with("$argon2id$"));

    // sesiones: el token resuelve al usuario hasta que vence o se cierra
    let ahora = chrono::Local::now().naive_local();
    let sesion = sesiones::abrir(&mut tx, evaluador.clone(), 1).unwrap();
    let dueno = sesiones::usuario_de_token(&mut tx, &sesion.token, ahora).unwrap();
    assert_eq!(dueno.map(|u| u.id), Some(evaluador.id));
    assert!(sesiones::usuario_de_token(&mut tx, &sesion.token, sesion.expira_en).unwrap().is_none());
    assert!(sesiones::usuario_de_token(&mut tx, &sesiones::nuevo_token(), ahora).unwrap().is_none());
    assert!(sesiones::cerrar(&mut tx, &sesion.token).unwrap());
    assert!(sesiones::usuario_de_token(&mut tx, &sesion.token, ahora).unwrap().is_none());

    // cambiar la contraseña invalida las sesiones abiertas
    let otra = sesiones::abrir(&mut tx, sin_areas.clone(), 1).unwrap();
    let cambio = ActualizarUsuario { password: Some("nueva-clave-1".into()), ..Default::default() };
    usuarios::actualizar(&mut tx, sin_areas.id, &cambio).unwrap();
    assert!(sesiones::usuario_de_token(&mut tx, &otra.token, ahora).unwrap().is_none());
    assert!(usuarios::login(&mut tx, &sin_areas.email, "nueva-clave-1").unwrap().is_some());

    // el email cambia sin tocar la contraseña
    let nuevo_email = format!("eval2{}@prueba.bo", sufijo);
    let cambio = ActualizarUsuario { email: Some(nuevo_email.clone()), ..Default::default() };
    usuarios::actualizar(&mut tx, evaluador.id, &cambio).unwrap();
    assert!(usuarios::login(&mut tx, &nuevo_email, "secreta123").unwrap().is_some());

    // clasificación
    let fase = Fase::Clasificacion;
    evaluaciones::registrar(&mut tx, fase, evaluador.id, &nota(i1, 80.0), true).unwrap();
    let revisada = evaluaciones::registrar(&mut tx, fase, evaluador.id, &nota(i1, 85.0), true).unwrap();
    assert_eq!(revisada.modificaciones, 1);
    evaluaciones::registrar(&mut tx, fase, evaluador.id, &nota(i2, 70.0), true).unwrap();
    evaluaciones::registrar(&mut tx, fase, evaluador.id, &nota(i3, 40.0), true).unwrap();
    assert!(matches!(
        evaluaciones::registrar(&mut tx, fase, sin_areas.id, &nota(i3, 99.0), true),
        Err(ApiError::Prohibido(_))
    ));
    assert_eq!(inscripciones::obtener(&mut tx, i1).unwrap().estado, EstadoInscripcion::Evaluado);

    let resumen = evaluaciones::cerrar_clasificacion(&mut tx, area.id, Some(nivel.id), GESTION, 60.0).unwrap();
    assert_eq!((resumen.clasificados, resumen.no_clasificados), (2, 1));
    assert_eq!(inscripciones::obtener(&mut tx, i3).unwrap().estado, EstadoInscripcion::NoClasificado);
    assert!(matches!(
        evaluaciones::registrar(&mut tx, fase, evaluador.id, &nota(i3, 90.0), true),
        Err(ApiError::Conflicto(_))
    ));

    // exclusiones superpuestas y su revocación
    let motivo = |m: &str| NuevaExclusion { inscripcion_id: i2, regla_id: None, motivo: m.to_string() };
    let desclas =
        exclusiones::registrar(&mut tx, TipoExclusion::Desclasificacion, evaluador.id, &motivo("copia")).unwrap();
    assert_eq!(desclas.estado_anterior, EstadoInscripcion::Clasificado);
    let descal =
        exclusiones::registrar(&mut tx, TipoExclusion::Descalificacion, evaluador.id, &motivo("suplantación")).unwrap();
    assert_eq!(descal.estado_anterior, EstadoInscripcion::Clasificado);
    assert_eq!(exclusiones::activas(&mut tx, i2).unwrap().len(), 2);

    let r = exclusiones::revocar(&mut tx, TipoExclusion::Descalificacion, descal.id, evaluador.id).unwrap();
    assert_eq!(r.estado_inscripcion, EstadoInscripcion::Desclasificado);
    let r = exclusiones::revocar(&mut tx, TipoExclusion::Desclasificacion, desclas.id, evaluador.id).unwrap();
    assert_eq!(r.estado_inscripcion, EstadoInscripcion::Clasificado);
    assert!(matches!(
        exclusiones::revocar(&mut tx, TipoExclusion::Desclasificacion, desclas.id, evaluador.id),
        Err(ApiError::Conflicto(_))
    ));

    // final, medallero y confirmación
    evaluaciones::registrar(&mut tx, Fase::Final, evaluador.id, &nota(i1, 90.0), true).unwrap();
    evaluaciones::registrar(&mut tx, Fase::Final, evaluador.id, &nota(i2, 75.0), true).unwrap();
    medallero::guardar(
        &mut tx,
        &MedalleroEntrada {
            area_id: area.id,
            nivel_id: Some(nivel.id),
            grado_escolaridad: None,
            oro: Some(1),
            plata: Some(0),
            bronce: Some(0),
            mencion_honor: Some(1),
        },
    )
    .unwrap();
    let premiados = resultados::calcular_premiados(&mut tx, area.id, Some(nivel.id), GESTION).unwrap();
    let medallas: Vec<(i32, Medalla)> = premiados.iter().map(|p| (p.inscripcion_id, p.medalla)).collect();
    assert_eq!(medallas, vec![(i1, Medalla::Oro), (i2, Medalla::MencionHonor)]);

    let confirmados = resultados::confirmar(&mut tx, area.id, Some(nivel.id), GESTION, evaluador.id).unwrap();
    assert_eq!(confirmados.len(), 2);
    assert_eq!(inscripciones::obtener(&mut tx, i1).unwrap().estado, EstadoInscripcion::Premiado);
    assert!(matches!(
        resultados::confirmar(&mut tx, area.id, Some(nivel.id), GESTION, evaluador.id),
        Err(ApiError::Conflicto(_))
    ));

    // publicación
    let ahora = chrono::Local::now().naive_local();
    assert!(matches!(
        publicacion::resultados_publicos(&mut tx, area.id, Fase::Final, GESTION, ahora),
        Err(ApiError::NoEncontrado(_))
    ));
    publicacion::cambiar(&mut tx, area.id, Fase::Final, true, evaluador.id).unwrap();
    let publicos = publicacion::resultados_publicos(&mut tx, area.id, Fase::Final, GESTION, ahora).unwrap();
    assert_eq!(publicos.len(), 2);
    assert_eq!(publicos[0].medalla, Some(Medalla::Oro));

    drop(tx);
}
