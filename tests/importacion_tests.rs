use olimpiada::error::ApiError;
use olimpiada::importacion::olimpistas::validar_filas;
use olimpiada::importacion::{Catalogo, leer_tabla};

fn catalogos() -> (Catalogo, Catalogo) {
    (
        Catalogo::new([("Matemáticas", 1), ("Física", 2), ("Informática", 3)]),
        Catalogo::new([("Primaria", 10), ("Secundaria", 20)]),
    )
}

#[test]
fn test_csv_con_punto_y_coma_y_alias() {
    let csv = "\u{feff}Nombre;Apellido;CI;Fecha de Nacimiento;Colegio;Área;Categoría\n\
               Ana;Quispe;1234567;02/04/2010;U.E. Bolívar;matematicas;Secundaria\n\
               Luis;Mamani;7654321;2011-08-15;;Fisica;primaria\n";
    let tabla = leer_tabla("inscritos.csv", csv.as_bytes()).unwrap();
    let (areas, niveles) = catalogos();
    let (validas, errores) = validar_filas(&tabla, &areas, &niveles).unwrap();

    assert!(errores.is_empty(), "{:?}", errores);
    assert_eq!(validas.len(), 2);
    assert_eq!(validas[0].fila, 2);
    assert_eq!(validas[0].area_id, 1);
    assert_eq!(validas[0].nivel_id, 20);
    assert_eq!(validas[0].unidad_educativa.as_deref(), Some("U.E. Bolívar"));
    assert_eq!(validas[1].area_id, 2);
    assert_eq!(validas[1].unidad_educativa, None);
}

#[test]
fn test_filas_invalidas_reportan_numero_y_motivo() {
    let csv = "nombres,apellidos,documento,area,nivel\n\
               Ana,Quispe,111,Matemáticas,Primaria\n\
               ,Rojas,222,Matemáticas,Primaria\n\
               Eva,Lima,333,Astronomía,Primaria\n\
               Ana,Quispe,111,Matemáticas,Primaria\n\
               Ana,Quispe,111,Física,Primaria\n";
    let tabla = leer_tabla("lote.CSV", csv.as_bytes()).unwrap();
    let (areas, niveles) = catalogos();
    let (validas, errores) = validar_filas(&tabla, &areas, &niveles).unwrap();

    // la misma persona puede inscribirse en otra área
    assert_eq!(validas.iter().map(|v| v.fila).collect::<Vec<_>>(), vec![2, 6]);
    assert_eq!(errores.iter().map(|e| e.fila).collect::<Vec<_>>(), vec![3, 4, 5]);
    assert!(errores[0].motivo.contains("nombres"));
    assert!(errores[1].motivo.contains("Astronomía"));
    assert!(errores[2].motivo.contains("fila 2"));
}

#[test]
fn test_faltan_columnas_obligatorias() {
    let tabla = leer_tabla("x.csv", "nombres,apellidos\nAna,Quispe\n".as_bytes()).unwrap();
    let (areas, niveles) = catalogos();
    assert!(matches!(validar_filas(&tabla, &areas, &niveles), Err(ApiError::Importacion(_))));
}

#[test]
fn test_extension_desconocida() {
    assert!(matches!(leer_tabla("notas.pdf", b"%PDF"), Err(ApiError::Importacion(_))));
}

#[test]
fn test_csv_que_no_es_utf8_no_se_importa() {
    let latin1 = b"nombres;apellidos;documento;area;nivel\nJos\xe9;P\xe9rez;555;F\xedsica;Primaria\n";
    match leer_tabla("inscritos.csv", latin1) {
        Err(ApiError::Importacion(msg)) => assert!(msg.contains("fila 2"), "{}", msg),
        otro => panic!("se esperaba un error de importación: {:?}", otro),
    }
}
