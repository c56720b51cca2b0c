// Visibilidad pública de resultados según bandera y ventana de publicación.
use chrono::NaiveDateTime;

/// Los resultados se muestran si están publicados y `ahora` cae dentro de la
/// ventana configurada. Un extremo ausente no limita.
pub fn publicacion_visible(
    publicado: bool,
    inicio: Option<NaiveDateTime>,
    fin: Option<NaiveDateTime>,
    ahora: NaiveDateTime,
) -> bool {
    if !publicado {
        return false;
    }
    if let Some(i) = inicio {
        if ahora < i {
            return false;
        }
    }
    if let Some(f) = fin {
        if ahora >= f {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn respeta_bandera_y_ventana() {
        assert!(!publicacion_visible(false, None, None, t(10)));
        assert!(publicacion_visible(true, None, None, t(10)));
        assert!(!publicacion_visible(true, Some(t(11)), None, t(10)));
        assert!(publicacion_visible(true, Some(t(10)), Some(t(12)), t(10)));
        assert!(!publicacion_visible(true, Some(t(8)), Some(t(10)), t(10)));
    }
}
