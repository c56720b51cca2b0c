// Carga y descarga de archivos: CSV/XLSX de olimpistas y usuarios.
pub mod exportar;
pub mod io;
pub mod olimpistas;
pub mod usuarios;

pub use io::{Tabla, cell_to_string, leer_csv, leer_tabla, leer_xlsx, normalizar_encabezado, normalizar_nombre};
pub use olimpistas::{Catalogo, ErrorFila, FilaOlimpista, ResumenImportacion};
