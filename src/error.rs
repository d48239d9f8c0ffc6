use thiserror::Error;

/// Errors produced by the attendance and payroll engine.
///
/// Parser and reconciler errors (`Format`, `MissingInput`) come from pure
/// code and are always safe to retry with corrected input. The rest map to
/// caller-facing conditions; storage failures stay opaque and are never
/// retried here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("archivo de checador {ubicacion}: {motivo}")]
    Format { ubicacion: String, motivo: String },

    #[error("se requiere al menos un archivo de checador")]
    MissingInput,

    #[error("empleado {0} no encontrado")]
    NotFound(i64),

    #[error("el empleado {0} no está activo")]
    InactiveEmployee(i64),

    #[error("{0}")]
    Validation(String),

    #[error("error de almacenamiento: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn format(ubicacion: &str, motivo: impl Into<String>) -> Self {
        Error::Format {
            ubicacion: ubicacion.to_string(),
            motivo: motivo.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
