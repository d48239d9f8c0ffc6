use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const ESTATUS_ACTIVO: &str = "Activo";
pub const INCIDENCIA_APROBADA: &str = "APROBADA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empleado {
    pub id: i64,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub puesto: Option<String>,
    pub area: Option<String>,
    pub salario_mensual: f64,
    pub fecha_ingreso: NaiveDate,
    pub estatus: String,
    pub created_at: DateTime<Utc>,
}

impl Empleado {
    pub fn nombre_completo(&self) -> String {
        match &self.apellido_materno {
            Some(materno) => format!("{} {} {}", self.nombre, self.apellido_paterno, materno),
            None => format!("{} {}", self.nombre, self.apellido_paterno),
        }
    }

    pub fn activo(&self) -> bool {
        self.estatus == ESTATUS_ACTIVO
    }
}

/// Input for creating an employee row.
#[derive(Debug, Clone)]
pub struct AltaEmpleado {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub puesto: Option<String>,
    pub area: Option<String>,
    pub salario_mensual: f64,
    pub fecha_ingreso: NaiveDate,
    pub estatus: String,
}

/// One employee's persisted attendance row for one date.
/// At most one row per (employee, date); ENTRADA and SALIDA punches update
/// their own fields only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asistencia {
    pub id: i64,
    pub empleado_id: i64,
    pub fecha: NaiveDate,
    pub presente: bool,
    pub hora_entrada: Option<NaiveDateTime>,
    pub hora_salida: Option<NaiveDateTime>,
    pub ubicacion_entrada: Option<String>,
    pub ubicacion_salida: Option<String>,
    pub retardo: bool,
    pub minutos_retardo: i64,
    pub notas: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit entry, one per received punch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorialChecada {
    pub id: i64,
    pub asistencia_id: i64,
    pub tipo_checada: String,
    pub fecha_hora: NaiveDateTime,
    pub ubicacion: String,
    pub dispositivo: Option<String>,
    pub estado: String,
    pub created_at: DateTime<Utc>,
}

/// Approved leave covering a date range exempts the employee from the
/// automatic absence sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incidencia {
    pub id: i64,
    pub empleado_id: i64,
    pub tipo: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub estatus: String,
}

/// Named configuration parameter with a declared value type, coerced at
/// read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguracionNomina {
    pub clave: String,
    pub valor: String,
    pub descripcion: Option<String>,
    pub tipo_dato: String,
    pub activo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoChecada {
    Entrada,
    Salida,
}

impl TipoChecada {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoChecada::Entrada => "ENTRADA",
            TipoChecada::Salida => "SALIDA",
        }
    }
}

impl std::str::FromStr for TipoChecada {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRADA" => Ok(TipoChecada::Entrada),
            "SALIDA" => Ok(TipoChecada::Salida),
            otro => Err(Error::Validation(format!(
                "tipo de checada inválido: \"{otro}\"; valores válidos: ENTRADA, SALIDA"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ubicacion {
    Ram1,
    Ram2,
}

impl Ubicacion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ubicacion::Ram1 => "RAM1",
            Ubicacion::Ram2 => "RAM2",
        }
    }
}

impl std::str::FromStr for Ubicacion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RAM1" => Ok(Ubicacion::Ram1),
            "RAM2" => Ok(Ubicacion::Ram2),
            otro => Err(Error::Validation(format!(
                "ubicación inválida: \"{otro}\"; valores válidos: RAM1, RAM2"
            ))),
        }
    }
}

/// Evaluated status of a received punch, recorded in the audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoChecada {
    ATiempo,
    Tolerancia,
    Retardo,
    Completo,
    SalidaTemprana,
}

impl EstadoChecada {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoChecada::ATiempo => "A_TIEMPO",
            EstadoChecada::Tolerancia => "TOLERANCIA",
            EstadoChecada::Retardo => "RETARDO",
            EstadoChecada::Completo => "COMPLETO",
            EstadoChecada::SalidaTemprana => "SALIDA_TEMPRANA",
        }
    }
}
