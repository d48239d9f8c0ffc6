pub mod hours;
pub mod merge;
pub mod parser;

pub use hours::{CalculoDia, ShiftConfig, calcular_horas_dia};
pub use merge::combinar_checadores;
pub use parser::{importar_buffer, parsear_grid};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Terminal that produced a record, or both when reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fuente {
    #[serde(rename = "RAM1")]
    Ram1,
    #[serde(rename = "RAM2")]
    Ram2,
    #[serde(rename = "RAM1+RAM2")]
    Ambos,
}

impl Fuente {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fuente::Ram1 => "RAM1",
            Fuente::Ram2 => "RAM2",
            Fuente::Ambos => "RAM1+RAM2",
        }
    }
}

/// How a merged employee record was matched across terminals.
/// `Nombre` is the degraded path: two employees with identical
/// normalized names would be merged incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emparejamiento {
    Id,
    Nombre,
}

/// A single clock event inside one day cell of the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checada {
    pub hora: u32,
    pub minuto: u32,
    pub total_minutos: u32,
    pub hora_str: String,
}

/// One employee's attendance outcome for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaRegistro {
    pub fecha: Option<NaiveDate>,
    pub dia_num: u32,
    pub nombre_dia: String,
    pub fuente: Fuente,
    pub checadas: Vec<Checada>,
    pub presente: bool,
    pub entrada: Option<String>,
    pub salida: Option<String>,
    pub horas_trabajadas: f64,
    pub horas_brutas: f64,
    pub minutos_comida_descontados: u32,
    pub retardo: bool,
    pub minutos_retardo: u32,
    pub jornada_completa: bool,
    pub incompleta: bool,
    pub notas: String,
}

impl DiaRegistro {
    pub fn nuevo(
        fecha: Option<NaiveDate>,
        dia_num: u32,
        nombre_dia: String,
        checadas: Vec<Checada>,
        fuente: Fuente,
        calculo: CalculoDia,
    ) -> Self {
        Self {
            fecha,
            dia_num,
            nombre_dia,
            fuente,
            checadas,
            presente: calculo.presente,
            entrada: calculo.entrada,
            salida: calculo.salida,
            horas_trabajadas: calculo.horas_trabajadas,
            horas_brutas: calculo.horas_brutas,
            minutos_comida_descontados: calculo.minutos_comida_descontados,
            retardo: calculo.retardo,
            minutos_retardo: calculo.minutos_retardo,
            jornada_completa: calculo.jornada_completa,
            incompleta: calculo.incompleta,
            notas: calculo.notas,
        }
    }

    /// Sundays are the weekly rest day; an empty Sunday is not an absence.
    pub fn es_domingo(&self) -> bool {
        self.nombre_dia.to_lowercase().starts_with("dom")
    }
}

/// All days for one employee across the import's date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpleadoImportado {
    pub id_checador: Option<i64>,
    pub nombre: String,
    pub departamento: String,
    pub emparejado_por: Emparejamiento,
    pub dias: Vec<DiaRegistro>,
    pub total_horas: f64,
    pub total_dias_trabajados: u32,
    pub total_ausencias: u32,
    pub total_retardos: u32,
    pub total_incompletos: u32,
}

impl EmpleadoImportado {
    /// Recomputes every rollup from the day list. Always called after the
    /// day list changes; rollups are never patched incrementally.
    pub fn recalcular_totales(&mut self) {
        let totales = recalcular_totales(&self.dias);
        self.total_horas = totales.horas;
        self.total_dias_trabajados = totales.dias;
        self.total_ausencias = totales.ausentes;
        self.total_retardos = totales.retardos;
        self.total_incompletos = totales.incompletos;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totales {
    pub horas: f64,
    pub dias: u32,
    pub ausentes: u32,
    pub retardos: u32,
    pub incompletos: u32,
}

pub fn recalcular_totales(dias: &[DiaRegistro]) -> Totales {
    let mut totales = Totales {
        horas: 0.0,
        dias: 0,
        ausentes: 0,
        retardos: 0,
        incompletos: 0,
    };

    for dia in dias {
        if dia.presente {
            totales.dias += 1;
            totales.horas += dia.horas_trabajadas;
            if dia.retardo {
                totales.retardos += 1;
            }
            if dia.incompleta {
                totales.incompletos += 1;
            }
        } else if !dia.es_domingo() {
            totales.ausentes += 1;
        }
    }

    totales.horas = (totales.horas * 100.0).round() / 100.0;
    totales
}

/// Inclusive date range declared in the export header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangoFechas {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
    pub fechas: Vec<NaiveDate>,
}

impl RangoFechas {
    pub fn total_dias(&self) -> usize {
        self.fechas.len()
    }
}

/// Aggregate figures over every employee in an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumenImportacion {
    pub periodo: String,
    pub total_empleados: usize,
    pub empleados_con_asistencia: usize,
    pub empleados_sin_asistencia: usize,
    pub total_horas: f64,
    pub promedio_horas_por_empleado: f64,
    pub total_retardos: u32,
    pub total_faltas: u32,
    pub jornadas_completas: u32,
    pub jornadas_incompletas: u32,
    pub dias_en_periodo: usize,
}

pub fn resumen_general(empleados: &[EmpleadoImportado], rango: &RangoFechas) -> ResumenImportacion {
    let mut total_horas = 0.0;
    let mut con_asistencia = 0;
    let mut total_retardos = 0;
    let mut total_faltas = 0;
    let mut completas = 0;
    let mut incompletas = 0;

    for emp in empleados {
        if emp.total_dias_trabajados > 0 {
            con_asistencia += 1;
        }
        total_horas += emp.total_horas;
        total_retardos += emp.total_retardos;
        total_faltas += emp.total_ausencias;

        for dia in &emp.dias {
            if dia.jornada_completa {
                completas += 1;
            }
            if dia.incompleta {
                incompletas += 1;
            }
        }
    }

    let promedio = if con_asistencia > 0 {
        ((total_horas / con_asistencia as f64) * 100.0).round() / 100.0
    } else {
        0.0
    };

    ResumenImportacion {
        periodo: format!("{} al {}", rango.inicio, rango.fin),
        total_empleados: empleados.len(),
        empleados_con_asistencia: con_asistencia,
        empleados_sin_asistencia: empleados.len() - con_asistencia,
        total_horas: (total_horas * 100.0).round() / 100.0,
        promedio_horas_por_empleado: promedio,
        total_retardos,
        total_faltas,
        jornadas_completas: completas,
        jornadas_incompletas: incompletas,
        dias_en_periodo: rango.total_dias(),
    }
}

/// Result of parsing one terminal export, or of reconciling two.
/// Transient: held in the import cache while the payroll clerk reviews it,
/// never persisted as authoritative history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultadoImportacion {
    pub ubicacion: String,
    pub rango: RangoFechas,
    pub empleados: Vec<EmpleadoImportado>,
    pub resumen: ResumenImportacion,
    pub importado_el: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checador::hours::calcular_horas_dia;
    use crate::checador::parser::parsear_checadas;

    fn dia_de_celda(dia_num: u32, nombre_dia: &str, celda: &str) -> DiaRegistro {
        let cfg = ShiftConfig::default();
        let checadas = parsear_checadas(celda);
        let calculo = calcular_horas_dia(&checadas, &cfg);
        DiaRegistro::nuevo(
            None,
            dia_num,
            nombre_dia.to_string(),
            checadas,
            Fuente::Ram1,
            calculo,
        )
    }

    #[test]
    fn totales_cuentan_dias_y_retardos() {
        let dias = vec![
            dia_de_celda(13, "Jue", "08:00\n17:00"),
            dia_de_celda(14, "Vie", "08:30\n17:00"),
            dia_de_celda(15, "Sáb", ""),
            dia_de_celda(16, "Dom", ""),
            dia_de_celda(17, "Lun", "08:05"),
        ];

        let totales = recalcular_totales(&dias);
        assert_eq!(totales.dias, 3);
        assert_eq!(totales.retardos, 1);
        assert_eq!(totales.ausentes, 1); // Saturday counts, Sunday does not
        assert_eq!(totales.incompletos, 1);
    }

    #[test]
    fn rollups_coinciden_con_recalculo() {
        let mut emp = EmpleadoImportado {
            id_checador: Some(7),
            nombre: "MARIA LOPEZ".to_string(),
            departamento: "Producción".to_string(),
            emparejado_por: Emparejamiento::Nombre,
            dias: vec![
                dia_de_celda(1, "Lun", "08:00\n17:00"),
                dia_de_celda(2, "Mar", "08:00\n16:00"),
            ],
            total_horas: 0.0,
            total_dias_trabajados: 0,
            total_ausencias: 0,
            total_retardos: 0,
            total_incompletos: 0,
        };
        emp.recalcular_totales();

        let totales = recalcular_totales(&emp.dias);
        assert_eq!(emp.total_horas, totales.horas);
        assert_eq!(emp.total_dias_trabajados, totales.dias);
        assert_eq!(emp.total_ausencias, totales.ausentes);
    }

    #[test]
    fn resumen_sin_asistencia_promedia_cero() {
        let rango = RangoFechas {
            inicio: NaiveDate::from_ymd_opt(2024, 11, 13).unwrap(),
            fin: NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
            fechas: vec![NaiveDate::from_ymd_opt(2024, 11, 13).unwrap()],
        };
        let resumen = resumen_general(&[], &rango);
        assert_eq!(resumen.total_empleados, 0);
        assert_eq!(resumen.promedio_horas_por_empleado, 0.0);
    }
}
