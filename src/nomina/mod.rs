//! Weekly payroll computation and punctuality bonus.
//!
//! Pay is weekly. Overtime follows the federal labor-law tiers: the first
//! block of weekly overtime hours is paid double, anything beyond triple.
//! The company does not withhold ISR; IMSS worker quotas are a flat-rate
//! approximation behind a toggle. Every monetary intermediate is rounded
//! to 2 decimals before it is combined; the payroll receipts are compared
//! peso by peso against the previous system, so no extra precision is
//! carried.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::asistencia::Periodo;
use crate::database::queries;
use crate::error::{Error, Result};
use crate::parametros::{self, ConfigNomina};
use crate::utils::time::minutos_del_dia;

/// Inputs for one employee's weekly payroll.
#[derive(Debug, Clone, Deserialize)]
pub struct EntradaNomina {
    pub salario_mensual: f64,
    pub dias_trabajados: u32,
    pub horas_extra: f64,
    pub checadas_correctas: u32,
    pub dias_con_checada: u32,
    pub faltas: u32,
    pub descuento_prestamos: f64,
    pub otros_descuentos: f64,
}

impl Default for EntradaNomina {
    fn default() -> Self {
        Self {
            salario_mensual: 0.0,
            dias_trabajados: 6,
            horas_extra: 0.0,
            checadas_correctas: 0,
            dias_con_checada: 0,
            faltas: 0,
            descuento_prestamos: 0.0,
            otros_descuentos: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PagoHorasExtra {
    pub horas: f64,
    pub monto: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Percepciones {
    pub salario_base: f64,
    pub bono_puntualidad: f64,
    pub horas_extra_dobles: PagoHorasExtra,
    pub horas_extra_triples: PagoHorasExtra,
    pub total_horas_extra: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deducciones {
    pub faltas: f64,
    pub isr: f64,
    pub imss: f64,
    pub prestamos: f64,
    pub otros: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigAplicada {
    pub calcula_isr: bool,
    pub calcula_imss: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DesgloseNomina {
    pub salario_mensual: f64,
    pub salario_diario: f64,
    pub salario_semanal: f64,
    pub salario_hora: f64,
    pub dias_trabajados: u32,
    pub faltas: u32,
    pub percepciones: Percepciones,
    pub deducciones: Deducciones,
    pub sueldo_neto: f64,
    pub cumple_puntualidad: bool,
    pub horas_extra_totales: f64,
    pub calculado_el: DateTime<Utc>,
    pub configuracion: ConfigAplicada,
}

/// Weekly payroll breakdown. Pure; configuration comes in as a snapshot.
///
/// Rate conventions: daily = monthly / 30, weekly = monthly / 4.33,
/// hourly = daily / 8.
pub fn calcular_nomina_semanal(entrada: &EntradaNomina, config: &ConfigNomina) -> DesgloseNomina {
    let salario_diario = redondear(entrada.salario_mensual / 30.0);
    let salario_semanal = redondear(entrada.salario_mensual / 4.33);
    let salario_hora = redondear(salario_diario / 8.0);

    // Percepciones
    let salario_base = redondear(salario_diario * entrada.dias_trabajados as f64);

    let cumple_puntualidad = entrada.checadas_correctas >= config.bono_puntualidad_checadas
        && entrada.dias_con_checada >= config.bono_puntualidad_dias
        && entrada.faltas == 0;
    let bono_puntualidad = if config.bono_puntualidad_activo && cumple_puntualidad {
        config.bono_puntualidad_monto
    } else {
        0.0
    };

    let horas_dobles = entrada.horas_extra.min(config.horas_extra_dobles_limite);
    let horas_triples = (entrada.horas_extra - config.horas_extra_dobles_limite).max(0.0);
    let pago_dobles = redondear(horas_dobles * salario_hora * 2.0);
    let pago_triples = redondear(horas_triples * salario_hora * 3.0);
    let total_horas_extra = pago_dobles + pago_triples;

    let total_percepciones = redondear(salario_base + bono_puntualidad + total_horas_extra);

    // Deducciones
    let descuento_faltas = redondear(salario_diario * entrada.faltas as f64);

    // ISR: company policy is to not withhold income tax; the toggle is
    // echoed in the result but the computation stays a zero stub.
    let isr = 0.0;

    let imss = if config.calcular_imss {
        // Simplified weekly worker quota, ~2.125% of base pay.
        redondear(salario_base * 0.02125)
    } else {
        0.0
    };

    let total_deducciones = redondear(
        descuento_faltas + isr + imss + entrada.descuento_prestamos + entrada.otros_descuentos,
    );

    let sueldo_neto = redondear(total_percepciones - total_deducciones);

    DesgloseNomina {
        salario_mensual: entrada.salario_mensual,
        salario_diario,
        salario_semanal,
        salario_hora,
        dias_trabajados: entrada.dias_trabajados,
        faltas: entrada.faltas,
        percepciones: Percepciones {
            salario_base,
            bono_puntualidad,
            horas_extra_dobles: PagoHorasExtra {
                horas: horas_dobles,
                monto: pago_dobles,
            },
            horas_extra_triples: PagoHorasExtra {
                horas: horas_triples,
                monto: pago_triples,
            },
            total_horas_extra,
            total: total_percepciones,
        },
        deducciones: Deducciones {
            faltas: descuento_faltas,
            isr,
            imss,
            prestamos: entrada.descuento_prestamos,
            otros: entrada.otros_descuentos,
            total: total_deducciones,
        },
        sueldo_neto,
        cumple_puntualidad,
        horas_extra_totales: entrada.horas_extra,
        calculado_el: Utc::now(),
        configuracion: ConfigAplicada {
            calcula_isr: config.calcular_isr,
            calcula_imss: config.calcular_imss,
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequisitosPuntualidad {
    pub checadas_requeridas: u32,
    pub dias_requeridos: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluacionPuntualidad {
    pub empleado_id: i64,
    pub periodo: Periodo,
    pub dias_evaluados: usize,
    pub dias_con_checada: u32,
    pub checadas_correctas: u32,
    pub faltas: u32,
    pub retardos: u32,
    pub requisitos: RequisitosPuntualidad,
    pub cumple_requisitos: bool,
    pub monto_bono: f64,
}

/// Estimated severance, used as the cap for employee loans.
#[derive(Debug, Clone, Serialize)]
pub struct DesgloseFiniquito {
    pub salario_diario: f64,
    pub antiguedad_dias: i64,
    pub antiguedad_anios: i64,
    pub dias_periodo_actual: i64,
    pub pago_dias_trabajados: f64,
    pub dias_vacaciones_proporcionales: f64,
    pub pago_vacaciones: f64,
    pub prima_vacacional: f64,
    pub dias_aguinaldo_proporcionales: f64,
    pub pago_aguinaldo: f64,
    pub total: f64,
    pub monto_maximo_prestamo: f64,
}

/// Proportional settlement estimate: worked days of the current month,
/// proportional vacation plus the 25% premium, and the proportional
/// 15-day aguinaldo. An estimate for loan caps, not a legal settlement.
pub fn estimar_finiquito(
    salario_mensual: f64,
    fecha_ingreso: NaiveDate,
    fecha_calculo: NaiveDate,
) -> DesgloseFiniquito {
    let salario_diario = salario_mensual / 30.0;

    let antiguedad_dias = (fecha_calculo - fecha_ingreso).num_days().max(0);
    let antiguedad_anios = antiguedad_dias / 365;

    let dias_periodo_actual = antiguedad_dias % 30;
    let pago_dias_trabajados = redondear(salario_diario * dias_periodo_actual as f64);

    let dias_vacaciones = dias_vacaciones(antiguedad_anios) as f64;
    let dias_vacaciones_proporcionales =
        redondear(dias_vacaciones / 365.0 * antiguedad_dias as f64);
    let pago_vacaciones = redondear(salario_diario * dias_vacaciones_proporcionales);
    let prima_vacacional = redondear(pago_vacaciones * 0.25);

    let dias_aguinaldo_proporcionales = redondear(15.0 / 365.0 * antiguedad_dias as f64);
    let pago_aguinaldo = redondear(salario_diario * dias_aguinaldo_proporcionales);

    let total = redondear(pago_dias_trabajados + pago_vacaciones + prima_vacacional + pago_aguinaldo);

    DesgloseFiniquito {
        salario_diario,
        antiguedad_dias,
        antiguedad_anios,
        dias_periodo_actual,
        pago_dias_trabajados,
        dias_vacaciones_proporcionales,
        pago_vacaciones,
        prima_vacacional,
        dias_aguinaldo_proporcionales,
        pago_aguinaldo,
        total,
        monto_maximo_prestamo: total,
    }
}

/// Vacation days per completed years of service, LFT 2023 reform.
pub fn dias_vacaciones(anios: i64) -> u32 {
    match anios {
        i64::MIN..=0 => 0,
        1 => 12,
        2 => 14,
        3 => 16,
        4 => 18,
        5 => 20,
        6..=10 => 22,
        11..=15 => 24,
        16..=20 => 26,
        _ => 28,
    }
}

fn redondear(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

pub struct NominaService {
    pool: SqlitePool,
}

impl NominaService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Walks the employee's attendance over the period and counts what the
    /// bonus requires: 2 correct punches per complete day, 1 per partial
    /// day, zero absences and zero late arrivals.
    pub async fn evaluar_puntualidad(
        &self,
        empleado_id: i64,
        inicio: NaiveDate,
        fin: NaiveDate,
    ) -> Result<EvaluacionPuntualidad> {
        queries::get_empleado(&self.pool, empleado_id)
            .await?
            .ok_or(Error::NotFound(empleado_id))?;

        let horario = parametros::cargar_horario(&self.pool).await?;
        let config = parametros::cargar_nomina(&self.pool).await?;

        let asistencias =
            queries::asistencias_rango_empleado(&self.pool, empleado_id, inicio, fin).await?;

        let limite_entrada = horario.entrada_estandar + horario.tolerancia_minutos;
        let mut checadas_correctas = 0;
        let mut dias_con_checada = 0;
        let mut faltas = 0;
        let mut retardos = 0;

        for asistencia in &asistencias {
            if !asistencia.presente {
                faltas += 1;
                continue;
            }

            dias_con_checada += 1;

            match (asistencia.hora_entrada, asistencia.hora_salida) {
                (Some(entrada), Some(_)) => {
                    checadas_correctas += 2;
                    if minutos_del_dia(&entrada) > limite_entrada {
                        retardos += 1;
                    }
                }
                (Some(_), None) | (None, Some(_)) => checadas_correctas += 1,
                (None, None) => {}
            }
        }

        let cumple_requisitos = checadas_correctas >= config.bono_puntualidad_checadas
            && dias_con_checada >= config.bono_puntualidad_dias
            && faltas == 0
            && retardos == 0;
        let monto_bono = if config.bono_puntualidad_activo && cumple_requisitos {
            config.bono_puntualidad_monto
        } else {
            0.0
        };

        info!(
            empleado_id,
            cumple = cumple_requisitos,
            checadas_correctas,
            faltas,
            retardos,
            "bono de puntualidad evaluado"
        );

        Ok(EvaluacionPuntualidad {
            empleado_id,
            periodo: Periodo { inicio, fin },
            dias_evaluados: asistencias.len(),
            dias_con_checada,
            checadas_correctas,
            faltas,
            retardos,
            requisitos: RequisitosPuntualidad {
                checadas_requeridas: config.bono_puntualidad_checadas,
                dias_requeridos: config.bono_puntualidad_dias,
            },
            cumple_requisitos,
            monto_bono,
        })
    }

    /// Weekly payroll with the configuration loaded once, as a snapshot.
    pub async fn calcular_semanal(&self, entrada: &EntradaNomina) -> Result<DesgloseNomina> {
        let config = parametros::cargar_nomina(&self.pool).await?;
        Ok(calcular_nomina_semanal(entrada, &config))
    }
}
