//! Daily worked-hours calculator.
//!
//! Pure function over one day's ordered punch list. The meal window is
//! deducted by interval overlap with `[entrada, salida]`; this is the
//! authoritative worked-hours rule for imported terminal data.

use serde::{Deserialize, Serialize};

use super::Checada;

/// Shift parameters, all times in minutes since midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub comida_inicio: u32,
    pub comida_fin: u32,
    pub entrada_estandar: u32,
    pub salida_estandar: u32,
    pub tolerancia_minutos: u32,
    pub jornada_completa_horas: f64,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            comida_inicio: 14 * 60,
            comida_fin: 15 * 60,
            entrada_estandar: 8 * 60,
            salida_estandar: 17 * 60,
            tolerancia_minutos: 15,
            jornada_completa_horas: 8.0,
        }
    }
}

/// Derived fields for one day, before date/label/source are attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculoDia {
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

impl CalculoDia {
    fn ausente() -> Self {
        Self {
            presente: false,
            entrada: None,
            salida: None,
            horas_trabajadas: 0.0,
            horas_brutas: 0.0,
            minutos_comida_descontados: 0,
            retardo: false,
            minutos_retardo: 0,
            jornada_completa: false,
            incompleta: false,
            notas: "Sin checada".to_string(),
        }
    }
}

pub fn calcular_horas_dia(checadas: &[Checada], cfg: &ShiftConfig) -> CalculoDia {
    if checadas.is_empty() {
        return CalculoDia::ausente();
    }

    // Single punch: entry only, no hours can be credited.
    if checadas.len() == 1 {
        let entrada = &checadas[0];
        let minutos_tarde = entrada.total_minutos.saturating_sub(cfg.entrada_estandar);
        let retardo = minutos_tarde > cfg.tolerancia_minutos;

        return CalculoDia {
            presente: true,
            entrada: Some(entrada.hora_str.clone()),
            salida: None,
            horas_trabajadas: 0.0,
            horas_brutas: 0.0,
            minutos_comida_descontados: 0,
            retardo,
            minutos_retardo: if retardo { minutos_tarde } else { 0 },
            jornada_completa: false,
            incompleta: true,
            notas: "Solo entrada registrada, falta salida".to_string(),
        };
    }

    // First punch is the entry, last is the exit; intermediate punches are
    // kept on the day record but do not enter the hours formula.
    let entrada = &checadas[0];
    let salida = &checadas[checadas.len() - 1];

    let mut notas = Vec::new();

    let minutos_brutos = salida.total_minutos as i64 - entrada.total_minutos as i64;
    let minutos_brutos = if minutos_brutos < 0 {
        notas.push("Checadas inconsistentes (salida antes de entrada)".to_string());
        0
    } else {
        minutos_brutos as u32
    };

    // Meal is deducted only for the portion of [entrada, salida] that
    // overlaps the configured window.
    let mut minutos_comida = 0;
    if entrada.total_minutos < cfg.comida_fin && salida.total_minutos > cfg.comida_inicio {
        let inicio = entrada.total_minutos.max(cfg.comida_inicio);
        let fin = salida.total_minutos.min(cfg.comida_fin);
        minutos_comida = fin.saturating_sub(inicio);
    }

    let minutos_netos = minutos_brutos.saturating_sub(minutos_comida);
    let horas_trabajadas = redondear2(minutos_netos as f64 / 60.0);
    let horas_brutas = redondear2(minutos_brutos as f64 / 60.0);

    let minutos_tarde = entrada.total_minutos.saturating_sub(cfg.entrada_estandar);
    let retardo = minutos_tarde > cfg.tolerancia_minutos;
    let jornada_completa = horas_trabajadas >= cfg.jornada_completa_horas;

    if retardo {
        notas.push(format!("Retardo de {} min", minutos_tarde));
    }
    if salida.total_minutos < cfg.salida_estandar {
        let min_antes = cfg.salida_estandar - salida.total_minutos;
        if min_antes > 5 {
            notas.push(format!("Salida {} min antes", min_antes));
        }
    }
    if checadas.len() > 2 {
        notas.push(format!("{} checadas registradas", checadas.len()));
    }
    if jornada_completa {
        notas.push("Jornada completa".to_string());
    } else if horas_trabajadas > 0.0 {
        let faltantes = cfg.jornada_completa_horas - horas_trabajadas;
        notas.push(format!("Faltan {:.1}h para jornada completa", faltantes));
    }

    CalculoDia {
        presente: true,
        entrada: Some(entrada.hora_str.clone()),
        salida: Some(salida.hora_str.clone()),
        horas_trabajadas,
        horas_brutas,
        minutos_comida_descontados: minutos_comida,
        retardo,
        minutos_retardo: if retardo { minutos_tarde } else { 0 },
        jornada_completa,
        incompleta: false,
        notas: notas.join(" | "),
    }
}

fn redondear2(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}
