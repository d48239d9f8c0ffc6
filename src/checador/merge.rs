//! Cross-terminal reconciliation.
//!
//! Each terminal exports its own file; the same employee appears in both
//! when they punched at both sites. Records are joined by normalized name
//! (the exports carry no stable cross-terminal id) and merged day by day.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::{Error, Result};

use super::{
    DiaRegistro, EmpleadoImportado, Emparejamiento, Fuente, ResultadoImportacion, resumen_general,
};

/// Merges the two terminals' import results into one.
///
/// Either side may be absent; with only one side the result is that side,
/// untouched. The per-day outcome is commutative: swapping the argument
/// order never changes merged hours or rollups, only which side's source
/// tag survives an exact tie.
pub fn combinar_checadores(
    datos_a: Option<ResultadoImportacion>,
    datos_b: Option<ResultadoImportacion>,
) -> Result<ResultadoImportacion> {
    let (datos_a, datos_b) = match (datos_a, datos_b) {
        (None, None) => return Err(Error::MissingInput),
        (Some(a), None) => {
            tracing::info!(ubicacion = %a.ubicacion, "un solo checador, sin combinación");
            return Ok(a);
        }
        (None, Some(b)) => {
            tracing::info!(ubicacion = %b.ubicacion, "un solo checador, sin combinación");
            return Ok(b);
        }
        (Some(a), Some(b)) => (a, b),
    };

    if datos_a.rango.inicio != datos_b.rango.inicio || datos_a.rango.fin != datos_b.rango.fin {
        tracing::warn!(
            rango_a = %format!("{} ~ {}", datos_a.rango.inicio, datos_a.rango.fin),
            rango_b = %format!("{} ~ {}", datos_b.rango.inicio, datos_b.rango.fin),
            "los rangos de fechas de los checadores no coinciden; se usa el primero"
        );
    }

    let mut combinados: Vec<EmpleadoImportado> = Vec::new();
    let mut indice: HashMap<String, usize> = HashMap::new();

    for empleado in datos_a.empleados {
        let clave = normalizar_nombre(&empleado.nombre);
        indice.insert(clave, combinados.len());
        combinados.push(empleado);
    }

    for empleado in datos_b.empleados {
        let clave = normalizar_nombre(&empleado.nombre);
        match indice.get(&clave) {
            Some(&pos) => {
                let existente = &mut combinados[pos];
                existente.emparejado_por = if existente.id_checador.is_some()
                    && existente.id_checador == empleado.id_checador
                {
                    Emparejamiento::Id
                } else {
                    Emparejamiento::Nombre
                };
                existente.dias = combinar_dias(&existente.dias, &empleado.dias);
                existente.recalcular_totales();
            }
            None => {
                indice.insert(clave, combinados.len());
                combinados.push(empleado);
            }
        }
    }

    let ubicacion = format!("{}+{}", datos_a.ubicacion, datos_b.ubicacion);
    let resumen = resumen_general(&combinados, &datos_a.rango);

    Ok(ResultadoImportacion {
        ubicacion,
        rango: datos_a.rango,
        empleados: combinados,
        resumen,
        importado_el: chrono::Utc::now(),
    })
}

/// Per-day merge, keyed by day-of-month. A present record beats an absent
/// one; with presence on both sides, the larger computed hours win and the
/// day is tagged as seen at both terminals; punching at two sites the
/// same day is a condition the payroll clerk must be able to review.
fn combinar_dias(dias_a: &[DiaRegistro], dias_b: &[DiaRegistro]) -> Vec<DiaRegistro> {
    let mut por_dia: BTreeMap<u32, DiaRegistro> = BTreeMap::new();

    for dia in dias_a {
        por_dia.insert(dia.dia_num, dia.clone());
    }

    for dia in dias_b {
        match por_dia.get_mut(&dia.dia_num) {
            None => {
                por_dia.insert(dia.dia_num, dia.clone());
            }
            Some(existente) => {
                if !existente.presente && dia.presente {
                    *existente = dia.clone();
                } else if existente.presente && dia.presente {
                    if dia.horas_trabajadas > existente.horas_trabajadas {
                        *existente = dia.clone();
                    }
                    existente.fuente = Fuente::Ambos;
                    existente.notas = format!("Checada en ambos checadores. {}", existente.notas);
                }
            }
        }
    }

    por_dia.into_values().collect()
}

/// Join key for employee names: case-folded, diacritics stripped, letters
/// and single spaces only. Approximate identity: two distinct employees
/// with identical normalized names would be merged.
pub fn normalizar_nombre(nombre: &str) -> String {
    let mut limpio = String::with_capacity(nombre.len());
    for c in nombre.to_uppercase().chars() {
        let c = match c {
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            'Ñ' => 'N',
            _ => c,
        };
        if c.is_ascii_alphabetic() || c == ' ' {
            limpio.push(c);
        }
    }
    limpio.split_whitespace().collect::<Vec<_>>().join(" ")
}
