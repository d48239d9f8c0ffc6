//! Parser for one biometric terminal export.
//!
//! The upload layer hands the export sheet over as a UTF-8 CSV buffer; it
//! is decoded into a rows-by-columns grid and scanned for the date-range
//! header and the per-employee blocks. The layout, per terminal firmware:
//!
//! - one header cell somewhere in the first rows: `"YYYY-MM-DD ~ YYYY-MM-DD"`
//! - per employee, a block of 4 rows:
//!   - `ID.` | _ | number | ... | `Nombre` | _ | name | ... | `Depart.` | _ | dept
//!   - day-of-month numbers, one per column
//!   - day-name abbreviations (Jue, Vie, Sáb, Dom, ...)
//!   - punch times per column, newline-separated (`"08:00\n17:07"`)

use chrono::NaiveDate;

use crate::error::{Error, Result};

use super::{
    Checada, DiaRegistro, EmpleadoImportado, Emparejamiento, Fuente, RangoFechas,
    ResultadoImportacion, ShiftConfig, calcular_horas_dia, resumen_general,
};

/// Column holding the employee name when the `Nombre` label cell is missing.
const COLUMNA_NOMBRE_FIJA: usize = 11;

/// Parses a raw export buffer for one terminal.
pub fn importar_buffer(
    buffer: &[u8],
    fuente: Fuente,
    cfg: &ShiftConfig,
) -> Result<ResultadoImportacion> {
    let grid = leer_grid_csv(buffer, fuente)?;
    parsear_grid(&grid, fuente, cfg)
}

/// Parses an already-decoded cell grid. Pure; no side effects.
pub fn parsear_grid(
    grid: &[Vec<String>],
    fuente: Fuente,
    cfg: &ShiftConfig,
) -> Result<ResultadoImportacion> {
    if grid.len() < 3 {
        return Err(Error::format(
            fuente.as_str(),
            "el archivo no tiene el formato esperado del checador",
        ));
    }

    let rango = extraer_rango_fechas(grid, fuente)?;
    let empleados = parsear_empleados(grid, &rango, fuente, cfg);
    let resumen = resumen_general(&empleados, &rango);

    tracing::info!(
        ubicacion = fuente.as_str(),
        empleados = empleados.len(),
        dias = rango.total_dias(),
        "archivo de checador importado"
    );

    Ok(ResultadoImportacion {
        ubicacion: fuente.as_str().to_string(),
        rango,
        empleados,
        resumen,
        importado_el: chrono::Utc::now(),
    })
}

fn leer_grid_csv(buffer: &[u8], fuente: Fuente) -> Result<Vec<Vec<String>>> {
    let mut lector = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(buffer);

    let mut filas = Vec::new();
    for registro in lector.records() {
        let registro = registro
            .map_err(|e| Error::format(fuente.as_str(), format!("contenido ilegible: {e}")))?;
        filas.push(registro.iter().map(|celda| celda.to_string()).collect());
    }
    Ok(filas)
}

/// Finds the `"<inicio> ~ <fin>"` header cell and expands it into the
/// inclusive date sequence that maps column index to calendar date for
/// every employee block.
fn extraer_rango_fechas(grid: &[Vec<String>], fuente: Fuente) -> Result<RangoFechas> {
    let mut rango_str = String::new();
    for fila in grid {
        if let Some(celda) = fila.iter().find(|c| c.contains('~')) {
            rango_str = celda.trim().to_string();
            break;
        }
    }

    if rango_str.is_empty() {
        return Err(Error::format(
            fuente.as_str(),
            "no se encontró el rango de fechas; se esperaba \"YYYY-MM-DD ~ YYYY-MM-DD\"",
        ));
    }

    let mut partes = rango_str.split('~').map(str::trim);
    let inicio = partes.next().unwrap_or_default();
    let fin = partes.next().unwrap_or_default();

    let inicio = NaiveDate::parse_from_str(inicio, "%Y-%m-%d").map_err(|_| {
        Error::format(fuente.as_str(), format!("fecha inválida: \"{rango_str}\""))
    })?;
    let fin = NaiveDate::parse_from_str(fin, "%Y-%m-%d").map_err(|_| {
        Error::format(fuente.as_str(), format!("fecha inválida: \"{rango_str}\""))
    })?;

    let mut fechas = Vec::new();
    let mut actual = inicio;
    while actual <= fin {
        fechas.push(actual);
        match actual.succ_opt() {
            Some(siguiente) => actual = siguiente,
            None => break,
        }
    }

    Ok(RangoFechas { inicio, fin, fechas })
}

fn parsear_empleados(
    grid: &[Vec<String>],
    rango: &RangoFechas,
    fuente: Fuente,
    cfg: &ShiftConfig,
) -> Vec<EmpleadoImportado> {
    let vacia: Vec<String> = Vec::new();
    let mut empleados = Vec::new();

    let mut i = 0;
    while i < grid.len() {
        let fila = &grid[i];
        if fila.first().map(|c| c.trim()) != Some("ID.") {
            i += 1;
            continue;
        }

        let id_checador = fila
            .get(2)
            .and_then(|celda| celda.trim().parse::<i64>().ok());

        let nombre = valor_tras_etiqueta(fila, "Nombre").unwrap_or_else(|| {
            fila.get(COLUMNA_NOMBRE_FIJA)
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        });
        let departamento = valor_tras_etiqueta(fila, "Depart.").unwrap_or_default();

        let fila_dias = grid.get(i + 1).unwrap_or(&vacia);
        let fila_nombres = grid.get(i + 2).unwrap_or(&vacia);
        let fila_checadas = grid.get(i + 3).unwrap_or(&vacia);

        let dias = parsear_dias(fila_dias, fila_nombres, fila_checadas, rango, fuente, cfg);

        let mut empleado = EmpleadoImportado {
            id_checador,
            nombre,
            departamento,
            emparejado_por: Emparejamiento::Nombre,
            dias,
            total_horas: 0.0,
            total_dias_trabajados: 0,
            total_ausencias: 0,
            total_retardos: 0,
            total_incompletos: 0,
        };
        empleado.recalcular_totales();
        empleados.push(empleado);

        i += 4;
    }

    empleados
}

/// Identity cells sit two columns to the right of their label cell.
fn valor_tras_etiqueta(fila: &[String], etiqueta: &str) -> Option<String> {
    fila.iter().position(|celda| celda.trim() == etiqueta).and_then(|j| {
        fila.get(j + 2)
            .map(|celda| celda.trim().to_string())
            .filter(|valor| !valor.is_empty())
    })
}

fn parsear_dias(
    fila_dias: &[String],
    fila_nombres: &[String],
    fila_checadas: &[String],
    rango: &RangoFechas,
    fuente: Fuente,
    cfg: &ShiftConfig,
) -> Vec<DiaRegistro> {
    let columnas = fila_dias.len().min(rango.total_dias());
    let mut dias = Vec::with_capacity(columnas);

    for col in 0..columnas {
        let Ok(dia_num) = fila_dias[col].trim().parse::<u32>() else {
            continue;
        };
        let nombre_dia = fila_nombres
            .get(col)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        let celda = fila_checadas.get(col).map(String::as_str).unwrap_or("");

        let checadas = parsear_checadas(celda);
        let calculo = calcular_horas_dia(&checadas, cfg);

        dias.push(DiaRegistro::nuevo(
            rango.fechas.get(col).copied(),
            dia_num,
            nombre_dia,
            checadas,
            fuente,
            calculo,
        ));
    }

    dias
}

/// Splits one day cell into its valid punches, ascending by time.
/// Malformed tokens are dropped, not errored; `nan` and empty cells mean
/// no punches at all.
pub fn parsear_checadas(celda: &str) -> Vec<Checada> {
    let celda = celda.trim();
    if celda.is_empty() || celda.eq_ignore_ascii_case("nan") {
        return Vec::new();
    }

    let mut checadas: Vec<Checada> = celda
        .split('\n')
        .map(str::trim)
        .filter_map(parsear_token)
        .collect();
    checadas.sort_by_key(|c| c.total_minutos);
    checadas
}

/// Accepts `H:MM` or `HH:MM` only.
fn parsear_token(token: &str) -> Option<Checada> {
    let (hora, minuto) = token.split_once(':')?;
    if hora.is_empty() || hora.len() > 2 || minuto.len() != 2 {
        return None;
    }
    if !hora.bytes().all(|b| b.is_ascii_digit()) || !minuto.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hora: u32 = hora.parse().ok()?;
    let minuto: u32 = minuto.parse().ok()?;
    if hora > 23 || minuto > 59 {
        return None;
    }

    Some(Checada {
        hora,
        minuto,
        total_minutos: hora * 60 + minuto,
        hora_str: token.to_string(),
    })
}
