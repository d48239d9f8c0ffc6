//! Named payroll and schedule parameters.
//!
//! Parameters live in `configuracion_nomina` with a declared value type
//! (`STRING|INT|BOOLEAN|DECIMAL`) and are coerced at read time. Each
//! operation loads what it needs once, into an immutable snapshot, and the
//! pure computations only ever see the snapshot, never the store.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::checador::ShiftConfig;
use crate::database::queries;
use crate::error::Result;
use crate::utils::time::parse_hora_minutos;

async fn valor_activo(pool: &SqlitePool, clave: &str) -> Result<Option<String>> {
    Ok(queries::get_config(pool, clave)
        .await?
        .filter(|config| config.activo)
        .map(|config| config.valor))
}

pub async fn get_int(pool: &SqlitePool, clave: &str, default: i64) -> Result<i64> {
    match valor_activo(pool, clave).await? {
        Some(valor) => match valor.trim().parse() {
            Ok(numero) => Ok(numero),
            Err(_) => {
                warn!(clave, %valor, "parámetro no es un entero, se usa el valor por defecto");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

pub async fn get_decimal(pool: &SqlitePool, clave: &str, default: f64) -> Result<f64> {
    match valor_activo(pool, clave).await? {
        Some(valor) => match valor.trim().parse() {
            Ok(numero) => Ok(numero),
            Err(_) => {
                warn!(clave, %valor, "parámetro no es un decimal, se usa el valor por defecto");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

pub async fn get_bool(pool: &SqlitePool, clave: &str, default: bool) -> Result<bool> {
    match valor_activo(pool, clave).await? {
        Some(valor) => Ok(valor.trim().eq_ignore_ascii_case("true")),
        None => Ok(default),
    }
}

/// "HH:MM" parameters, read as minutes since midnight.
pub async fn get_hora(pool: &SqlitePool, clave: &str, default: u32) -> Result<u32> {
    match valor_activo(pool, clave).await? {
        Some(valor) => match parse_hora_minutos(&valor) {
            Some(minutos) => Ok(minutos),
            None => {
                warn!(clave, %valor, "parámetro no es una hora HH:MM, se usa el valor por defecto");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

/// Weekly payroll parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigNomina {
    pub bono_puntualidad_activo: bool,
    pub bono_puntualidad_monto: f64,
    pub bono_puntualidad_checadas: u32,
    pub bono_puntualidad_dias: u32,
    pub horas_extra_dobles_limite: f64,
    pub calcular_isr: bool,
    pub calcular_imss: bool,
}

impl Default for ConfigNomina {
    fn default() -> Self {
        Self {
            bono_puntualidad_activo: true,
            bono_puntualidad_monto: 50.0,
            bono_puntualidad_checadas: 8,
            bono_puntualidad_dias: 6,
            horas_extra_dobles_limite: 9.0,
            // Company policy: income tax is not withheld at all.
            calcular_isr: false,
            calcular_imss: true,
        }
    }
}

pub async fn cargar_horario(pool: &SqlitePool) -> Result<ShiftConfig> {
    Ok(ShiftConfig {
        entrada_estandar: get_hora(pool, "HORA_ENTRADA", 8 * 60).await?,
        salida_estandar: get_hora(pool, "HORA_SALIDA", 17 * 60).await?,
        comida_inicio: get_hora(pool, "HORA_COMIDA_INICIO", 14 * 60).await?,
        comida_fin: get_hora(pool, "HORA_COMIDA_FIN", 15 * 60).await?,
        tolerancia_minutos: get_int(pool, "TOLERANCIA_MINUTOS", 15).await? as u32,
        jornada_completa_horas: get_int(pool, "HORAS_DIARIAS", 8).await? as f64,
    })
}

pub async fn cargar_nomina(pool: &SqlitePool) -> Result<ConfigNomina> {
    Ok(ConfigNomina {
        bono_puntualidad_activo: get_bool(pool, "BONO_PUNTUALIDAD_ACTIVO", true).await?,
        bono_puntualidad_monto: get_decimal(pool, "BONO_PUNTUALIDAD_MONTO", 50.0).await?,
        bono_puntualidad_checadas: get_int(pool, "BONO_PUNTUALIDAD_CHECADAS", 8).await? as u32,
        bono_puntualidad_dias: get_int(pool, "BONO_PUNTUALIDAD_DIAS", 6).await? as u32,
        horas_extra_dobles_limite: get_decimal(pool, "HORAS_EXTRA_DOBLES_LIMITE", 9.0).await?,
        calcular_isr: get_bool(pool, "CALCULAR_ISR", false).await?,
        calcular_imss: get_bool(pool, "CALCULAR_IMSS", true).await?,
    })
}

/// Seeds the default parameters without touching operator-edited values.
pub async fn sembrar_defaults(pool: &SqlitePool) -> Result<()> {
    let defaults: &[(&str, &str, &str, &str)] = &[
        ("TIPO_NOMINA", "SEMANAL", "Frecuencia de pago de nómina", "STRING"),
        ("DIA_PAGO", "VIERNES", "Día de la semana en que se paga", "STRING"),
        ("HORA_ENTRADA", "08:00", "Hora de entrada estándar", "STRING"),
        ("HORA_SALIDA", "17:00", "Hora de salida estándar", "STRING"),
        ("HORA_COMIDA_INICIO", "14:00", "Hora de inicio de comida", "STRING"),
        ("HORA_COMIDA_FIN", "15:00", "Hora de fin de comida", "STRING"),
        ("TOLERANCIA_MINUTOS", "15", "Minutos de tolerancia para entrada", "INT"),
        ("HORAS_DIARIAS", "8", "Horas de jornada diaria", "INT"),
        ("CALCULAR_ISR", "false", "Si se calcula y retiene ISR", "BOOLEAN"),
        ("CALCULAR_IMSS", "true", "Si se calculan cuotas IMSS obrero", "BOOLEAN"),
        ("BONO_PUNTUALIDAD_ACTIVO", "true", "Si se otorga bono de puntualidad", "BOOLEAN"),
        ("BONO_PUNTUALIDAD_MONTO", "50.00", "Monto semanal del bono de puntualidad", "DECIMAL"),
        ("BONO_PUNTUALIDAD_CHECADAS", "8", "Checadas requeridas para bono", "INT"),
        ("BONO_PUNTUALIDAD_DIAS", "6", "Días requeridos para bono de puntualidad", "INT"),
        ("HORAS_EXTRA_DOBLES_LIMITE", "9", "Hasta qué hora extra se paga doble", "INT"),
    ];

    for &(clave, valor, descripcion, tipo_dato) in defaults {
        queries::config_si_falta(pool, clave, valor, descripcion, tipo_dato).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    #[tokio::test]
    async fn valores_tipados_con_defaults() {
        let pool = test_pool().await;

        assert_eq!(get_int(&pool, "TOLERANCIA_MINUTOS", 15).await.unwrap(), 15);

        queries::upsert_config(&pool, "TOLERANCIA_MINUTOS", "10", "INT")
            .await
            .unwrap();
        assert_eq!(get_int(&pool, "TOLERANCIA_MINUTOS", 15).await.unwrap(), 10);

        queries::upsert_config(&pool, "BONO_PUNTUALIDAD_MONTO", "75.50", "DECIMAL")
            .await
            .unwrap();
        assert_eq!(
            get_decimal(&pool, "BONO_PUNTUALIDAD_MONTO", 50.0).await.unwrap(),
            75.5
        );

        queries::upsert_config(&pool, "CALCULAR_IMSS", "false", "BOOLEAN")
            .await
            .unwrap();
        assert!(!get_bool(&pool, "CALCULAR_IMSS", true).await.unwrap());
    }

    #[tokio::test]
    async fn valor_ilegible_regresa_el_default() {
        let pool = test_pool().await;
        queries::upsert_config(&pool, "TOLERANCIA_MINUTOS", "quince", "INT")
            .await
            .unwrap();
        assert_eq!(get_int(&pool, "TOLERANCIA_MINUTOS", 15).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn horario_desde_parametros() {
        let pool = test_pool().await;
        queries::upsert_config(&pool, "HORA_ENTRADA", "09:00", "STRING")
            .await
            .unwrap();

        let horario = cargar_horario(&pool).await.unwrap();
        assert_eq!(horario.entrada_estandar, 9 * 60);
        assert_eq!(horario.salida_estandar, 17 * 60);
        assert_eq!(horario.comida_inicio, 14 * 60);
    }

    #[tokio::test]
    async fn sembrar_no_pisa_valores_editados() {
        let pool = test_pool().await;
        queries::upsert_config(&pool, "BONO_PUNTUALIDAD_MONTO", "80", "DECIMAL")
            .await
            .unwrap();

        sembrar_defaults(&pool).await.unwrap();

        let nomina = cargar_nomina(&pool).await.unwrap();
        assert_eq!(nomina.bono_puntualidad_monto, 80.0);
        assert_eq!(nomina.bono_puntualidad_checadas, 8);
    }
}
