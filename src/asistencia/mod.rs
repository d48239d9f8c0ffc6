//! Attendance service.
//!
//! Bridges live punch events from the biometric terminals and the
//! persisted attendance store, and computes the daily, per-employee and
//! per-site reports. Schedule parameters are loaded once per operation
//! into a [`ShiftConfig`] snapshot; the punch evaluation itself is pure.

use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::checador::ShiftConfig;
use crate::database::models::{Asistencia, EstadoChecada, TipoChecada, Ubicacion};
use crate::database::queries;
use crate::error::{Error, Result};
use crate::parametros;
use crate::utils::time::minutos_del_dia;

const NOTA_FALTA_AUTOMATICA: &str = "Falta marcada automáticamente - Sin registro de entrada";

pub struct AsistenciaService {
    pool: SqlitePool,
}

/// Outcome of evaluating one punch against the schedule.
#[derive(Debug, Clone, Serialize)]
pub struct EstadoEvaluado {
    pub estado: EstadoChecada,
    pub retardo: bool,
    pub minutos_retardo: u32,
    pub mensaje: String,
}

/// Evaluates a punch time against the configured schedule. Entry punches
/// grade lateness against standard entry plus tolerance; exit punches
/// grade shift completion against standard exit.
pub fn evaluar_estado_checada(
    tipo: TipoChecada,
    minutos: u32,
    horario: &ShiftConfig,
) -> EstadoEvaluado {
    match tipo {
        TipoChecada::Entrada => {
            let limite_tolerancia = horario.entrada_estandar + horario.tolerancia_minutos;
            if minutos <= horario.entrada_estandar {
                EstadoEvaluado {
                    estado: EstadoChecada::ATiempo,
                    retardo: false,
                    minutos_retardo: 0,
                    mensaje: "Entrada a tiempo".to_string(),
                }
            } else if minutos <= limite_tolerancia {
                EstadoEvaluado {
                    estado: EstadoChecada::Tolerancia,
                    retardo: false,
                    minutos_retardo: 0,
                    mensaje: "Entrada dentro de tolerancia".to_string(),
                }
            } else {
                let minutos_retardo = minutos - horario.entrada_estandar;
                EstadoEvaluado {
                    estado: EstadoChecada::Retardo,
                    retardo: true,
                    minutos_retardo,
                    mensaje: format!("Retardo de {} minutos", minutos_retardo),
                }
            }
        }
        TipoChecada::Salida => {
            if minutos >= horario.salida_estandar {
                EstadoEvaluado {
                    estado: EstadoChecada::Completo,
                    retardo: false,
                    minutos_retardo: 0,
                    mensaje: "Jornada completa".to_string(),
                }
            } else {
                EstadoEvaluado {
                    estado: EstadoChecada::SalidaTemprana,
                    retardo: false,
                    minutos_retardo: 0,
                    mensaje: format!(
                        "Salida {} minutos antes",
                        horario.salida_estandar - minutos
                    ),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecadaRegistrada {
    pub asistencia: Asistencia,
    pub tipo: TipoChecada,
    pub ubicacion: Ubicacion,
    pub fecha_hora: NaiveDateTime,
    pub estado: EstadoEvaluado,
    pub empleado: String,
}

/// One punch inside a batch; site and device may fall back to the
/// batch-level values.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecadaInput {
    pub empleado_id: i64,
    pub tipo_checada: String,
    pub ubicacion: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub dispositivo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoteChecadas {
    pub checadas: Vec<ChecadaInput>,
    pub ubicacion: Option<String>,
    pub dispositivo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorLote {
    pub indice: usize,
    pub empleado_id: i64,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ResultadoLote {
    pub procesadas: usize,
    pub exitosas: usize,
    pub errores: Vec<ErrorLote>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Periodo {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct DetalleAsistencia {
    pub empleado_id: i64,
    pub nombre_completo: String,
    pub puesto: Option<String>,
    pub area: Option<String>,
    pub fecha: NaiveDate,
    pub presente: bool,
    pub hora_entrada: Option<NaiveDateTime>,
    pub hora_salida: Option<NaiveDateTime>,
    pub retardo: bool,
    pub minutos_retardo: i64,
    pub ubicacion_entrada: Option<String>,
    pub ubicacion_salida: Option<String>,
}

impl From<&queries::AsistenciaDetalle> for DetalleAsistencia {
    fn from(detalle: &queries::AsistenciaDetalle) -> Self {
        let a = &detalle.asistencia;
        Self {
            empleado_id: a.empleado_id,
            nombre_completo: detalle.nombre_completo.clone(),
            puesto: detalle.puesto.clone(),
            area: detalle.area.clone(),
            fecha: a.fecha,
            presente: a.presente,
            hora_entrada: a.hora_entrada,
            hora_salida: a.hora_salida,
            retardo: a.retardo,
            minutos_retardo: a.minutos_retardo,
            ubicacion_entrada: a.ubicacion_entrada.clone(),
            ubicacion_salida: a.ubicacion_salida.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ConteoSitios {
    pub ram1: usize,
    pub ram2: usize,
}

#[derive(Debug, Serialize)]
pub struct ResumenDiario {
    pub fecha: NaiveDate,
    pub total_empleados_activos: i64,
    pub total_presentes: i64,
    pub total_ausentes: i64,
    pub porcentaje_asistencia: i64,
    pub con_entrada: usize,
    pub con_salida: usize,
    pub con_retardo: usize,
    pub por_ubicacion: ConteoSitios,
    pub detalle: Vec<DetalleAsistencia>,
}

#[derive(Debug, Default, Serialize)]
pub struct ConteoChecadas {
    pub entradas: u32,
    pub salidas: u32,
}

#[derive(Debug, Serialize)]
pub struct ResumenAsistencia {
    pub empleado_id: i64,
    pub periodo: Periodo,
    pub total_dias: usize,
    pub dias_presentes: u32,
    pub dias_ausentes: u32,
    pub retardos: u32,
    pub minutos_retardo_total: i64,
    pub horas_trabajadas: f64,
    pub checadas_completas: u32,
    pub ram1: ConteoChecadas,
    pub ram2: ConteoChecadas,
    pub detalle: Vec<Asistencia>,
}

#[derive(Debug, Default, Serialize)]
pub struct SitioReporte {
    pub total_empleados: usize,
    pub total_checadas: usize,
    pub detalle: Vec<DetalleAsistencia>,
}

#[derive(Debug, Serialize)]
pub struct ReporteUbicacion {
    pub periodo: Periodo,
    pub ram1: SitioReporte,
    pub ram2: SitioReporte,
}

#[derive(Debug, Serialize)]
pub struct FaltaMarcada {
    pub empleado_id: i64,
    pub nombre: String,
}

#[derive(Debug, Serialize)]
pub struct ResultadoFaltas {
    pub fecha: NaiveDate,
    pub mensaje: Option<String>,
    pub total_empleados_activos: usize,
    pub empleados_con_asistencia: usize,
    pub faltas_marcadas: usize,
    pub detalle: Vec<FaltaMarcada>,
}

impl AsistenciaService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers one punch. The day row is found or created, then only the
    /// fields for this punch type are written: another ENTRADA overwrites
    /// entry fields, another SALIDA overwrites exit fields, nothing else.
    /// Every received punch is appended to the audit history.
    pub async fn registrar_checada(
        &self,
        empleado_id: i64,
        tipo: TipoChecada,
        ubicacion: Ubicacion,
        fecha_hora: NaiveDateTime,
        dispositivo: Option<&str>,
    ) -> Result<ChecadaRegistrada> {
        let horario = parametros::cargar_horario(&self.pool).await?;

        let empleado = queries::get_empleado(&self.pool, empleado_id)
            .await?
            .ok_or(Error::NotFound(empleado_id))?;
        if !empleado.activo() {
            return Err(Error::InactiveEmployee(empleado_id));
        }

        let estado = evaluar_estado_checada(tipo, minutos_del_dia(&fecha_hora), &horario);

        let fecha = fecha_hora.date();
        let asistencia_id = match queries::buscar_asistencia(&self.pool, empleado_id, fecha).await? {
            Some(asistencia) => asistencia.id,
            None => queries::insertar_asistencia(&self.pool, empleado_id, fecha).await?,
        };

        match tipo {
            TipoChecada::Entrada => {
                queries::actualizar_entrada(
                    &self.pool,
                    asistencia_id,
                    fecha_hora,
                    ubicacion.as_str(),
                    estado.retardo,
                    estado.minutos_retardo as i64,
                )
                .await?;
            }
            TipoChecada::Salida => {
                queries::actualizar_salida(&self.pool, asistencia_id, fecha_hora, ubicacion.as_str())
                    .await?;
            }
        }

        queries::insertar_historial(
            &self.pool,
            asistencia_id,
            tipo.as_str(),
            fecha_hora,
            ubicacion.as_str(),
            dispositivo,
            estado.estado.as_str(),
        )
        .await?;

        let asistencia = queries::get_asistencia(&self.pool, asistencia_id).await?;

        info!(
            empleado_id,
            tipo = tipo.as_str(),
            ubicacion = ubicacion.as_str(),
            estado = estado.estado.as_str(),
            "checada registrada"
        );

        Ok(ChecadaRegistrada {
            asistencia,
            tipo,
            ubicacion,
            fecha_hora,
            estado,
            empleado: empleado.nombre_completo(),
        })
    }

    /// Processes a batch of punches from a terminal sync. Each item is
    /// independent: a bad item is reported and the rest of the batch keeps
    /// going. Partial failure is the normal result shape here, not an
    /// exception.
    pub async fn sincronizar_lote(&self, lote: LoteChecadas) -> ResultadoLote {
        let mut resultado = ResultadoLote {
            procesadas: 0,
            exitosas: 0,
            errores: Vec::new(),
        };

        for (indice, checada) in lote.checadas.iter().enumerate() {
            resultado.procesadas += 1;

            match self.registrar_item(checada, &lote).await {
                Ok(_) => resultado.exitosas += 1,
                Err(error) => resultado.errores.push(ErrorLote {
                    indice,
                    empleado_id: checada.empleado_id,
                    error: error.to_string(),
                }),
            }
        }

        info!(
            procesadas = resultado.procesadas,
            exitosas = resultado.exitosas,
            con_error = resultado.errores.len(),
            "lote de checadas sincronizado"
        );

        resultado
    }

    async fn registrar_item(
        &self,
        checada: &ChecadaInput,
        lote: &LoteChecadas,
    ) -> Result<ChecadaRegistrada> {
        let tipo: TipoChecada = checada.tipo_checada.parse()?;

        let ubicacion = checada
            .ubicacion
            .as_deref()
            .or(lote.ubicacion.as_deref())
            .ok_or_else(|| Error::Validation("falta la ubicación de la checada".to_string()))?
            .parse::<Ubicacion>()?;

        let fecha_hora = checada
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        let dispositivo = checada.dispositivo.as_deref().or(lote.dispositivo.as_deref());

        self.registrar_checada(checada.empleado_id, tipo, ubicacion, fecha_hora, dispositivo)
            .await
    }

    /// Attendance picture for one date across the whole staff. With zero
    /// active employees the percentage is 0, not an error.
    pub async fn resumen_diario(&self, fecha: NaiveDate) -> Result<ResumenDiario> {
        let asistencias = queries::asistencias_por_fecha(&self.pool, fecha).await?;
        let total_activos = queries::contar_empleados_activos(&self.pool).await?;

        let presentes = asistencias
            .iter()
            .filter(|d| d.asistencia.presente)
            .count() as i64;
        let porcentaje = if total_activos > 0 {
            ((presentes as f64 / total_activos as f64) * 100.0).round() as i64
        } else {
            0
        };

        let mut por_ubicacion = ConteoSitios::default();
        for detalle in &asistencias {
            match detalle.asistencia.ubicacion_entrada.as_deref() {
                Some("RAM1") => por_ubicacion.ram1 += 1,
                Some("RAM2") => por_ubicacion.ram2 += 1,
                _ => {}
            }
        }

        Ok(ResumenDiario {
            fecha,
            total_empleados_activos: total_activos,
            total_presentes: presentes,
            total_ausentes: total_activos - presentes,
            porcentaje_asistencia: porcentaje,
            con_entrada: asistencias
                .iter()
                .filter(|d| d.asistencia.hora_entrada.is_some())
                .count(),
            con_salida: asistencias
                .iter()
                .filter(|d| d.asistencia.hora_salida.is_some())
                .count(),
            con_retardo: asistencias.iter().filter(|d| d.asistencia.retardo).count(),
            por_ubicacion,
            detalle: asistencias.iter().map(DetalleAsistencia::from).collect(),
        })
    }

    /// Per-day detail plus totals for one employee over a date range.
    ///
    /// Hours here are a reporting estimate from the two stored timestamps,
    /// with a flat 1-hour meal deduction whenever both punches exist. The
    /// authoritative worked-hours rule is the interval-overlap calculation
    /// applied to imported terminal data; the two are intentionally
    /// different policies.
    pub async fn resumen_empleado(
        &self,
        empleado_id: i64,
        inicio: NaiveDate,
        fin: NaiveDate,
    ) -> Result<ResumenAsistencia> {
        queries::get_empleado(&self.pool, empleado_id)
            .await?
            .ok_or(Error::NotFound(empleado_id))?;

        let asistencias =
            queries::asistencias_rango_empleado(&self.pool, empleado_id, inicio, fin).await?;

        let mut resumen = ResumenAsistencia {
            empleado_id,
            periodo: Periodo { inicio, fin },
            total_dias: asistencias.len(),
            dias_presentes: 0,
            dias_ausentes: 0,
            retardos: 0,
            minutos_retardo_total: 0,
            horas_trabajadas: 0.0,
            checadas_completas: 0,
            ram1: ConteoChecadas::default(),
            ram2: ConteoChecadas::default(),
            detalle: Vec::new(),
        };

        for asistencia in &asistencias {
            if asistencia.presente {
                resumen.dias_presentes += 1;

                if asistencia.retardo {
                    resumen.retardos += 1;
                    resumen.minutos_retardo_total += asistencia.minutos_retardo;
                }

                if let (Some(entrada), Some(salida)) =
                    (asistencia.hora_entrada, asistencia.hora_salida)
                {
                    resumen.checadas_completas += 1;
                    let horas = (salida - entrada).num_minutes() as f64 / 60.0;
                    resumen.horas_trabajadas += (horas - 1.0).max(0.0);
                }

                match asistencia.ubicacion_entrada.as_deref() {
                    Some("RAM1") => resumen.ram1.entradas += 1,
                    Some("RAM2") => resumen.ram2.entradas += 1,
                    _ => {}
                }
                match asistencia.ubicacion_salida.as_deref() {
                    Some("RAM1") => resumen.ram1.salidas += 1,
                    Some("RAM2") => resumen.ram2.salidas += 1,
                    _ => {}
                }
            } else {
                resumen.dias_ausentes += 1;
            }
        }

        resumen.horas_trabajadas = (resumen.horas_trabajadas * 100.0).round() / 100.0;
        resumen.detalle = asistencias;

        Ok(resumen)
    }

    /// Presence rows grouped by site. The entry site wins when a row has
    /// punches at both; rows with no site recorded are left out.
    pub async fn reporte_por_ubicacion(
        &self,
        inicio: NaiveDate,
        fin: NaiveDate,
        filtro: Option<Ubicacion>,
    ) -> Result<ReporteUbicacion> {
        let asistencias = queries::asistencias_presentes_rango(&self.pool, inicio, fin).await?;

        let mut ram1 = SitioReporte::default();
        let mut ram2 = SitioReporte::default();
        let mut empleados_ram1 = HashSet::new();
        let mut empleados_ram2 = HashSet::new();

        for detalle in &asistencias {
            let asistencia = &detalle.asistencia;
            let ubicacion = asistencia
                .ubicacion_entrada
                .as_deref()
                .or(asistencia.ubicacion_salida.as_deref());

            let Some(ubicacion) = ubicacion.and_then(|u| u.parse::<Ubicacion>().ok()) else {
                continue;
            };
            if let Some(filtro) = filtro {
                if ubicacion != filtro {
                    continue;
                }
            }

            let (sitio, empleados) = match ubicacion {
                Ubicacion::Ram1 => (&mut ram1, &mut empleados_ram1),
                Ubicacion::Ram2 => (&mut ram2, &mut empleados_ram2),
            };
            empleados.insert(asistencia.empleado_id);
            sitio.total_checadas += 1;
            sitio.detalle.push(DetalleAsistencia::from(detalle));
        }

        ram1.total_empleados = empleados_ram1.len();
        ram2.total_empleados = empleados_ram2.len();

        Ok(ReporteUbicacion {
            periodo: Periodo { inicio, fin },
            ram1,
            ram2,
        })
    }

    /// Marks an absence for every active employee (hired on or before the
    /// target date) with no attendance row that day, unless an approved
    /// incidencia covers the date. Defaults to yesterday. Sundays are the
    /// weekly rest day and are skipped entirely. Existing rows are never
    /// duplicated, so re-running the sweep is harmless.
    pub async fn marcar_faltas(&self, fecha: Option<NaiveDate>) -> Result<ResultadoFaltas> {
        let fecha = fecha.unwrap_or_else(|| Local::now().date_naive() - Duration::days(1));

        if fecha.weekday() == Weekday::Sun {
            return Ok(ResultadoFaltas {
                fecha,
                mensaje: Some("Domingo - No es día laboral".to_string()),
                total_empleados_activos: 0,
                empleados_con_asistencia: 0,
                faltas_marcadas: 0,
                detalle: Vec::new(),
            });
        }

        let activos = queries::empleados_activos(&self.pool, Some(fecha)).await?;
        let con_asistencia: HashSet<i64> = queries::asistencias_por_fecha(&self.pool, fecha)
            .await?
            .iter()
            .map(|d| d.asistencia.empleado_id)
            .collect();

        let mut detalle = Vec::new();
        for empleado in &activos {
            if con_asistencia.contains(&empleado.id) {
                continue;
            }
            if queries::incidencia_aprobada_en_fecha(&self.pool, empleado.id, fecha)
                .await?
                .is_some()
            {
                continue;
            }

            queries::insertar_falta(&self.pool, empleado.id, fecha, NOTA_FALTA_AUTOMATICA).await?;
            detalle.push(FaltaMarcada {
                empleado_id: empleado.id,
                nombre: empleado.nombre_completo(),
            });
        }

        info!(
            fecha = %fecha,
            faltas = detalle.len(),
            "barrido de faltas automáticas"
        );

        Ok(ResultadoFaltas {
            fecha,
            mensaje: None,
            total_empleados_activos: activos.len(),
            empleados_con_asistencia: con_asistencia.len(),
            faltas_marcadas: detalle.len(),
            detalle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AltaEmpleado, ESTATUS_ACTIVO, INCIDENCIA_APROBADA};
    use crate::database::test_pool;

    async fn alta(pool: &SqlitePool, nombre: &str, estatus: &str) -> i64 {
        queries::crear_empleado(
            pool,
            &AltaEmpleado {
                nombre: nombre.to_string(),
                apellido_paterno: "Pérez".to_string(),
                apellido_materno: None,
                puesto: Some("Operador".to_string()),
                area: Some("Producción".to_string()),
                salario_mensual: 12000.0,
                fecha_ingreso: NaiveDate::from_ymd_opt(2023, 1, 9).unwrap(),
                estatus: estatus.to_string(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn dt(fecha: NaiveDate, hora: u32, minuto: u32) -> NaiveDateTime {
        fecha.and_hms_opt(hora, minuto, 0).unwrap()
    }

    // 2024-11-20 is a Wednesday.
    fn miercoles() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
    }

    #[test]
    fn estado_de_entrada_por_tramos() {
        let horario = ShiftConfig::default();

        let estado = evaluar_estado_checada(TipoChecada::Entrada, 7 * 60 + 55, &horario);
        assert_eq!(estado.estado, EstadoChecada::ATiempo);

        let estado = evaluar_estado_checada(TipoChecada::Entrada, 8 * 60 + 10, &horario);
        assert_eq!(estado.estado, EstadoChecada::Tolerancia);
        assert!(!estado.retardo);

        let estado = evaluar_estado_checada(TipoChecada::Entrada, 8 * 60 + 20, &horario);
        assert_eq!(estado.estado, EstadoChecada::Retardo);
        assert!(estado.retardo);
        assert_eq!(estado.minutos_retardo, 20);
    }

    #[test]
    fn estado_de_salida() {
        let horario = ShiftConfig::default();

        let estado = evaluar_estado_checada(TipoChecada::Salida, 17 * 60, &horario);
        assert_eq!(estado.estado, EstadoChecada::Completo);

        let estado = evaluar_estado_checada(TipoChecada::Salida, 16 * 60 + 30, &horario);
        assert_eq!(estado.estado, EstadoChecada::SalidaTemprana);
    }

    #[tokio::test]
    async fn entrada_y_salida_comparten_la_fila_del_dia() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let empleado_id = alta(&pool, "Ana", ESTATUS_ACTIVO).await;

        let entrada = servicio
            .registrar_checada(
                empleado_id,
                TipoChecada::Entrada,
                Ubicacion::Ram1,
                dt(miercoles(), 8, 0),
                Some("terminal-1"),
            )
            .await
            .unwrap();
        assert!(entrada.asistencia.presente);
        assert!(entrada.asistencia.hora_salida.is_none());

        let salida = servicio
            .registrar_checada(
                empleado_id,
                TipoChecada::Salida,
                Ubicacion::Ram2,
                dt(miercoles(), 17, 5),
                None,
            )
            .await
            .unwrap();

        assert_eq!(salida.asistencia.id, entrada.asistencia.id);
        assert!(salida.asistencia.hora_entrada.is_some());
        assert!(salida.asistencia.hora_salida.is_some());
        assert_eq!(salida.asistencia.ubicacion_entrada.as_deref(), Some("RAM1"));
        assert_eq!(salida.asistencia.ubicacion_salida.as_deref(), Some("RAM2"));

        let historial = queries::historial_de_asistencia(&pool, entrada.asistencia.id)
            .await
            .unwrap();
        assert_eq!(historial.len(), 2);
        assert_eq!(historial[0].estado, "A_TIEMPO");
        assert_eq!(historial[1].estado, "COMPLETO");
    }

    #[tokio::test]
    async fn entrada_tarde_marca_retardo() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let empleado_id = alta(&pool, "Luis", ESTATUS_ACTIVO).await;

        let registrada = servicio
            .registrar_checada(
                empleado_id,
                TipoChecada::Entrada,
                Ubicacion::Ram1,
                dt(miercoles(), 8, 20),
                None,
            )
            .await
            .unwrap();

        assert!(registrada.asistencia.retardo);
        assert_eq!(registrada.asistencia.minutos_retardo, 20);
        assert_eq!(registrada.estado.estado, EstadoChecada::Retardo);
    }

    #[tokio::test]
    async fn empleado_desconocido_o_inactivo() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let inactivo = alta(&pool, "Baja", "Baja").await;

        let err = servicio
            .registrar_checada(
                999,
                TipoChecada::Entrada,
                Ubicacion::Ram1,
                dt(miercoles(), 8, 0),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(999)));

        let err = servicio
            .registrar_checada(
                inactivo,
                TipoChecada::Entrada,
                Ubicacion::Ram1,
                dt(miercoles(), 8, 0),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InactiveEmployee(_)));
    }

    #[tokio::test]
    async fn lote_aisla_los_errores_por_checada() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let empleado_id = alta(&pool, "Ana", ESTATUS_ACTIVO).await;

        let item = |empleado_id, tipo: &str| ChecadaInput {
            empleado_id,
            tipo_checada: tipo.to_string(),
            ubicacion: None,
            timestamp: Some(dt(miercoles(), 8, 0)),
            dispositivo: None,
        };

        let resultado = servicio
            .sincronizar_lote(LoteChecadas {
                checadas: vec![
                    item(empleado_id, "ENTRADA"),
                    item(empleado_id, "COMIDA"),
                    item(999, "ENTRADA"),
                    item(empleado_id, "SALIDA"),
                ],
                ubicacion: Some("RAM1".to_string()),
                dispositivo: Some("terminal-1".to_string()),
            })
            .await;

        assert_eq!(resultado.procesadas, 4);
        assert_eq!(resultado.exitosas, 2);
        assert_eq!(resultado.errores.len(), 2);
        assert_eq!(resultado.errores[0].indice, 1);
        assert!(resultado.errores[0].error.contains("tipo de checada inválido"));
        assert_eq!(resultado.errores[1].indice, 2);
    }

    #[tokio::test]
    async fn lote_sin_ubicacion_es_error_de_validacion() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let empleado_id = alta(&pool, "Ana", ESTATUS_ACTIVO).await;

        let resultado = servicio
            .sincronizar_lote(LoteChecadas {
                checadas: vec![ChecadaInput {
                    empleado_id,
                    tipo_checada: "ENTRADA".to_string(),
                    ubicacion: None,
                    timestamp: Some(dt(miercoles(), 8, 0)),
                    dispositivo: None,
                }],
                ubicacion: None,
                dispositivo: None,
            })
            .await;

        assert_eq!(resultado.exitosas, 0);
        assert!(resultado.errores[0].error.contains("ubicación"));
    }

    #[tokio::test]
    async fn resumen_diario_cuenta_y_porcentaje() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let ana = alta(&pool, "Ana", ESTATUS_ACTIVO).await;
        let _luis = alta(&pool, "Luis", ESTATUS_ACTIVO).await;

        servicio
            .registrar_checada(
                ana,
                TipoChecada::Entrada,
                Ubicacion::Ram1,
                dt(miercoles(), 8, 0),
                None,
            )
            .await
            .unwrap();

        let resumen = servicio.resumen_diario(miercoles()).await.unwrap();
        assert_eq!(resumen.total_empleados_activos, 2);
        assert_eq!(resumen.total_presentes, 1);
        assert_eq!(resumen.total_ausentes, 1);
        assert_eq!(resumen.porcentaje_asistencia, 50);
        assert_eq!(resumen.por_ubicacion.ram1, 1);
        assert_eq!(resumen.detalle.len(), 1);
    }

    #[tokio::test]
    async fn resumen_diario_sin_empleados_activos() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());

        let resumen = servicio.resumen_diario(miercoles()).await.unwrap();
        assert_eq!(resumen.total_empleados_activos, 0);
        assert_eq!(resumen.porcentaje_asistencia, 0);
    }

    #[tokio::test]
    async fn resumen_de_rango_usa_descuento_fijo_de_comida() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let empleado_id = alta(&pool, "Ana", ESTATUS_ACTIVO).await;

        for dia in [20, 21] {
            let fecha = NaiveDate::from_ymd_opt(2024, 11, dia).unwrap();
            servicio
                .registrar_checada(
                    empleado_id,
                    TipoChecada::Entrada,
                    Ubicacion::Ram1,
                    dt(fecha, 8, 0),
                    None,
                )
                .await
                .unwrap();
            servicio
                .registrar_checada(
                    empleado_id,
                    TipoChecada::Salida,
                    Ubicacion::Ram1,
                    dt(fecha, 17, 0),
                    None,
                )
                .await
                .unwrap();
        }

        let resumen = servicio
            .resumen_empleado(
                empleado_id,
                NaiveDate::from_ymd_opt(2024, 11, 18).unwrap(),
                NaiveDate::from_ymd_opt(2024, 11, 23).unwrap(),
            )
            .await
            .unwrap();

        // 9 clock hours per day minus the flat 1-hour meal deduction.
        assert_eq!(resumen.horas_trabajadas, 16.0);
        assert_eq!(resumen.dias_presentes, 2);
        assert_eq!(resumen.checadas_completas, 2);
        assert_eq!(resumen.ram1.entradas, 2);
        assert_eq!(resumen.ram1.salidas, 2);
    }

    #[tokio::test]
    async fn reporte_por_ubicacion_filtra() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let ana = alta(&pool, "Ana", ESTATUS_ACTIVO).await;
        let luis = alta(&pool, "Luis", ESTATUS_ACTIVO).await;

        servicio
            .registrar_checada(ana, TipoChecada::Entrada, Ubicacion::Ram1, dt(miercoles(), 8, 0), None)
            .await
            .unwrap();
        servicio
            .registrar_checada(luis, TipoChecada::Entrada, Ubicacion::Ram2, dt(miercoles(), 8, 5), None)
            .await
            .unwrap();

        let reporte = servicio
            .reporte_por_ubicacion(miercoles(), miercoles(), None)
            .await
            .unwrap();
        assert_eq!(reporte.ram1.total_empleados, 1);
        assert_eq!(reporte.ram2.total_empleados, 1);

        let solo_ram1 = servicio
            .reporte_por_ubicacion(miercoles(), miercoles(), Some(Ubicacion::Ram1))
            .await
            .unwrap();
        assert_eq!(solo_ram1.ram1.total_checadas, 1);
        assert_eq!(solo_ram1.ram2.total_checadas, 0);
    }

    #[tokio::test]
    async fn faltas_se_marcan_una_sola_vez() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let ana = alta(&pool, "Ana", ESTATUS_ACTIVO).await;
        let luis = alta(&pool, "Luis", ESTATUS_ACTIVO).await;

        servicio
            .registrar_checada(ana, TipoChecada::Entrada, Ubicacion::Ram1, dt(miercoles(), 8, 0), None)
            .await
            .unwrap();

        let resultado = servicio.marcar_faltas(Some(miercoles())).await.unwrap();
        assert_eq!(resultado.faltas_marcadas, 1);
        assert_eq!(resultado.detalle[0].empleado_id, luis);

        // The sweep never duplicates an existing row.
        let otra_vez = servicio.marcar_faltas(Some(miercoles())).await.unwrap();
        assert_eq!(otra_vez.faltas_marcadas, 0);

        let fila = queries::buscar_asistencia(&pool, luis, miercoles())
            .await
            .unwrap()
            .unwrap();
        assert!(!fila.presente);
        assert_eq!(fila.notas.as_deref(), Some(NOTA_FALTA_AUTOMATICA));
    }

    #[tokio::test]
    async fn faltas_respetan_incidencias_y_domingos() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());
        let ana = alta(&pool, "Ana", ESTATUS_ACTIVO).await;

        queries::insertar_incidencia(
            &pool,
            ana,
            "VACACIONES",
            NaiveDate::from_ymd_opt(2024, 11, 18).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 22).unwrap(),
            INCIDENCIA_APROBADA,
        )
        .await
        .unwrap();

        let resultado = servicio.marcar_faltas(Some(miercoles())).await.unwrap();
        assert_eq!(resultado.faltas_marcadas, 0);

        // 2024-11-24 is a Sunday.
        let domingo = NaiveDate::from_ymd_opt(2024, 11, 24).unwrap();
        let resultado = servicio.marcar_faltas(Some(domingo)).await.unwrap();
        assert_eq!(resultado.faltas_marcadas, 0);
        assert!(resultado.mensaje.is_some());
    }

    #[tokio::test]
    async fn faltas_ignoran_contratados_despues() {
        let pool = test_pool().await;
        let servicio = AsistenciaService::new(pool.clone());

        queries::crear_empleado(
            &pool,
            &AltaEmpleado {
                nombre: "Nuevo".to_string(),
                apellido_paterno: "Ingreso".to_string(),
                apellido_materno: None,
                puesto: None,
                area: None,
                salario_mensual: 10000.0,
                fecha_ingreso: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                estatus: ESTATUS_ACTIVO.to_string(),
            },
        )
        .await
        .unwrap();

        let resultado = servicio.marcar_faltas(Some(miercoles())).await.unwrap();
        assert_eq!(resultado.total_empleados_activos, 0);
        assert_eq!(resultado.faltas_marcadas, 0);
    }
}
