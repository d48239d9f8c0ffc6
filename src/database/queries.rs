//! Data access for the attendance store, using the runtime query API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::database::models::{
    AltaEmpleado, Asistencia, ConfiguracionNomina, Empleado, ESTATUS_ACTIVO, HistorialChecada,
    INCIDENCIA_APROBADA, Incidencia,
};
use crate::error::Result;

/// Attendance row joined with the employee identity fields the reports need.
#[derive(Debug, Clone, Serialize)]
pub struct AsistenciaDetalle {
    pub asistencia: Asistencia,
    pub nombre_completo: String,
    pub puesto: Option<String>,
    pub area: Option<String>,
}

fn mapear_empleado(row: &SqliteRow) -> Empleado {
    Empleado {
        id: row.get("id"),
        nombre: row.get("nombre"),
        apellido_paterno: row.get("apellido_paterno"),
        apellido_materno: row.get("apellido_materno"),
        puesto: row.get("puesto"),
        area: row.get("area"),
        salario_mensual: row.get("salario_mensual"),
        fecha_ingreso: row.get("fecha_ingreso"),
        estatus: row.get("estatus"),
        created_at: row.get("created_at"),
    }
}

fn mapear_asistencia(row: &SqliteRow) -> Asistencia {
    Asistencia {
        id: row.get("id"),
        empleado_id: row.get("empleado_id"),
        fecha: row.get("fecha"),
        presente: row.get("presente"),
        hora_entrada: row.get("hora_entrada"),
        hora_salida: row.get("hora_salida"),
        ubicacion_entrada: row.get("ubicacion_entrada"),
        ubicacion_salida: row.get("ubicacion_salida"),
        retardo: row.get("retardo"),
        minutos_retardo: row.get("minutos_retardo"),
        notas: row.get("notas"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn mapear_detalle(row: &SqliteRow) -> AsistenciaDetalle {
    let nombre: String = row.get("emp_nombre");
    let paterno: String = row.get("emp_paterno");
    let materno: Option<String> = row.get("emp_materno");
    let nombre_completo = match materno {
        Some(materno) => format!("{nombre} {paterno} {materno}"),
        None => format!("{nombre} {paterno}"),
    };

    AsistenciaDetalle {
        asistencia: mapear_asistencia(row),
        nombre_completo,
        puesto: row.get("emp_puesto"),
        area: row.get("emp_area"),
    }
}

// Empleados

pub async fn crear_empleado(pool: &SqlitePool, alta: &AltaEmpleado) -> Result<Empleado> {
    let result = sqlx::query(
        "INSERT INTO empleados
            (nombre, apellido_paterno, apellido_materno, puesto, area,
             salario_mensual, fecha_ingreso, estatus)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&alta.nombre)
    .bind(&alta.apellido_paterno)
    .bind(&alta.apellido_materno)
    .bind(&alta.puesto)
    .bind(&alta.area)
    .bind(alta.salario_mensual)
    .bind(alta.fecha_ingreso)
    .bind(&alta.estatus)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT * FROM empleados WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    Ok(mapear_empleado(&row))
}

pub async fn get_empleado(pool: &SqlitePool, empleado_id: i64) -> Result<Option<Empleado>> {
    let row = sqlx::query("SELECT * FROM empleados WHERE id = ?")
        .bind(empleado_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| mapear_empleado(&row)))
}

/// Active employees, optionally restricted to those hired on or before a
/// given date (the absence sweep must not mark employees hired later).
pub async fn empleados_activos(
    pool: &SqlitePool,
    ingreso_hasta: Option<NaiveDate>,
) -> Result<Vec<Empleado>> {
    let rows = match ingreso_hasta {
        Some(fecha) => {
            sqlx::query(
                "SELECT * FROM empleados
                 WHERE estatus = ? AND fecha_ingreso <= ?
                 ORDER BY apellido_paterno, nombre",
            )
            .bind(ESTATUS_ACTIVO)
            .bind(fecha)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM empleados WHERE estatus = ? ORDER BY apellido_paterno, nombre")
                .bind(ESTATUS_ACTIVO)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.iter().map(mapear_empleado).collect())
}

pub async fn contar_empleados_activos(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM empleados WHERE estatus = ?")
        .bind(ESTATUS_ACTIVO)
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}

// Asistencia

pub async fn buscar_asistencia(
    pool: &SqlitePool,
    empleado_id: i64,
    fecha: NaiveDate,
) -> Result<Option<Asistencia>> {
    let row = sqlx::query("SELECT * FROM empleados_asistencia WHERE empleado_id = ? AND fecha = ?")
        .bind(empleado_id)
        .bind(fecha)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| mapear_asistencia(&row)))
}

pub async fn get_asistencia(pool: &SqlitePool, asistencia_id: i64) -> Result<Asistencia> {
    let row = sqlx::query("SELECT * FROM empleados_asistencia WHERE id = ?")
        .bind(asistencia_id)
        .fetch_one(pool)
        .await?;

    Ok(mapear_asistencia(&row))
}

/// Bare day row; punch fields are applied afterwards, each punch type
/// touching only its own columns.
pub async fn insertar_asistencia(
    pool: &SqlitePool,
    empleado_id: i64,
    fecha: NaiveDate,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO empleados_asistencia (empleado_id, fecha) VALUES (?, ?)")
        .bind(empleado_id)
        .bind(fecha)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn actualizar_entrada(
    pool: &SqlitePool,
    asistencia_id: i64,
    hora: NaiveDateTime,
    ubicacion: &str,
    retardo: bool,
    minutos_retardo: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE empleados_asistencia
         SET hora_entrada = ?, ubicacion_entrada = ?, presente = TRUE,
             retardo = ?, minutos_retardo = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(hora)
    .bind(ubicacion)
    .bind(retardo)
    .bind(minutos_retardo)
    .bind(asistencia_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn actualizar_salida(
    pool: &SqlitePool,
    asistencia_id: i64,
    hora: NaiveDateTime,
    ubicacion: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE empleados_asistencia
         SET hora_salida = ?, ubicacion_salida = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(hora)
    .bind(ubicacion)
    .bind(asistencia_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insertar_falta(
    pool: &SqlitePool,
    empleado_id: i64,
    fecha: NaiveDate,
    notas: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO empleados_asistencia (empleado_id, fecha, presente, notas)
         VALUES (?, ?, FALSE, ?)",
    )
    .bind(empleado_id)
    .bind(fecha)
    .bind(notas)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn asistencias_rango_empleado(
    pool: &SqlitePool,
    empleado_id: i64,
    inicio: NaiveDate,
    fin: NaiveDate,
) -> Result<Vec<Asistencia>> {
    let rows = sqlx::query(
        "SELECT * FROM empleados_asistencia
         WHERE empleado_id = ? AND fecha >= ? AND fecha <= ?
         ORDER BY fecha ASC",
    )
    .bind(empleado_id)
    .bind(inicio)
    .bind(fin)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(mapear_asistencia).collect())
}

pub async fn asistencias_por_fecha(
    pool: &SqlitePool,
    fecha: NaiveDate,
) -> Result<Vec<AsistenciaDetalle>> {
    let rows = sqlx::query(
        "SELECT a.*, e.nombre AS emp_nombre, e.apellido_paterno AS emp_paterno,
                e.apellido_materno AS emp_materno, e.puesto AS emp_puesto, e.area AS emp_area
         FROM empleados_asistencia a
         JOIN empleados e ON e.id = a.empleado_id
         WHERE a.fecha = ?
         ORDER BY a.hora_entrada ASC",
    )
    .bind(fecha)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(mapear_detalle).collect())
}

pub async fn asistencias_presentes_rango(
    pool: &SqlitePool,
    inicio: NaiveDate,
    fin: NaiveDate,
) -> Result<Vec<AsistenciaDetalle>> {
    let rows = sqlx::query(
        "SELECT a.*, e.nombre AS emp_nombre, e.apellido_paterno AS emp_paterno,
                e.apellido_materno AS emp_materno, e.puesto AS emp_puesto, e.area AS emp_area
         FROM empleados_asistencia a
         JOIN empleados e ON e.id = a.empleado_id
         WHERE a.fecha >= ? AND a.fecha <= ? AND a.presente = TRUE
         ORDER BY a.fecha ASC, e.nombre ASC",
    )
    .bind(inicio)
    .bind(fin)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(mapear_detalle).collect())
}

// Historial de checadas

pub async fn insertar_historial(
    pool: &SqlitePool,
    asistencia_id: i64,
    tipo_checada: &str,
    fecha_hora: NaiveDateTime,
    ubicacion: &str,
    dispositivo: Option<&str>,
    estado: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO historial_checadas
            (asistencia_id, tipo_checada, fecha_hora, ubicacion, dispositivo, estado)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(asistencia_id)
    .bind(tipo_checada)
    .bind(fecha_hora)
    .bind(ubicacion)
    .bind(dispositivo)
    .bind(estado)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn historial_de_asistencia(
    pool: &SqlitePool,
    asistencia_id: i64,
) -> Result<Vec<HistorialChecada>> {
    let rows = sqlx::query(
        "SELECT * FROM historial_checadas WHERE asistencia_id = ? ORDER BY fecha_hora ASC, id ASC",
    )
    .bind(asistencia_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| HistorialChecada {
            id: row.get("id"),
            asistencia_id: row.get("asistencia_id"),
            tipo_checada: row.get("tipo_checada"),
            fecha_hora: row.get("fecha_hora"),
            ubicacion: row.get("ubicacion"),
            dispositivo: row.get("dispositivo"),
            estado: row.get("estado"),
            created_at: row.get("created_at"),
        })
        .collect())
}

// Incidencias

pub async fn insertar_incidencia(
    pool: &SqlitePool,
    empleado_id: i64,
    tipo: &str,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    estatus: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO empleados_incidencias (empleado_id, tipo, fecha_inicio, fecha_fin, estatus)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(empleado_id)
    .bind(tipo)
    .bind(fecha_inicio)
    .bind(fecha_fin)
    .bind(estatus)
    .execute(pool)
    .await?;

    Ok(())
}

/// Approved leave covering the date, if any.
pub async fn incidencia_aprobada_en_fecha(
    pool: &SqlitePool,
    empleado_id: i64,
    fecha: NaiveDate,
) -> Result<Option<Incidencia>> {
    let row = sqlx::query(
        "SELECT * FROM empleados_incidencias
         WHERE empleado_id = ? AND estatus = ? AND fecha_inicio <= ? AND fecha_fin >= ?
         LIMIT 1",
    )
    .bind(empleado_id)
    .bind(INCIDENCIA_APROBADA)
    .bind(fecha)
    .bind(fecha)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Incidencia {
        id: row.get("id"),
        empleado_id: row.get("empleado_id"),
        tipo: row.get("tipo"),
        fecha_inicio: row.get("fecha_inicio"),
        fecha_fin: row.get("fecha_fin"),
        estatus: row.get("estatus"),
    }))
}

// Configuración

pub async fn get_config(pool: &SqlitePool, clave: &str) -> Result<Option<ConfiguracionNomina>> {
    let row = sqlx::query("SELECT * FROM configuracion_nomina WHERE clave = ?")
        .bind(clave)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| ConfiguracionNomina {
        clave: row.get("clave"),
        valor: row.get("valor"),
        descripcion: row.get("descripcion"),
        tipo_dato: row.get("tipo_dato"),
        activo: row.get("activo"),
    }))
}

pub async fn upsert_config(
    pool: &SqlitePool,
    clave: &str,
    valor: &str,
    tipo_dato: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO configuracion_nomina (clave, valor, tipo_dato) VALUES (?, ?, ?)
         ON CONFLICT (clave) DO UPDATE SET valor = excluded.valor, tipo_dato = excluded.tipo_dato",
    )
    .bind(clave)
    .bind(valor)
    .bind(tipo_dato)
    .execute(pool)
    .await?;

    Ok(())
}

/// Seeds a parameter without overwriting an operator-edited value.
pub async fn config_si_falta(
    pool: &SqlitePool,
    clave: &str,
    valor: &str,
    descripcion: &str,
    tipo_dato: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO configuracion_nomina (clave, valor, descripcion, tipo_dato)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (clave) DO NOTHING",
    )
    .bind(clave)
    .bind(valor)
    .bind(descripcion)
    .bind(tipo_dato)
    .execute(pool)
    .await?;

    Ok(())
}
