use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_empleados_table(pool).await?;
    create_asistencia_table(pool).await?;
    create_historial_checadas_table(pool).await?;
    create_incidencias_table(pool).await?;
    create_configuracion_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_empleados_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS empleados (
            id INTEGER PRIMARY KEY,
            nombre TEXT NOT NULL,
            apellido_paterno TEXT NOT NULL,
            apellido_materno TEXT,
            puesto TEXT,
            area TEXT,
            salario_mensual REAL NOT NULL DEFAULT 0,
            fecha_ingreso DATE NOT NULL,
            estatus TEXT NOT NULL DEFAULT 'Activo',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_asistencia_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS empleados_asistencia (
            id INTEGER PRIMARY KEY,
            empleado_id INTEGER NOT NULL,
            fecha DATE NOT NULL,
            presente BOOLEAN NOT NULL DEFAULT FALSE,
            hora_entrada DATETIME,
            hora_salida DATETIME,
            ubicacion_entrada TEXT,
            ubicacion_salida TEXT,
            retardo BOOLEAN NOT NULL DEFAULT FALSE,
            minutos_retardo INTEGER NOT NULL DEFAULT 0,
            notas TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (empleado_id, fecha),
            FOREIGN KEY (empleado_id) REFERENCES empleados (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_historial_checadas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historial_checadas (
            id INTEGER PRIMARY KEY,
            asistencia_id INTEGER NOT NULL,
            tipo_checada TEXT NOT NULL CHECK (tipo_checada IN ('ENTRADA', 'SALIDA')),
            fecha_hora DATETIME NOT NULL,
            ubicacion TEXT NOT NULL,
            dispositivo TEXT,
            estado TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (asistencia_id) REFERENCES empleados_asistencia (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_incidencias_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS empleados_incidencias (
            id INTEGER PRIMARY KEY,
            empleado_id INTEGER NOT NULL,
            tipo TEXT NOT NULL,
            fecha_inicio DATE NOT NULL,
            fecha_fin DATE NOT NULL,
            estatus TEXT NOT NULL DEFAULT 'PENDIENTE',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (empleado_id) REFERENCES empleados (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_configuracion_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS configuracion_nomina (
            clave TEXT PRIMARY KEY,
            valor TEXT NOT NULL,
            descripcion TEXT,
            tipo_dato TEXT NOT NULL DEFAULT 'STRING'
                CHECK (tipo_dato IN ('STRING', 'INT', 'BOOLEAN', 'DECIMAL')),
            activo BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
