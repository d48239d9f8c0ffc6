use anyhow::Result;
use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ram_checador::asistencia::AsistenciaService;
use ram_checador::checador::{Fuente, combinar_checadores, importar_buffer};
use ram_checador::config::Config;
use ram_checador::nomina::NominaService;
use ram_checador::utils::time::semana_de;
use ram_checador::{database, parametros};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ram_checador=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let pool = database::create_connection(&config.database_url).await?;
    parametros::sembrar_defaults(&pool).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("importar") => importar(&pool, &args[1..]).await,
        Some("marcar-faltas") => marcar_faltas(&pool, args.get(1)).await,
        Some("resumen-diario") => resumen_diario(&pool, args.get(1)).await,
        Some("puntualidad") => puntualidad(&pool, &args[1..]).await,
        _ => {
            eprintln!(
                "Uso: ram-checador <comando>\n\
                 \n\
                 Comandos:\n\
                 \x20 importar <ram1.csv> [ram2.csv]   importa y combina los checadores\n\
                 \x20 marcar-faltas [YYYY-MM-DD]       barrido de faltas (ayer por defecto)\n\
                 \x20 resumen-diario [YYYY-MM-DD]      resumen de asistencia del día\n\
                 \x20 puntualidad <empleado-id> [YYYY-MM-DD]  bono de la semana de esa fecha"
            );
            Ok(())
        }
    }
}

async fn importar(pool: &SqlitePool, rutas: &[String]) -> Result<()> {
    if rutas.is_empty() {
        anyhow::bail!("se requiere al menos un archivo de checador");
    }

    let horario = parametros::cargar_horario(pool).await?;

    let ram1 = match rutas.first() {
        Some(ruta) => {
            let contenido = std::fs::read(ruta)?;
            Some(importar_buffer(&contenido, Fuente::Ram1, &horario)?)
        }
        None => None,
    };
    let ram2 = match rutas.get(1) {
        Some(ruta) => {
            let contenido = std::fs::read(ruta)?;
            Some(importar_buffer(&contenido, Fuente::Ram2, &horario)?)
        }
        None => None,
    };

    let resultado = combinar_checadores(ram1, ram2)?;
    println!("{}", serde_json::to_string_pretty(&resultado)?);
    Ok(())
}

async fn marcar_faltas(pool: &SqlitePool, fecha: Option<&String>) -> Result<()> {
    let fecha = parse_fecha(fecha)?;
    let servicio = AsistenciaService::new(pool.clone());
    let resultado = servicio.marcar_faltas(fecha).await?;
    println!("{}", serde_json::to_string_pretty(&resultado)?);
    Ok(())
}

async fn resumen_diario(pool: &SqlitePool, fecha: Option<&String>) -> Result<()> {
    let fecha = parse_fecha(fecha)?.unwrap_or_else(|| Local::now().date_naive());
    let servicio = AsistenciaService::new(pool.clone());
    let resumen = servicio.resumen_diario(fecha).await?;
    println!("{}", serde_json::to_string_pretty(&resumen)?);
    Ok(())
}

async fn puntualidad(pool: &SqlitePool, args: &[String]) -> Result<()> {
    let empleado_id: i64 = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("se requiere el id del empleado"))?
        .parse()?;
    let fecha = parse_fecha(args.get(1))?.unwrap_or_else(|| Local::now().date_naive());
    let (lunes, sabado) = semana_de(fecha);

    let servicio = NominaService::new(pool.clone());
    let evaluacion = servicio.evaluar_puntualidad(empleado_id, lunes, sabado).await?;
    println!("{}", serde_json::to_string_pretty(&evaluacion)?);
    Ok(())
}

fn parse_fecha(arg: Option<&String>) -> Result<Option<NaiveDate>> {
    match arg {
        Some(texto) => Ok(Some(NaiveDate::parse_from_str(texto, "%Y-%m-%d")?)),
        None => Ok(None),
    }
}
