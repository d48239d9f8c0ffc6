//! Attendance reconciliation and weekly payroll engine for the RAM
//! biometric terminals.
//!
//! The import pipeline parses each terminal's export on its own
//! ([`checador::parser`]), computes net worked hours per day
//! ([`checador::hours`]) and reconciles both terminals into one result
//! ([`checador::merge`]). Live punches and reports go through
//! [`asistencia::AsistenciaService`]; the weekly payroll and punctuality
//! bonus live in [`nomina`].

pub mod asistencia;
pub mod checador;
pub mod config;
pub mod database;
pub mod error;
pub mod nomina;
pub mod parametros;
pub mod utils;
