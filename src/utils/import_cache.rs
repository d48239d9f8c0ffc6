//! Transient storage for import results under review.
//!
//! An import is parsed once and then browsed across several screens; the
//! combined result is held here, keyed by the caller's session id, until
//! it expires or a new import supersedes it. Nothing in the cache is
//! authoritative attendance history.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::checador::ResultadoImportacion;

struct Entrada {
    expira: Instant,
    resultado: ResultadoImportacion,
}

pub struct ImportCache {
    ttl: Duration,
    entradas: Mutex<HashMap<String, Entrada>>,
}

impl ImportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entradas: Mutex::new(HashMap::new()),
        }
    }

    /// Stores a result for a session, superseding any previous import.
    pub fn guardar(&self, sesion: &str, resultado: ResultadoImportacion) {
        let mut entradas = self.entradas.lock().unwrap();
        entradas.insert(
            sesion.to_string(),
            Entrada {
                expira: Instant::now() + self.ttl,
                resultado,
            },
        );
    }

    /// An expired entry is a miss and is evicted on the spot.
    pub fn obtener(&self, sesion: &str) -> Option<ResultadoImportacion> {
        let mut entradas = self.entradas.lock().unwrap();
        match entradas.get(sesion) {
            Some(entrada) if entrada.expira > Instant::now() => {
                Some(entrada.resultado.clone())
            }
            Some(_) => {
                entradas.remove(sesion);
                None
            }
            None => None,
        }
    }

    pub fn eliminar(&self, sesion: &str) {
        self.entradas.lock().unwrap().remove(sesion);
    }

    pub fn purgar_expiradas(&self) {
        let ahora = Instant::now();
        self.entradas
            .lock()
            .unwrap()
            .retain(|_, entrada| entrada.expira > ahora);
    }
}
