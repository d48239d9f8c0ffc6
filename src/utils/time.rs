use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Parses an "HH:MM" parameter value into minutes since midnight.
pub fn parse_hora_minutos(texto: &str) -> Option<u32> {
    let (hora, minuto) = texto.trim().split_once(':')?;
    let hora: u32 = hora.parse().ok()?;
    let minuto: u32 = minuto.parse().ok()?;
    if hora > 23 || minuto > 59 {
        return None;
    }
    Some(hora * 60 + minuto)
}

/// Every time comparison in the engine runs on minutes since midnight,
/// never on raw "HH:MM" text.
pub fn minutos_del_dia(momento: &NaiveDateTime) -> u32 {
    momento.time().hour() * 60 + momento.time().minute()
}

/// Working week for a given day: Monday through Saturday. Payroll is paid
/// weekly and Sunday is the rest day.
pub fn semana_de(fecha: NaiveDate) -> (NaiveDate, NaiveDate) {
    let lunes = fecha - Duration::days(fecha.weekday().num_days_from_monday() as i64);
    (lunes, lunes + Duration::days(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hora_valida() {
        assert_eq!(parse_hora_minutos("08:00"), Some(480));
        assert_eq!(parse_hora_minutos("17:07"), Some(1027));
        assert_eq!(parse_hora_minutos(" 8:30 "), Some(510));
    }

    #[test]
    fn parse_hora_invalida() {
        assert_eq!(parse_hora_minutos("25:00"), None);
        assert_eq!(parse_hora_minutos("0800"), None);
        assert_eq!(parse_hora_minutos("ocho"), None);
    }

    #[test]
    fn semana_de_cualquier_dia() {
        // 2024-11-20 is a Wednesday.
        let (lunes, sabado) = semana_de(NaiveDate::from_ymd_opt(2024, 11, 20).unwrap());
        assert_eq!(lunes, NaiveDate::from_ymd_opt(2024, 11, 18).unwrap());
        assert_eq!(sabado, NaiveDate::from_ymd_opt(2024, 11, 23).unwrap());

        // A Sunday belongs to the week that started the previous Monday.
        let (lunes, _) = semana_de(NaiveDate::from_ymd_opt(2024, 11, 24).unwrap());
        assert_eq!(lunes, NaiveDate::from_ymd_opt(2024, 11, 18).unwrap());
    }

    #[test]
    fn minutos_del_dia_de_un_timestamp() {
        let momento = NaiveDate::from_ymd_opt(2024, 11, 20)
            .unwrap()
            .and_hms_opt(8, 20, 15)
            .unwrap();
        assert_eq!(minutos_del_dia(&momento), 500);
    }
}
