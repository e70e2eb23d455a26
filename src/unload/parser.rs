//! Hanger-unload lines in the line controller's message log.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `08:15:42.123 L# Команда от CJ2M: Разгрузка подвеса - 17 в поз. 34`
static RE_UNLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{2}):(\d{2}):(\d{2})\.\d+\s+L#\s+Команда\s+от\s+CJ2M:\s+Разгрузка\s+подвеса\s+-\s+(\d+)\s+в\s+поз\.\s+34",
    )
    .expect("Invalid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnloadEvent {
    /// `HH:MM:SS`, fractional seconds dropped.
    pub time: String,
    pub hanger: u32,
}

/// Every unload event in `text`, in log order.
pub fn parse_unload_events(text: &str) -> Vec<UnloadEvent> {
    text.lines()
        .filter_map(|line| {
            let caps = RE_UNLOAD.captures(line)?;
            let hanger = caps[4].parse().ok()?;
            Some(UnloadEvent {
                time: format!("{}:{}:{}", &caps[1], &caps[2], &caps[3]),
                hanger,
            })
        })
        .collect()
}

/// Log bytes as text: UTF-8 when valid, Windows-1251 otherwise.
pub fn decode_log(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
08:15:42.123 L# Команда от CJ2M: Разгрузка подвеса - 17 в поз. 34
08:15:43.001 L# Команда от CJ2M: Загрузка подвеса - 18 в поз. 1
08:16:00.5 L#  Команда от CJ2M:  Разгрузка подвеса - 3 в поз. 34\r
08:17:00.5 L# Команда от CJ2M: Разгрузка подвеса - 4 в поз. 12
garbage";

    #[test]
    fn test_parse_unload_events() {
        let events = parse_unload_events(LOG);
        assert_eq!(
            events,
            vec![
                UnloadEvent { time: "08:15:42".into(), hanger: 17 },
                UnloadEvent { time: "08:16:00".into(), hanger: 3 },
            ]
        );
    }

    #[test]
    fn test_decode_cp1251() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode("Разгрузка подвеса");
        assert!(std::str::from_utf8(&encoded).is_err());
        assert_eq!(decode_log(&encoded), "Разгрузка подвеса");
        assert_eq!(decode_log("Разгрузка".as_bytes()), "Разгрузка");
    }
}
