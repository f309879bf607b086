//! Spanish calendar month names, as used for folder and sheet naming.

/// Month names in calendar order, capitalized the way sheet names carry them.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Month number (1–12) for a folder name, case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| m.to_lowercase() == lower)
        .map(|i| i as u32 + 1)
}

/// Capitalized name for a month number (1–12).
pub fn month_name(number: u32) -> Option<&'static str> {
    MONTH_NAMES.get(number.checked_sub(1)? as usize).copied()
}

/// Sheet name for one month of the target year, e.g. `"Enero 2026"`.
pub fn sheet_name(month: u32, year: i32) -> String {
    format!("{} {year}", month_name(month).unwrap_or("?"))
}

/// Inverse of [`sheet_name`]: `"Enero 2026"` → `Some(1)` when `year == 2026`.
pub fn parse_sheet_name(name: &str, year: i32) -> Option<u32> {
    let prefix = name.strip_suffix(&format!(" {year}"))?;
    month_number(prefix)
}
