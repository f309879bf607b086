//! SAT ClaveProdServ → expense-category labels.
//!
//! The catalog covers the codes that actually show up in travel-expense
//! invoices; anything unmapped keeps its raw code so no information is lost.

use std::collections::HashMap;

/// Exact-match code → label.
const CATEGORY_EXACT: &[(&str, &str)] = &[
    ("15101514", "GASOLINA"),
    ("15101515", "GASOLINA"),
    ("95111602", "PEAJE"),
    ("95111603", "PEAJE"),
    ("78111807", "ESTACIONAMIENTO"),
    ("90111800", "HOTEL"),
    ("90111500", "HOTEL / HOSPEDAJE"),
    ("90101500", "ALIMENTO / BEBIDA"),
    ("90101501", "ALIMENTO / BEBIDA"),
    ("90101503", "ALIMENTO / BEBIDA"),
    ("90101700", "ALIMENTO / BEBIDA"),
    ("90101800", "ALIMENTO / BEBIDA"),
    ("78111804", "TAXI"),
    ("78111800", "TRANSPORTE"),
    ("78111808", "ALQUILER DE AUTO"),
    ("78111811", "ALQUILER DE AUTO"),
    ("83111603", "DATOS MÓVILES"),
    ("43201415", "DATOS MÓVILES"),
    ("27113300", "HERRAMIENTAS"),
    ("27131500", "HERRAMIENTAS"),
    ("23291900", "HERRAMIENTAS INDUSTRIALES"),
    ("14111828", "PAPELERÍA"),
];

/// Prefix-match code families, consulted after the exact table.
const CATEGORY_PREFIX: &[(&str, &str)] = &[
    ("831116", "DATOS MÓVILES"),
    ("2711", "HERRAMIENTAS"),
    ("2713151", "HERRAMIENTAS"),
    ("141115", "PAPELERÍA"),
    ("441217", "PAPELERÍA"),
];

/// Map a ClaveProdServ to its expense-category label.
///
/// Caller `overrides` win over the built-in tables; among built-in prefixes
/// the longest match wins. An empty or unknown code comes back unchanged.
pub fn map_product_code(code: &str, overrides: &HashMap<String, String>) -> String {
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }
    if let Some(label) = overrides.get(code) {
        return label.clone();
    }
    if let Some((_, label)) = CATEGORY_EXACT.iter().find(|(c, _)| *c == code) {
        return (*label).to_string();
    }
    CATEGORY_PREFIX
        .iter()
        .filter(|(prefix, _)| code.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_prefix() {
        let none = HashMap::new();
        assert_eq!(map_product_code("27131500", &none), "HERRAMIENTAS");
        // 27131510 misses the exact table, lands on the 2713151 prefix
        assert_eq!(map_product_code("27131510", &none), "HERRAMIENTAS");
    }

    #[test]
    fn unknown_code_is_kept_raw() {
        assert_eq!(map_product_code("99999999", &HashMap::new()), "99999999");
        assert_eq!(map_product_code("", &HashMap::new()), "");
    }

    #[test]
    fn overrides_win() {
        let mut map = HashMap::new();
        map.insert("15101514".to_string(), "COMBUSTIBLE".to_string());
        assert_eq!(map_product_code("15101514", &map), "COMBUSTIBLE");
        assert_eq!(map_product_code("15101515", &map), "GASOLINA");
    }
}
