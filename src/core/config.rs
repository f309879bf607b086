use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How the ledger-index builder treats pre-existing rows whose date cell
/// cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePolicy {
    /// Record a warning and defer the row to the end of its sheet.
    #[default]
    WarnAndDefer,
    /// Abort the run. Legacy behavior, kept selectable for callers that
    /// want a pristine ledger or nothing.
    Strict,
}

/// Run configuration. `Default` matches the deployed setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunConfig {
    /// The organization's RFC; any other Receptor RFC is a reportable error.
    pub expected_receiver_rfc: String,
    /// Year the ledger covers; sheets are named `"<Mes> <year>"`.
    pub fiscal_year: i32,
    /// Perform every step except the final write-back.
    pub simulate_only: bool,
    /// ClaveProdServ → label overrides, layered over the built-in catalog.
    pub product_code_map: HashMap<String, String>,
    pub existing_date_policy: DatePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            expected_receiver_rfc: "MES2301274X9".to_string(),
            fiscal_year: 2026,
            simulate_only: false,
            product_code_map: HashMap::new(),
            existing_date_policy: DatePolicy::default(),
        }
    }
}
