//! CFDI 4.0 XML extraction.
//!
//! Reads the fields the ledger needs out of one Comprobante: issue date,
//! Emisor/Receptor RFCs, amounts, the TimbreFiscalDigital UUID, and the
//! first Concepto's ClaveProdServ. Everything else in the document is
//! ignored.

mod extract;

pub use extract::{SourceContext, extract_invoice};
