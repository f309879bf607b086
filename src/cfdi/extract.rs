use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;

use crate::core::{ExtractError, InvoiceRecord, RunConfig, map_product_code, normalize_uuid};

/// Where a document was found. Supplied by the caller so the extractor stays
/// pure: folder naming policy lives with the traversal, not in here.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    /// Immediate containing folder name.
    pub employee: &'a str,
    /// Month folder name two levels up.
    pub source_month: &'a str,
    pub source_path: &'a Path,
}

/// Tax code for IVA in the SAT Impuesto catalog.
const IMPUESTO_IVA: &str = "002";

#[derive(Default)]
struct Parsed {
    saw_comprobante: bool,
    fecha: Option<String>,
    serie: Option<String>,
    folio: Option<String>,
    subtotal: Option<String>,
    total: Option<String>,
    issuer_name: Option<String>,
    issuer_rfc: Option<String>,
    receiver_rfc: Option<String>,
    uuid: Option<String>,
    iva: Decimal,
    otros: Decimal,
    first_clave: Option<String>,
}

/// Extract one CFDI 4.0 document into an [`InvoiceRecord`].
///
/// Streaming parse over local element names, so namespace prefixes other
/// than the conventional `cfdi:`/`tfd:` are accepted. Every parse problem
/// comes back as an [`ExtractError`]; this function does not panic on any
/// input.
pub fn extract_invoice(
    xml: &str,
    ctx: SourceContext<'_>,
    config: &RunConfig,
) -> Result<InvoiceRecord, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = Parsed::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                handle_element(&mut p, &path, &name, e)?;
                path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e);
                handle_element(&mut p, &path, &name, e)?;
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::malformed(e.to_string())),
            _ => {}
        }
    }

    if !p.saw_comprobante {
        return Err(ExtractError::malformed("no cfdi:Comprobante root element"));
    }

    let fecha = p
        .fecha
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ExtractError::MissingRequiredField { field: "Fecha" })?;
    let issue_date = parse_fecha(fecha)?;

    let uuid = p
        .uuid
        .as_deref()
        .map(normalize_uuid)
        .filter(|u| !u.is_empty())
        .ok_or(ExtractError::MissingRequiredField { field: "UUID" })?;

    let total = match p.total.as_deref() {
        Some(s) => parse_amount(s, "Total")?,
        None => return Err(ExtractError::MissingRequiredField { field: "Total" }),
    };
    let subtotal = match p.subtotal.as_deref() {
        Some(s) => parse_amount(s, "SubTotal")?,
        None => Decimal::ZERO,
    };

    let folio = match (p.serie.as_deref(), p.folio.as_deref()) {
        (Some(s), Some(f)) if !s.is_empty() && !f.is_empty() => format!("{s}-{f}"),
        (_, Some(f)) if !f.is_empty() => f.to_string(),
        (Some(s), _) => s.to_string(),
        _ => String::new(),
    };

    let product_code = p.first_clave.unwrap_or_default();
    let concept = map_product_code(&product_code, &config.product_code_map);

    Ok(InvoiceRecord {
        uuid,
        issue_date,
        issuer_name: p.issuer_name.unwrap_or_default(),
        issuer_rfc: p.issuer_rfc.unwrap_or_default(),
        folio,
        receiver_rfc: p.receiver_rfc.unwrap_or_default(),
        employee: ctx.employee.to_string(),
        subtotal,
        iva: p.iva,
        otros_impuestos: p.otros,
        total,
        product_code,
        concept,
        source_month: ctx.source_month.to_string(),
        source_path: ctx.source_path.to_path_buf(),
    })
}

fn handle_element(
    p: &mut Parsed,
    path: &[String],
    name: &str,
    e: &BytesStart<'_>,
) -> Result<(), ExtractError> {
    match name {
        "Comprobante" if path.is_empty() => {
            p.saw_comprobante = true;
            p.fecha = attr(e, "Fecha")?;
            p.serie = attr(e, "Serie")?;
            p.folio = attr(e, "Folio")?;
            p.subtotal = attr(e, "SubTotal")?;
            p.total = attr(e, "Total")?;
        }
        "Emisor" if at(path, &["Comprobante"]) => {
            p.issuer_name = attr(e, "Nombre")?;
            p.issuer_rfc = attr(e, "Rfc")?;
        }
        "Receptor" if at(path, &["Comprobante"]) => {
            p.receiver_rfc = attr(e, "Rfc")?;
        }
        "Concepto" if at(path, &["Comprobante", "Conceptos"]) => {
            if p.first_clave.is_none() {
                p.first_clave = attr(e, "ClaveProdServ")?;
            }
        }
        // Document-level taxes only; Concepto-level Impuestos nodes sit
        // deeper in the tree and must not be double-counted.
        "Traslado" if at(path, &["Comprobante", "Impuestos", "Traslados"]) => {
            accumulate_tax(p, e)?;
        }
        "Retencion" if at(path, &["Comprobante", "Impuestos", "Retenciones"]) => {
            accumulate_tax(p, e)?;
        }
        "TimbreFiscalDigital" if path.iter().any(|s| s == "Complemento") => {
            if let Some(u) = attr(e, "UUID")? {
                p.uuid = Some(u);
            }
        }
        _ => {}
    }
    Ok(())
}

fn accumulate_tax(p: &mut Parsed, e: &BytesStart<'_>) -> Result<(), ExtractError> {
    let amount = match attr(e, "Importe")? {
        Some(s) => parse_amount(&s, "Importe")?,
        None => Decimal::ZERO,
    };
    let impuesto = attr(e, "Impuesto")?.unwrap_or_default();
    if impuesto == IMPUESTO_IVA {
        p.iva += amount;
    } else {
        p.otros += amount;
    }
    Ok(())
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn at(path: &[String], want: &[&str]) -> bool {
    path.len() == want.len() && path.iter().zip(want).all(|(a, b)| a == b)
}

fn attr(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, ExtractError> {
    for a in e.attributes() {
        let a = a.map_err(|err| ExtractError::malformed(err.to_string()))?;
        if a.key.local_name().as_ref() == key.as_bytes() {
            let value = a
                .unescape_value()
                .map_err(|err| ExtractError::malformed(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// CFDI `Fecha` is ISO 8601 without an offset; a few stamping providers
/// append a `Z` anyway, and some emit fractional seconds.
fn parse_fecha(s: &str) -> Result<NaiveDateTime, ExtractError> {
    let s = s.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| ExtractError::malformed(format!("invalid Fecha '{s}': {e}")))
}

fn parse_amount(s: &str, field: &str) -> Result<Decimal, ExtractError> {
    Decimal::from_str(s.trim())
        .map_err(|e| ExtractError::malformed(format!("invalid {field} '{s}': {e}")))
}
