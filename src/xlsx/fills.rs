//! Recover per-row highlight state from the raw parts of an `.xlsx` file.
//!
//! calamine reads cell values but not formatting, and highlight color is how
//! the ledger remembers which rows were flagged in earlier runs. The file is
//! a zip of XML parts, so this walks `xl/styles.xml` for the two fill colors
//! the ledger uses, then scans each worksheet's cell style indices.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::core::{Highlight, LedgerError};

const YELLOW_RGB: &str = "FFF59D";
const RED_RGB: &str = "EF9A9A";

/// Row highlight vectors per sheet name, indexed by 0-based row.
pub(crate) fn read_row_fills(path: &Path) -> Result<HashMap<String, Vec<Highlight>>, LedgerError> {
    let open_err = |reason: String| LedgerError::Open {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| open_err(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| open_err(e.to_string()))?;

    let styles = match read_part(&mut archive, "xl/styles.xml").map_err(open_err)? {
        Some(xml) => xml,
        None => return Ok(HashMap::new()),
    };
    let style_highlights = parse_styles(&styles).map_err(open_err)?;
    if style_highlights.iter().all(|h| *h == Highlight::None) {
        return Ok(HashMap::new());
    }

    let workbook = read_part(&mut archive, "xl/workbook.xml")
        .map_err(open_err)?
        .ok_or_else(|| open_err("missing xl/workbook.xml".into()))?;
    let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")
        .map_err(open_err)?
        .unwrap_or_default();

    let sheet_rids = parse_workbook_sheets(&workbook).map_err(open_err)?;
    let targets = parse_rels(&rels).map_err(open_err)?;

    let mut fills = HashMap::new();
    for (name, rid) in sheet_rids {
        let Some(target) = targets.get(&rid) else {
            continue;
        };
        if let Some(xml) = read_part(&mut archive, target).map_err(open_err)? {
            let rows = parse_sheet_fills(&xml, &style_highlights).map_err(open_err)?;
            fills.insert(name, rows);
        }
    }
    Ok(fills)
}

fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> Result<Option<String>, String> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut out = String::new();
    entry
        .read_to_string(&mut out)
        .map_err(|e| format!("{name}: {e}"))?;
    Ok(Some(out))
}

/// Map each cell style index (the `s=` attribute) to a highlight.
fn parse_styles(xml: &str) -> Result<Vec<Highlight>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fill_colors: Vec<Highlight> = Vec::new();
    let mut xf_fill_ids: Vec<usize> = Vec::new();
    let mut in_fills = false;
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match local(e).as_str() {
                    "fills" => in_fills = true,
                    "cellXfs" => in_cell_xfs = true,
                    "fill" if in_fills => fill_colors.push(Highlight::None),
                    "fgColor" if in_fills => {
                        if let Some(rgb) = attr(e, "rgb")? {
                            let rgb = rgb.to_uppercase();
                            let highlight = if rgb.contains(RED_RGB) {
                                Highlight::Red
                            } else if rgb.contains(YELLOW_RGB) {
                                Highlight::Yellow
                            } else {
                                Highlight::None
                            };
                            if let Some(last) = fill_colors.last_mut() {
                                *last = highlight;
                            }
                        }
                    }
                    "xf" if in_cell_xfs => {
                        let fill_id = attr(e, "fillId")?
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(0);
                        xf_fill_ids.push(fill_id);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match local_end(e).as_str() {
                "fills" => in_fills = false,
                "cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("styles.xml: {e}")),
            _ => {}
        }
    }

    Ok(xf_fill_ids
        .iter()
        .map(|fill_id| {
            fill_colors
                .get(*fill_id)
                .copied()
                .unwrap_or(Highlight::None)
        })
        .collect())
}

/// `(sheet name, relationship id)` pairs in workbook order.
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, String> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local(e) == "sheet" {
                    let name = attr(e, "name")?.unwrap_or_default();
                    let rid = attr(e, "id")?.unwrap_or_default();
                    sheets.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("workbook.xml: {e}")),
            _ => {}
        }
    }
    Ok(sheets)
}

/// Relationship id → zip part path.
fn parse_rels(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut out = HashMap::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local(e) == "Relationship" {
                    let id = attr(e, "Id")?.unwrap_or_default();
                    let target = attr(e, "Target")?.unwrap_or_default();
                    let part = if let Some(stripped) = target.strip_prefix('/') {
                        stripped.to_string()
                    } else {
                        format!("xl/{target}")
                    };
                    out.insert(id, part);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("workbook.xml.rels: {e}")),
            _ => {}
        }
    }
    Ok(out)
}

/// Scan one worksheet part for highlighted rows. Red wins when a row mixes
/// both fill colors.
fn parse_sheet_fills(xml: &str, styles: &[Highlight]) -> Result<Vec<Highlight>, String> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Highlight> = Vec::new();
    let mut current_row: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match local(e).as_str() {
                "row" => {
                    current_row = attr(e, "r")?
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                }
                "c" if current_row > 0 => {
                    let highlight = attr(e, "s")?
                        .and_then(|v| v.parse::<usize>().ok())
                        .and_then(|s| styles.get(s).copied())
                        .unwrap_or(Highlight::None);
                    if highlight != Highlight::None {
                        if rows.len() < current_row {
                            rows.resize(current_row, Highlight::None);
                        }
                        let slot = &mut rows[current_row - 1];
                        if *slot != Highlight::Red {
                            *slot = highlight;
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("worksheet: {e}")),
            _ => {}
        }
    }
    Ok(rows)
}

fn local(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn local_end(e: &quick_xml::events::BytesEnd<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn attr(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, String> {
    for a in e.attributes() {
        let a = a.map_err(|err| err.to_string())?;
        if a.key.local_name().as_ref() == key.as_bytes() {
            let value = a.unescape_value().map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
