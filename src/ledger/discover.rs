use std::path::{Path, PathBuf};

use crate::core::{LedgerError, months};

/// One XML document found in the folder tree, with the folder names that
/// give it its employee and month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Calendar month of the containing month folder (1–12).
    pub month: u32,
    /// Month folder name as it appears on disk.
    pub month_folder: String,
    /// Employee folder name, copied verbatim.
    pub employee: String,
    pub path: PathBuf,
}

/// Enumerate `root`'s month folders, their employee folders, and the XML
/// files inside.
///
/// Order is deterministic — calendar-month order, then case-insensitive
/// lexicographic employee and file order — because duplicate first-seen
/// designation depends on visitation order. Non-month folders and non-XML
/// files are ignored.
pub fn discover_invoices(root: &Path) -> Result<Vec<DiscoveredFile>, LedgerError> {
    let mut month_dirs: Vec<(u32, PathBuf, String)> = Vec::new();
    for entry in read_dir(root)? {
        if !entry.is_dir() {
            continue;
        }
        let name = file_name(&entry);
        if let Some(month) = months::month_number(&name) {
            month_dirs.push((month, entry, name));
        }
    }
    month_dirs.sort_by_key(|(month, _, _)| *month);

    let mut found = Vec::new();
    for (month, month_path, month_folder) in month_dirs {
        let mut employees: Vec<PathBuf> = read_dir(&month_path)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();
        employees.sort_by_key(|p| file_name(p).to_lowercase());

        for employee_path in employees {
            let employee = file_name(&employee_path);
            let mut files: Vec<PathBuf> = read_dir(&employee_path)?
                .into_iter()
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
                })
                .collect();
            files.sort_by_key(|p| file_name(p).to_lowercase());

            for path in files {
                found.push(DiscoveredFile {
                    month,
                    month_folder: month_folder.clone(),
                    employee: employee.clone(),
                    path,
                });
            }
        }
    }
    Ok(found)
}

fn read_dir(path: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    let entries = std::fs::read_dir(path).map_err(|source| LedgerError::Walk {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LedgerError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        out.push(entry.path());
    }
    Ok(out)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
