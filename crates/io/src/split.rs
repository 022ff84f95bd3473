use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use erafix_engine::{RecordStore, RowIndex};

use crate::error::IoError;
use crate::sheet::RawSheet;

/// Write one `<prefix>_<discipline>.xlsx` per distinct discipline.
///
/// Rows without a discipline are not written. Returns the paths written,
/// ordered by discipline.
pub fn split_by_discipline(store: &RecordStore, prefix: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut groups: BTreeMap<String, BTreeSet<RowIndex>> = BTreeMap::new();
    for row in store.row_indices() {
        if let Some(discipline) = store.discipline(row) {
            groups.entry(discipline).or_default().insert(row);
        }
    }

    let mut written = Vec::with_capacity(groups.len());
    for (discipline, rows) in &groups {
        let path = output_path(prefix, discipline);
        let subset = store.subset(rows);
        crate::xlsx::export(&[RawSheet::from_store(&subset)], &path)?;
        log::info!("wrote {} row(s) for '{discipline}' to {}", rows.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

fn output_path(prefix: &Path, discipline: &str) -> PathBuf {
    let safe: String = discipline
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("_{safe}.xlsx"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_appends_discipline() {
        assert_eq!(
            output_path(Path::new("out/era"), "astro"),
            PathBuf::from("out/era_astro.xlsx")
        );
        assert_eq!(
            output_path(Path::new("era"), "bio/photonics"),
            PathBuf::from("era_bio_photonics.xlsx")
        );
    }
}
