use std::path::{Path, PathBuf};

use crate::dal::ProjectStore;
use crate::domain::Project;
use crate::error::StageError;

/// Writes the accumulated rows as CSV: one header per column title plus a
/// final URL column, cells in column order, missing values as empty
/// strings. The output path defaults to the project path with a `.csv`
/// extension.
pub fn export_csv(store: &ProjectStore, csv_path: Option<PathBuf>) -> Result<PathBuf, StageError> {
    let project = store.load()?;
    let csv_path = csv_path.unwrap_or_else(|| store.path().with_extension("csv"));

    write_csv(&project, &csv_path)?;
    log::info!("CSV file saved to {}", csv_path.display());

    Ok(csv_path)
}

fn write_csv(project: &Project, path: &Path) -> Result<(), StageError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers: Vec<String> = project.columns.iter().map(|c| c.title.clone()).collect();
    headers.push("URL".to_string());
    writer.write_record(&headers)?;

    for row in &project.rows {
        let mut record: Vec<String> = project
            .columns
            .iter()
            .map(|column| {
                row.values
                    .get(&column.key)
                    .and_then(|value| value.clone())
                    .unwrap_or_default()
            })
            .collect();
        record.push(row.url.clone());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
