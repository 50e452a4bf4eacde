/*!
 * Tests for CSV and XLSX export
 */

use anyhow::Result;
use calamine::{open_workbook, Data, Reader, Xlsx};

use lexiscribe::app_config::DictionaryProfile;
use lexiscribe::export::{ExportPaths, TableExporter};
use lexiscribe::Entry;
use crate::common;

fn entries() -> Vec<Entry> {
    vec![
        Entry::new("Abeja de miel", "Vmaña", 41).unwrap(),
        Entry::new("Agallas en la garganta", "Cchaña haque, añanque", 42).unwrap(),
    ]
}

/// The CSV reads back with the csv crate once the BOM is skipped
#[test]
fn test_writeCsv_shouldReadBackWithHeaders() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("out.csv");
    TableExporter::default().write_csv(&path, &entries())?;

    let content = std::fs::read_to_string(&path)?;
    let content = content.strip_prefix('\u{feff}').expect("BOM");
    let mut reader = csv::Reader::from_reader(content.as_bytes());

    assert_eq!(reader.headers()?.iter().collect::<Vec<_>>(), vec!["espanol", "aymara", "pagina"]);
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][1], "Cchaña haque, añanque");
    assert_eq!(&rows[1][2], "42");
    Ok(())
}

/// Custom profiles rename the columns
#[test]
fn test_writeCsv_withCustomProfile_shouldUseItsHeaders() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("nested").join("out.csv");
    let mut profile = DictionaryProfile::default();
    profile.output_key = "castellano".to_string();
    profile.source_key = "quechua".to_string();
    profile.page_column = "folio".to_string();

    TableExporter::from_profile(&profile).write_csv(&path, &[])?;

    let content = std::fs::read_to_string(&path)?;
    assert_eq!(content, "\u{feff}castellano,quechua,folio\n");
    Ok(())
}

/// The workbook has a header row, text cells and numeric pages
#[test]
fn test_writeXlsx_shouldReadBackWithCalamine() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("out.xlsx");
    TableExporter::default().write_xlsx(&path, &entries())?;

    let mut workbook: Xlsx<_> = open_workbook(&path)?;
    let sheet_names = workbook.sheet_names();
    assert_eq!(sheet_names, vec!["Entries".to_string()]);

    let range = workbook.worksheet_range("Entries")?;
    assert_eq!(range.height(), 3);
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("espanol".to_string())));
    assert_eq!(range.get_value((1, 1)), Some(&Data::String("Vmaña".to_string())));
    assert_eq!(range.get_value((2, 2)), Some(&Data::Float(42.0)));
    Ok(())
}

/// Paths follow the basename with the expected suffixes
#[test]
fn test_exportPaths_shouldShareDirectory() {
    let paths = ExportPaths::new("out", "diccionario");
    for path in [&paths.csv, &paths.xlsx, &paths.refined_csv, &paths.refined_xlsx, &paths.checkpoint, &paths.issues_log] {
        assert_eq!(path.parent().unwrap(), std::path::Path::new("out"));
    }
    assert_eq!(paths.refined_csv.file_name().unwrap(), "diccionario_clean.csv");
}
