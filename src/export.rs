/*!
 * Tabular export of entries.
 *
 * Both formats carry three columns: the output-language term, the
 * source-language term and the page number, under the header names of the
 * dictionary profile. CSV files start with a UTF-8 byte order mark so that
 * spreadsheet programs detect the encoding of accented and Aymara letters.
 */

use log::debug;
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::app_config::DictionaryProfile;
use crate::errors::ExportError;
use crate::extraction::Entry;
use crate::file_utils::FileManager;

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Worksheet name in exported workbooks
const SHEET_NAME: &str = "Entries";

/// Every file a run writes
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub refined_csv: PathBuf,
    pub refined_xlsx: PathBuf,
    pub checkpoint: PathBuf,
    pub issues_log: PathBuf,
}

impl ExportPaths {
    pub fn new<P: AsRef<Path>>(output_dir: P, basename: &str) -> Self {
        let dir = output_dir.as_ref();
        Self {
            csv: FileManager::output_path(dir, basename, "", "csv"),
            xlsx: FileManager::output_path(dir, basename, "", "xlsx"),
            refined_csv: FileManager::output_path(dir, basename, "_clean", "csv"),
            refined_xlsx: FileManager::output_path(dir, basename, "_clean", "xlsx"),
            checkpoint: FileManager::output_path(dir, basename, ".checkpoint", "json"),
            issues_log: FileManager::output_path(dir, basename, ".issues", "log"),
        }
    }
}

/// Writes entries as CSV and XLSX tables
#[derive(Debug, Clone)]
pub struct TableExporter {
    headers: [String; 3],
}

impl TableExporter {
    pub fn new(output_header: &str, source_header: &str, page_header: &str) -> Self {
        Self {
            headers: [output_header.to_string(), source_header.to_string(), page_header.to_string()],
        }
    }

    /// Column headers from the profile's JSON keys and page column
    pub fn from_profile(profile: &DictionaryProfile) -> Self {
        Self::new(&profile.output_key, &profile.source_key, &profile.page_column)
    }

    pub fn headers(&self) -> &[String; 3] {
        &self.headers
    }

    /// Write a BOM-prefixed UTF-8 CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, entries: &[Entry]) -> Result<(), ExportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        for entry in entries {
            writer.write_record([
                entry.source_term.as_str(),
                entry.translated_term.as_str(),
                entry.page_number.to_string().as_str(),
            ])?;
        }
        writer.flush()?;

        debug!("Wrote {} entries to {:?}", entries.len(), path);
        Ok(())
    }

    /// Write a single-sheet XLSX workbook
    pub fn write_xlsx<P: AsRef<Path>>(&self, path: P, entries: &[Entry]) -> Result<(), ExportError> {
        let path = path.as_ref();
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        worksheet.set_column_width(0, 40)?;
        worksheet.set_column_width(1, 40)?;

        for (index, entry) in entries.iter().enumerate() {
            let row = index as u32 + 1;
            worksheet.write_string(row, 0, &entry.source_term)?;
            worksheet.write_string(row, 1, &entry.translated_term)?;
            worksheet.write_number(row, 2, entry.page_number)?;
        }

        workbook.save(path)?;

        debug!("Wrote {} entries to {:?}", entries.len(), path);
        Ok(())
    }

    /// Write the same entries to a CSV and an XLSX file
    pub fn write_tables(&self, csv_path: &Path, xlsx_path: &Path, entries: &[Entry]) -> Result<(), ExportError> {
        self.write_csv(csv_path, entries)?;
        self.write_xlsx(xlsx_path, entries)
    }
}

impl Default for TableExporter {
    fn default() -> Self {
        Self::from_profile(&DictionaryProfile::default())
    }
}
