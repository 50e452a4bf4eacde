/*!
 * Common test utilities for the lexiscribe test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use lexiscribe::app_config::{Config, ModelProvider};
use lexiscribe::providers::mock::MockModel;

/// A dense entry page: five "Term. gloss" lines and a running header
pub const ENTRY_PAGE: &str = "A ANTES DE B. BERTONIO 12\n\
Abeja de miel. Vmaña\n\
Abejon que zumba. Ccumurumu\n\
Abaxar lo alto. Cchaquatha\n\
Abaxo, debaxo. Mancca\n\
Abadejo, pescado. Ccaraapa\n\
13";

/// Second entry page, different headwords
pub const SECOND_ENTRY_PAGE: &str = "Agallas en la garganta. Cchaña haque\n\
Agarrar haziendo presa. Cchumi chapicha\n\
Agua que corre. Vma sarasiri\n\
Aguja para coser. Ccauchi\n\
Ahogarse en el agua. Vmaru maquthatha";

/// Title page of the printed volume
pub const FRONT_MATTER_PAGE: &str = "VOCABVLARIO DE LA LENGVA AYMARA.\n\
PRIMERA PARTE, donde por abecedario se ponen en primer lugar los Vocablos de la lengua Española.\n\
Compuesto por el P. Ludovico Bertonio. Impresso en la Casa de la Compañia de Iesus de Iuli Pueblo en la Provincia de Chucuito. 1612";

/// Initialize logging for tests; repeated calls are harmless
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration that needs no API key, writes into `output_dir` and never pauses
pub fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.extraction.provider = ModelProvider::Ollama;
    config.processing.start_page = 1;
    config.processing.end_page = None;
    config.processing.pacing_delay_ms = 0;
    config.processing.flush_every_pages = 1;
    config.output.directory = output_dir.to_string_lossy().to_string();
    config.output.basename = "bertonio".to_string();
    config
}

/// A model answer in the default profile's keys
pub fn answer(pairs: &[(&str, &str)]) -> String {
    MockModel::entries_json("espanol", "aymara", pairs)
}
