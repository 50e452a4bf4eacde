/*!
 * Source documents that hand out the raw text of one page at a time.
 *
 * - `PdfDocument`: text layer of a PDF, read with lopdf
 * - `TextDocument`: plain text with pages separated by form feeds, as
 *   written by `pdftotext`
 * - `MemoryDocument`: pages held in memory, for tests and dry runs
 */

use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::DocumentError;

/// Page separator used by `pdftotext` and most OCR exporters
pub const FORM_FEED: char = '\x0c';

/// A paged source of raw text
pub trait Document {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Raw text of the page at `index` (0-based)
    fn load_page_text(&self, index: usize) -> Result<String, DocumentError>;

    /// Short name for logs and checkpoints
    fn name(&self) -> String;
}

fn page_out_of_range(index: usize, page_count: usize) -> DocumentError {
    DocumentError::PageLoad {
        page_number: index as u32 + 1,
        message: format!("document has {} pages", page_count),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// PDF document backed by lopdf
pub struct PdfDocument {
    path: PathBuf,
    document: lopdf::Document,
    /// lopdf page numbers in reading order
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    /// Open and parse a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let document = lopdf::Document::load(path).map_err(|e| DocumentError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let pages: BTreeMap<u32, lopdf::ObjectId> = document.get_pages();
        let page_numbers: Vec<u32> = pages.keys().copied().collect();
        debug!("Opened PDF {:?} with {} pages", path, page_numbers.len());

        Ok(Self {
            path: path.to_path_buf(),
            document,
            page_numbers,
        })
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn load_page_text(&self, index: usize) -> Result<String, DocumentError> {
        let page_number = *self.page_numbers.get(index)
            .ok_or_else(|| page_out_of_range(index, self.page_count()))?;

        self.document.extract_text(&[page_number]).map_err(|e| DocumentError::PageLoad {
            page_number: index as u32 + 1,
            message: e.to_string(),
        })
    }

    fn name(&self) -> String {
        file_name(&self.path)
    }
}

/// Plain-text document with form-feed separated pages
pub struct TextDocument {
    name: String,
    pages: Vec<String>,
}

impl TextDocument {
    /// Read a text file and split it into pages
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_text(file_name(path), &content))
    }

    /// Split already loaded text into pages
    pub fn from_text(name: impl Into<String>, content: &str) -> Self {
        let mut pages: Vec<String> = content.split(FORM_FEED).map(str::to_string).collect();
        // pdftotext terminates every page, including the last, with a form feed
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self { name: name.into(), pages }
    }
}

impl Document for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn load_page_text(&self, index: usize) -> Result<String, DocumentError> {
        self.pages.get(index)
            .cloned()
            .ok_or_else(|| page_out_of_range(index, self.page_count()))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// In-memory document; a `None` page fails to load
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<Option<String>>,
}

impl MemoryDocument {
    /// Create a document whose pages all load
    pub fn new<S: Into<String>>(pages: Vec<S>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| Some(p.into())).collect(),
        }
    }

    /// Create a document from pages that may be unreadable
    pub fn with_pages(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }
}

impl Document for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn load_page_text(&self, index: usize) -> Result<String, DocumentError> {
        match self.pages.get(index) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(DocumentError::PageLoad {
                page_number: index as u32 + 1,
                message: "page is unreadable".to_string(),
            }),
            None => Err(page_out_of_range(index, self.page_count())),
        }
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

/// Open a document, picking the reader from the file extension
pub fn open_document<P: AsRef<Path>>(path: P) -> Result<Box<dyn Document>, DocumentError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DocumentError::Open {
            path: path.display().to_string(),
            message: "file does not exist".to_string(),
        });
    }

    let extension = path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfDocument::open(path)?)),
        "txt" | "text" => Ok(Box::new(TextDocument::open(path)?)),
        other => Err(DocumentError::Unsupported(format!(
            "'{}' ({}), expected .pdf or .txt",
            path.display(),
            if other.is_empty() { "no extension" } else { other }
        ))),
    }
}
