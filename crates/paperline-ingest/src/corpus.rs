//! Plain-text corpus extraction from a local tree of paper PDFs.
//!
//! Every `*.pdf` under the input root becomes a `.txt` file at the same
//! relative location under the output root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// All `*.pdf` files below `root`, sorted by path.
pub fn collect_pdfs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    scan_pdfs(root, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn scan_pdfs(dir: &Path, paths: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            scan_pdfs(&path, paths)?;
        } else if path.is_file() && is_pdf(&path) {
            paths.push(path);
        }
    }
    Ok(())
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}

/// Text of every page of the PDF at `path`, in page order.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let document = Document::load(path).map_err(|err| {
        IngestError::PdfExtraction(format!("lopdf failed to open {}: {err}", path.display()))
    })?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Ok(String::new());
    }
    debug!(path = %path.display(), pages = page_numbers.len(), "extracting text");

    document.extract_text(&page_numbers).map_err(|err| {
        IngestError::PdfExtraction(format!(
            "lopdf failed to extract text from {}: {err}",
            path.display()
        ))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextReport {
    pub written: Vec<PathBuf>,
    /// Outputs left untouched because they already existed.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TextReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct TextRoutine {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl TextRoutine {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Where the text of `pdf` is written.
    pub fn output_path(&self, pdf: &Path) -> PathBuf {
        let relative = pdf.strip_prefix(&self.input_root).unwrap_or(pdf);
        let relative = match relative.file_name() {
            Some(_) => relative.to_path_buf(),
            None => PathBuf::from(pdf.file_name().unwrap_or_default()),
        };
        self.output_root.join(relative).with_extension("txt")
    }

    /// Extracts every PDF. Failures for one file are recorded and the run
    /// moves on; only an unreadable input tree aborts it.
    pub fn run(&self) -> Result<TextReport> {
        let mut report = TextReport::default();

        for pdf in collect_pdfs(&self.input_root)? {
            let output = self.output_path(&pdf);

            if output.exists() {
                warn!(path = %output.display(), "text file already exists, skipping");
                report.skipped.push(output);
                continue;
            }

            match self.write_text(&pdf, &output) {
                Ok(()) => {
                    debug!(pdf = %pdf.display(), txt = %output.display(), "text written");
                    report.written.push(output);
                }
                Err(e) => {
                    warn!(pdf = %pdf.display(), error = %e, "text extraction failed");
                    report.failed.push((pdf, e.to_string()));
                }
            }
        }

        info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "text extraction finished"
        );
        Ok(report)
    }

    fn write_text(&self, pdf: &Path, output: &Path) -> Result<()> {
        let text = extract_pdf_text(pdf)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn write_pdf(path: &Path, text: &str) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        doc.save(path).unwrap();
    }

    #[test]
    fn test_collect_pdfs_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("0704")).unwrap();
        fs::write(dir.path().join("0704/0704.0002.pdf"), b"").unwrap();
        fs::write(dir.path().join("0704.0001.PDF"), b"").unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        let pdfs = collect_pdfs(dir.path()).unwrap();
        assert_eq!(
            pdfs,
            vec![dir.path().join("0704.0001.PDF"), dir.path().join("0704/0704.0002.pdf")]
        );
    }

    #[test]
    fn test_output_path_keeps_relative_layout() {
        let routine = TextRoutine::new("/data/pdf", "/data/txt");
        assert_eq!(
            routine.output_path(Path::new("/data/pdf/2007/04/0704.0001.pdf")),
            PathBuf::from("/data/txt/2007/04/0704.0001.txt")
        );
    }

    #[test]
    fn test_extracts_text_from_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("0704.0001.pdf");
        write_pdf(&pdf, "Prompt diphoton production");

        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("Prompt diphoton production"), "got {text:?}");
    }

    #[test]
    fn test_run_writes_mirrored_text_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_pdf(&input.path().join("2007/04/0704.0001.pdf"), "Diphoton");
        write_pdf(&input.path().join("0704.0002.pdf"), "Sparsity");

        let report = TextRoutine::new(input.path(), output.path()).run().unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(!report.has_failures());
        let nested = fs::read_to_string(output.path().join("2007/04/0704.0001.txt")).unwrap();
        assert!(nested.contains("Diphoton"));
        assert!(output.path().join("0704.0002.txt").is_file());
    }

    #[test]
    fn test_run_skips_existing_and_records_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_pdf(&input.path().join("0704.0001.pdf"), "Diphoton");
        fs::write(input.path().join("0704.0003.pdf"), b"not a pdf").unwrap();
        fs::write(output.path().join("0704.0001.txt"), "kept").unwrap();

        let report = TextRoutine::new(input.path(), output.path()).run().unwrap();

        assert_eq!(report.skipped, vec![output.path().join("0704.0001.txt")]);
        assert_eq!(fs::read_to_string(output.path().join("0704.0001.txt")).unwrap(), "kept");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, input.path().join("0704.0003.pdf"));
        assert!(!output.path().join("0704.0003.txt").exists());
    }

    #[test]
    fn test_missing_input_tree_fails() {
        let dir = tempfile::tempdir().unwrap();
        let routine = TextRoutine::new(dir.path().join("absent"), dir.path().join("out"));
        assert!(matches!(routine.run(), Err(IngestError::Io(_))));
    }
}
