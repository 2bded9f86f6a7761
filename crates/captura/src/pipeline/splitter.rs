//! Splitter stage: one source PDF into per-page documents
//!
//! Page outputs are created with an exclusive open, so a duplicate
//! invocation for the same document surfaces a Conflict instead of
//! silently overwriting. The source is archived after a successful split;
//! raw inputs must remain recoverable.

use lopdf::Document;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::{create_artifact, StageStore};

/// Outcome of a successful split.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Number of pages produced
    pub pages: usize,
    /// Directory holding the page documents
    pub output_dir: PathBuf,
    /// Where the consumed source document was archived
    pub archived_to: PathBuf,
}

/// Split `filename` (in the incoming area) into single-page PDFs named
/// `{base}_page_{1..N}.pdf`, then archive the source document.
pub fn split_document(store: &StageStore, filename: &str) -> Result<SplitOutcome> {
    let input = normalize_source(store, filename)?;
    let base = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidParameter(format!("invalid filename: {}", filename)))?
        .to_string();

    // Advisory pre-check; the exclusive create below is authoritative
    let first_page = store.pages().join(page_file_name(&base, 1));
    if first_page.exists() {
        return Err(Error::Conflict(format!(
            "page output already exists: {}",
            first_page.display()
        )));
    }

    let document = Document::load(&input)
        .map_err(|e| Error::Pdf(format!("failed to load {}: {}", filename, e)))?;
    let page_count = document.get_pages().len();
    if page_count == 0 {
        return Err(Error::Pdf(format!("document has no pages: {}", filename)));
    }

    for index in 1..=page_count as u32 {
        let output = store.pages().join(page_file_name(&base, index));
        let mut single = document.clone();
        let others: Vec<u32> = (1..=page_count as u32).filter(|n| *n != index).collect();
        single.delete_pages(&others);
        single.prune_objects();
        write_page(&mut single, &output)?;
    }

    let archived_to = store.archive_source(&input)?;
    tracing::info!(
        "split '{}' into {} pages, archived to {}",
        filename,
        page_count,
        archived_to.display()
    );

    Ok(SplitOutcome {
        pages: page_count,
        output_dir: store.pages().to_path_buf(),
        archived_to,
    })
}

/// `{base}_page_{index}.pdf`, 1-indexed in document order.
pub fn page_file_name(base: &str, index: u32) -> String {
    format!("{}_page_{}.pdf", base, index)
}

fn write_page(document: &mut Document, path: &Path) -> Result<()> {
    let file = create_artifact(path)?;
    let mut writer = BufWriter::new(file);
    document
        .save_to(&mut writer)
        .map_err(|e| Error::Pdf(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Validate the source name; normalize an upper-case `.PDF` extension to
/// `.pdf` on disk before splitting.
fn normalize_source(store: &StageStore, filename: &str) -> Result<PathBuf> {
    let path = StageStore::resolve(store.incoming(), filename)?;
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "no such document in incoming: {}",
            filename
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    if !extension.eq_ignore_ascii_case("pdf") {
        return Err(Error::UnsupportedType(format!(
            "expected a .pdf document: {}",
            filename
        )));
    }

    if extension != "pdf" {
        let target = path.with_extension("pdf");
        fs::rename(&path, &target)?;
        return Ok(target);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn store_in(dir: &Path) -> StageStore {
        let config = StorageConfig {
            incoming_dir: dir.join("files"),
            pages_dir: dir.join("pages"),
            chunks_dir: dir.join("results"),
            tables_dir: dir.join("tables"),
            archive_dir: dir.join("archive"),
            public_base_url: "https://files.test".to_string(),
        };
        StageStore::new(&config).unwrap()
    }

    fn sample_pdf(pages: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in 0..pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("page {}", page + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn split_produces_one_document_per_page_and_archives_the_source() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        sample_pdf(3)
            .save(store.incoming().join("invoice_7.pdf"))
            .unwrap();

        let outcome = split_document(&store, "invoice_7.pdf").unwrap();
        assert_eq!(outcome.pages, 3);

        for index in 1..=3 {
            let page_path = store.pages().join(page_file_name("invoice_7", index));
            assert!(page_path.exists(), "missing page {}", index);
            let page = Document::load(&page_path).unwrap();
            assert_eq!(page.get_pages().len(), 1);
        }

        assert!(!store.incoming().join("invoice_7.pdf").exists());
        assert!(store.archive().join("invoice_7.pdf").exists());
    }

    #[test]
    fn split_refuses_a_duplicate_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        sample_pdf(2)
            .save(store.incoming().join("invoice_8.pdf"))
            .unwrap();
        split_document(&store, "invoice_8.pdf").unwrap();

        // Re-upload the same document; its page 1 output already exists
        sample_pdf(2)
            .save(store.incoming().join("invoice_8.pdf"))
            .unwrap();
        let err = split_document(&store, "invoice_8.pdf").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn split_rejects_missing_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let err = split_document(&store, "nowhere.pdf").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn split_rejects_non_pdf_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        fs::write(store.incoming().join("notes.txt"), "plain text").unwrap();
        let err = split_document(&store, "notes.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn uppercase_pdf_extension_is_normalized_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        sample_pdf(1)
            .save(store.incoming().join("SCAN.PDF"))
            .unwrap();

        let outcome = split_document(&store, "SCAN.PDF").unwrap();
        assert_eq!(outcome.pages, 1);
        assert!(store.pages().join("SCAN_page_1.pdf").exists());
        assert!(store.archive().join("SCAN.pdf").exists());
    }

    #[test]
    fn page_file_names_are_one_indexed() {
        assert_eq!(page_file_name("covalca_3", 1), "covalca_3_page_1.pdf");
        assert_eq!(page_file_name("covalca_3", 16), "covalca_3_page_16.pdf");
    }
}
