//! DOCX decoding. A .docx file is a zip archive; the body lives in
//! word/document.xml as WordprocessingML. Paragraphs become text blocks
//! and tables become cell grids, in document order.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{CellGrid, LoaderError, StructuredView, TextBlock};

pub(super) fn load(bytes: &[u8]) -> Result<StructuredView, LoaderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;

    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<StructuredView, LoaderError> {
    let mut reader = Reader::from_reader(xml.as_bytes());

    let mut buf = Vec::new();
    let mut view = StructuredView::default();

    let mut in_paragraph = false;
    let mut in_table = false;
    // Run text lives in w:t elements. Word splits a paragraph across runs
    // at arbitrary points and keeps boundary spaces inside w:t
    // (xml:space="preserve"), so only w:t content is collected and it is
    // collected verbatim; markup whitespace between elements is ignored.
    let mut in_text = false;
    let mut current_paragraph = String::new();
    let mut current_cell = String::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut table_rows: Vec<Vec<String>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" if !in_table => {
                    in_paragraph = true;
                    current_paragraph.clear();
                }
                b"w:tbl" => {
                    in_table = true;
                    table_rows.clear();
                }
                b"w:tr" => current_row.clear(),
                b"w:tc" => current_cell.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().unwrap_or_default().to_string();
                if in_table {
                    current_cell.push_str(&text);
                } else if in_paragraph {
                    current_paragraph.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:tc" => {
                    current_row.push(current_cell.trim().to_string());
                    current_cell.clear();
                }
                b"w:tr" => {
                    if !current_row.is_empty() {
                        table_rows.push(std::mem::take(&mut current_row));
                    }
                }
                b"w:tbl" => {
                    in_table = false;
                    if !table_rows.is_empty() {
                        view.grids.push(CellGrid {
                            name: format!("table-{}", view.grids.len() + 1),
                            rows: std::mem::take(&mut table_rows),
                        });
                    }
                }
                b"w:p" if !in_table => {
                    in_paragraph = false;
                    let line = current_paragraph.trim();
                    if !line.is_empty() {
                        view.text_blocks.push(TextBlock {
                            page: 1,
                            index: view.text_blocks.len(),
                            text: line.to_string(),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoaderError::CorruptDocument(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(view)
}
