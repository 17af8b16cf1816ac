//! Minimal PDF 1.4 writer: A4 pages of Helvetica text, one line per record.

use std::fs;
use std::path::Path;

use super::{summary_line, write_error};
use crate::models::{CoreResult, LogRecord};

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 40;
const LEFT: u32 = 30;
const LINE_HEIGHT: u32 = 18;
const FONT_SIZE: u32 = 10;
const MAX_LINE_CHARS: usize = 120;

pub(super) fn write(records: &[LogRecord], path: &Path) -> CoreResult<()> {
    let lines: Vec<String> = records.iter().map(summary_line).collect();
    fs::write(path, render(&lines)).map_err(|error| write_error(path, error))
}

/// Split lines into pages; an empty document still gets one blank page.
fn paginate(lines: &[String]) -> Vec<Vec<(u32, &str)>> {
    let mut pages = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        if let Some(page) = pages.last_mut() {
            page.push((y, line.as_str()));
        }
        y -= LINE_HEIGHT;
        if y < MARGIN {
            pages.push(Vec::new());
            y = PAGE_HEIGHT - MARGIN;
        }
    }
    if pages.len() > 1 && pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }
    pages
}

fn render(lines: &[String]) -> Vec<u8> {
    let pages = paginate(lines);

    // 1: catalog, 2: page tree, 3: font, then a (page, content) pair per page.
    let page_ids: Vec<usize> = (0..pages.len()).map(|index| 4 + index * 2).collect();
    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            )
            .into_bytes(),
        );

        let mut content = String::new();
        for (y, text) in page {
            content.push_str(&format!(
                "BT /F1 {FONT_SIZE} Tf {LEFT} {y} Td ({}) Tj ET\n",
                escape_text(text)
            ));
        }
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"endstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Truncate to the printable width and escape for a PDF literal string.
/// Characters outside printable ASCII become '?'.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars().take(MAX_LINE_CHARS) {
        match ch {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' '..='~' => escaped.push(ch),
            _ => escaped.push('?'),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{MAX_LINE_CHARS, escape_text, paginate, render};

    #[test]
    fn escapes_delimiters_and_replaces_non_ascii() {
        assert_eq!(escape_text(r"a(b)c\d"), r"a\(b\)c\\d");
        assert_eq!(escape_text("café"), "caf?");
    }

    #[test]
    fn long_lines_are_truncated() {
        let long = "x".repeat(MAX_LINE_CHARS + 50);
        assert_eq!(escape_text(&long).len(), MAX_LINE_CHARS);
    }

    #[test]
    fn lines_flow_onto_new_pages() {
        let lines: Vec<String> = (0..100).map(|i| format!("line {i}")).collect();
        let pages = paginate(&lines);

        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 100);
        assert_eq!(pages[0][0].0, 802);
        assert!(pages.iter().flatten().all(|(y, _)| *y >= 40));
    }

    #[test]
    fn empty_document_has_one_page() {
        assert_eq!(paginate(&[]).len(), 1);
        let pdf = String::from_utf8(render(&[])).unwrap();
        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains("/Count 1"));
        assert!(pdf.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = render(&["hello".to_string()]);
        let text = String::from_utf8(bytes).unwrap();
        let xref_start = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().unwrap())
            .collect();

        for (index, offset) in entries.iter().enumerate() {
            assert!(text[*offset..].starts_with(&format!("{} 0 obj", index + 1)));
        }
    }
}
