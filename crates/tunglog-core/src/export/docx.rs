//! Minimal WordprocessingML package: a heading and one table row per record.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::write_error;
use crate::models::{CoreResult, LogRecord};

const HEADER: [&str; 5] = ["ID", "Type", "Message", "Hostname", "Created At"];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

pub(super) fn write(records: &[LogRecord], path: &Path) -> CoreResult<()> {
    let file = File::create(path).map_err(|error| write_error(path, error))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", RELS_XML.to_string()),
        ("word/document.xml", document_xml(records)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)
            .map_err(|error| write_error(path, error))?;
        zip.write_all(body.as_bytes())
            .map_err(|error| write_error(path, error))?;
    }
    zip.finish().map_err(|error| write_error(path, error))?;
    Ok(())
}

fn document_xml(records: &[LogRecord]) -> String {
    let mut body = String::new();
    body.push_str(
        r#"<w:p><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t>Log Export</w:t></w:r></w:p>"#,
    );
    body.push_str(
        r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders><w:top w:val="single" w:sz="4"/><w:left w:val="single" w:sz="4"/><w:bottom w:val="single" w:sz="4"/><w:right w:val="single" w:sz="4"/><w:insideH w:val="single" w:sz="4"/><w:insideV w:val="single" w:sz="4"/></w:tblBorders></w:tblPr><w:tblGrid>"#,
    );
    for _ in HEADER {
        body.push_str(r#"<w:gridCol w:w="1800"/>"#);
    }
    body.push_str("</w:tblGrid>");
    push_row(&mut body, HEADER.iter().map(|cell| cell.to_string()));

    for record in records {
        push_row(
            &mut body,
            [
                record.id.map(|id| id.to_string()).unwrap_or_default(),
                record.log_type.to_string(),
                record.log_message.clone(),
                record.hostname.clone(),
                record.created_at.to_rfc3339(),
            ],
        );
    }
    body.push_str("</w:tbl><w:p/>");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

fn push_row(body: &mut String, cells: impl IntoIterator<Item = String>) {
    body.push_str("<w:tr>");
    for cell in cells {
        body.push_str(r#"<w:tc><w:p><w:r><w:t xml:space="preserve">"#);
        body.push_str(&escape_xml(&cell));
        body.push_str("</w:t></w:r></w:p></w:tc>");
    }
    body.push_str("</w:tr>");
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Control characters other than tab/newline are not valid XML 1.0.
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{document_xml, escape_xml};
    use crate::models::{LogId, LogRecord, LogType};

    #[test]
    fn markup_characters_are_escaped() {
        assert_eq!(
            escape_xml(r#"<disk> & "quota" 'x'"#),
            "&lt;disk&gt; &amp; &quot;quota&quot; &apos;x&apos;"
        );
        assert_eq!(escape_xml("a\u{0}b"), "ab");
    }

    #[test]
    fn document_has_header_plus_one_row_per_record() {
        let record = LogRecord {
            id: Some(LogId(3)),
            log_type: LogType::Error,
            log_message: "disk <full>".to_string(),
            hostname: "node-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };
        let xml = document_xml(&[record.clone(), record]);

        assert_eq!(xml.matches("<w:tr>").count(), 3);
        assert!(xml.contains("Created At"));
        assert!(xml.contains("disk &lt;full&gt;"));
        assert!(xml.contains("<w:t>Log Export</w:t>"));
    }
}
