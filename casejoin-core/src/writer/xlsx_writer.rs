//! XLSX package writer built on zip + quick-xml

use crate::reader::{CellValue, Table};
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Write `sheets` as a new XLSX package into `sink`.
///
/// Each table becomes one worksheet: the header row followed by the data
/// rows. Empty cells are omitted.
pub fn write_xlsx_package<W: Write + Seek>(sink: W, sheets: &[&Table]) -> Result<W> {
    if sheets.is_empty() {
        anyhow::bail!("A workbook needs at least one sheet");
    }
    for sheet in sheets {
        validate_sheet_name(&sheet.name)?;
    }

    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(&content_types_xml(sheets.len())?)?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(&root_rels_xml()?)?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(&workbook_xml(sheets)?)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(&workbook_rels_xml(sheets.len())?)?;

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        let xml = worksheet_xml(sheet)
            .with_context(|| format!("Failed to serialize sheet '{}'", sheet.name))?;
        zip.write_all(&xml)?;
    }

    Ok(zip.finish()?)
}

fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > 31 {
        anyhow::bail!("Invalid sheet name '{}': must be 1-31 characters", name);
    }
    if let Some(c) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        anyhow::bail!("Invalid sheet name '{}': contains '{}'", name, c);
    }
    Ok(())
}

fn new_xml_writer() -> Result<Writer<Cursor<Vec<u8>>>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut writer = new_xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Types").with_attributes([("xmlns", NS_CONTENT_TYPES)]),
    ))?;
    writer.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
        ("Extension", "rels"),
        ("ContentType", CT_RELS),
    ])))?;
    writer.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
        ("Extension", "xml"),
        ("ContentType", "application/xml"),
    ])))?;
    writer.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
        ("PartName", "/xl/workbook.xml"),
        ("ContentType", CT_WORKBOOK),
    ])))?;
    for i in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{}.xml", i);
        writer.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
            ("PartName", part.as_str()),
            ("ContentType", CT_WORKSHEET),
        ])))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(writer.into_inner().into_inner())
}

fn root_rels_xml() -> Result<Vec<u8>> {
    let mut writer = new_xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", NS_PKG_REL)]),
    ))?;
    writer.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
        ("Id", "rId1"),
        ("Type", REL_OFFICE_DOCUMENT),
        ("Target", "xl/workbook.xml"),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner().into_inner())
}

fn workbook_xml(sheets: &[&Table]) -> Result<Vec<u8>> {
    let mut writer = new_xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    for (i, sheet) in sheets.iter().enumerate() {
        let sheet_id = (i + 1).to_string();
        let rel_id = format!("rId{}", i + 1);
        writer.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
            ("name", sheet.name.as_str()),
            ("sheetId", sheet_id.as_str()),
            ("r:id", rel_id.as_str()),
        ])))?;
    }
    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner().into_inner())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut writer = new_xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", NS_PKG_REL)]),
    ))?;
    for i in 1..=sheet_count {
        let rel_id = format!("rId{}", i);
        let target = format!("worksheets/sheet{}.xml", i);
        writer.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
            ("Id", rel_id.as_str()),
            ("Type", REL_WORKSHEET),
            ("Target", target.as_str()),
        ])))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner().into_inner())
}

fn worksheet_xml(table: &Table) -> Result<Vec<u8>> {
    let mut writer = new_xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<CellValue> = table.columns.iter().map(|c| CellValue::from(c.as_str())).collect();
    write_row(&mut writer, 0, &header)?;
    for (i, row) in table.rows.iter().enumerate() {
        write_row(&mut writer, i as u32 + 1, row)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_row<W: Write>(writer: &mut Writer<W>, row: u32, cells: &[CellValue]) -> Result<()> {
    let row_number = (row + 1).to_string();
    writer.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
    ))?;

    for (col, cell) in cells.iter().enumerate() {
        let reference = cell_ref(row, col as u32);
        match cell {
            CellValue::Empty => {}
            CellValue::Number(n) if n.is_finite() => {
                writer.write_event(Event::Start(
                    BytesStart::new("c").with_attributes([("r", reference.as_str())]),
                ))?;
                write_value(writer, &n.to_string())?;
                writer.write_event(Event::End(BytesEnd::new("c")))?;
            }
            CellValue::Boolean(b) => {
                writer.write_event(Event::Start(
                    BytesStart::new("c").with_attributes([("r", reference.as_str()), ("t", "b")]),
                ))?;
                write_value(writer, if *b { "1" } else { "0" })?;
                writer.write_event(Event::End(BytesEnd::new("c")))?;
            }
            // Text, error codes and non-finite numbers go out as inline strings
            other => {
                let text = match other {
                    CellValue::Text(s) => s.clone(),
                    CellValue::Error(e) => e.clone(),
                    CellValue::Number(n) => n.to_string(),
                    _ => String::new(),
                };
                write_inline_string(writer, &reference, &text)?;
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn write_value<W: Write>(writer: &mut Writer<W>, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    Ok(())
}

fn write_inline_string<W: Write>(writer: &mut Writer<W>, reference: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new("c").with_attributes([("r", reference), ("t", "inlineStr")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;
    writer.write_event(Event::Start(
        BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;
    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Excel-style reference for 0-based (row, col), e.g. (0, 27) -> "AB1"
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Convert column number to letter (0 -> A, 1 -> B, etc.)
fn col_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}
