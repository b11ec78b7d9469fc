//! Worksheet part patch: swap the style index on every existing cell of a
//! marked row. Values, formulas, cell types, dimensions, and every other
//! event in the stream are copied through verbatim; cells are never
//! created, so the patch cannot grow the sheet.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader as XmlReader, Writer as XmlWriter};

use crate::ooxml::attr_value;
use crate::MarkError;

/// Distinct style ids referenced by cells on the marked rows. Cells with no
/// `s` attribute use style 0. Rows are 1-based sheet row numbers.
pub fn collect_row_style_ids(
    xml: &str,
    part: &str,
    rows: &BTreeSet<u32>,
) -> Result<BTreeSet<u32>, MarkError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf: Vec<u8> = Vec::new();

    let mut out: BTreeSet<u32> = BTreeSet::new();
    let mut next_row: u32 = 1;
    let mut in_marked = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"row" => {
                    let number = row_number(&e, next_row);
                    next_row = number + 1;
                    in_marked = rows.contains(&number);
                }
                b"c" if in_marked => {
                    out.insert(style_id(&e));
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"row" {
                    in_marked = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Rewrite the worksheet, swapping `s` on cells of marked rows through the
/// style remap.
pub fn patch_sheet_rows(
    xml: &str,
    part: &str,
    rows: &BTreeSet<u32>,
    remap: &IndexMap<u32, u32>,
) -> Result<Vec<u8>, MarkError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut writer = XmlWriter::new(Vec::new());
    let mut buf: Vec<u8> = Vec::new();

    let mut next_row: u32 = 1;
    let mut in_marked = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                let event = match name.as_slice() {
                    b"row" => {
                        let number = row_number(&e, next_row);
                        next_row = number + 1;
                        in_marked = rows.contains(&number);
                        Event::Start(e.into_owned())
                    }
                    b"c" if in_marked => Event::Start(restyled(&e, part, remap)?),
                    _ => Event::Start(e.into_owned()),
                };
                write(&mut writer, part, event)?;
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_vec();
                let event = match name.as_slice() {
                    b"row" => {
                        // A self-closing row has no cells; track the number
                        // but nothing inside it can be marked.
                        let number = row_number(&e, next_row);
                        next_row = number + 1;
                        Event::Empty(e.into_owned())
                    }
                    b"c" if in_marked => Event::Empty(restyled(&e, part, remap)?),
                    _ => Event::Empty(e.into_owned()),
                };
                write(&mut writer, part, event)?;
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"row" {
                    in_marked = false;
                }
                write(&mut writer, part, Event::End(e.into_owned()))?;
            }
            Ok(Event::Text(e)) => write(&mut writer, part, Event::Text(e.into_owned()))?,
            Ok(Event::CData(e)) => write(&mut writer, part, Event::CData(e.into_owned()))?,
            Ok(Event::Comment(e)) => write(&mut writer, part, Event::Comment(e.into_owned()))?,
            Ok(Event::Decl(e)) => write(&mut writer, part, Event::Decl(e.into_owned()))?,
            Ok(Event::PI(e)) => write(&mut writer, part, Event::PI(e.into_owned()))?,
            Ok(Event::DocType(e)) => write(&mut writer, part, Event::DocType(e.into_owned()))?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml(part, e)),
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn write(writer: &mut XmlWriter<Vec<u8>>, part: &str, event: Event<'_>) -> Result<(), MarkError> {
    writer
        .write_event(event)
        .map_err(|e| MarkError::xml(part, e))
}

/// Row number from the `r` attribute, or the implicit successor of the
/// previous row when the attribute is absent.
fn row_number(e: &BytesStart<'_>, implicit: u32) -> u32 {
    attr_value(e, b"r")
        .and_then(|r| r.parse::<u32>().ok())
        .unwrap_or(implicit)
}

fn style_id(e: &BytesStart<'_>) -> u32 {
    attr_value(e, b"s")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

/// The cell element with its `s` attribute swapped through the remap; all
/// other attributes ride through unchanged.
fn restyled(
    e: &BytesStart<'_>,
    part: &str,
    remap: &IndexMap<u32, u32>,
) -> Result<BytesStart<'static>, MarkError> {
    let old = style_id(e);
    let new = remap.get(&old).copied().unwrap_or(old);
    let style = new.to_string();

    let mut out = BytesStart::new("c");
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| MarkError::xml(part, err))?;
        if attr.key.as_ref() == b"s" {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| MarkError::xml(part, err))?
            .into_owned();
        out.push_attribute((key.as_str(), value.as_str()));
    }
    out.push_attribute(("s", style.as_str()));
    Ok(out)
}
