//! Small OOXML plumbing shared by the patchers: attribute access, the
//! workbook sheet list, relationship target maps, and part path joining.

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::ZipArchive;

use crate::MarkError;

pub fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    for attr in e.attributes().with_checks(false) {
        let Ok(attr) = attr else { continue };
        if attr.key.as_ref() == name {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

pub fn zip_read_to_string<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, MarkError> {
    let mut file = zip
        .by_name(name)
        .map_err(|_| MarkError::MissingPart(name.to_string()))?;
    let mut out = String::new();
    file.read_to_string(&mut out)
        .map_err(|e| MarkError::Package(format!("failed to read {name}: {e}")))?;
    Ok(out)
}

/// Sheets from workbook.xml as (name, relationship id), in workbook order.
/// The first entry is the sheet the engine operates on.
pub fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, MarkError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf: Vec<u8> = Vec::new();
    let mut out: Vec<(String, String)> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"sheet" {
                    let name = attr_value(&e, b"name").unwrap_or_default();
                    if let Some(rid) = attr_value(&e, b"r:id") {
                        out.push((name, rid));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml("xl/workbook.xml", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Relationship id -> target map from a *.rels part.
pub fn parse_relationship_targets(xml: &str) -> Result<HashMap<String, String>, MarkError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf: Vec<u8> = Vec::new();
    let mut out: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                    {
                        out.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml("workbook rels", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Join a relationship target onto a base directory inside the package,
/// resolving `..` segments. Absolute targets (leading `/`) are taken as-is.
pub fn join_and_normalize(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}
