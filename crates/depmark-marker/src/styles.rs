//! styles.xml patch: append one solid marking fill and derive one new
//! `cellXfs` entry per distinct style id used on marked rows. A derived xf
//! keeps every attribute and child of the original (number format, font,
//! borders, alignment, protection) and swaps only the fill, so marked cells
//! change appearance in exactly one facet.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader as XmlReader, Writer as XmlWriter};

use crate::MarkError;

const PART: &str = "xl/styles.xml";

/// A `cellXfs` entry captured verbatim: attributes plus child events.
struct XfEntry {
    attrs: Vec<(String, String)>,
    children: Vec<Event<'static>>,
}

/// Rewrite styles.xml for the given set of used style ids. Returns the
/// patched part and the old-id -> derived-id map, iterated in the order the
/// derived xfs were appended so the rewrite is deterministic.
pub fn patch_styles(
    xml: &str,
    used: &BTreeSet<u32>,
    fill_rgb: &str,
) -> Result<(Vec<u8>, IndexMap<u32, u32>), MarkError> {
    let (fill_count, xfs) = scan(xml)?;

    let mut remap: IndexMap<u32, u32> = IndexMap::new();
    for (i, &old) in used.iter().enumerate() {
        if old as usize >= xfs.len() {
            return Err(MarkError::xml(
                PART,
                format!("cell style id {old} out of range ({} cellXfs entries)", xfs.len()),
            ));
        }
        remap.insert(old, (xfs.len() + i) as u32);
    }

    let patched = rewrite(xml, fill_count, &xfs, &remap, &argb(fill_rgb))?;
    Ok((patched, remap))
}

/// OOXML wants an 8-digit ARGB code; accept a bare RGB and assume opaque.
fn argb(rgb: &str) -> String {
    if rgb.len() == 6 {
        format!("FF{}", rgb.to_ascii_uppercase())
    } else {
        rgb.to_ascii_uppercase()
    }
}

fn attrs_of(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, MarkError> {
    let mut out = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| MarkError::xml(PART, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| MarkError::xml(PART, err))?
            .into_owned();
        out.push((key, value));
    }
    Ok(out)
}

/// First pass: count direct `<fill>` children of `<fills>` and capture
/// every `<xf>` entry of `<cellXfs>` (not `cellStyleXfs`).
fn scan(xml: &str) -> Result<(usize, Vec<XfEntry>), MarkError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf: Vec<u8> = Vec::new();

    let mut fill_count = 0usize;
    let mut xfs: Vec<XfEntry> = Vec::new();
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut current: Option<XfEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                // Own the name so the element itself stays movable below.
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"fills" => in_fills = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"fill" if in_fills => fill_count += 1,
                    b"xf" if in_cell_xfs => {
                        current = Some(XfEntry {
                            attrs: attrs_of(&e)?,
                            children: Vec::new(),
                        });
                    }
                    _ => {
                        if let Some(cur) = current.as_mut() {
                            cur.children.push(Event::Start(e.into_owned()));
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"fill" if in_fills => fill_count += 1,
                    b"xf" if in_cell_xfs && current.is_none() => {
                        xfs.push(XfEntry {
                            attrs: attrs_of(&e)?,
                            children: Vec::new(),
                        });
                    }
                    _ => {
                        if let Some(cur) = current.as_mut() {
                            cur.children.push(Event::Empty(e.into_owned()));
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"fills" => in_fills = false,
                    b"cellXfs" => in_cell_xfs = false,
                    b"xf" => {
                        if let Some(entry) = current.take() {
                            xfs.push(entry);
                        }
                    }
                    _ => {
                        if let Some(cur) = current.as_mut() {
                            cur.children.push(Event::End(e.into_owned()));
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(cur) = current.as_mut() {
                    cur.children.push(Event::Text(t.into_owned()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml(PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((fill_count, xfs))
}

/// Second pass: copy the document through, bumping the two `count`
/// attributes and injecting the new fill and the derived xfs just before
/// their containers close.
fn rewrite(
    xml: &str,
    fill_count: usize,
    xfs: &[XfEntry],
    remap: &IndexMap<u32, u32>,
    fill_argb: &str,
) -> Result<Vec<u8>, MarkError> {
    let new_fill_id = fill_count;
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut writer = XmlWriter::new(Vec::new());
    let mut buf: Vec<u8> = Vec::new();

    let mut fill_injected = false;
    let mut xfs_injected = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                let event = match name.as_slice() {
                    b"fills" => Event::Start(with_count(&e, fill_count + 1)?),
                    b"cellXfs" => Event::Start(with_count(&e, xfs.len() + remap.len())?),
                    _ => Event::Start(e.into_owned()),
                };
                write(&mut writer, event)?;
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"fills" => {
                        write_marking_fill(&mut writer, fill_argb)?;
                        fill_injected = true;
                    }
                    b"cellXfs" => {
                        for &old in remap.keys() {
                            write_derived_xf(&mut writer, &xfs[old as usize], new_fill_id)?;
                        }
                        xfs_injected = true;
                    }
                    _ => {}
                }
                write(&mut writer, Event::End(e.into_owned()))?;
            }
            Ok(Event::Empty(e)) => write(&mut writer, Event::Empty(e.into_owned()))?,
            Ok(Event::Text(e)) => write(&mut writer, Event::Text(e.into_owned()))?,
            Ok(Event::CData(e)) => write(&mut writer, Event::CData(e.into_owned()))?,
            Ok(Event::Comment(e)) => write(&mut writer, Event::Comment(e.into_owned()))?,
            Ok(Event::Decl(e)) => write(&mut writer, Event::Decl(e.into_owned()))?,
            Ok(Event::PI(e)) => write(&mut writer, Event::PI(e.into_owned()))?,
            Ok(Event::DocType(e)) => write(&mut writer, Event::DocType(e.into_owned()))?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(MarkError::xml(PART, e)),
        }
        buf.clear();
    }

    if !fill_injected {
        return Err(MarkError::xml(PART, "no <fills> element found"));
    }
    if !xfs_injected {
        return Err(MarkError::xml(PART, "no <cellXfs> element found"));
    }

    Ok(writer.into_inner())
}

fn write(writer: &mut XmlWriter<Vec<u8>>, event: Event<'_>) -> Result<(), MarkError> {
    writer
        .write_event(event)
        .map_err(|e| MarkError::xml(PART, e))
}

fn with_count(e: &BytesStart<'_>, count: usize) -> Result<BytesStart<'static>, MarkError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for (key, value) in attrs_of(e)? {
        if key != "count" {
            out.push_attribute((key.as_str(), value.as_str()));
        }
    }
    out.push_attribute(("count", count.to_string().as_str()));
    Ok(out)
}

fn write_marking_fill(writer: &mut XmlWriter<Vec<u8>>, fill_argb: &str) -> Result<(), MarkError> {
    write(writer, Event::Start(BytesStart::new("fill")))?;
    let mut pattern = BytesStart::new("patternFill");
    pattern.push_attribute(("patternType", "solid"));
    write(writer, Event::Start(pattern))?;
    let mut fg = BytesStart::new("fgColor");
    fg.push_attribute(("rgb", fill_argb));
    write(writer, Event::Empty(fg))?;
    let mut bg = BytesStart::new("bgColor");
    bg.push_attribute(("indexed", "64"));
    write(writer, Event::Empty(bg))?;
    write(writer, Event::End(BytesEnd::new("patternFill")))?;
    write(writer, Event::End(BytesEnd::new("fill")))
}

fn write_derived_xf(
    writer: &mut XmlWriter<Vec<u8>>,
    entry: &XfEntry,
    fill_id: usize,
) -> Result<(), MarkError> {
    let fill_id = fill_id.to_string();
    let mut xf = BytesStart::new("xf");
    let mut saw_fill = false;
    let mut saw_apply = false;
    for (key, value) in &entry.attrs {
        match key.as_str() {
            "fillId" => {
                xf.push_attribute(("fillId", fill_id.as_str()));
                saw_fill = true;
            }
            "applyFill" => {
                xf.push_attribute(("applyFill", "1"));
                saw_apply = true;
            }
            _ => xf.push_attribute((key.as_str(), value.as_str())),
        }
    }
    if !saw_fill {
        xf.push_attribute(("fillId", fill_id.as_str()));
    }
    if !saw_apply {
        xf.push_attribute(("applyFill", "1"));
    }

    if entry.children.is_empty() {
        write(writer, Event::Empty(xf))
    } else {
        write(writer, Event::Start(xf))?;
        for child in &entry.children {
            write(writer, child.clone())?;
        }
        write(writer, Event::End(BytesEnd::new("xf")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"><alignment horizontal="center"/></xf></cellXfs>
</styleSheet>"#;

    fn ids(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn appends_fill_and_derived_xfs() {
        let (out, remap) = patch_styles(STYLES, &ids(&[0, 1]), "FFFF00").unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<fills count="3">"#));
        assert!(out.contains(r#"<fgColor rgb="FFFFFF00"/>"#));
        assert!(out.contains(r#"<cellXfs count="4">"#));
        // Derived from style 0: fill swapped to the appended fill (id 2).
        assert!(out.contains(r#"fillId="2""#));
        assert!(out.contains(r#"applyFill="1""#));
        assert_eq!(remap.get(&0), Some(&2));
        assert_eq!(remap.get(&1), Some(&3));
    }

    #[test]
    fn derived_xf_keeps_children_and_other_attrs() {
        let (out, _) = patch_styles(STYLES, &ids(&[1]), "FFFF00").unwrap();
        let out = String::from_utf8(out).unwrap();
        // The date-formatted xf is cloned with its alignment child and
        // number format intact, only the fill differs.
        let derived = out.rfind(r#"<xf numFmtId="14""#).unwrap();
        let tail = &out[derived..];
        assert!(tail.contains(r#"applyNumberFormat="1""#));
        assert!(tail.contains(r#"<alignment horizontal="center"/>"#));
        assert!(tail.contains(r#"fillId="2""#));
    }

    #[test]
    fn untouched_sections_survive_verbatim() {
        let (out, _) = patch_styles(STYLES, &ids(&[0]), "FFFF00").unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"<fonts count="1">"#));
        assert!(out.contains(r#"<cellStyleXfs count="1">"#));
        assert!(out.contains(r#"<patternFill patternType="gray125"/>"#));
    }

    #[test]
    fn out_of_range_style_id_is_an_error() {
        let err = patch_styles(STYLES, &ids(&[9]), "FFFF00").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn missing_cell_xfs_is_an_error() {
        let xml = r#"<styleSheet><fills count="0"></fills></styleSheet>"#;
        let err = patch_styles(xml, &ids(&[0]), "FFFF00").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
