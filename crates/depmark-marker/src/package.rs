use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::{ooxml, sheet_patch, styles, MarkError};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// Apply the marking fill to every existing cell of the given 1-based sheet
/// rows, returning a new package. Only the first worksheet part and
/// styles.xml are rewritten; every other entry is copied byte-for-byte with
/// its compression method, timestamp, and permissions preserved. With
/// nothing to mark the original bytes come back unchanged.
pub fn apply_marks(
    original: &[u8],
    rows: &BTreeSet<u32>,
    fill_rgb: &str,
) -> Result<Vec<u8>, MarkError> {
    if rows.is_empty() {
        return Ok(original.to_vec());
    }

    let mut zip = ZipArchive::new(Cursor::new(original))
        .map_err(|e| MarkError::Package(e.to_string()))?;

    let workbook_xml = ooxml::zip_read_to_string(&mut zip, WORKBOOK_PART)?;
    let rels_xml = ooxml::zip_read_to_string(&mut zip, WORKBOOK_RELS_PART)?;
    let sheets = ooxml::parse_workbook_sheets(&workbook_xml)?;
    let (sheet_name, rid) = sheets
        .first()
        .ok_or_else(|| MarkError::MissingPart("no sheets listed in workbook.xml".to_string()))?;
    let targets = ooxml::parse_relationship_targets(&rels_xml)?;
    let target = targets
        .get(rid)
        .ok_or_else(|| MarkError::MissingPart(format!("relationship {rid} for sheet '{sheet_name}'")))?;
    let sheet_part = ooxml::join_and_normalize("xl/", target);

    let sheet_xml = ooxml::zip_read_to_string(&mut zip, &sheet_part)?;
    let used = sheet_patch::collect_row_style_ids(&sheet_xml, &sheet_part, rows)?;
    if used.is_empty() {
        // The marked rows hold no cells at all; there is nothing to restyle.
        return Ok(original.to_vec());
    }

    let styles_xml = ooxml::zip_read_to_string(&mut zip, STYLES_PART)?;
    let (patched_styles, remap) = styles::patch_styles(&styles_xml, &used, fill_rgb)?;
    let patched_sheet = sheet_patch::patch_sheet_rows(&sheet_xml, &sheet_part, rows, &remap)?;
    drop(zip);

    tracing::debug!(
        sheet = %sheet_name,
        part = %sheet_part,
        rows = rows.len(),
        styles = remap.len(),
        "patching marked rows"
    );

    repackage(original, &sheet_part, &patched_sheet, &patched_styles)
}

/// Entry-by-entry rewrite of the package with the two patched parts
/// substituted in place.
fn repackage(
    original: &[u8],
    sheet_part: &str,
    patched_sheet: &[u8],
    patched_styles: &[u8],
) -> Result<Vec<u8>, MarkError> {
    let mut zip = ZipArchive::new(Cursor::new(original))
        .map_err(|e| MarkError::Package(e.to_string()))?;
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));

    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| MarkError::Package(format!("failed to read zip entry {i}: {e}")))?;
        let name = file.name().to_string();

        let mut opts = SimpleFileOptions::default().compression_method(file.compression());
        if let Some(modified) = file.last_modified() {
            opts = opts.last_modified_time(modified);
        }
        if let Some(mode) = file.unix_mode() {
            opts = opts.unix_permissions(mode);
        }

        if file.is_dir() {
            out.add_directory(name, opts)
                .map_err(|e| MarkError::Serialize(e.to_string()))?;
            continue;
        }

        let mut data: Vec<u8> = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| MarkError::Package(format!("failed to read {name}: {e}")))?;
        if name == sheet_part {
            data = patched_sheet.to_vec();
        } else if name == STYLES_PART {
            data = patched_styles.to_vec();
        }

        out.start_file(name, opts)
            .map_err(|e| MarkError::Serialize(e.to_string()))?;
        out.write_all(&data)
            .map_err(|e| MarkError::Serialize(e.to_string()))?;
    }

    let cursor = out
        .finish()
        .map_err(|e| MarkError::Serialize(e.to_string()))?;
    Ok(cursor.into_inner())
}
