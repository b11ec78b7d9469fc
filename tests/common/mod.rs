//! Minimal in-memory xlsx assembly for the integration suite: enough of a
//! package (content types, rels, workbook, styles, one worksheet with
//! inline strings) for the engine to read and patch, small enough to
//! assert against byte-for-byte.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub struct WorkbookBuilder {
    rows: Vec<Vec<String>>,
    raw_rows: Vec<String>,
    vba: Option<Vec<u8>>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            raw_rows: Vec::new(),
            vba: None,
        }
    }

    /// Append a row of inline-string cells.
    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Append raw `<row>` XML after the generated rows (for formula cells
    /// and other shapes the string helper cannot express). The caller owns
    /// row-number consistency.
    pub fn raw_sheet_row(mut self, xml: &str) -> Self {
        self.raw_rows.push(xml.to_string());
        self
    }

    /// Attach a fake macro payload as `xl/vbaProject.bin`.
    pub fn vba(mut self, payload: &[u8]) -> Self {
        self.vba = Some(payload.to_vec());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();

        let mut put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| {
            zip.start_file(name, opts).unwrap();
            zip.write_all(data).unwrap();
        };

        put(&mut zip, "[Content_Types].xml", self.content_types().as_bytes());
        put(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes());
        put(&mut zip, "xl/workbook.xml", WORKBOOK.as_bytes());
        put(&mut zip, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes());
        put(&mut zip, "xl/styles.xml", STYLES.as_bytes());
        put(&mut zip, "xl/worksheets/sheet1.xml", self.sheet_xml().as_bytes());
        if let Some(vba) = &self.vba {
            put(&mut zip, "xl/vbaProject.bin", vba);
        }

        zip.finish().unwrap().into_inner()
    }

    fn content_types(&self) -> String {
        let mut overrides = String::new();
        if self.vba.is_some() {
            overrides.push_str(
                r#"<Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>"#,
            );
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                "{}",
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
                r#"</Types>"#,
            ),
            overrides
        )
    }

    fn sheet_xml(&self) -> String {
        let mut out = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<sheetData>"#,
        ));
        for (r, cells) in self.rows.iter().enumerate() {
            let row_num = r + 1;
            out.push_str(&format!(r#"<row r="{row_num}">"#));
            for (c, value) in cells.iter().enumerate() {
                out.push_str(&format!(
                    r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    col_letter(c),
                    row_num,
                    escape(value.as_str())
                ));
            }
            out.push_str("</row>");
        }
        for raw in &self.raw_rows {
            out.push_str(raw);
        }
        out.push_str("</sheetData></worksheet>");
        out
    }
}

pub fn col_letter(mut idx: usize) -> String {
    let mut out = String::new();
    loop {
        out.insert(0, (b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    out
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>"#,
    r#"</workbook>"#,
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#,
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs>"#,
    r#"</styleSheet>"#,
);

/// Names and bytes of every entry in a package, in archive order.
pub fn entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut data).unwrap();
        out.push((file.name().to_string(), data));
    }
    out
}

/// One named part of a package as a UTF-8 string.
pub fn part(bytes: &[u8], name: &str) -> String {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = zip.by_name(name).unwrap();
    let mut out = String::new();
    std::io::Read::read_to_string(&mut file, &mut out).unwrap();
    out
}
