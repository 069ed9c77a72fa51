//! Minimal Office Open XML writers: a slide deck of full-bleed page images
//! and a workbook of plain tables.
//!
//! Only the parts PowerPoint, Excel and LibreOffice require are emitted.
//! Every part is written as `quick_xml` events. Both writers are blocking.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::CodecError;

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Namespaces declared on every PresentationML root element
const PML_NAMESPACES: [(&str, &str); 3] = [
    ("xmlns:a", NS_DRAWING),
    ("xmlns:r", NS_DOC_RELS),
    ("xmlns:p", NS_PRESENTATION),
];

const COLOR_MAP: [(&str, &str); 12] = [
    ("bg1", "lt1"),
    ("tx1", "dk1"),
    ("bg2", "lt2"),
    ("tx2", "dk2"),
    ("accent1", "accent1"),
    ("accent2", "accent2"),
    ("accent3", "accent3"),
    ("accent4", "accent4"),
    ("accent5", "accent5"),
    ("accent6", "accent6"),
    ("hlink", "hlink"),
    ("folHlink", "folHlink"),
];

/// 4:3 slide, 10in x 7.5in in EMU
const SLIDE_CX: u64 = 9_144_000;
const SLIDE_CY: u64 = 6_858_000;

/// A named worksheet of rows
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// One XML part being written into memory, declaration first
struct XmlPart {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlPart {
    fn new() -> Result<Self, CodecError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { writer })
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut elem = BytesStart::new(name);
        for &attr in attrs {
            elem.push_attribute(attr);
        }
        elem
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        self.writer.write_event(Event::Start(Self::element(name, attrs)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        self.writer.write_event(Event::Empty(Self::element(name, attrs)))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), CodecError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        value: &str,
    ) -> Result<(), CodecError> {
        self.open(name, attrs)?;
        self.writer.write_event(Event::Text(BytesText::new(value)))?;
        self.close(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

struct Package {
    zip: ZipWriter<BufWriter<File>>,
    xml: SimpleFileOptions,
    stored: SimpleFileOptions,
}

impl Package {
    fn create(dest: &Path) -> Result<Self, CodecError> {
        let file = File::create(dest)?;
        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            xml: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            stored: SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        })
    }

    fn part(&mut self, name: &str, body: Vec<u8>) -> Result<(), CodecError> {
        self.zip.start_file(name, self.xml)?;
        self.zip.write_all(&body)?;
        Ok(())
    }

    fn binary(&mut self, name: &str, source: &Path) -> Result<(), CodecError> {
        self.zip.start_file(name, self.stored)?;
        std::io::copy(&mut File::open(source)?, &mut self.zip)?;
        Ok(())
    }

    fn finish(self) -> Result<(), CodecError> {
        let mut writer = self.zip.finish()?;
        writer.flush()?;
        Ok(())
    }
}

type Rel = (String, &'static str, String);

fn rel(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Rel {
    (id.into(), kind, target.into())
}

fn relationships(rels: &[Rel]) -> Result<Vec<u8>, CodecError> {
    let mut xml = XmlPart::new()?;
    xml.open("Relationships", &[("xmlns", NS_PACKAGE_RELS)])?;
    for (id, kind, target) in rels {
        let kind = format!("{NS_DOC_RELS}/{kind}");
        xml.empty(
            "Relationship",
            &[("Id", id.as_str()), ("Type", kind.as_str()), ("Target", target.as_str())],
        )?;
    }
    xml.close("Relationships")?;
    Ok(xml.finish())
}

/// `[Content_Types].xml` from extension defaults and part overrides
fn content_types(
    defaults: &[(String, String)],
    overrides: &[(String, &str)],
) -> Result<Vec<u8>, CodecError> {
    let mut xml = XmlPart::new()?;
    xml.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (ext, content_type) in defaults {
        xml.empty(
            "Default",
            &[("Extension", ext.as_str()), ("ContentType", content_type.as_str())],
        )?;
    }
    for (part, content_type) in overrides {
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", *content_type)])?;
    }
    xml.close("Types")?;
    Ok(xml.finish())
}

/// Opens `p:spTree` with its mandatory group properties; the caller closes it.
fn open_shape_tree(xml: &mut XmlPart) -> Result<(), CodecError> {
    xml.open("p:spTree", &[])?;
    xml.open("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.close("p:nvGrpSpPr")?;
    xml.empty("p:grpSpPr", &[])
}

fn master_color_mapping(xml: &mut XmlPart) -> Result<(), CodecError> {
    xml.open("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.close("p:clrMapOvr")
}

fn media_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "png".to_string())
}

/// Build a `.pptx` with one slide per image, each stretched over the whole slide.
pub fn write_slide_deck(images: &[PathBuf], dest: &Path) -> Result<(), CodecError> {
    let mut pkg = Package::create(dest)?;

    let mut extensions: Vec<String> = images.iter().map(|p| media_extension(p)).collect();
    extensions.sort();
    extensions.dedup();
    let defaults: Vec<(String, String)> = extensions
        .into_iter()
        .map(|ext| {
            let content_type = mime_guess::from_ext(&ext).first_or_octet_stream().to_string();
            (ext, content_type)
        })
        .collect();
    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
    ];
    for n in 1..=images.len() {
        overrides.push((format!("/ppt/slides/slide{n}.xml"), CT_SLIDE));
    }
    pkg.part("[Content_Types].xml", content_types(&defaults, &overrides)?)?;

    pkg.part(
        "_rels/.rels",
        relationships(&[rel("rId1", "officeDocument", "ppt/presentation.xml")])?,
    )?;

    pkg.part("ppt/presentation.xml", presentation(images.len())?)?;

    // rId1 master, rId2 theme, rId3.. slides
    let mut presentation_rels = vec![
        rel("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        rel("rId2", "theme", "theme/theme1.xml"),
    ];
    for n in 1..=images.len() {
        presentation_rels.push(rel(format!("rId{}", n + 2), "slide", format!("slides/slide{n}.xml")));
    }
    pkg.part("ppt/_rels/presentation.xml.rels", relationships(&presentation_rels)?)?;

    pkg.part("ppt/slideMasters/slideMaster1.xml", slide_master()?)?;
    pkg.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships(&[
            rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            rel("rId2", "theme", "../theme/theme1.xml"),
        ])?,
    )?;

    pkg.part("ppt/slideLayouts/slideLayout1.xml", blank_layout()?)?;
    pkg.part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships(&[rel("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])?,
    )?;

    pkg.part("ppt/theme/theme1.xml", theme()?)?;

    for (i, image) in images.iter().enumerate() {
        let n = i + 1;
        let media = format!("image{n}.{}", media_extension(image));

        pkg.part(&format!("ppt/slides/slide{n}.xml"), picture_slide(n)?)?;
        pkg.part(
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            relationships(&[
                rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                rel("rId2", "image", format!("../media/{media}")),
            ])?,
        )?;
        pkg.binary(&format!("ppt/media/{media}"), image)?;
    }

    pkg.finish()
}

fn presentation(slides: usize) -> Result<Vec<u8>, CodecError> {
    let (cx, cy) = (SLIDE_CX.to_string(), SLIDE_CY.to_string());

    let mut xml = XmlPart::new()?;
    xml.open("p:presentation", &PML_NAMESPACES)?;
    xml.open("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.close("p:sldMasterIdLst")?;
    if slides > 0 {
        xml.open("p:sldIdLst", &[])?;
        for n in 0..slides {
            let id = (256 + n).to_string();
            let rel_id = format!("rId{}", n + 3);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel_id.as_str())])?;
        }
        xml.close("p:sldIdLst")?;
    }
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str()), ("type", "screen4x3")])?;
    xml.empty("p:notesSz", &[("cx", cy.as_str()), ("cy", cx.as_str())])?;
    xml.close("p:presentation")?;
    Ok(xml.finish())
}

fn slide_master() -> Result<Vec<u8>, CodecError> {
    let mut xml = XmlPart::new()?;
    xml.open("p:sldMaster", &PML_NAMESPACES)?;
    xml.open("p:cSld", &[])?;
    open_shape_tree(&mut xml)?;
    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    xml.empty("p:clrMap", &COLOR_MAP)?;
    xml.open("p:sldLayoutIdLst", &[])?;
    xml.empty("p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rId1")])?;
    xml.close("p:sldLayoutIdLst")?;
    xml.close("p:sldMaster")?;
    Ok(xml.finish())
}

fn blank_layout() -> Result<Vec<u8>, CodecError> {
    let attrs = [&PML_NAMESPACES[..], &[("type", "blank"), ("preserve", "1")][..]].concat();

    let mut xml = XmlPart::new()?;
    xml.open("p:sldLayout", &attrs)?;
    xml.open("p:cSld", &[("name", "Blank")])?;
    open_shape_tree(&mut xml)?;
    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    master_color_mapping(&mut xml)?;
    xml.close("p:sldLayout")?;
    Ok(xml.finish())
}

/// Slide `n`: one picture (relationship `rId2`) covering the whole slide
fn picture_slide(n: usize) -> Result<Vec<u8>, CodecError> {
    let name = format!("Page {n}");
    let (cx, cy) = (SLIDE_CX.to_string(), SLIDE_CY.to_string());

    let mut xml = XmlPart::new()?;
    xml.open("p:sld", &PML_NAMESPACES)?;
    xml.open("p:cSld", &[])?;
    open_shape_tree(&mut xml)?;

    xml.open("p:pic", &[])?;
    xml.open("p:nvPicPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "2"), ("name", name.as_str())])?;
    xml.open("p:cNvPicPr", &[])?;
    xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
    xml.close("p:cNvPicPr")?;
    xml.empty("p:nvPr", &[])?;
    xml.close("p:nvPicPr")?;

    xml.open("p:blipFill", &[])?;
    xml.empty("a:blip", &[("r:embed", "rId2")])?;
    xml.open("a:stretch", &[])?;
    xml.empty("a:fillRect", &[])?;
    xml.close("a:stretch")?;
    xml.close("p:blipFill")?;

    xml.open("p:spPr", &[])?;
    xml.open("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.close("a:xfrm")?;
    xml.open("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.close("a:prstGeom")?;
    xml.close("p:spPr")?;
    xml.close("p:pic")?;

    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    master_color_mapping(&mut xml)?;
    xml.close("p:sld")?;
    Ok(xml.finish())
}

fn theme() -> Result<Vec<u8>, CodecError> {
    let scheme = [
        ("a:dk2", "1F497D"),
        ("a:lt2", "EEECE1"),
        ("a:accent1", "4F81BD"),
        ("a:accent2", "C0504D"),
        ("a:accent3", "9BBB59"),
        ("a:accent4", "8064A2"),
        ("a:accent5", "4BACC6"),
        ("a:accent6", "F79646"),
        ("a:hlink", "0000FF"),
        ("a:folHlink", "800080"),
    ];

    let mut xml = XmlPart::new()?;
    xml.open("a:theme", &[("xmlns:a", NS_DRAWING), ("name", "Office Theme")])?;
    xml.open("a:themeElements", &[])?;

    xml.open("a:clrScheme", &[("name", "Office")])?;
    for (slot, value, last) in [("a:dk1", "windowText", "000000"), ("a:lt1", "window", "FFFFFF")] {
        xml.open(slot, &[])?;
        xml.empty("a:sysClr", &[("val", value), ("lastClr", last)])?;
        xml.close(slot)?;
    }
    for (slot, rgb) in scheme {
        xml.open(slot, &[])?;
        xml.empty("a:srgbClr", &[("val", rgb)])?;
        xml.close(slot)?;
    }
    xml.close("a:clrScheme")?;

    xml.open("a:fontScheme", &[("name", "Office")])?;
    for font in ["a:majorFont", "a:minorFont"] {
        xml.open(font, &[])?;
        xml.empty("a:latin", &[("typeface", "Calibri")])?;
        xml.empty("a:ea", &[("typeface", "")])?;
        xml.empty("a:cs", &[("typeface", "")])?;
        xml.close(font)?;
    }
    xml.close("a:fontScheme")?;

    // Each style list needs three entries
    xml.open("a:fmtScheme", &[("name", "Office")])?;
    xml.open("a:fillStyleLst", &[])?;
    for _ in 0..3 {
        placeholder_fill(&mut xml)?;
    }
    xml.close("a:fillStyleLst")?;
    xml.open("a:lnStyleLst", &[])?;
    for _ in 0..3 {
        xml.open("a:ln", &[("w", "9525")])?;
        placeholder_fill(&mut xml)?;
        xml.close("a:ln")?;
    }
    xml.close("a:lnStyleLst")?;
    xml.open("a:effectStyleLst", &[])?;
    for _ in 0..3 {
        xml.open("a:effectStyle", &[])?;
        xml.empty("a:effectLst", &[])?;
        xml.close("a:effectStyle")?;
    }
    xml.close("a:effectStyleLst")?;
    xml.open("a:bgFillStyleLst", &[])?;
    for _ in 0..3 {
        placeholder_fill(&mut xml)?;
    }
    xml.close("a:bgFillStyleLst")?;
    xml.close("a:fmtScheme")?;

    xml.close("a:themeElements")?;
    xml.close("a:theme")?;
    Ok(xml.finish())
}

fn placeholder_fill(xml: &mut XmlPart) -> Result<(), CodecError> {
    xml.open("a:solidFill", &[])?;
    xml.empty("a:schemeClr", &[("val", "phClr")])?;
    xml.close("a:solidFill")
}

/// Build an `.xlsx` with one worksheet per sheet, in order. Cells that parse
/// as finite numbers are written as numbers, everything else as inline text.
pub fn write_workbook(sheets: &[Sheet], dest: &Path) -> Result<(), CodecError> {
    let mut pkg = Package::create(dest)?;

    let mut overrides = vec![("/xl/workbook.xml".to_string(), CT_WORKBOOK)];
    for n in 1..=sheets.len() {
        overrides.push((format!("/xl/worksheets/sheet{n}.xml"), CT_WORKSHEET));
    }
    pkg.part("[Content_Types].xml", content_types(&[], &overrides)?)?;

    pkg.part(
        "_rels/.rels",
        relationships(&[rel("rId1", "officeDocument", "xl/workbook.xml")])?,
    )?;

    let workbook_rels: Vec<Rel> = (1..=sheets.len())
        .map(|n| rel(format!("rId{n}"), "worksheet", format!("worksheets/sheet{n}.xml")))
        .collect();
    pkg.part("xl/workbook.xml", workbook(sheets)?)?;
    pkg.part("xl/_rels/workbook.xml.rels", relationships(&workbook_rels)?)?;

    for (i, sheet) in sheets.iter().enumerate() {
        pkg.part(&format!("xl/worksheets/sheet{}.xml", i + 1), worksheet(&sheet.rows)?)?;
    }

    pkg.finish()
}

fn workbook(sheets: &[Sheet]) -> Result<Vec<u8>, CodecError> {
    let mut xml = XmlPart::new()?;
    xml.open("workbook", &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_DOC_RELS)])?;
    xml.open("sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let sheet_id = (i + 1).to_string();
        let rel_id = format!("rId{sheet_id}");
        xml.empty(
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", rel_id.as_str()),
            ],
        )?;
    }
    xml.close("sheets")?;
    xml.close("workbook")?;
    Ok(xml.finish())
}

fn worksheet(rows: &[Vec<String>]) -> Result<Vec<u8>, CodecError> {
    let mut xml = XmlPart::new()?;
    xml.open("worksheet", &[("xmlns", NS_SPREADSHEET)])?;
    xml.open("sheetData", &[])?;
    for (r, row) in rows.iter().enumerate() {
        let row_ref = (r + 1).to_string();
        xml.open("row", &[("r", row_ref.as_str())])?;
        for (c, value) in row.iter().enumerate() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{row_ref}", column_name(c));
            match value.parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    xml.open("c", &[("r", cell_ref.as_str())])?;
                    xml.text_element("v", &[], value)?;
                }
                _ => {
                    // XML 1.0 cannot carry most control characters
                    let text: String = value
                        .chars()
                        .filter(|&ch| ch == '\t' || ch == '\n' || ch == '\r' || ch >= ' ')
                        .collect();
                    xml.open("c", &[("r", cell_ref.as_str()), ("t", "inlineStr")])?;
                    xml.open("is", &[])?;
                    xml.text_element("t", &[("xml:space", "preserve")], &text)?;
                    xml.close("is")?;
                }
            }
            xml.close("c")?;
        }
        xml.close("row")?;
    }
    xml.close("sheetData")?;
    xml.close("worksheet")?;
    Ok(xml.finish())
}

/// Spreadsheet column letters for a zero-based index (0 → A, 26 → AA).
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> String {
        let mut body = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_slide_deck_has_one_slide_per_image() {
        let temp = TempDir::new().unwrap();
        let images: Vec<PathBuf> = (1..=3)
            .map(|n| {
                let path = temp.path().join(format!("slide-{n}.png"));
                std::fs::write(&path, format!("png-{n}")).unwrap();
                path
            })
            .collect();
        let dest = temp.path().join("converted.pptx");

        write_slide_deck(&images, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        for n in 1..=3 {
            assert!(archive.by_name(&format!("ppt/slides/slide{n}.xml")).is_ok());
            let media = read_entry(&mut archive, &format!("ppt/media/image{n}.png"));
            assert_eq!(media, format!("png-{n}"));
        }
        assert!(archive.by_name("ppt/slides/slide4.xml").is_err());

        let presentation = read_entry(&mut archive, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 3);

        let types = read_entry(&mut archive, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="png" ContentType="image/png""#));
    }

    #[test]
    fn test_workbook_sheets_and_cells() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("converted.xlsx");
        let sheets = vec![
            Sheet {
                name: "Table_1".to_string(),
                rows: vec![
                    vec!["Item".to_string(), "Price".to_string()],
                    vec!["Nuts & Bolts".to_string(), "4.50".to_string()],
                ],
            },
            Sheet {
                name: "Table_2".to_string(),
                rows: vec![vec!["<none>".to_string(), String::new(), "x".to_string()]],
            },
        ];

        write_workbook(&sheets, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let workbook = read_entry(&mut archive, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="Table_1" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook.contains(r#"<sheet name="Table_2" sheetId="2" r:id="rId2"/>"#));

        let first = read_entry(&mut archive, "xl/worksheets/sheet1.xml");
        assert!(first.contains("Nuts &amp; Bolts"));
        assert!(first.contains(r#"<c r="B2"><v>4.50</v></c>"#));

        let second = read_entry(&mut archive, "xl/worksheets/sheet2.xml");
        assert!(second.contains("&lt;none&gt;"));
        assert!(second.contains(r#"<c r="C1" t="inlineStr">"#));
        assert!(!second.contains(r#"r="B1""#));
    }

    #[test]
    fn test_sheet_names_are_escaped_in_attributes() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("converted.xlsx");
        let sheets = vec![Sheet {
            name: r#"R&D "Q1""#.to_string(),
            rows: vec![vec!["a\u{1}b".to_string()]],
        }];

        write_workbook(&sheets, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let workbook = read_entry(&mut archive, "xl/workbook.xml");
        assert!(workbook.starts_with(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook "#
        ));
        assert!(workbook.contains(r#"name="R&amp;D &quot;Q1&quot;""#));

        let sheet = read_entry(&mut archive, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<t xml:space="preserve">ab</t>"#));
    }
}
