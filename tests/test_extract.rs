//! Extraction through the public dispatch, on real (in-memory) OOXML packages.

use std::io::{Cursor, Write};

use doc_chat::extract::{self, ExtractError, Upload};
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in parts {
        zw.start_file(*name, opts).unwrap();
        zw.write_all(body.as_bytes()).unwrap();
    }
    zw.finish().unwrap().into_inner()
}

const P_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

fn slide(text: &str) -> String {
    format!(
        r#"<p:sld {P_NS}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
    )
}

#[test]
fn docx_body_then_table() {
    let cell = |text: &str| TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
    let docx = Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Quarterly report")))
        .add_table(Table::new(vec![
            TableRow::new(vec![cell("Region"), cell("Sales")]),
            TableRow::new(vec![cell("North"), cell("42")]),
        ]));
    let mut buf = Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();

    let text = extract::extract(&Upload::new("Report.DOCX", buf.into_inner())).unwrap();
    assert_eq!(text, "Quarterly report\nRegion\tSales\t\nNorth\t42\t\n");
}

#[test]
fn docx_without_document_part_fails() {
    let bytes = package(&[("word/styles.xml", "<w:styles/>")]);
    let err = extract::extract(&Upload::new("empty.docx", bytes)).unwrap_err();
    assert!(matches!(err, ExtractError::Docx(_)));
}

#[test]
fn pptx_slides_in_numeric_order() {
    let s1 = slide("first");
    let s2 = slide("second");
    let s10 = slide("tenth");
    let bytes = package(&[
        ("ppt/slides/slide10.xml", &s10),
        ("ppt/slides/slide2.xml", &s2),
        ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ("ppt/slides/slide1.xml", &s1),
    ]);
    let text = extract::extract(&Upload::new("deck.pptx", bytes)).unwrap();
    assert_eq!(text, "first\nsecond\ntenth\n");
}

#[test]
fn pptx_follows_deck_order_over_file_names() {
    let presentation = format!(
        r#"<p:presentation {P_NS} xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#
    );
    let rels = concat!(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>"#,
        r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>"#,
        r#"</Relationships>"#,
    );
    let s1 = slide("now second");
    let s2 = slide("now first");
    let bytes = package(&[
        ("ppt/presentation.xml", &presentation),
        ("ppt/_rels/presentation.xml.rels", rels),
        ("ppt/slides/slide1.xml", &s1),
        ("ppt/slides/slide2.xml", &s2),
    ]);
    let text = extract::extract(&Upload::new("moved.pptx", bytes)).unwrap();
    assert_eq!(text, "now first\nnow second\n");
}

#[test]
fn pptx_with_no_slides_is_blank() {
    let bytes = package(&[("ppt/presentation.xml", "<p:presentation/>")]);
    let text = extract::extract(&Upload::new("blank.pptx", bytes)).unwrap();
    assert!(text.trim().is_empty());
}

#[test]
fn malformed_slide_xml_is_pptx_error() {
    let bytes = package(&[("ppt/slides/slide1.xml", "<p:sld><p:cSld></p:sld>")]);
    let err = extract::extract(&Upload::new("bad.pptx", bytes)).unwrap_err();
    assert!(matches!(err, ExtractError::Pptx(_)));
}

// ── spreadsheets ──────────────────────────────────────────────────────────────

#[cfg(feature = "format-sheet")]
fn sheet_xml(rows: &str) -> String {
    format!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
    )
}

#[cfg(feature = "format-sheet")]
fn workbook() -> Vec<u8> {
    let content_types = concat!(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
        r#"<Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
        r#"</Types>"#,
    );
    let root_rels = concat!(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
        r#"</Relationships>"#,
    );
    let workbook = concat!(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        r#"<sheets><sheet name="Sales" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets>"#,
        r#"</workbook>"#,
    );
    let workbook_rels = concat!(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>"#,
        r#"</Relationships>"#,
    );
    let sales = sheet_xml(concat!(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Region</t></is></c><c r="B1" t="inlineStr"><is><t>Sales</t></is></c></row>"#,
        r#"<row r="2"><c r="A2" t="inlineStr"><is><t>North</t></is></c><c r="B2"><v>42</v></c></row>"#,
    ));
    let notes = sheet_xml(r#"<row r="1"><c r="A1" t="inlineStr"><is><t>hello</t></is></c></row>"#);

    // Archive order deliberately differs from workbook order.
    package(&[
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", root_rels),
        ("xl/worksheets/sheet2.xml", &notes),
        ("xl/worksheets/sheet1.xml", &sales),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
        ("xl/workbook.xml", workbook),
    ])
}

#[cfg(feature = "format-sheet")]
#[test]
fn xlsx_sheets_rendered_in_workbook_order() {
    let text = extract::extract(&Upload::new("figures.xlsx", workbook())).unwrap();
    assert_eq!(
        text,
        "--- Sheet: Sales ---\nRegion Sales\n North    42\n\n--- Sheet: Notes ---\nhello\n\n"
    );
}
