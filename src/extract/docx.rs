//! DOCX text via `docx-rs`: body paragraphs first, then every top-level
//! table row.
//!
//! Table cells contribute their paragraphs joined by `\n`, each cell
//! terminated by `\t` and each row by `\n`. Tables nested inside a cell are
//! not descended into.

use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use super::ExtractError;

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut body = String::new();
    let mut tables = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                body.push_str(&paragraph_text(p));
                body.push('\n');
            }
            DocumentChild::Table(t) => table_text(t, &mut tables),
            _ => {}
        }
    }

    body.push_str(&tables);
    Ok(body)
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            // Link text is part of the sentence around it.
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}

fn table_text(table: &Table, out: &mut String) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            let paragraphs: Vec<String> = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .collect();
            out.push_str(&paragraphs.join("\n"));
            out.push('\t');
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{BreakType, Docx, Run, TableCell, TableRow};

    use super::*;

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    fn para(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    fn cell(paragraphs: &[&str]) -> TableCell {
        paragraphs
            .iter()
            .fold(TableCell::new(), |c, text| c.add_paragraph(para(text)))
    }

    #[test]
    fn paragraphs_then_tables() {
        let bytes = pack(
            Docx::new()
                .add_paragraph(para("Intro"))
                .add_table(Table::new(vec![TableRow::new(vec![cell(&["a"]), cell(&["b"])])]))
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Outro ")).add_run(Run::new().add_text("end"))),
        );
        assert_eq!(extract(&bytes).unwrap(), "Intro\nOutro end\na\tb\t\n");
    }

    #[test]
    fn tabs_and_breaks_inside_runs() {
        let run = Run::new()
            .add_text("x")
            .add_tab()
            .add_text("y")
            .add_break(BreakType::TextWrapping)
            .add_text("z");
        let bytes = pack(Docx::new().add_paragraph(Paragraph::new().add_run(run)));
        assert_eq!(extract(&bytes).unwrap(), "x\ty\nz\n");
    }

    #[test]
    fn empty_paragraph_keeps_line() {
        let bytes = pack(Docx::new().add_paragraph(Paragraph::new()).add_paragraph(para("A & B")));
        assert_eq!(extract(&bytes).unwrap(), "\nA & B\n");
    }

    #[test]
    fn multi_paragraph_cell_joined_by_newline() {
        let table = Table::new(vec![
            TableRow::new(vec![cell(&["one", "two"])]),
            TableRow::new(vec![cell(&[""])]),
        ]);
        let bytes = pack(Docx::new().add_table(table));
        assert_eq!(extract(&bytes).unwrap(), "one\ntwo\t\n\t\n");
    }

    #[test]
    fn not_a_zip_is_docx_error() {
        assert!(matches!(extract(b"plain bytes"), Err(ExtractError::Docx(_))));
    }
}
