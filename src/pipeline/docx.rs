//! Document emission: lay composed badge cells out on label-sheet tables.
//!
//! Each printed page is one fixed-layout table of `rows × columns` cells whose
//! rows have an *exact* height and whose columns match the label stock, so the
//! text lands inside the die-cut labels. Tables are appended back to back;
//! because every table fills the printable area exactly, Word and LibreOffice
//! flow the next table onto the next sheet without explicit page breaks.

use crate::config::{inches_to_emu, inches_to_twips, SheetProfile};
use crate::error::BadgeError;
use crate::pipeline::compose::{BadgeCell, CellLine, TextLine, QR_ERROR_TEXT};
use crate::pipeline::paginate::Grid;
use docx_rs::{
    AlignmentType, Docx, HeightRule, LineSpacing, PageMargin, PageOrientationType, Paragraph,
    Pic, Run, Table, TableBorders, TableCell, TableLayoutType, TableRow, WidthType,
};
use std::io::Cursor;
use tracing::debug;

/// Build the sheet document for a sequence of composed badges.
///
/// `footer` is appended after the last table (the QR sheet's total count).
pub fn build_document(
    cells: &[BadgeCell],
    profile: &SheetProfile,
    footer: Option<&TextLine>,
) -> Result<Docx, BadgeError> {
    let grid = Grid::new(profile.per_page, profile.columns)?;

    let mut docx = Docx::new()
        .page_size(
            inches_to_twips(profile.page.width),
            inches_to_twips(profile.page.height),
        )
        .page_margin(
            PageMargin::new()
                .top(inches_to_twips(profile.margins.top) as i32)
                .bottom(inches_to_twips(profile.margins.bottom) as i32)
                .left(inches_to_twips(profile.margins.left) as i32)
                .right(inches_to_twips(profile.margins.right) as i32),
        );
    if profile.landscape {
        docx = docx.page_orient(PageOrientationType::Landscape);
    }

    let mut page: Vec<TableCell> = Vec::with_capacity(grid.per_page());
    for (i, cell) in cells.iter().enumerate() {
        let pos = grid.position(i + 1);
        if pos.starts_page && !page.is_empty() {
            docx = docx.add_table(sheet_table(std::mem::take(&mut page), &grid, profile));
        }
        page.push(badge_cell(cell, profile));
    }
    if !page.is_empty() {
        docx = docx.add_table(sheet_table(page, &grid, profile));
    }

    if let Some(line) = footer {
        docx = docx.add_paragraph(text_paragraph(line));
    }

    debug!(
        "Laid out {} badges on {} pages",
        cells.len(),
        grid.page_count(cells.len())
    );
    Ok(docx)
}

/// Serialise a document to `.docx` bytes.
pub fn pack(docx: Docx) -> Result<Vec<u8>, BadgeError> {
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| BadgeError::DocumentBuild(e.to_string()))?;
    Ok(buf.into_inner())
}

/// One page: the filled cells in raster order, padded with empty labels.
fn sheet_table(mut cells: Vec<TableCell>, grid: &Grid, profile: &SheetProfile) -> Table {
    let width = inches_to_twips(profile.label.width) as usize;
    let height = inches_to_twips(profile.label.height) as f32;

    while cells.len() < grid.per_page() {
        cells.push(empty_cell(width));
    }

    let mut rows = Vec::with_capacity(grid.rows());
    let mut cells = cells.into_iter();
    for _ in 0..grid.rows() {
        let row: Vec<TableCell> = cells.by_ref().take(grid.columns()).collect();
        rows.push(
            TableRow::new(row)
                .row_height(height)
                .height_rule(HeightRule::Exact),
        );
    }

    Table::new(rows)
        .layout(TableLayoutType::Fixed)
        .set_grid(vec![width; grid.columns()])
        .width(width * grid.columns(), WidthType::Dxa)
        .set_borders(TableBorders::with_empty())
}

fn empty_cell(width: usize) -> TableCell {
    TableCell::new()
        .add_paragraph(Paragraph::new())
        .width(width, WidthType::Dxa)
}

fn badge_cell(cell: &BadgeCell, profile: &SheetProfile) -> TableCell {
    let width = inches_to_twips(profile.label.width) as usize;
    let mut out = TableCell::new().width(width, WidthType::Dxa);

    if cell.lines.is_empty() {
        return out.add_paragraph(Paragraph::new());
    }

    for line in &cell.lines {
        out = out.add_paragraph(match line {
            CellLine::Blank => Paragraph::new(),
            CellLine::Text(text) => text_paragraph(text),
            CellLine::QrImage { image, width_in } => {
                let pic = Pic::new_with_dimensions(image.png.clone(), image.width_px, image.height_px)
                    .size(
                        inches_to_emu(*width_in),
                        inches_to_emu(width_in * image.aspect()),
                    );
                centered().add_run(Run::new().add_image(pic))
            }
            // A QR that was never fetched still has to show something.
            CellLine::QrPending { .. } => text_paragraph(&TextLine::new(QR_ERROR_TEXT)),
        });
    }
    out
}

fn centered() -> Paragraph {
    Paragraph::new()
        .align(AlignmentType::Center)
        .line_spacing(LineSpacing::new().before(0).after(0))
}

fn text_paragraph(line: &TextLine) -> Paragraph {
    let mut run = Run::new().add_text(&line.text);
    if line.bold {
        run = run.bold();
    }
    if let Some(pt) = line.size_pt {
        // OOXML uses half-points
        run = run.size(pt * 2);
    }
    centered().add_run(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::BadgeKind;
    use crate::config::LayoutConfig;
    use crate::pipeline::compose::total_count_line;
    use docx_rs::DocumentChild;

    fn cells(n: usize) -> Vec<BadgeCell> {
        (0..n)
            .map(|i| BadgeCell {
                lines: vec![CellLine::Text(TextLine::new(format!("Badge {i}")).bold())],
            })
            .collect()
    }

    fn tables(docx: &Docx) -> usize {
        docx.document
            .children
            .iter()
            .filter(|c| matches!(c, DocumentChild::Table(_)))
            .count()
    }

    #[test]
    fn one_table_per_page() {
        let layout = LayoutConfig::default();
        let profile = layout.profile(BadgeKind::Qr, false);

        assert_eq!(tables(&build_document(&cells(8), &profile, None).unwrap()), 1);
        assert_eq!(tables(&build_document(&cells(9), &profile, None).unwrap()), 2);
        assert_eq!(tables(&build_document(&cells(0), &profile, None).unwrap()), 0);

        let name = layout.profile(BadgeKind::Student, false);
        assert_eq!(tables(&build_document(&cells(13), &name, None).unwrap()), 3);
    }

    #[test]
    fn footer_follows_last_table() {
        let profile = LayoutConfig::default().profile(BadgeKind::Qr, false);
        let footer = total_count_line(3);
        let docx = build_document(&cells(3), &profile, Some(&footer)).unwrap();

        let children = &docx.document.children;
        assert!(matches!(children.last(), Some(DocumentChild::Paragraph(_))));
        assert_eq!(tables(&docx), 1);
    }

    #[test]
    fn packs_to_zip_container() {
        let profile = LayoutConfig::default().profile(BadgeKind::Qr, true);
        let docx = build_document(&cells(2), &profile, None).unwrap();
        let bytes = pack(docx).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn blank_and_pending_lines_render() {
        let profile = LayoutConfig::default().profile(BadgeKind::Student, false);
        let cell = BadgeCell {
            lines: vec![
                CellLine::Blank,
                CellLine::QrPending {
                    url: "http://qr.test/x".into(),
                },
            ],
        };
        let docx = build_document(&[cell, BadgeCell::default()], &profile, None).unwrap();
        assert!(pack(docx).is_ok());
    }
}
