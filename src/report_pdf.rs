//! Fixed-layout annual report rendered from a [`Report`] record.
//!
//! Layout is expressed in PDF points from the top-left corner, the way the
//! report was designed; [`Canvas`] converts to printpdf's bottom-left
//! millimetres.

use crate::config::ReportConfig;
use crate::db::models::Report;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rgb,
};
use thiserror::Error;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 50.0;
const BODY_WIDTH: f32 = 500.0;
/// Helvetica averages about half an em per glyph; good enough for wrapping.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;

const GREEN: (u8, u8, u8) = (0x1F, 0x7A, 0x44);
const GRAY: (u8, u8, u8) = (0x4B, 0x55, 0x63);

const IMPACT: &[&str] = &[
    "- Distributed 100 wheelchairs to enhance mobility for disabled individuals.",
    "- Provided scholarships for 50 students in rural schools.",
    "- Delivered free medical checkups and supplies to underserved communities.",
    "- Employed 20 full-time staff to manage and expand our programs.",
];

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to render report: {0}")]
    Render(String),
}

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: usize,
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

impl Canvas {
    fn new(title: &str) -> Result<Self, PdfError> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PdfError::Render(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PdfError::Render(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            pages: 1,
        })
    }

    fn add_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
    }

    fn text(&self, text: &str, x: f32, y: f32, size: f32, face: Face, color: (u8, u8, u8)) {
        let font = match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        };
        self.layer.set_fill_color(rgb(color));
        self.layer
            .use_text(text, size, mm(x), mm(PAGE_HEIGHT - y - size), font);
    }

    fn centered(&self, text: &str, y: f32, size: f32, face: Face, color: (u8, u8, u8)) {
        let width = estimate_width(text, size);
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.text(text, x, y, size, face, color);
    }

    /// Writes wrapped text and returns the y just below it.
    fn paragraph(&self, text: &str, x: f32, y: f32, size: f32, width: f32) -> f32 {
        let mut y = y;
        for line in wrap(text, size, width) {
            self.text(&line, x, y, size, Face::Regular, GRAY);
            y += size * LINE_SPACING;
        }
        y
    }

    fn heading(&self, text: &str) {
        self.text(text, MARGIN, MARGIN, 20.0, Face::Bold, GREEN);
    }

    fn finish(self) -> Result<Vec<u8>, PdfError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| PdfError::Render(e.to_string()))
    }
}

fn estimate_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM
}

/// Greedy word wrap against the estimated glyph width.
pub fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if estimate_width(&candidate, size) > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Formats like an en-US `toLocaleString`: comma thousands separators and at
/// most three fraction digits, trailing zeros dropped.
pub fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let millis = (value.abs() * 1000.0).round() as u64;
    let whole = millis / 1000;
    let fraction = millis % 1000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if fraction > 0 {
        let fraction = format!("{fraction:03}");
        grouped.push('.');
        grouped.push_str(fraction.trim_end_matches('0'));
    }
    if negative && millis > 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[tracing::instrument(skip_all, fields(report = report.id, year = report.year))]
pub fn render(report: &Report, branding: &ReportConfig) -> Result<Vec<u8>, PdfError> {
    let year = report.year;
    let mut canvas = Canvas::new(&format!("{} {year} Annual Report", branding.organisation))?;

    canvas.centered(&branding.organisation, 100.0, 30.0, Face::Bold, GREEN);
    canvas.centered(&format!("{year} Annual Report"), 160.0, 24.0, Face::Bold, GREEN);
    canvas.centered(&branding.tagline, 220.0, 16.0, Face::Regular, GRAY);
    canvas.centered(
        &format!("Published: {}", report.created_at.format("%B %Y")),
        600.0,
        12.0,
        Face::Regular,
        GRAY,
    );

    canvas.add_page();
    canvas.heading("Introduction");
    canvas.paragraph(
        &format!(
            "In {year}, the {} continued its mission to uplift Nigerian communities through \
             education, healthcare, and support for the vulnerable. This report outlines our key \
             activities, financial expenditures, and the impact of your generous donations.",
            branding.organisation
        ),
        MARGIN,
        100.0,
        12.0,
        BODY_WIDTH,
    );

    canvas.add_page();
    canvas.heading("Financial Summary");
    let total = group_thousands(report.total_spent());
    canvas.paragraph(
        &format!(
            "In {year}, the foundation spent NGN {total} to support our initiatives. Below is a \
             detailed breakdown of our expenditures."
        ),
        MARGIN,
        100.0,
        12.0,
        BODY_WIDTH,
    );
    spending_table(&mut canvas, report, &total);

    canvas.add_page();
    canvas.heading(&format!("Our Impact in {year}"));
    let mut y = canvas.paragraph(
        "Key achievements made possible by your support:",
        MARGIN,
        100.0,
        12.0,
        BODY_WIDTH,
    );
    y += 12.0;
    for line in IMPACT {
        y = canvas.paragraph(line, MARGIN, y, 12.0, BODY_WIDTH);
    }

    canvas.add_page();
    canvas.heading("Looking Ahead");
    canvas.paragraph(
        &format!(
            "As we move into {}, we aim to expand our healthcare and education programs, reaching \
             more communities and deepening our impact. Thank you for your continued support in \
             making this vision a reality.",
            year.saturating_add(1)
        ),
        MARGIN,
        100.0,
        12.0,
        BODY_WIDTH,
    );

    let pages = canvas.pages;
    let bytes = canvas.finish()?;
    tracing::debug!(bytes = bytes.len(), pages, "report rendered");
    Ok(bytes)
}

fn spending_table(canvas: &mut Canvas, report: &Report, total: &str) {
    const TOP: f32 = 150.0;
    const COLUMNS: [f32; 3] = [50.0, 200.0, 350.0];
    const ROW_HEIGHT: f32 = 30.0;
    const BOTTOM: f32 = PAGE_HEIGHT - MARGIN;

    let header = |canvas: &Canvas, y: f32| {
        for (x, title) in COLUMNS.iter().zip(["Category", "Amount (NGN)", "Description"]) {
            canvas.text(title, *x, y, 12.0, Face::Bold, GREEN);
        }
    };
    header(&*canvas, TOP);

    let mut y = TOP;
    for detail in &report.spending_details {
        let amount = group_thousands(detail.amount);
        let lines = [
            wrap(&detail.category, 12.0, 140.0).len(),
            wrap(&amount, 12.0, 140.0).len(),
            wrap(&detail.description, 12.0, 200.0).len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
        .max(1);
        let row_height = (lines as f32 * 12.0 * LINE_SPACING).max(ROW_HEIGHT);

        // Rows never straddle a page; continuation pages repeat the header.
        if y + ROW_HEIGHT + row_height > BOTTOM {
            canvas.add_page();
            header(&*canvas, MARGIN);
            y = MARGIN;
        }

        y += ROW_HEIGHT;
        let row_bottom = [
            canvas.paragraph(&detail.category, COLUMNS[0], y, 12.0, 140.0),
            canvas.paragraph(&amount, COLUMNS[1], y, 12.0, 140.0),
            canvas.paragraph(&detail.description, COLUMNS[2], y, 12.0, 200.0),
        ];
        let tallest = row_bottom.into_iter().fold(y, f32::max);
        y = y.max(tallest - ROW_HEIGHT);
    }

    if y + 2.0 * ROW_HEIGHT > BOTTOM {
        canvas.add_page();
        y = MARGIN - ROW_HEIGHT;
    }
    y += ROW_HEIGHT;
    canvas.text("Total", COLUMNS[0], y, 12.0, Face::Bold, GRAY);
    canvas.text(&format!("NGN {total}"), COLUMNS[1], y, 12.0, Face::Bold, GRAY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SpendingDetail;
    use chrono::NaiveDate;

    fn report(details: Vec<SpendingDetail>) -> Report {
        Report {
            id: 7,
            title: "2024 Annual Report".to_string(),
            description: "Summary".to_string(),
            pdf_link: "/assets/2024.pdf".to_string(),
            year: 2024,
            spending_details: details,
            created_at: NaiveDate::from_ymd_opt(2025, 8, 4)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn groups_thousands_like_a_locale_formatter() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1_500_000.0), "1,500,000");
        assert_eq!(group_thousands(1234.5), "1,234.5");
        assert_eq!(group_thousands(1234.05), "1,234.05");
        assert_eq!(group_thousands(0.1236), "0.124");
        assert_eq!(group_thousands(-2500.0), "-2,500");
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("one two three four five six seven eight", 12.0, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "one two three four five six seven eight");
        for line in &lines {
            assert!(estimate_width(line, 12.0) <= 60.0 || !line.contains(' '));
        }
    }

    #[test]
    fn long_single_word_gets_its_own_line() {
        let lines = wrap("supercalifragilistic", 12.0, 10.0);
        assert_eq!(lines, vec!["supercalifragilistic".to_string()]);
    }

    #[test]
    fn renders_a_pdf_document() {
        let report = report(vec![
            SpendingDetail {
                category: "Healthcare".to_string(),
                amount: 2_000_000.0,
                description: "Free medical checkups and supplies for underserved communities across three states".to_string(),
            },
            SpendingDetail {
                category: "Education".to_string(),
                amount: 750_000.0,
                description: "Scholarships".to_string(),
            },
        ]);
        let bytes = render(&report, &ReportConfig::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn renders_with_no_spending() {
        let bytes = render(&report(Vec::new()), &ReportConfig::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    fn rows(count: usize) -> Report {
        report(
            (0..count)
                .map(|i| SpendingDetail {
                    category: format!("Category {i}"),
                    amount: 1000.0 * i as f64,
                    description: "Outreach programme costs".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn short_table_fits_on_one_page() {
        let mut canvas = Canvas::new("table").unwrap();
        spending_table(&mut canvas, &rows(3), "3,000");
        assert_eq!(canvas.pages, 1);
    }

    #[test]
    fn long_table_continues_on_new_pages() {
        let mut canvas = Canvas::new("table").unwrap();
        spending_table(&mut canvas, &rows(60), "1,770,000");
        // 60 rows at 30pt each need roughly 1800pt of a 742pt body.
        assert!(canvas.pages >= 3, "pages = {}", canvas.pages);

        let bytes = render(&rows(60), &ReportConfig::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn last_representable_year_still_renders() {
        let mut report = rows(1);
        report.year = i32::MAX;
        assert!(render(&report, &ReportConfig::default()).is_ok());
    }
}
