use anyhow::{Result, anyhow};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{BusinessInfo, Client, Document, DocumentKind, DocumentStatus, Status};
use crate::totals::format_amount;

// Page geometry in millimetres, origin top-left, A4.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MM: f32 = 20.0;
const BOTTOM_MM: f32 = 280.0;
const LEFT_MM: f32 = 10.0;
const LINE_STEP_MM: f32 = 10.0;

const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
}

/// One line of text at a fixed position on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub align: Align,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub pages: usize,
    pub lines: Vec<TextLine>,
}

impl DocumentLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }
}

struct Cursor {
    page: usize,
    y: f32,
    lines: Vec<TextLine>,
}

impl Cursor {
    fn line(&mut self, text: String) {
        if self.y > BOTTOM_MM {
            self.page += 1;
            self.y = TOP_MM;
        }
        self.lines.push(TextLine {
            page: self.page,
            x: LEFT_MM,
            y: self.y,
            font_size: BODY_SIZE,
            align: Align::Left,
            text,
        });
        self.y += LINE_STEP_MM;
    }

    fn gap(&mut self) {
        self.y += LINE_STEP_MM;
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// Lays out a quote or invoice as fixed-position text lines.
///
/// Missing client details are printed as placeholders; the business block
/// is left out entirely when no business profile exists.
pub fn layout_document<S: DocumentStatus>(
    document: &Document<S>,
    business: Option<&BusinessInfo>,
    client: Option<&Client>,
) -> DocumentLayout {
    let mut cursor = Cursor {
        page: 0,
        y: TOP_MM,
        lines: vec![TextLine {
            page: 0,
            x: PAGE_WIDTH_MM / 2.0,
            y: TOP_MM,
            font_size: TITLE_SIZE,
            align: Align::Center,
            text: S::KIND.label().to_string(),
        }],
    };
    cursor.y = TOP_MM + 2.0 * LINE_STEP_MM;

    cursor.line(format!("Title: {}", document.title));
    cursor.line(format!("Description: {}", document.description));
    cursor.line(format!("Date: {}", document.date.format("%Y-%m-%d")));
    cursor.line(format!("Status: {}", document.status.label()));

    if let Some(business) = business {
        cursor.gap();
        cursor.line("From:".to_string());
        for value in [
            &business.name,
            &business.email,
            &business.phone,
            &business.address,
            &business.website,
        ] {
            if !value.trim().is_empty() {
                cursor.line(value.clone());
            }
        }
    }

    cursor.gap();
    cursor.line("Client Details:".to_string());
    let (name, email, address) = client.map_or(("", "", ""), |c| {
        (c.name.as_str(), c.email.as_str(), c.address.as_str())
    });
    cursor.line(format!("Name: {}", or_placeholder(name)));
    cursor.line(format!("Email: {}", or_placeholder(email)));
    cursor.line(format!("Address: {}", or_placeholder(address)));

    cursor.gap();
    cursor.line("Line Items:".to_string());
    for (index, item) in document.line_items.iter().enumerate() {
        cursor.line(format!(
            "{}. {} - Quantity: {}, Unit Price: {}, Total: {}",
            index + 1,
            item.description,
            item.quantity,
            format_amount(item.unit_price),
            format_amount(item.amount())
        ));
    }

    cursor.gap();
    cursor.line(format!("Total Amount: {}", format_amount(document.total_amount)));

    DocumentLayout {
        pages: cursor.page + 1,
        lines: cursor.lines,
    }
}

/// `<title>_<Kind>.pdf`, with every run of whitespace in the title replaced
/// by a single underscore. Path separators become dashes so the file always
/// lands in the export directory.
pub fn export_file_name(title: &str, kind: DocumentKind) -> String {
    let mut name = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(if c == '/' || c == '\\' { '-' } else { c });
            in_whitespace = false;
        }
    }
    if name.is_empty() {
        name.push_str("untitled");
    }
    format!("{}_{}.pdf", name, kind.label())
}

/// Position of a line in printpdf coordinates: millimetres from the
/// bottom-left corner of the page.
fn text_origin(line: &TextLine) -> (f32, f32) {
    let mut x = line.x;
    if line.align == Align::Center {
        // Builtin fonts carry no metrics; Helvetica averages half an em per glyph.
        let width_pt = line.text.chars().count() as f32 * line.font_size * 0.5;
        x -= width_pt / PT_PER_MM / 2.0;
    }
    (x, PAGE_HEIGHT_MM - line.y)
}

/// Renders a layout to PDF bytes, one A4 page per layout page, in Helvetica.
pub fn render_pdf(layout: &DocumentLayout, title: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("failed to load Helvetica: {}", e))?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for page in 1..layout.pages {
        let (page_index, layer_index) = doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Layer {}", page + 1),
        );
        layers.push(doc.get_page(page_index).get_layer(layer_index));
    }

    for line in &layout.lines {
        let Some(layer) = layers.get(line.page) else {
            continue;
        };
        let (x, y) = text_origin(line);
        layer.use_text(line.text.as_str(), line.font_size, Mm(x), Mm(y), &font);
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| anyhow!("failed to write PDF: {}", e))?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush PDF: {}", e))
}

/// Writes exported documents into one output directory.
pub struct DocumentExporter {
    output_dir: PathBuf,
}

impl DocumentExporter {
    pub fn new(output_dir: &str) -> Result<Self> {
        // Create the output directory if it doesn't exist
        let path = Path::new(output_dir);
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
        })
    }

    /// Lays out the document, writes the PDF and returns its path.
    pub fn export<S: DocumentStatus>(
        &self,
        document: &Document<S>,
        business: Option<&BusinessInfo>,
        client: Option<&Client>,
    ) -> Result<PathBuf> {
        let layout = layout_document(document, business, client);
        let path = self
            .output_dir
            .join(export_file_name(&document.title, S::KIND));

        fs::write(&path, render_pdf(&layout, &document.title)?)?;
        info!(path = %path.display(), pages = layout.pages, "Exported {}", S::KIND);

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientStatus, LineItem, Quote, QuoteStatus};
    use chrono::NaiveDate;

    fn quote(items: usize) -> Quote {
        let mut quote = Quote {
            id: 1,
            title: "Deck Repair (rear)".to_string(),
            description: "Replace boards".to_string(),
            client_id: Some(2),
            line_items: (0..items)
                .map(|i| LineItem {
                    id: i as u32 + 1,
                    description: format!("Board {}", i + 1),
                    quantity: 2,
                    unit_price: 50.0,
                })
                .collect(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            status: QuoteStatus::Approved,
            total_amount: 0.0,
        };
        quote.recompute_total();
        quote
    }

    fn client() -> Client {
        Client {
            id: 2,
            name: "Harbor Cafe".to_string(),
            email: "owner@harborcafe.test".to_string(),
            phone: String::new(),
            address: String::new(),
            status: ClientStatus::Active,
        }
    }

    #[test]
    fn file_name_replaces_whitespace_runs_with_underscores() {
        assert_eq!(
            export_file_name("Deck  Repair\tRear", DocumentKind::Quote),
            "Deck_Repair_Rear_Quote.pdf"
        );
        assert_eq!(
            export_file_name(" Q1/Q2 ", DocumentKind::Invoice),
            "_Q1-Q2__Invoice.pdf"
        );
    }

    #[test]
    fn layout_lists_details_items_and_total() {
        let layout = layout_document(&quote(2), None, Some(&client()));
        let texts: Vec<&str> = layout.texts().collect();

        assert_eq!(texts[0], "Quote");
        assert_eq!(layout.lines[0].align, Align::Center);
        assert!(texts.contains(&"Title: Deck Repair (rear)"));
        assert!(texts.contains(&"Date: 2024-05-01"));
        assert!(texts.contains(&"Name: Harbor Cafe"));
        assert!(texts.contains(&"Address: -"));
        assert!(texts.contains(
            &"2. Board 2 - Quantity: 2, Unit Price: $50.00, Total: $100.00"
        ));
        assert_eq!(*texts.last().unwrap(), "Total Amount: $200.00");
        assert!(!texts.contains(&"From:"));
        assert_eq!(layout.pages, 1);
    }

    #[test]
    fn business_block_skips_empty_fields() {
        let business = BusinessInfo {
            name: "Northwind".to_string(),
            website: "northwind.test".to_string(),
            ..BusinessInfo::default()
        };
        let layout = layout_document(&quote(1), Some(&business), None);
        let texts: Vec<&str> = layout.texts().collect();

        let from = texts.iter().position(|t| *t == "From:").unwrap();
        assert_eq!(&texts[from + 1..from + 3], &["Northwind", "northwind.test"]);
        assert!(texts.contains(&"Name: -"));
    }

    #[test]
    fn long_documents_flow_onto_more_pages() {
        let layout = layout_document(&quote(40), None, None);
        assert!(layout.pages > 1);
        assert!(layout.lines.iter().all(|l| l.y <= BOTTOM_MM + LINE_STEP_MM));
        assert_eq!(layout.lines.last().unwrap().page, layout.pages - 1);
    }

    #[test]
    fn text_origin_flips_y_and_centers_titles() {
        let layout = layout_document(&quote(1), None, None);

        let (x, y) = text_origin(&layout.lines[0]);
        assert!(x < PAGE_WIDTH_MM / 2.0);
        assert_eq!(y, PAGE_HEIGHT_MM - TOP_MM);

        let (x, y) = text_origin(&layout.lines[1]);
        assert_eq!(x, LEFT_MM);
        assert_eq!(y, PAGE_HEIGHT_MM - layout.lines[1].y);
    }

    #[test]
    fn renders_every_layout_page() {
        let layout = layout_document(&quote(40), None, None);
        assert!(layout.pages > 1);

        let pdf = render_pdf(&layout, "Deck Repair").unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(pdf.len() > 1000);
    }

    #[test]
    fn exporter_writes_file_named_from_title() {
        let dir = std::env::temp_dir().join(format!("business_admin_export_{}", std::process::id()));
        let exporter = DocumentExporter::new(dir.to_str().unwrap()).unwrap();

        let path = exporter.export(&quote(2), None, Some(&client())).unwrap();

        assert_eq!(path, dir.join("Deck_Repair_(rear)_Quote.pdf"));
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
