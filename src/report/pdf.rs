//! Renders the monthly gross-revenue report as a PDF document.
//!
//! The layout follows the official MEI "Relatório Mensal das Receitas Brutas"
//! form: the six revenue totals split by class and invoice status, the grand
//! total, and the list of sales the totals were computed from.

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use time::{Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    auth::User,
    report::{aggregation::MonthlyTotals, month_name_pt},
    sale::Sale,
};

// A4 in PDF points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 16.0;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

const SALE_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// PDF literal strings carry single-byte encodings, so text is written with
/// WinAnsiEncoding and characters outside Latin-1 degrade to '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|character| {
            let code = character as u32;
            if code <= 0xFF { code as u8 } else { b'?' }
        })
        .collect()
}

/// Accumulates text lines into pages, starting a new page when the current
/// one runs out of vertical space.
struct ReportWriter {
    pages: Vec<Vec<Operation>>,
    cursor_y: f32,
}

impl ReportWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn write_line(&mut self, font: &str, size: f32, text: &str) {
        if self.cursor_y < MARGIN + LINE_HEIGHT {
            self.pages.push(Vec::new());
            self.cursor_y = PAGE_HEIGHT - MARGIN;
        }

        let operations = self
            .pages
            .last_mut()
            .expect("the writer always holds at least one page");
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
        operations.push(Operation::new(
            "Td",
            vec![MARGIN.into(), self.cursor_y.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        operations.push(Operation::new("ET", vec![]));

        self.cursor_y -= LINE_HEIGHT;
    }

    fn blank_line(&mut self) {
        self.cursor_y -= LINE_HEIGHT;
    }
}

fn write_report_text(
    writer: &mut ReportWriter,
    user: &User,
    year: i32,
    month: Month,
    sales: &[Sale],
    totals: &MonthlyTotals,
) {
    writer.write_line(BOLD_FONT, 16.0, "Relatório Mensal das Receitas Brutas");
    writer.write_line(REGULAR_FONT, 11.0, "Microempreendedor Individual - MEI");
    writer.blank_line();

    writer.write_line(
        REGULAR_FONT,
        11.0,
        &format!("Empreendedor: {} - CPF: {}", user.name, user.cpf.formatted()),
    );
    writer.write_line(
        REGULAR_FONT,
        11.0,
        &format!("Período de apuração: {} de {}", month_name_pt(month), year),
    );
    writer.blank_line();

    writer.write_line(BOLD_FONT, 12.0, "Receita bruta mensal");
    let revenue_lines = [
        ("I - Revenda de mercadorias com nota fiscal", totals.resale_with_invoice),
        ("II - Revenda de mercadorias sem nota fiscal", totals.resale_without_invoice),
        ("III - Venda de produtos industrializados com nota fiscal", totals.product_with_invoice),
        ("IV - Venda de produtos industrializados sem nota fiscal", totals.product_without_invoice),
        ("V - Prestação de serviços com nota fiscal", totals.service_with_invoice),
        ("VI - Prestação de serviços sem nota fiscal", totals.service_without_invoice),
    ];
    let subtotals = [
        (
            "Total das receitas de revenda (I + II)",
            totals.resale_with_invoice + totals.resale_without_invoice,
        ),
        (
            "Total das receitas de produtos (III + IV)",
            totals.product_with_invoice + totals.product_without_invoice,
        ),
        (
            "Total das receitas de serviços (V + VI)",
            totals.service_with_invoice + totals.service_without_invoice,
        ),
    ];

    for (chunk, (subtotal_label, subtotal)) in revenue_lines.chunks(2).zip(subtotals) {
        for (label, amount) in chunk {
            writer.write_line(REGULAR_FONT, 11.0, &format!("{label}: {amount}"));
        }
        writer.write_line(REGULAR_FONT, 11.0, &format!("{subtotal_label}: {subtotal}"));
    }
    writer.write_line(BOLD_FONT, 12.0, &format!("Receita total: {}", totals.total()));
    writer.blank_line();

    writer.write_line(BOLD_FONT, 12.0, "Vendas do período");
    for sale in sales {
        let date_string = sale
            .date
            .date()
            .format(SALE_DATE_FORMAT)
            .unwrap_or_else(|_| sale.date.date().to_string());
        let invoice_label = match &sale.invoice {
            Some(invoice) => format!("NF {}", invoice.number),
            None => "sem nota".to_string(),
        };

        writer.write_line(
            REGULAR_FONT,
            10.0,
            &format!(
                "{date_string}  {}  {}  ({invoice_label})",
                sale.description, sale.amount
            ),
        );
    }
    writer.blank_line();

    writer.write_line(
        REGULAR_FONT,
        10.0,
        "Declaro que as informações acima correspondem às receitas brutas auferidas no período.",
    );
    writer.blank_line();
    writer.write_line(
        REGULAR_FONT,
        10.0,
        &format!("Assinatura: ______________________________  ({})", user.name),
    );
}

/// Render the report for one month of `sales` as PDF bytes.
///
/// # Errors
/// Returns [Error::PdfError] if the document could not be produced.
pub fn render_monthly_report(
    user: &User,
    year: i32,
    month: Month,
    sales: &[Sale],
    totals: &MonthlyTotals,
) -> Result<Vec<u8>, Error> {
    let mut writer = ReportWriter::new();
    write_report_text(&mut writer, user, year, month, sales, totals);

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let regular_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_font_id,
            BOLD_FONT => bold_font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(writer.pages.len());
    for operations in writer.pages {
        let content = Content { operations };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|error| Error::PdfError(error.to_string()))?;

    Ok(bytes)
}

#[cfg(test)]
mod pdf_tests {
    use time::{Month, macros::datetime};

    use crate::{
        auth::{Cpf, PasswordHash, User, UserID},
        money::Centavos,
        report::aggregation::MonthlyTotals,
        sale::Sale,
    };

    use super::render_monthly_report;

    fn get_test_user() -> User {
        User {
            id: UserID::new(1),
            cpf: Cpf::new_unchecked("12345678901"),
            name: "Maria".to_string(),
            email: None,
            password_hash: PasswordHash::new_unchecked("definitely hashed"),
        }
    }

    fn get_test_sale(description: &str) -> Sale {
        Sale {
            id: 1,
            date: datetime!(2025-06-10 14:30 UTC),
            description: description.to_string(),
            amount: Centavos::new(15000),
            category_id: 1,
            category_name: "Revenda de Mercadorias".to_string(),
            invoice: None,
            owner: UserID::new(1),
        }
    }

    #[test]
    fn renders_a_parseable_pdf() {
        let bytes = render_monthly_report(
            &get_test_user(),
            2025,
            Month::June,
            &[get_test_sale("Venda de bolo")],
            &MonthlyTotals::default(),
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));

        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn long_sale_lists_paginate() {
        let sales: Vec<Sale> = (0..100).map(|_| get_test_sale("Venda")).collect();

        let bytes = render_monthly_report(
            &get_test_user(),
            2025,
            Month::June,
            &sales,
            &MonthlyTotals::default(),
        )
        .unwrap();

        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(
            document.get_pages().len() > 1,
            "want more than one page, got {}",
            document.get_pages().len()
        );
    }
}
