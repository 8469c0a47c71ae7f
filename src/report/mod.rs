//! The monthly gross-revenue report: aggregation of a month of sales into
//! the six MEI revenue buckets and the PDF download routes.

use time::Month;

mod aggregation;
mod page;
mod pdf;

pub use aggregation::{MonthlyTotals, aggregate};
pub use page::{ReportState, get_report_page, post_report};

/// The Portuguese name of `month`, lowercase as used mid-sentence.
pub(crate) fn month_name_pt(month: Month) -> &'static str {
    match month {
        Month::January => "janeiro",
        Month::February => "fevereiro",
        Month::March => "março",
        Month::April => "abril",
        Month::May => "maio",
        Month::June => "junho",
        Month::July => "julho",
        Month::August => "agosto",
        Month::September => "setembro",
        Month::October => "outubro",
        Month::November => "novembro",
        Month::December => "dezembro",
    }
}
