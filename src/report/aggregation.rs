//! Aggregates a month of sales into the six buckets of the MEI
//! gross-revenue report.

use crate::{category::RevenueClass, money::Centavos, sale::Sale};

/// The totals for one month, split by revenue class and fiscal-invoice status.
///
/// Sales whose category matches no revenue class are excluded from every
/// bucket and from the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyTotals {
    /// Resale of merchandise, with an issued invoice.
    pub resale_with_invoice: Centavos,
    /// Resale of merchandise, without an invoice.
    pub resale_without_invoice: Centavos,
    /// Industrialized products, with an issued invoice.
    pub product_with_invoice: Centavos,
    /// Industrialized products, without an invoice.
    pub product_without_invoice: Centavos,
    /// Services rendered, with an issued invoice.
    pub service_with_invoice: Centavos,
    /// Services rendered, without an invoice.
    pub service_without_invoice: Centavos,
}

impl MonthlyTotals {
    /// The grand total, always equal to the sum of the six buckets.
    pub fn total(&self) -> Centavos {
        self.resale_with_invoice
            + self.resale_without_invoice
            + self.product_with_invoice
            + self.product_without_invoice
            + self.service_with_invoice
            + self.service_without_invoice
    }
}

/// Reduce `sales` into the six report buckets.
///
/// This is a pure reduction: the order of `sales` does not affect the result
/// and the input is not modified.
pub fn aggregate(sales: &[Sale]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();

    for sale in sales {
        let Some(class) = RevenueClass::classify(&sale.category_name) else {
            continue;
        };

        let bucket = match (class, sale.invoice.is_some()) {
            (RevenueClass::Resale, true) => &mut totals.resale_with_invoice,
            (RevenueClass::Resale, false) => &mut totals.resale_without_invoice,
            (RevenueClass::Product, true) => &mut totals.product_with_invoice,
            (RevenueClass::Product, false) => &mut totals.product_without_invoice,
            (RevenueClass::Service, true) => &mut totals.service_with_invoice,
            (RevenueClass::Service, false) => &mut totals.service_without_invoice,
        };

        *bucket = *bucket + sale.amount;
    }

    totals
}
