//! Recording and managing sales, the core domain of the application.
//!
//! A sale records the amount received, a description, a revenue category and
//! whether a fiscal invoice (Nota Fiscal) was issued for it. Sales feed the
//! dashboard and the monthly revenue report.

mod db;
mod delete_endpoint;
mod history_page;
mod new_sale;

pub use db::{
    FiscalInvoice, NewSale, SALE_NOT_FOUND_OR_DENIED_MSG, Sale, create_sale_tables, record_sale,
    sales_for_month,
};
pub use delete_endpoint::{DeleteSaleState, delete_sale_endpoint};
pub use history_page::{SalesPageState, get_sales_page};
pub use new_sale::{NewSaleState, create_sale_endpoint, get_new_sale_page};

pub(crate) use db::recent_sales;
