//! Sales façade.
//!
//! Sales capability check, customer resolution, order creation and the
//! sales report (with an inventory report when sales is not usable).

pub mod availability;
pub mod customer;
pub mod error;
pub mod order;
pub mod report;

pub use availability::{SalesAvailability, check_sales_available};
pub use customer::{
    Customer, CustomerMarker, CustomerResolution, CustomerTemplate, ResolveCustomer,
    resolve_customer,
};
pub use error::SalesError;
pub use order::{SaleOrderReceipt, SaleRequest, create_sale_order};
pub use report::{OrderRow, ProductSales, SalesReport, SalesReportOutcome, generate_sales_report};
