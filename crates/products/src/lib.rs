//! Product façade.
//!
//! Lists and inspects `product.product` and creates products whose payload
//! only names fields the remote schema actually has.

pub mod catalog;
pub mod create;
pub mod error;
pub mod inspect;

pub use catalog::{PRODUCT_MODEL, ProductSummary, list_products, read_product};
pub use create::{
    Category, CreatedProduct, NewProduct, ResolveUnitOfMeasure, UnitOfMeasure, create_product,
    pick_category, pick_unit,
};
pub use error::ProductError;
pub use inspect::{FieldDescription, ProductFieldReport, inspect_fields};
