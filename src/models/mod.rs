mod business_info;
mod client;
mod document;
mod invoice;
mod line_item;
mod quote;
mod status;

pub use business_info::BusinessInfo;
pub use client::{Client, ClientStatus};
pub use document::{Document, DocumentKind};
pub use invoice::{Invoice, InvoiceStatus};
pub use line_item::LineItem;
pub use quote::{Quote, QuoteStatus};
pub use status::{DocumentStatus, Status};
