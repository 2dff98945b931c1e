use serde::{Deserialize, Serialize};

use super::{Document, DocumentKind, DocumentStatus, Status};

pub type Invoice = Document<InvoiceStatus>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl Status for InvoiceStatus {
    fn all() -> &'static [Self] {
        &[InvoiceStatus::Pending, InvoiceStatus::Paid, InvoiceStatus::Overdue]
    }

    fn label(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl DocumentStatus for InvoiceStatus {
    const KIND: DocumentKind = DocumentKind::Invoice;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_invoice_without_status_or_client_loads_with_defaults() {
        let json = r#"{
            "id": 1,
            "title": "Mock Invoice 1",
            "description": "Description for Mock Invoice 1",
            "lineItems": [
                {"id": 1, "description": "Item 1", "quantity": 2, "unitPrice": 50},
                {"id": 2, "description": "Item 2", "quantity": 1, "unitPrice": 100}
            ],
            "date": "2023-01-01"
        }"#;

        let invoice: Invoice = serde_json::from_str(json).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.client_id, None);
        assert_eq!(invoice.line_items.len(), 2);
        assert_eq!(invoice.line_items[0].unit_price, 50.0);
        assert_eq!(invoice.date.to_string(), "2023-01-01");
    }

    #[test]
    fn status_serializes_lowercase_and_cycles() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"overdue\"");
        assert_eq!(InvoiceStatus::Overdue.next(), InvoiceStatus::Pending);
        assert_eq!(InvoiceStatus::Pending.previous(), InvoiceStatus::Overdue);
    }
}
