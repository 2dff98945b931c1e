use chrono::{DateTime, Duration, Utc};

use super::{ClientDraft, DocumentDraft, LineItemDraft, Store};
use crate::error::StoreError;
use crate::models::{BusinessInfo, InvoiceStatus, QuoteStatus};

fn item(description: &str, quantity: u32, unit_price: f64) -> LineItemDraft {
    LineItemDraft {
        description: description.to_string(),
        quantity,
        unit_price,
    }
}

impl Store {
    /// Sample data for a first run: one business, one client, a quote and
    /// two invoices.
    pub fn demo(now: DateTime<Utc>) -> Result<Store, StoreError> {
        let store = Store::default().update_business_info(BusinessInfo {
            name: "Northwind Carpentry".to_string(),
            email: "office@northwind.test".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Mill Road".to_string(),
            website: "northwind.test".to_string(),
        });

        let (store, client_id) = store.add_client(
            ClientDraft {
                name: "Harbor Cafe".to_string(),
                email: "owner@harborcafe.test".to_string(),
                phone: "555-0142".to_string(),
                address: "3 Quay Street".to_string(),
                ..ClientDraft::default()
            },
            now,
        )?;

        let (store, _) = store.add_quote(
            DocumentDraft {
                title: "Counter Refit".to_string(),
                description: "Replace the front counter top".to_string(),
                client_id: Some(client_id),
                line_items: vec![item("Oak top", 1, 640.0), item("Fitting", 6, 45.0)],
                status: QuoteStatus::Pending,
            },
            now,
        )?;

        let (store, _) = store.add_invoice(
            DocumentDraft {
                title: "Mock Invoice 1".to_string(),
                description: "Description for Mock Invoice 1".to_string(),
                client_id: Some(client_id),
                line_items: vec![item("Item 1", 2, 50.0), item("Item 2", 1, 100.0)],
                status: InvoiceStatus::Paid,
            },
            now,
        )?;

        store.add_invoice(
            DocumentDraft {
                title: "Mock Invoice 2".to_string(),
                description: "Description for Mock Invoice 2".to_string(),
                client_id: Some(client_id),
                line_items: vec![item("Item A", 3, 30.0), item("Item B", 2, 40.0)],
                status: InvoiceStatus::Pending,
            },
            now + Duration::milliseconds(1),
        )
        .map(|(store, _)| store)
    }
}
