//! Application state as immutable snapshots.
//!
//! A [`Store`] is never mutated in place by callers: every operation takes
//! `&self` and returns the next snapshot, leaving the current one untouched.
//! Whoever owns the current snapshot (the session) decides whether to keep
//! the new one.

mod draft;
mod filter;
mod seed;

use chrono::{DateTime, Utc};

use crate::error::{EntityKind, StoreError};
use crate::models::{
    BusinessInfo, Client, Document, DocumentKind, DocumentStatus, Invoice, InvoiceStatus, Quote,
    QuoteStatus,
};

pub use draft::{ClientDraft, DocumentDraft, LineItemDraft, business_info_is_empty};
pub use filter::{ClientFilter, StatusFilter, StatusTally, Summary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    business_info: Option<BusinessInfo>,
    clients: Vec<Client>,
    quotes: Vec<Quote>,
    invoices: Vec<Invoice>,
}

/// Gives generic code access to the collection holding documents with
/// status `Self`.
pub trait DocumentCollection: DocumentStatus {
    fn documents(store: &Store) -> &[Document<Self>];

    fn documents_mut(store: &mut Store) -> &mut Vec<Document<Self>>;
}

impl DocumentCollection for QuoteStatus {
    fn documents(store: &Store) -> &[Document<Self>] {
        &store.quotes
    }

    fn documents_mut(store: &mut Store) -> &mut Vec<Document<Self>> {
        &mut store.quotes
    }
}

impl DocumentCollection for InvoiceStatus {
    fn documents(store: &Store) -> &[Document<Self>] {
        &store.invoices
    }

    fn documents_mut(store: &mut Store) -> &mut Vec<Document<Self>> {
        &mut store.invoices
    }
}

fn entity_kind(kind: DocumentKind) -> EntityKind {
    match kind {
        DocumentKind::Quote => EntityKind::Quote,
        DocumentKind::Invoice => EntityKind::Invoice,
    }
}

/// Picks an id from the creation timestamp. Falls back to one past the
/// largest existing id when the timestamp would not be strictly greater,
/// which happens for entities created within the same millisecond or after
/// a clock step backwards.
fn next_id(
    existing: impl Iterator<Item = i64>,
    now: DateTime<Utc>,
    kind: EntityKind,
) -> Result<i64, StoreError> {
    let candidate = now.timestamp_millis();
    match existing.max() {
        Some(max) if max >= candidate => {
            max.checked_add(1).ok_or(StoreError::IdsExhausted(kind))
        }
        _ => Ok(candidate),
    }
}

impl Store {
    /// Builds a snapshot from loaded collections. Line items are renumbered
    /// by position and document totals recomputed, so a stale or hand-edited
    /// `totalAmount` never survives.
    pub fn from_parts(
        business_info: Option<BusinessInfo>,
        clients: Vec<Client>,
        mut quotes: Vec<Quote>,
        mut invoices: Vec<Invoice>,
    ) -> Self {
        for quote in &mut quotes {
            quote.renumber_line_items();
            quote.recompute_total();
        }
        for invoice in &mut invoices {
            invoice.renumber_line_items();
            invoice.recompute_total();
        }
        Self {
            business_info,
            clients,
            quotes,
            invoices,
        }
    }

    pub fn business_info(&self) -> Option<&BusinessInfo> {
        self.business_info.as_ref()
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn documents<S: DocumentCollection>(&self) -> &[Document<S>] {
        S::documents(self)
    }

    pub fn client(&self, id: i64) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn quote(&self, id: i64) -> Option<&Quote> {
        self.document::<QuoteStatus>(id)
    }

    pub fn invoice(&self, id: i64) -> Option<&Invoice> {
        self.document::<InvoiceStatus>(id)
    }

    pub fn document<S: DocumentCollection>(&self, id: i64) -> Option<&Document<S>> {
        S::documents(self).iter().find(|d| d.id == id)
    }

    // Business info

    pub fn update_business_info(&self, info: BusinessInfo) -> Store {
        let mut next = self.clone();
        next.business_info = Some(info);
        next
    }

    // Clients

    pub fn add_client(
        &self,
        draft: ClientDraft,
        now: DateTime<Utc>,
    ) -> Result<(Store, i64), StoreError> {
        draft.validate()?;
        let id = next_id(self.clients.iter().map(|c| c.id), now, EntityKind::Client)?;
        let mut next = self.clone();
        next.clients.push(draft.into_client(id));
        Ok((next, id))
    }

    pub fn update_client(&self, id: i64, draft: ClientDraft) -> Result<Store, StoreError> {
        draft.validate()?;
        let pos = self
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Client,
                id,
            })?;
        let mut next = self.clone();
        next.clients[pos] = draft.into_client(id);
        Ok(next)
    }

    /// Removes the client. Documents that reference it keep their
    /// `client_id`; the reference is not enforced.
    pub fn delete_client(&self, id: i64) -> Result<Store, StoreError> {
        if self.client(id).is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Client,
                id,
            });
        }
        let mut next = self.clone();
        next.clients.retain(|c| c.id != id);
        Ok(next)
    }

    // Quotes and invoices

    pub fn add_quote(
        &self,
        draft: DocumentDraft<QuoteStatus>,
        now: DateTime<Utc>,
    ) -> Result<(Store, i64), StoreError> {
        self.add_document(draft, now)
    }

    pub fn add_invoice(
        &self,
        draft: DocumentDraft<InvoiceStatus>,
        now: DateTime<Utc>,
    ) -> Result<(Store, i64), StoreError> {
        self.add_document(draft, now)
    }

    pub fn update_quote(
        &self,
        id: i64,
        draft: DocumentDraft<QuoteStatus>,
    ) -> Result<Store, StoreError> {
        self.update_document(id, draft)
    }

    pub fn update_invoice(
        &self,
        id: i64,
        draft: DocumentDraft<InvoiceStatus>,
    ) -> Result<Store, StoreError> {
        self.update_document(id, draft)
    }

    pub fn delete_quote(&self, id: i64) -> Result<Store, StoreError> {
        self.delete_document::<QuoteStatus>(id)
    }

    pub fn delete_invoice(&self, id: i64) -> Result<Store, StoreError> {
        self.delete_document::<InvoiceStatus>(id)
    }

    pub fn add_document<S: DocumentCollection>(
        &self,
        draft: DocumentDraft<S>,
        now: DateTime<Utc>,
    ) -> Result<(Store, i64), StoreError> {
        draft.validate()?;
        let id = next_id(
            S::documents(self).iter().map(|d| d.id),
            now,
            entity_kind(S::KIND),
        )?;
        let mut document = Document {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            client_id: draft.client_id,
            line_items: draft.numbered_line_items(),
            date: now.date_naive(),
            status: draft.status,
            total_amount: 0.0,
        };
        document.recompute_total();

        let mut next = self.clone();
        S::documents_mut(&mut next).push(document);
        Ok((next, id))
    }

    /// Replaces every editable field of the document and recomputes its
    /// total. `id` and `date` are kept.
    pub fn update_document<S: DocumentCollection>(
        &self,
        id: i64,
        draft: DocumentDraft<S>,
    ) -> Result<Store, StoreError> {
        draft.validate()?;
        let pos = S::documents(self)
            .iter()
            .position(|d| d.id == id)
            .ok_or(StoreError::NotFound {
                kind: entity_kind(S::KIND),
                id,
            })?;

        let mut next = self.clone();
        let document = &mut S::documents_mut(&mut next)[pos];
        document.title = draft.title.clone();
        document.description = draft.description.clone();
        document.client_id = draft.client_id;
        document.status = draft.status;
        document.line_items = draft.numbered_line_items();
        document.recompute_total();
        Ok(next)
    }

    pub fn delete_document<S: DocumentCollection>(&self, id: i64) -> Result<Store, StoreError> {
        if self.document::<S>(id).is_none() {
            return Err(StoreError::NotFound {
                kind: entity_kind(S::KIND),
                id,
            });
        }
        let mut next = self.clone();
        S::documents_mut(&mut next).retain(|d| d.id != id);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn client_draft(name: &str) -> ClientDraft {
        ClientDraft {
            name: name.to_string(),
            email: format!("{}@example.test", name.to_lowercase()),
            ..ClientDraft::default()
        }
    }

    fn quote_draft(title: &str, client_id: i64, items: &[(u32, f64)]) -> DocumentDraft<QuoteStatus> {
        DocumentDraft {
            title: title.to_string(),
            description: format!("{} description", title),
            client_id: Some(client_id),
            line_items: items
                .iter()
                .map(|(quantity, unit_price)| LineItemDraft {
                    description: "work".to_string(),
                    quantity: *quantity,
                    unit_price: *unit_price,
                })
                .collect(),
            status: QuoteStatus::Pending,
        }
    }

    #[test]
    fn add_quote_computes_total_and_assigns_date() {
        let (store, client_id) = Store::default().add_client(client_draft("Acme"), at(0)).unwrap();
        let (store, id) = store
            .add_quote(quote_draft("Deck", client_id, &[(2, 50.0), (1, 100.0)]), at(5))
            .unwrap();

        let quote = store.quote(id).unwrap();
        assert_eq!(quote.total_amount, 200.0);
        assert_eq!(quote.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(quote.id, at(5).timestamp_millis());
    }

    #[test]
    fn add_never_reuses_an_id_and_leaves_previous_snapshot_alone() {
        let empty = Store::default();
        let (one, first) = empty.add_client(client_draft("Acme"), at(0)).unwrap();
        // Same millisecond: the timestamp is taken, so the next free id is used.
        let (two, second) = one.add_client(client_draft("Globex"), at(0)).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, first + 1);
        assert!(empty.clients().is_empty());
        assert_eq!(one.clients().len(), 1);
        assert_eq!(two.clients()[0], one.clients()[0]);
    }

    #[test]
    fn update_replaces_fields_but_keeps_id_and_date() {
        let (store, id) = Store::default()
            .add_invoice(
                DocumentDraft {
                    title: "March".to_string(),
                    description: "Consulting".to_string(),
                    client_id: Some(1),
                    line_items: vec![LineItemDraft {
                        description: "Hours".to_string(),
                        quantity: 10,
                        unit_price: 80.0,
                    }],
                    status: InvoiceStatus::Pending,
                },
                at(0),
            )
            .unwrap();
        let (store, other) = store
            .add_invoice(
                DocumentDraft {
                    title: "April".to_string(),
                    description: "Consulting".to_string(),
                    client_id: Some(1),
                    line_items: Vec::new(),
                    status: InvoiceStatus::Pending,
                },
                at(60),
            )
            .unwrap();
        let before = store.invoice(id).unwrap().clone();

        let mut draft = DocumentDraft::from(&before);
        draft.title = "March (revised)".to_string();
        draft.status = InvoiceStatus::Paid;
        draft.line_items.push(LineItemDraft {
            description: "Travel".to_string(),
            quantity: 1,
            unit_price: 45.5,
        });
        let updated = store.update_invoice(id, draft).unwrap();

        let after = updated.invoice(id).unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.date, before.date);
        assert_eq!(after.title, "March (revised)");
        assert_eq!(after.status, InvoiceStatus::Paid);
        assert_eq!(after.total_amount, 845.5);
        assert_eq!(after.line_items[1].id, 2);
        assert_eq!(updated.invoice(other), store.invoice(other));
    }

    #[test]
    fn delete_removes_exactly_the_target() {
        let (store, a) = Store::default()
            .add_quote(quote_draft("A", 1, &[(1, 1.0)]), at(0))
            .unwrap();
        let (store, b) = store.add_quote(quote_draft("B", 1, &[(1, 2.0)]), at(1)).unwrap();
        let (store, c) = store.add_quote(quote_draft("C", 1, &[(1, 3.0)]), at(2)).unwrap();

        let next = store.delete_quote(b).unwrap();

        let ids: Vec<i64> = next.quotes().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(store.quotes().len(), 3);
    }

    #[test]
    fn unknown_id_reports_not_found() {
        let store = Store::default();
        assert_eq!(
            store.delete_invoice(42),
            Err(StoreError::NotFound {
                kind: EntityKind::Invoice,
                id: 42
            })
        );
        assert_eq!(
            store.update_client(7, client_draft("Acme")),
            Err(StoreError::NotFound {
                kind: EntityKind::Client,
                id: 7
            })
        );
    }

    #[test]
    fn invalid_draft_is_rejected_without_change() {
        let store = Store::default();
        let mut draft = client_draft("Acme");
        draft.name.clear();
        assert_eq!(
            store.add_client(draft, at(0)),
            Err(StoreError::MissingField("name"))
        );
    }

    #[test]
    fn from_parts_recomputes_stale_totals() {
        let (store, id) = Store::default()
            .add_quote(quote_draft("Deck", 1, &[(2, 50.0), (1, 100.0)]), at(0))
            .unwrap();
        let mut quotes = store.quotes().to_vec();
        quotes[0].total_amount = 1.0;

        let reloaded = Store::from_parts(None, Vec::new(), quotes, Vec::new());
        assert_eq!(reloaded.quote(id).unwrap().total_amount, 200.0);
    }

    #[test]
    fn from_parts_numbers_line_items_by_position() {
        let (store, id) = Store::default()
            .add_quote(quote_draft("Deck", 1, &[(2, 50.0), (1, 100.0)]), at(0))
            .unwrap();
        let mut quotes = store.quotes().to_vec();
        quotes[0].line_items[0].id = 0;
        quotes[0].line_items[1].id = 0;

        let reloaded = Store::from_parts(None, Vec::new(), quotes, Vec::new());
        let ids: Vec<u32> = reloaded.quote(id).unwrap().line_items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn add_fails_cleanly_when_ids_are_exhausted() {
        let (store, _) = Store::default().add_client(client_draft("Acme"), at(0)).unwrap();
        let mut clients = store.clients().to_vec();
        clients[0].id = i64::MAX;
        let store = Store::from_parts(None, clients, Vec::new(), Vec::new());

        assert_eq!(
            store.add_client(client_draft("Globex"), at(1)),
            Err(StoreError::IdsExhausted(EntityKind::Client))
        );

        let mut quotes = Store::default()
            .add_quote(quote_draft("Deck", 1, &[(1, 1.0)]), at(0))
            .unwrap()
            .0
            .quotes()
            .to_vec();
        quotes[0].id = i64::MAX;
        let store = Store::from_parts(None, Vec::new(), quotes, Vec::new());
        assert_eq!(
            store.add_quote(quote_draft("Fence", 1, &[(1, 1.0)]), at(1)),
            Err(StoreError::IdsExhausted(EntityKind::Quote))
        );
    }

    #[test]
    fn business_info_is_replaced_wholesale() {
        let info = BusinessInfo {
            name: "Cedar & Co".to_string(),
            website: "cedar.test".to_string(),
            ..BusinessInfo::default()
        };
        let store = Store::default().update_business_info(info.clone());
        assert_eq!(store.business_info(), Some(&info));
        assert_eq!(Store::default().business_info(), None);
    }
}
