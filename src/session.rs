//! The owner of the current snapshot.
//!
//! Every change goes through here: the store produces the next snapshot,
//! the affected storage keys are written, the snapshot becomes current, and
//! the backend (when configured) is told about the change. Backend failures
//! are logged and never roll anything back.

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::db::{self, Database, StorageKey};
use crate::error::StoreError;
use crate::models::{BusinessInfo, InvoiceStatus, QuoteStatus};
use crate::store::{ClientDraft, DocumentCollection, DocumentDraft, Store};

pub struct Session {
    store: Store,
    db: Database,
    api: Option<ApiClient>,
}

/// An update or delete aimed at an entry that no longer exists leaves the
/// snapshot as it is.
fn unless_missing(result: Result<Store, StoreError>) -> Result<Option<Store>, StoreError> {
    match result {
        Ok(next) => Ok(Some(next)),
        Err(e @ StoreError::NotFound { .. }) => {
            warn!(error = %e, "Ignoring change to a missing entry");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl Session {
    /// Loads local storage and, with a backend configured, pulls from it.
    pub async fn open(config: &Config) -> Result<Self> {
        let db = db::init(config).await?;
        let api = config.api_base_url.as_deref().map(ApiClient::new).transpose()?;

        let mut session = Self::new(db, api).await?;
        session.pull().await?;
        Ok(session)
    }

    pub async fn new(db: Database, api: Option<ApiClient>) -> Result<Self> {
        let store = db.load_store().await?;
        info!(
            clients = store.clients().len(),
            quotes = store.quotes().len(),
            invoices = store.invoices().len(),
            "Loaded local storage"
        );
        Ok(Self { store, db, api })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn has_backend(&self) -> bool {
        self.api.is_some()
    }

    /// Merges the backend's collections over the local ones and saves the
    /// result. Returns `false` when no backend is configured.
    pub async fn pull(&mut self) -> Result<bool> {
        let Some(api) = &self.api else {
            return Ok(false);
        };
        let next = api.pull(&self.store).await;
        self.commit(next, &StorageKey::ALL).await?;
        Ok(true)
    }

    /// Replaces the whole snapshot, e.g. with demo data.
    pub async fn replace(&mut self, next: Store) -> Result<()> {
        self.db.save_store(&next).await?;
        self.store = next;
        Ok(())
    }

    async fn commit(&mut self, next: Store, keys: &[StorageKey]) -> Result<()> {
        self.db.save_keys(&next, keys).await?;
        self.store = next;
        Ok(())
    }

    // Business info

    pub async fn update_business_info(&mut self, info: BusinessInfo) -> Result<()> {
        let next = self.store.update_business_info(info);
        self.commit(next, &[StorageKey::BusinessInfo]).await?;

        if let (Some(api), Some(info)) = (&self.api, self.store.business_info()) {
            if let Err(e) = api.save_business_info(info).await {
                warn!(error = %e, "Failed to push business info");
            }
        }
        Ok(())
    }

    // Clients

    pub async fn add_client(&mut self, draft: ClientDraft) -> Result<i64> {
        let (next, id) = self.store.add_client(draft, Utc::now())?;
        self.commit(next, &[StorageKey::Clients]).await?;
        info!(id, "Client added");

        if let (Some(api), Some(client)) = (&self.api, self.store.client(id)) {
            if let Err(e) = api.create_client(client).await {
                warn!(id, error = %e, "Failed to push new client");
            }
        }
        Ok(id)
    }

    pub async fn update_client(&mut self, id: i64, draft: ClientDraft) -> Result<()> {
        let Some(next) = unless_missing(self.store.update_client(id, draft))? else {
            return Ok(());
        };
        self.commit(next, &[StorageKey::Clients]).await?;

        if let (Some(api), Some(client)) = (&self.api, self.store.client(id)) {
            if let Err(e) = api.update_client(client).await {
                warn!(id, error = %e, "Failed to push client update");
            }
        }
        Ok(())
    }

    pub async fn delete_client(&mut self, id: i64) -> Result<()> {
        let Some(next) = unless_missing(self.store.delete_client(id))? else {
            return Ok(());
        };
        self.commit(next, &[StorageKey::Clients]).await?;
        info!(id, "Client deleted");

        if let Some(api) = &self.api {
            if let Err(e) = api.delete_client(id).await {
                warn!(id, error = %e, "Failed to push client deletion");
            }
        }
        Ok(())
    }

    // Quotes and invoices

    pub async fn add_quote(&mut self, draft: DocumentDraft<QuoteStatus>) -> Result<i64> {
        self.add_document(draft).await
    }

    pub async fn add_invoice(&mut self, draft: DocumentDraft<InvoiceStatus>) -> Result<i64> {
        self.add_document(draft).await
    }

    pub async fn add_document<S: DocumentCollection>(
        &mut self,
        draft: DocumentDraft<S>,
    ) -> Result<i64> {
        let (next, id) = self.store.add_document(draft, Utc::now())?;
        self.commit(next, &[StorageKey::from(S::KIND)]).await?;
        info!(id, kind = %S::KIND, "Document added");

        if let (Some(api), Some(document)) = (&self.api, self.store.document::<S>(id)) {
            if let Err(e) = api.create_document(document).await {
                warn!(id, kind = %S::KIND, error = %e, "Failed to push new document");
            }
        }
        Ok(id)
    }

    pub async fn update_document<S: DocumentCollection>(
        &mut self,
        id: i64,
        draft: DocumentDraft<S>,
    ) -> Result<()> {
        let Some(next) = unless_missing(self.store.update_document(id, draft))? else {
            return Ok(());
        };
        self.commit(next, &[StorageKey::from(S::KIND)]).await?;

        if let (Some(api), Some(document)) = (&self.api, self.store.document::<S>(id)) {
            if let Err(e) = api.update_document(document).await {
                warn!(id, kind = %S::KIND, error = %e, "Failed to push document update");
            }
        }
        Ok(())
    }

    pub async fn delete_document<S: DocumentCollection>(&mut self, id: i64) -> Result<()> {
        let Some(next) = unless_missing(self.store.delete_document::<S>(id))? else {
            return Ok(());
        };
        self.commit(next, &[StorageKey::from(S::KIND)]).await?;
        info!(id, kind = %S::KIND, "Document deleted");

        if let Some(api) = &self.api {
            if let Err(e) = api.delete_document::<S>(id).await {
                warn!(id, kind = %S::KIND, error = %e, "Failed to push document deletion");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LineItemDraft;
    use chrono::TimeZone;
    use tokio::net::TcpListener;

    async fn empty_session() -> Session {
        Session::new(Database::in_memory().await.unwrap(), None)
            .await
            .unwrap()
    }

    fn acme() -> ClientDraft {
        ClientDraft {
            name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
            ..ClientDraft::default()
        }
    }

    #[tokio::test]
    async fn changes_are_persisted_before_they_become_current() {
        let mut session = empty_session().await;

        let client_id = session.add_client(acme()).await.unwrap();
        let quote_id = session
            .add_quote(DocumentDraft {
                title: "Deck".to_string(),
                description: "Cedar deck".to_string(),
                client_id: Some(client_id),
                line_items: vec![LineItemDraft {
                    description: "Boards".to_string(),
                    quantity: 4,
                    unit_price: 25.0,
                }],
                status: QuoteStatus::Pending,
            })
            .await
            .unwrap();

        let reloaded = session.db.load_store().await.unwrap();
        assert_eq!(&reloaded, session.store());
        assert_eq!(reloaded.quote(quote_id).unwrap().total_amount, 100.0);
        assert!(!session.has_backend());
    }

    #[tokio::test]
    async fn missing_entries_are_ignored() {
        let mut session = empty_session().await;
        let id = session.add_client(acme()).await.unwrap();
        let before = session.store().clone();

        session.update_client(id + 1, acme()).await.unwrap();
        session.delete_document::<InvoiceStatus>(99).await.unwrap();

        assert_eq!(session.store(), &before);
    }

    #[tokio::test]
    async fn invalid_draft_is_an_error_and_nothing_is_saved() {
        let mut session = empty_session().await;

        let err = session
            .add_invoice(DocumentDraft::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::MissingField("title"))
        );
        assert!(session.store().invoices().is_empty());
        assert_eq!(session.db.get_item(StorageKey::Invoices).await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_and_delete_write_through() {
        let mut session = empty_session().await;
        let demo = Store::demo(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap();
        session.replace(demo.clone()).await.unwrap();

        let paid = demo.invoices()[0].id;
        session.delete_document::<InvoiceStatus>(paid).await.unwrap();

        let reloaded = session.db.load_store().await.unwrap();
        assert_eq!(reloaded.invoices().len(), 1);
        assert_eq!(reloaded.business_info(), demo.business_info());
        assert!(!session.pull().await.unwrap());
    }

    /// A backend address with nothing listening behind it.
    async fn unreachable_backend() -> ApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        ApiClient::new(&format!("http://{}", addr)).unwrap()
    }

    #[tokio::test]
    async fn failed_pushes_do_not_undo_local_changes() {
        let db = Database::in_memory().await.unwrap();
        let mut session = Session::new(db, Some(unreachable_backend().await))
            .await
            .unwrap();
        assert!(session.has_backend());

        let client_id = session.add_client(acme()).await.unwrap();
        let invoice_id = session
            .add_invoice(DocumentDraft {
                title: "March".to_string(),
                description: "Consulting".to_string(),
                client_id: Some(client_id),
                line_items: vec![LineItemDraft {
                    description: "Hours".to_string(),
                    quantity: 2,
                    unit_price: 80.0,
                }],
                status: InvoiceStatus::Pending,
            })
            .await
            .unwrap();
        assert!(session.store().invoice(invoice_id).is_some());

        session
            .delete_document::<InvoiceStatus>(invoice_id)
            .await
            .unwrap();

        assert!(session.store().client(client_id).is_some());
        assert!(session.store().invoices().is_empty());
        let reloaded = session.db.load_store().await.unwrap();
        assert_eq!(&reloaded, session.store());
    }
}
