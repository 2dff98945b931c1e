use crate::error::StoreError;
use crate::models::{BusinessInfo, Client, ClientStatus, Document, DocumentStatus, LineItem};
use crate::totals;

/// Form contents for a client, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: ClientStatus,
}

impl ClientDraft {
    pub fn validate(&self) -> Result<(), StoreError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        Ok(())
    }

    pub(crate) fn into_client(self, id: i64) -> Client {
        Client {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            status: self.status,
        }
    }
}

impl From<&Client> for ClientDraft {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
            status: client.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl Default for LineItemDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: 1,
            unit_price: 0.0,
        }
    }
}

impl LineItemDraft {
    pub fn amount(&self) -> f64 {
        totals::line_amount(self.quantity, self.unit_price)
    }
}

/// Form contents for a quote or invoice. Id, date and total are not part of
/// the draft: the store assigns the first two and derives the last.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft<S> {
    pub title: String,
    pub description: String,
    pub client_id: Option<i64>,
    pub line_items: Vec<LineItemDraft>,
    pub status: S,
}

impl<S: DocumentStatus> Default for DocumentDraft<S> {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            client_id: None,
            line_items: vec![LineItemDraft::default()],
            status: S::default(),
        }
    }
}

impl<S: DocumentStatus> DocumentDraft<S> {
    pub fn validate(&self) -> Result<(), StoreError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        if self.client_id.is_none() {
            return Err(StoreError::MissingField("client"));
        }
        for (index, item) in self.line_items.iter().enumerate() {
            if !item.unit_price.is_finite() || item.unit_price < 0.0 {
                return Err(StoreError::InvalidLineItem { position: index + 1 });
            }
        }
        Ok(())
    }

    /// Live total shown while the form is being edited.
    pub fn total(&self) -> f64 {
        totals::total(&self.numbered_line_items())
    }

    /// Line item ids are their 1-based position, reassigned on every save.
    pub(crate) fn numbered_line_items(&self) -> Vec<LineItem> {
        self.line_items
            .iter()
            .enumerate()
            .map(|(index, item)| LineItem {
                id: index as u32 + 1,
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect()
    }
}

impl<S: DocumentStatus> From<&Document<S>> for DocumentDraft<S> {
    fn from(doc: &Document<S>) -> Self {
        Self {
            title: doc.title.clone(),
            description: doc.description.clone(),
            client_id: doc.client_id,
            line_items: doc
                .line_items
                .iter()
                .map(|item| LineItemDraft {
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            status: doc.status,
        }
    }
}

/// The business profile form has no required fields.
pub fn business_info_is_empty(info: &BusinessInfo) -> bool {
    [&info.name, &info.email, &info.phone, &info.address, &info.website]
        .iter()
        .all(|value| value.trim().is_empty())
}

fn require(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        Err(StoreError::MissingField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteStatus;

    fn quote_draft() -> DocumentDraft<QuoteStatus> {
        DocumentDraft {
            title: "Deck".to_string(),
            description: "Cedar deck".to_string(),
            client_id: Some(7),
            line_items: vec![
                LineItemDraft {
                    description: "Boards".to_string(),
                    quantity: 2,
                    unit_price: 50.0,
                },
                LineItemDraft {
                    description: "Labour".to_string(),
                    quantity: 1,
                    unit_price: 100.0,
                },
            ],
            status: QuoteStatus::Pending,
        }
    }

    #[test]
    fn client_requires_name_and_email_only() {
        let mut draft = ClientDraft {
            name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
            ..ClientDraft::default()
        };
        assert_eq!(draft.validate(), Ok(()));

        draft.email = "   ".to_string();
        assert_eq!(draft.validate(), Err(StoreError::MissingField("email")));
    }

    #[test]
    fn document_requires_title_description_and_client() {
        let mut draft = quote_draft();
        assert_eq!(draft.validate(), Ok(()));

        draft.client_id = None;
        assert_eq!(draft.validate(), Err(StoreError::MissingField("client")));

        draft.title.clear();
        assert_eq!(draft.validate(), Err(StoreError::MissingField("title")));
    }

    #[test]
    fn negative_or_nan_price_is_rejected() {
        let mut draft = quote_draft();
        draft.line_items[1].unit_price = -1.0;
        assert_eq!(
            draft.validate(),
            Err(StoreError::InvalidLineItem { position: 2 })
        );

        draft.line_items[1].unit_price = f64::NAN;
        assert!(draft.validate().is_err());
    }

    #[test]
    fn line_items_are_numbered_by_position() {
        let items = quote_draft().numbered_line_items();
        let ids: Vec<u32> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(quote_draft().total(), 200.0);
    }

    #[test]
    fn live_total_matches_the_saved_document_total() {
        let mut draft = quote_draft();
        draft.line_items[0].unit_price = 0.1;
        draft.line_items[1].quantity = 3;
        draft.line_items[1].unit_price = 0.2;

        let items = draft.numbered_line_items();
        assert_eq!(draft.total(), totals::total(&items));
        assert_eq!(draft.line_items[1].amount(), items[1].amount());
    }
}
