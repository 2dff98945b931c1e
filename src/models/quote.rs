use serde::{Deserialize, Serialize};

use super::{Document, DocumentKind, DocumentStatus, Status};

pub type Quote = Document<QuoteStatus>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Status for QuoteStatus {
    fn all() -> &'static [Self] {
        &[QuoteStatus::Pending, QuoteStatus::Approved, QuoteStatus::Rejected]
    }

    fn label(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }
}

impl DocumentStatus for QuoteStatus {
    const KIND: DocumentKind = DocumentKind::Quote;
}
