use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DocumentStatus, LineItem};
use crate::totals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Quote,
    Invoice,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Quote => "Quote",
            DocumentKind::Invoice => "Invoice",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            DocumentKind::Quote => "Quotes",
            DocumentKind::Invoice => "Invoices",
        }
    }

    pub fn api_path(self) -> &'static str {
        match self {
            DocumentKind::Quote => "/api/quotes",
            DocumentKind::Invoice => "/api/invoices",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A priced document issued to a client: a quote or an invoice, depending
/// on the status type.
///
/// `total_amount` is derived from `line_items`. It is serialized so that
/// consumers of the JSON see it, but it is recomputed on every write and on
/// load; a stored value is never trusted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", bound = "S: DocumentStatus")]
pub struct Document<S> {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: S,
    #[serde(default)]
    pub total_amount: f64,
}

impl<S: DocumentStatus> Document<S> {
    pub fn kind(&self) -> DocumentKind {
        S::KIND
    }

    pub(crate) fn recompute_total(&mut self) {
        self.total_amount = totals::total(&self.line_items);
    }

    pub(crate) fn renumber_line_items(&mut self) {
        for (position, item) in self.line_items.iter_mut().enumerate() {
            item.id = position as u32 + 1;
        }
    }
}
