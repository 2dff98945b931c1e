use super::{DocumentCollection, Store};
use crate::models::{Client, ClientStatus, Document, InvoiceStatus, QuoteStatus, Status};

/// "All" or one specific status. Cycles All -> each status -> All.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: Status> StatusFilter<S> {
    pub fn matches(&self, status: S) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    pub fn cycle(self) -> Self {
        let all = S::all();
        match self {
            StatusFilter::All => all.first().map_or(StatusFilter::All, |s| StatusFilter::Only(*s)),
            StatusFilter::Only(current) => {
                let pos = all.iter().position(|s| *s == current).unwrap_or(0);
                all.get(pos + 1).map_or(StatusFilter::All, |s| StatusFilter::Only(*s))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFilter {
    pub status: StatusFilter<ClientStatus>,
    pub search: String,
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        let search = self.search.trim().to_lowercase();
        self.status.matches(client.status)
            && (search.is_empty() || client.name.to_lowercase().contains(&search))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusTally<S> {
    pub status: S,
    pub count: usize,
    pub amount: f64,
}

/// Dashboard figures, derived from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub clients_total: usize,
    pub clients_active: usize,
    pub quotes: Vec<StatusTally<QuoteStatus>>,
    pub invoices: Vec<StatusTally<InvoiceStatus>>,
}

fn tally<S: DocumentCollection>(documents: &[Document<S>]) -> Vec<StatusTally<S>> {
    S::all()
        .iter()
        .map(|status| {
            let matching = documents.iter().filter(|d| d.status == *status);
            let (count, amount) =
                matching.fold((0, 0.0), |(count, amount), d| (count + 1, amount + d.total_amount));
            StatusTally {
                status: *status,
                count,
                amount,
            }
        })
        .collect()
}

impl Store {
    pub fn filtered_clients(&self, filter: &ClientFilter) -> Vec<&Client> {
        self.clients().iter().filter(|c| filter.matches(c)).collect()
    }

    pub fn filtered_documents<S: DocumentCollection>(
        &self,
        filter: StatusFilter<S>,
    ) -> Vec<&Document<S>> {
        self.documents::<S>()
            .iter()
            .filter(|d| filter.matches(d.status))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            clients_total: self.clients().len(),
            clients_active: self
                .clients()
                .iter()
                .filter(|c| c.status == ClientStatus::Active)
                .count(),
            quotes: tally(self.quotes()),
            invoices: tally(self.invoices()),
        }
    }
}
