use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

use super::DocumentKind;

/// A closed set of states an entity can be in, listed in display order.
pub trait Status: Copy + Eq + Default + Debug + Send + Sync + 'static {
    fn all() -> &'static [Self];

    fn label(self) -> &'static str;

    /// The status after this one, wrapping around. Used by pickers.
    fn next(self) -> Self {
        let all = Self::all();
        let pos = all.iter().position(|s| *s == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }

    fn previous(self) -> Self {
        let all = Self::all();
        let pos = all.iter().position(|s| *s == self).unwrap_or(0);
        all[(pos + all.len() - 1) % all.len()]
    }
}

/// Status of a priced document. Ties the status type to the kind of
/// document it belongs to, so quotes and invoices share one `Document` type.
pub trait DocumentStatus: Status + Serialize + DeserializeOwned {
    const KIND: DocumentKind;
}
