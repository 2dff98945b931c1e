pub mod popup;
pub mod selection;
