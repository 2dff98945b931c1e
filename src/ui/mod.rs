pub mod business_info_wizard;
pub mod client_wizard;
pub mod clients;
pub mod components;
pub mod dashboard;
pub mod document_wizard;
pub mod documents;

/// Shown whenever a form is saved with a required field left blank.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill out all required fields.";
