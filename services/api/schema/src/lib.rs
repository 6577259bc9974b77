//! sea-orm entities for the Courier API database.

pub mod email_histories;
pub mod gmail_credentials;
pub mod users;
