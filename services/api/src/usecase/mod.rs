pub mod auth;
pub mod bulk;
pub mod csv;
pub mod gmail;
pub mod history;
pub mod profile;
