pub mod auth;
pub mod bulk;
pub mod gmail;
pub mod history;
pub mod profile;
