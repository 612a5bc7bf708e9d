pub mod airports;
pub mod mail;
