pub mod airports;
pub mod email;
pub mod forms;
pub mod health;
