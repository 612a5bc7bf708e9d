pub mod airport;
pub mod delivery;
pub mod message;
pub mod request_log;
pub mod submission;
