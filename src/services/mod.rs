pub mod airport_service;
pub mod composer;
pub mod delivery;
pub mod health_service;
pub mod rate_limit_service;
pub mod request_log;
pub mod submission_service;
