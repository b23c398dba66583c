pub mod orchestrator;
pub mod telegram_service;
