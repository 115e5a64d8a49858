pub mod ai_service;
pub mod config_service;
pub mod file_service;
pub mod llm_client;
pub mod pdf_service;
pub mod session_service;

#[cfg(test)]
pub mod testing;
