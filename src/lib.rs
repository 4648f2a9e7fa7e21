pub mod ai_client;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod error;
pub mod exchange;
pub mod http_client;
pub mod play;
pub mod playbook;
pub mod provider;
pub mod state;
pub mod workbook_export;
