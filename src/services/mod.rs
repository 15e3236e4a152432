pub mod checklist;
pub mod checklist_templates;
pub mod geo;
pub mod mailer;
pub mod password_reset;
pub mod route_data;
pub mod storage;
