pub mod checklist;
pub mod media;
pub mod password_reset;
pub mod place;
pub mod session;
pub mod trip;
pub mod user;
