pub mod attachments;
pub mod auth;
pub mod decide;
pub mod queue;
pub mod server;
pub mod show;
pub mod signature;
pub mod submit;
