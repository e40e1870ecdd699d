pub mod cache;
pub mod document;
pub mod events;
pub mod multipart;
pub mod remote;
pub mod service;
