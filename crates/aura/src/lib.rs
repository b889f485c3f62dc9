pub mod config;
pub mod events;
pub mod gui;
pub mod link;
pub mod sys;
