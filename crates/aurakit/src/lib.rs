pub mod accordion;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod control;
pub mod gate;
pub mod macros;
pub mod player;
pub mod rng;
pub mod store;
pub mod wheel;
