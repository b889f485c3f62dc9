pub mod app;
pub mod hub;
pub mod theme;
pub mod wheel;
