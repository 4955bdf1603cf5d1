pub mod health;
pub mod scoring;
pub mod ws;
