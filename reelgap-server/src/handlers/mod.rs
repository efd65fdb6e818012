pub mod health;
pub mod mediaserver;
