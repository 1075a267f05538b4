pub mod chain;
pub mod complaints;
pub mod health;
pub mod metrics;
