pub mod compliance;
pub mod user;
