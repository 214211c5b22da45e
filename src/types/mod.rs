pub mod analysis;
pub mod billing;
pub mod profile;
