pub mod claim;
pub mod config;
pub mod general;
pub mod policy;

pub use claim::Role;
