pub mod context;
pub mod registry;
pub mod session;
