pub mod interface;
pub mod session;
