pub mod capability;
pub mod middleware;
pub mod session;
