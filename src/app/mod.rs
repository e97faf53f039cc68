pub mod routes;
pub mod session;
