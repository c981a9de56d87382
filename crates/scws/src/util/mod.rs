pub mod extract;
pub mod http;
