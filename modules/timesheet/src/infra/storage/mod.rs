pub mod entities;
pub mod mapper;
pub mod schema;
