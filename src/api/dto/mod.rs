//! Data Transfer Objects for REST request/response serialization.

pub mod map_dto;

pub use map_dto::*;
