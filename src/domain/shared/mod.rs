pub mod error_dto;
pub mod owner;
pub mod usage_dto;

pub use owner::OwnerId;
