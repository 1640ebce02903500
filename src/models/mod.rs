pub mod message;
pub mod response;
pub mod result;
