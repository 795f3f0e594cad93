pub mod health;
pub mod landing;
pub mod tables;
