pub mod health;
pub mod presigned_urls;
pub mod submissions;
