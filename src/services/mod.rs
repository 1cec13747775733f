pub mod api_service;
pub mod feed_service;
