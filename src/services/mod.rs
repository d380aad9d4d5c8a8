pub mod library_service;
pub mod photo_service;
pub mod storage;
