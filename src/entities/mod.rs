pub mod prelude;

pub mod album_photos;
pub mod albums;
pub mod libraries;
pub mod photo_tags;
pub mod photos;
pub mod tags;
