pub use super::album_photos::Entity as AlbumPhotos;
pub use super::albums::Entity as Albums;
pub use super::libraries::Entity as Libraries;
pub use super::photo_tags::Entity as PhotoTags;
pub use super::photos::Entity as Photos;
pub use super::tags::Entity as Tags;
