//! Profile photo library: presence index, storage, change watching.

pub mod index;
pub mod store;
pub mod watcher;

pub use index::{photo_key, PhotoEntry, PhotoIndex, PhotoLibrary};
pub use store::{delete_photo, save_photo, PhotoSizes};
pub use watcher::PhotoWatcher;
