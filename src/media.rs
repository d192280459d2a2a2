pub mod bitmap_cache;
pub mod image_loader;

pub use bitmap_cache::{Bitmap, BitmapCache, CacheStats};
pub use image_loader::{ImageError, ImageLoader};
