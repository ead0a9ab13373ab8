// Fingerprinting and thumbnailing of individual files

pub mod cryptographic;
pub mod perceptual;
pub mod thumbnail;

pub use cryptographic::{compute_cryptographic, ContentHash};
pub use perceptual::{calculate_dhash, phash_from_file, PHash};
pub use thumbnail::{fit_within, JpegThumbnailer, ThumbnailGenerator};
