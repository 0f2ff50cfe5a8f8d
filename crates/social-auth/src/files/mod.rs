//! File handling for profile pictures.
//!
//! - [`tokens`]: directory template token replacement
//! - [`transliterate`]: ASCII-safe file and directory names
//! - [`downloader`]: remote downloads into managed storage

pub mod downloader;
pub mod tokens;
pub mod transliterate;

pub use downloader::{
    DEFAULT_MAX_DOWNLOAD_SIZE, FileDownloader, HttpFileDownloader, ManagedFile, split_uri,
};
pub use tokens::{DefaultTokenReplacer, TokenContext, TokenReplacer};
pub use transliterate::{LatinTransliterator, Transliterator};
