// PDF processing modules
pub mod extract;
pub mod images;
pub mod remover;

#[cfg(test)]
pub(crate) mod test_support;

pub use extract::extract_text;
pub use images::ImageCleaner;
pub use remover::{RemovalReport, WatermarkRemover};
