//! Domain error types.

mod configuration_error;
mod fetch_error;
mod image_load_error;
mod store_error;
mod upload_error;

pub use configuration_error::ConfigurationError;
pub use fetch_error::FetchError;
pub use image_load_error::ImageLoadError;
pub use store_error::StoreError;
pub use upload_error::UploadError;
