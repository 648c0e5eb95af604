mod image_fetch_port;
mod json_fetch_port;
mod key_value_store_port;
mod profile_image_port;
mod slot_renderer_port;

pub use image_fetch_port::ImageFetchPort;
pub use json_fetch_port::JsonFetchPort;
pub use key_value_store_port::KeyValueStorePort;
pub use profile_image_port::ProfileImagePort;
pub use slot_renderer_port::SlotRendererPort;
