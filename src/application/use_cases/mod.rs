//! Use case implementations.

mod select_avatar_use_case;

pub use select_avatar_use_case::{SelectAvatarKeys, SelectAvatarUseCase, UploadOutcome};
