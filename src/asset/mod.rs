//! Asset references for content records
//!
//! Uploads end in an asset URI; records such as books and videos store those
//! URIs in fixed fields and cannot be created without the ones they require.

pub mod form;
pub mod types;

pub use form::AssetForm;
pub use types::{AssetRef, AssetSlot, ContentKind};
