//! Asset fields of a content form
//!
//! A record is only submitted once every asset it requires has a reference,
//! either freshly uploaded or, when editing, carried over from the stored
//! record.

use crate::asset::types::{AssetRef, AssetSlot, ContentKind};
use crate::error::{Result, UploadError};
use crate::upload::UploadResult;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetForm {
    kind: ContentKind,
    uploaded: BTreeMap<AssetSlot, AssetRef>,
    existing: BTreeMap<AssetSlot, AssetRef>,
}

impl AssetForm {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            uploaded: BTreeMap::new(),
            existing: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Record a freshly uploaded asset
    pub fn set(&mut self, slot: AssetSlot, asset: AssetRef) -> &mut Self {
        self.uploaded.insert(slot, asset);
        self
    }

    /// Record the asset URI of a finished upload
    ///
    /// Fails with `MissingAssetUri` when the endpoint returned no URI, so the
    /// slot stays empty and the form cannot be submitted.
    pub fn set_from_upload(
        &mut self,
        slot: AssetSlot,
        result: &UploadResult,
        uri_field: &str,
    ) -> Result<&mut Self> {
        let uri = result.require_asset_uri(uri_field)?;
        Ok(self.set(slot, AssetRef::new(uri)))
    }

    /// Record the value already stored on the record being edited
    pub fn keep_existing(&mut self, slot: AssetSlot, asset: AssetRef) -> &mut Self {
        self.existing.insert(slot, asset);
        self
    }

    /// Clear freshly uploaded assets, as when a form is reset
    pub fn reset(&mut self) {
        self.uploaded.clear();
    }

    /// Effective value of a slot, preferring a fresh upload
    pub fn get(&self, slot: AssetSlot) -> Option<&AssetRef> {
        self.uploaded.get(&slot).or_else(|| self.existing.get(&slot))
    }

    /// Refuse creation unless every required slot has a fresh upload
    pub fn validate_for_create(&self) -> Result<()> {
        for slot in self.kind.required_slots() {
            if !self.uploaded.contains_key(slot) {
                return Err(UploadError::missing_asset(slot.field_name()));
            }
        }
        Ok(())
    }

    /// Refuse an update unless every required slot has a fresh or stored value
    pub fn validate_for_update(&self) -> Result<()> {
        for slot in self.kind.required_slots() {
            if self.get(*slot).is_none() {
                return Err(UploadError::missing_asset(slot.field_name()));
            }
        }
        Ok(())
    }

    /// Asset fields for the record payload, e.g. `{"file_uri": "..."}`
    pub fn to_fields(&self) -> Map<String, Value> {
        self.kind
            .required_slots()
            .iter()
            .filter_map(|slot| {
                self.get(*slot)
                    .map(|asset| (slot.field_name().to_string(), Value::from(asset.as_str())))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_all_assets() {
        let mut form = AssetForm::new(ContentKind::Book);
        form.set(AssetSlot::File, AssetRef::new("uploads/book.pdf"));
        assert!(matches!(
            form.validate_for_create(),
            Err(UploadError::MissingAsset { ref field }) if field == "cover_uri"
        ));

        form.set(AssetSlot::Cover, AssetRef::new("uploads/cover.png"));
        assert!(form.validate_for_create().is_ok());

        let fields = form.to_fields();
        assert_eq!(fields["file_uri"], "uploads/book.pdf");
        assert_eq!(fields["cover_uri"], "uploads/cover.png");
    }

    #[test]
    fn test_update_falls_back_to_existing() {
        let mut form = AssetForm::new(ContentKind::VideoDocument);
        form.keep_existing(AssetSlot::File, AssetRef::new("uploads/old.pdf"));
        assert!(form.validate_for_create().is_err());
        assert!(form.validate_for_update().is_ok());
        assert_eq!(form.to_fields()["file_uri"], "uploads/old.pdf");

        form.set(AssetSlot::File, AssetRef::new("uploads/new.pdf"));
        assert_eq!(form.to_fields()["file_uri"], "uploads/new.pdf");

        form.reset();
        assert_eq!(
            form.get(AssetSlot::File),
            Some(&AssetRef::new("uploads/old.pdf"))
        );
    }

    #[test]
    fn test_upload_without_uri_leaves_slot_empty() {
        let mut form = AssetForm::new(ContentKind::Video);
        let result = UploadResult::new("intro.mp4", 10, 1);
        assert!(matches!(
            form.set_from_upload(AssetSlot::Video, &result, "fileUrl"),
            Err(UploadError::MissingAssetUri { .. })
        ));
        assert!(form.validate_for_create().is_err());

        let result = result.asset_uri(Some("videos/intro.mp4".to_string()));
        form.set_from_upload(AssetSlot::Video, &result, "fileUrl")
            .unwrap();
        assert!(form.validate_for_create().is_ok());
    }

    #[test]
    fn test_lecturer_needs_no_assets() {
        let form = AssetForm::new(ContentKind::Lecturer);
        assert!(form.validate_for_create().is_ok());
        assert!(form.to_fields().is_empty());
    }
}
