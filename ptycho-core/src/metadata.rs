//! Run-wide parameters recorded on the measurement group.

use crate::schema::{AttrValue, Attributes};
use crate::{FrameGeometry, MetadataConfig, ScanGrid};

/// Name recorded in the `translator` attribute.
pub const TRANSLATOR_NAME: &str = "Ptychography";
/// Name recorded in the `datatype` attribute.
pub const DATA_TYPE: &str = "ptychography";

/// Parameters describing one translated measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementParams {
    pub num_images: usize,
    pub image_size_u: usize,
    pub image_size_v: usize,
    pub num_pixels: usize,
    pub scan_size_x: usize,
    pub scan_size_y: usize,
    pub metadata: MetadataConfig,
}

impl MeasurementParams {
    /// Collects the parameters for a run on `grid` with frames of `geometry`.
    #[must_use]
    pub fn new(geometry: &FrameGeometry, grid: &ScanGrid, metadata: MetadataConfig) -> Self {
        Self {
            num_images: grid.frames_used(),
            image_size_u: geometry.width,
            image_size_v: geometry.height,
            num_pixels: geometry.num_pixels(),
            scan_size_x: grid.side(),
            scan_size_y: grid.side(),
            metadata,
        }
    }

    /// Flattens the parameters into an attribute record.
    #[must_use]
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("num_images".into(), AttrValue::UInt(self.num_images as u64));
        attrs.insert("image_size_u".into(), AttrValue::UInt(self.image_size_u as u64));
        attrs.insert("image_size_v".into(), AttrValue::UInt(self.image_size_v as u64));
        attrs.insert("num_pixels".into(), AttrValue::UInt(self.num_pixels as u64));
        attrs.insert("scan_size_x".into(), AttrValue::UInt(self.scan_size_x as u64));
        attrs.insert("scan_size_y".into(), AttrValue::UInt(self.scan_size_y as u64));
        attrs.insert("translator".into(), AttrValue::Str(TRANSLATOR_NAME.into()));
        attrs.insert("datatype".into(), AttrValue::Str(DATA_TYPE.into()));

        let m = &self.metadata;
        attrs.insert("instrument".into(), AttrValue::Str(m.instrument.clone()));
        attrs.insert("user_name".into(), AttrValue::Str(m.user_name.clone()));
        attrs.insert("sample_name".into(), AttrValue::Str(m.sample_name.clone()));
        attrs.insert(
            "sample_description".into(),
            AttrValue::Str(m.sample_description.clone()),
        );
        attrs
    }
}
