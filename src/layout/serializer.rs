//! Layout (de)serialization.

use crate::error::Result;
use crate::layout::response::LayoutResponse;

/// Turns layout-service payloads into [`LayoutResponse`]s and back.
///
/// Registered once in [`Services`](crate::Services) as
/// `Arc<dyn LayoutSerializer>` and shared by every layout handler.
pub trait LayoutSerializer: Send + Sync + 'static {
    fn deserialize(&self, data: &[u8]) -> Result<LayoutResponse>;
    fn serialize(&self, layout: &LayoutResponse) -> Result<Vec<u8>>;
}

/// The stock JSON serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLayoutSerializer;

impl LayoutSerializer for JsonLayoutSerializer {
    fn deserialize(&self, data: &[u8]) -> Result<LayoutResponse> {
        Ok(serde_json::from_slice(data)?)
    }

    fn serialize(&self, layout: &LayoutResponse) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(layout)?)
    }
}
