// Payload codecs for snapshot fields that are not plain data
use super::error::{SnapshotError, SnapshotResult};
use super::image::Image;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Converts a field value to and from a self-describing byte stream.
pub trait PayloadCodec {
    type Value;

    fn encode(value: &Self::Value) -> SnapshotResult<Vec<u8>>;
    fn decode(bytes: &[u8]) -> SnapshotResult<Self::Value>;
}

/// Raster images are stored as their encoded PNG/JPEG/GIF stream.
pub struct ImageCodec;

impl PayloadCodec for ImageCodec {
    type Value = Image;

    fn encode(value: &Image) -> SnapshotResult<Vec<u8>> {
        Ok(value.bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> SnapshotResult<Image> {
        Image::from_bytes(bytes.to_vec())
    }
}

/// Structured view content is stored as canonical JSON text.
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    type Value = serde_json::Value;

    fn encode(value: &serde_json::Value) -> SnapshotResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(bytes: &[u8]) -> SnapshotResult<serde_json::Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn to_base64<C: PayloadCodec, S: Serializer>(value: &C::Value, serializer: S) -> Result<S::Ok, S::Error> {
    let bytes = C::encode(value).map_err(S::Error::custom)?;
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn from_base64<'de, C: PayloadCodec, D: Deserializer<'de>>(deserializer: D) -> Result<C::Value, D::Error> {
    let text = String::deserialize(deserializer)?;
    let bytes = STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)?;
    C::decode(&bytes).map_err(|e: SnapshotError| D::Error::custom(e))
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_base64::<ImageCodec, S>(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Image {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Image, D::Error> {
        from_base64::<ImageCodec, D>(deserializer)
    }
}

/// `#[serde(with = "...")]` adapter for JSON content.
pub mod json {
    use super::*;

    pub fn serialize<S: Serializer>(value: &serde_json::Value, serializer: S) -> Result<S::Ok, S::Error> {
        to_base64::<JsonCodec, S>(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<serde_json::Value, D::Error> {
        from_base64::<JsonCodec, D>(deserializer)
    }
}
