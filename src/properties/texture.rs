//! Textures, their images and sampling parameters.

use std::collections::BTreeMap;

use byteorder::{BigEndian, ByteOrder};
use serde_json::Value;

use super::{attr_bool, attr_i64, attr_json, attr_str};
use crate::document::Document;
use crate::property::{Literal, Payload};
use crate::util::Result;

property_handle! {
    /// Image data plus its MIME type. Sampling parameters live on the
    /// [`TextureInfo`] that references it from a material.
    Texture => Texture
}

property_handle! {
    /// Per-use texture parameters: UV set and sampler state. Owned by
    /// exactly one material slot.
    TextureInfo => TextureInfo
}

/// Sampler filter and wrap enums.
pub mod sampler {
    pub const NEAREST: u32 = 9728;
    pub const LINEAR: u32 = 9729;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 9984;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 9985;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 9986;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 9987;

    pub const CLAMP_TO_EDGE: u32 = 33071;
    pub const MIRRORED_REPEAT: u32 = 33648;
    pub const REPEAT: u32 = 10497;
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// MIME type sniffed from the leading bytes of an encoded image.
pub fn mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8]) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Pixel dimensions read from a PNG IHDR or a JPEG SOF marker. `None`
/// when the header is unknown or truncated.
pub fn image_size(bytes: &[u8]) -> Option<(u32, u32)> {
    match mime_from_bytes(bytes)? {
        "image/png" => png_size(bytes),
        "image/jpeg" => jpeg_size(bytes),
        _ => None,
    }
}

fn png_size(bytes: &[u8]) -> Option<(u32, u32)> {
    // Signature, IHDR length, "IHDR", width, height.
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return None;
    }
    Some((BigEndian::read_u32(&bytes[16..20]), BigEndian::read_u32(&bytes[20..24])))
}

fn jpeg_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 9 <= bytes.len() {
        if bytes[pos] != 0xff {
            return None;
        }
        let marker = bytes[pos + 1];
        let len = BigEndian::read_u16(&bytes[pos + 2..pos + 4]) as usize;
        // SOF0..SOF15, minus DHT, JPG and DAC.
        if (0xc0..=0xcf).contains(&marker) && !matches!(marker, 0xc4 | 0xc8 | 0xcc) {
            let height = BigEndian::read_u16(&bytes[pos + 5..pos + 7]) as u32;
            let width = BigEndian::read_u16(&bytes[pos + 7..pos + 9]) as u32;
            return Some((width, height));
        }
        pos += 2 + len;
    }
    None
}

impl Texture {
    /// Encoded image bytes.
    pub fn image(self, doc: &Document) -> Option<&[u8]> {
        match doc.graph().payload(self.0) {
            Some(Payload::Image(bytes)) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// Store a copy of the encoded image. The MIME type is sniffed when
    /// none has been set.
    pub fn set_image(self, doc: &mut Document, bytes: &[u8]) -> Result<Self> {
        doc.graph_mut().set_payload(self.0, Payload::Image(bytes.to_vec()))?;
        if self.mime_type(doc).is_empty() {
            if let Some(mime) = mime_from_bytes(bytes) {
                self.set_mime_type(doc, mime)?;
            }
        }
        Ok(self)
    }

    pub fn mime_type(self, doc: &Document) -> &str {
        attr_str(doc, self.0, "mimeType").unwrap_or("")
    }

    pub fn set_mime_type(self, doc: &mut Document, mime_type: &str) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "mimeType", mime_type)?;
        Ok(self)
    }

    pub fn uri(self, doc: &Document) -> &str {
        attr_str(doc, self.0, "uri").unwrap_or("")
    }

    pub fn set_uri(self, doc: &mut Document, uri: &str) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "uri", uri)?;
        Ok(self)
    }

    /// Pixel size read from the image header.
    pub fn size(self, doc: &Document) -> Option<(u32, u32)> {
        self.image(doc).and_then(image_size)
    }
}

fn opt_u32(doc: &Document, id: crate::graph::PropertyId, key: &str) -> Option<u32> {
    attr_i64(doc, id, key).and_then(|v| u32::try_from(v).ok())
}

impl TextureInfo {
    pub fn tex_coord(self, doc: &Document) -> u32 {
        opt_u32(doc, self.0, "texCoord").unwrap_or(0)
    }

    pub fn set_tex_coord(self, doc: &mut Document, tex_coord: u32) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "texCoord", tex_coord)?;
        Ok(self)
    }

    pub fn mag_filter(self, doc: &Document) -> Option<u32> {
        opt_u32(doc, self.0, "magFilter")
    }

    pub fn set_mag_filter(self, doc: &mut Document, filter: Option<u32>) -> Result<Self> {
        self.set_opt(doc, "magFilter", filter)
    }

    pub fn min_filter(self, doc: &Document) -> Option<u32> {
        opt_u32(doc, self.0, "minFilter")
    }

    pub fn set_min_filter(self, doc: &mut Document, filter: Option<u32>) -> Result<Self> {
        self.set_opt(doc, "minFilter", filter)
    }

    pub fn wrap_s(self, doc: &Document) -> u32 {
        opt_u32(doc, self.0, "wrapS").unwrap_or(sampler::REPEAT)
    }

    pub fn set_wrap_s(self, doc: &mut Document, wrap: u32) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "wrapS", wrap)?;
        Ok(self)
    }

    pub fn wrap_t(self, doc: &Document) -> u32 {
        opt_u32(doc, self.0, "wrapT").unwrap_or(sampler::REPEAT)
    }

    pub fn set_wrap_t(self, doc: &mut Document, wrap: u32) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "wrapT", wrap)?;
        Ok(self)
    }

    fn set_opt(self, doc: &mut Document, key: &str, value: Option<u32>) -> Result<Self> {
        match value {
            Some(v) => doc.graph_mut().set_attr(self.0, key, v)?,
            None => doc.graph_mut().set_attr(self.0, key, Literal::Null)?,
        }
        Ok(self)
    }

    /// Opaque extensions of the glTF texture object this slot samples
    /// through, e.g. `EXT_texture_webp`. Image indices inside them are
    /// resolved through [`extension_source`](Self::extension_source).
    pub fn texture_extensions(self, doc: &Document) -> BTreeMap<String, Value> {
        attr_json(doc, self.0, "textureExtensions")
            .and_then(Value::as_object)
            .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn set_texture_extensions(self, doc: &mut Document, extensions: BTreeMap<String, Value>) -> Result<Self> {
        let value = if extensions.is_empty() {
            Literal::Null
        } else {
            Literal::Json(Value::Object(extensions.into_iter().collect()))
        };
        doc.graph_mut().set_attr(self.0, "textureExtensions", value)?;
        Ok(self)
    }

    /// Extras of the glTF texture object.
    pub fn texture_extras(self, doc: &Document) -> Value {
        attr_json(doc, self.0, "textureExtras").cloned().unwrap_or(Value::Null)
    }

    pub fn set_texture_extras(self, doc: &mut Document, extras: Value) -> Result<Self> {
        let value = match extras {
            Value::Null => Literal::Null,
            extras => Literal::Json(extras),
        };
        doc.graph_mut().set_attr(self.0, "textureExtras", value)?;
        Ok(self)
    }

    /// Image named by the `source` of the texture extension `name`.
    pub fn extension_source(self, doc: &Document, name: &str) -> Option<Texture> {
        doc.graph().get_ref_map(self.0, "extensionSources", name).map(Texture)
    }

    pub fn set_extension_source(self, doc: &mut Document, name: &str, texture: Option<Texture>) -> Result<Self> {
        doc.graph_mut()
            .set_ref_map(self.0, "extensionSources", name, texture.map(|t| t.0))?;
        Ok(self)
    }

    /// Extension name and image pairs, in insertion order.
    pub fn list_extension_sources(self, doc: &Document) -> Vec<(String, Texture)> {
        doc.graph()
            .list_ref_map(self.0, "extensionSources")
            .into_iter()
            .map(|(name, id)| (name, Texture(id)))
            .collect()
    }

    /// True when the texture object had no core `source` and its image is
    /// reachable only through an extension. Written back without one.
    pub fn extension_source_only(self, doc: &Document) -> bool {
        attr_bool(doc, self.0, "extensionSourceOnly", false)
    }

    pub fn set_extension_source_only(self, doc: &mut Document, only: bool) -> Result<Self> {
        let value = if only { Literal::Bool(true) } else { Literal::Null };
        doc.graph_mut().set_attr(self.0, "extensionSourceOnly", value)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_png_size() {
        let png = tiny_png(64, 32);
        assert_eq!(mime_from_bytes(&png), Some("image/png"));
        assert_eq!(image_size(&png), Some((64, 32)));
        assert_eq!(image_size(&png[..20]), None);
    }

    #[test]
    fn test_jpeg_size() {
        let mut jpeg = vec![0xff, 0xd8];
        // APP0 with 4 payload bytes.
        jpeg.extend_from_slice(&[0xff, 0xe0, 0x00, 0x06, 0, 0, 0, 0]);
        // SOF0: length, precision, height 10, width 20.
        jpeg.extend_from_slice(&[0xff, 0xc0, 0x00, 0x11, 0x08, 0x00, 0x0a, 0x00, 0x14]);
        assert_eq!(image_size(&jpeg), Some((20, 10)));
    }

    #[test]
    fn test_set_image_sniffs_mime() {
        let mut doc = Document::new();
        let tex = doc.create_texture("t");
        tex.set_image(&mut doc, &tiny_png(2, 2)).unwrap();
        assert_eq!(tex.mime_type(&doc), "image/png");
        assert_eq!(tex.size(&doc), Some((2, 2)));
    }

    #[test]
    fn test_sampler_defaults() {
        let mut doc = Document::new();
        let info = doc.create_texture_info();
        assert_eq!(info.wrap_s(&doc), sampler::REPEAT);
        assert_eq!(info.mag_filter(&doc), None);
        info.set_mag_filter(&mut doc, Some(sampler::LINEAR)).unwrap();
        assert_eq!(info.mag_filter(&doc), Some(sampler::LINEAR));
        info.set_mag_filter(&mut doc, None).unwrap();
        assert_eq!(info.mag_filter(&doc), None);
    }

    #[test]
    fn test_texture_object_extensions() {
        let mut doc = Document::new();
        let info = doc.create_texture_info();
        let webp = doc.create_texture("webp");
        assert!(info.texture_extensions(&doc).is_empty());
        assert_eq!(info.texture_extras(&doc), Value::Null);

        let mut extensions = BTreeMap::new();
        extensions.insert("EXT_texture_webp".to_string(), serde_json::json!({"source": 1}));
        info.set_texture_extensions(&mut doc, extensions.clone())
            .unwrap()
            .set_texture_extras(&mut doc, serde_json::json!({"k": 1}))
            .unwrap()
            .set_extension_source(&mut doc, "EXT_texture_webp", Some(webp))
            .unwrap()
            .set_extension_source_only(&mut doc, true)
            .unwrap();

        assert_eq!(info.texture_extensions(&doc), extensions);
        assert_eq!(info.texture_extras(&doc)["k"], 1);
        assert_eq!(info.extension_source(&doc, "EXT_texture_webp"), Some(webp));
        assert_eq!(info.list_extension_sources(&doc), vec![("EXT_texture_webp".to_string(), webp)]);
        assert!(info.extension_source_only(&doc));
        assert_eq!(doc.graph().list_parents(webp.id()), vec![info.id()]);

        info.set_texture_extensions(&mut doc, BTreeMap::new()).unwrap();
        assert!(info.texture_extensions(&doc).is_empty());
    }
}
