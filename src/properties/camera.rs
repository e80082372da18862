//! Cameras.

use super::{attr_f64, attr_opt_f64, attr_str};
use crate::document::Document;
use crate::property::Literal;
use crate::util::Result;

property_handle! {
    /// Perspective or orthographic projection.
    Camera => Camera
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CameraType {
    #[default]
    Perspective,
    Orthographic,
}

impl CameraType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "perspective" => Some(Self::Perspective),
            "orthographic" => Some(Self::Orthographic),
            _ => None,
        }
    }
}

impl Camera {
    pub fn camera_type(self, doc: &Document) -> CameraType {
        attr_str(doc, self.0, "type")
            .and_then(CameraType::parse)
            .unwrap_or_default()
    }

    pub fn set_camera_type(self, doc: &mut Document, camera_type: CameraType) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "type", camera_type.as_str())?;
        Ok(self)
    }

    /// Vertical field of view in radians.
    pub fn yfov(self, doc: &Document) -> f64 {
        attr_f64(doc, self.0, "yfov", std::f64::consts::FRAC_PI_4)
    }

    pub fn set_yfov(self, doc: &mut Document, yfov: f64) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "yfov", yfov)?;
        Ok(self)
    }

    /// Aspect ratio; `None` lets the viewport decide.
    pub fn aspect_ratio(self, doc: &Document) -> Option<f64> {
        attr_opt_f64(doc, self.0, "aspectRatio")
    }

    pub fn set_aspect_ratio(self, doc: &mut Document, aspect: Option<f64>) -> Result<Self> {
        let value = aspect.map_or(Literal::Null, Literal::Float);
        doc.graph_mut().set_attr(self.0, "aspectRatio", value)?;
        Ok(self)
    }

    pub fn znear(self, doc: &Document) -> f64 {
        attr_f64(doc, self.0, "znear", 0.1)
    }

    pub fn set_znear(self, doc: &mut Document, znear: f64) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "znear", znear)?;
        Ok(self)
    }

    /// Far plane; `None` means an infinite projection.
    pub fn zfar(self, doc: &Document) -> Option<f64> {
        attr_opt_f64(doc, self.0, "zfar")
    }

    pub fn set_zfar(self, doc: &mut Document, zfar: Option<f64>) -> Result<Self> {
        let value = zfar.map_or(Literal::Null, Literal::Float);
        doc.graph_mut().set_attr(self.0, "zfar", value)?;
        Ok(self)
    }

    pub fn xmag(self, doc: &Document) -> f64 {
        attr_f64(doc, self.0, "xmag", 1.0)
    }

    pub fn set_xmag(self, doc: &mut Document, xmag: f64) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "xmag", xmag)?;
        Ok(self)
    }

    pub fn ymag(self, doc: &Document) -> f64 {
        attr_f64(doc, self.0, "ymag", 1.0)
    }

    pub fn set_ymag(self, doc: &mut Document, ymag: f64) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "ymag", ymag)?;
        Ok(self)
    }
}
