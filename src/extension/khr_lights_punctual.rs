//! `KHR_lights_punctual`: directional, point and spot lights attached to
//! nodes.
//!
//! Lights are stored once at the document level and referenced by index
//! from each node that instantiates them. In the graph a light is an
//! extension property; several nodes may share one.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Extension, ExtensionType};
use crate::document::Document;
use crate::graph::PropertyId;
use crate::io::{ReaderContext, WriterContext};
use crate::properties::{attr_floats, extension_handle, ExtensionProperty};
use crate::property::{ExtensionMeta, Literal, PropertyType};
use crate::util::Result;

pub const NAME: &str = "KHR_lights_punctual";

const META: ExtensionMeta = ExtensionMeta {
    extension_name: NAME,
    parent_types: &[PropertyType::Node],
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    #[default]
    Point,
    Spot,
}

impl LightType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Point => "point",
            Self::Spot => "spot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "directional" => Some(Self::Directional),
            "point" => Some(Self::Point),
            "spot" => Some(Self::Spot),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LightsDef {
    #[serde(default)]
    lights: Vec<LightDef>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LightDef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "type")]
    light_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spot: Option<SpotDef>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotDef {
    #[serde(default)]
    inner_cone_angle: f64,
    #[serde(default = "default_outer_cone")]
    outer_cone_angle: f64,
}

fn default_outer_cone() -> f64 {
    FRAC_PI_4
}

extension_handle! {
    /// A punctual light source.
    Light
}

impl Light {
    pub fn name(self, doc: &Document) -> &str {
        doc.graph().name(self.id())
    }

    pub fn set_name(self, doc: &mut Document, name: &str) -> Result<Self> {
        doc.graph_mut().set_name(self.id(), name)?;
        Ok(self)
    }

    pub fn light_type(self, doc: &Document) -> LightType {
        self.0
            .get(doc, "type")
            .and_then(Literal::as_str)
            .and_then(LightType::parse)
            .unwrap_or_default()
    }

    pub fn set_light_type(self, doc: &mut Document, light_type: LightType) -> Result<Self> {
        self.0.set(doc, "type", light_type.as_str())?;
        Ok(self)
    }

    /// Linear RGB color.
    pub fn color(self, doc: &Document) -> [f64; 3] {
        attr_floats(doc, self.id(), "color", [1.0, 1.0, 1.0])
    }

    pub fn set_color(self, doc: &mut Document, color: [f64; 3]) -> Result<Self> {
        self.0.set(doc, "color", color)?;
        Ok(self)
    }

    /// Candela for point and spot lights, lux for directional ones.
    pub fn intensity(self, doc: &Document) -> f64 {
        self.0.get(doc, "intensity").and_then(Literal::as_f64).unwrap_or(1.0)
    }

    pub fn set_intensity(self, doc: &mut Document, intensity: f64) -> Result<Self> {
        self.0.set(doc, "intensity", intensity)?;
        Ok(self)
    }

    /// Cutoff distance; `None` means infinite.
    pub fn range(self, doc: &Document) -> Option<f64> {
        self.0.get(doc, "range").and_then(Literal::as_f64)
    }

    pub fn set_range(self, doc: &mut Document, range: Option<f64>) -> Result<Self> {
        match range {
            Some(r) => self.0.set(doc, "range", r)?,
            None => self.0.set(doc, "range", Literal::Null)?,
        };
        Ok(self)
    }

    pub fn inner_cone_angle(self, doc: &Document) -> f64 {
        self.0.get(doc, "innerConeAngle").and_then(Literal::as_f64).unwrap_or(0.0)
    }

    pub fn set_inner_cone_angle(self, doc: &mut Document, angle: f64) -> Result<Self> {
        self.0.set(doc, "innerConeAngle", angle)?;
        Ok(self)
    }

    pub fn outer_cone_angle(self, doc: &Document) -> f64 {
        self.0
            .get(doc, "outerConeAngle")
            .and_then(Literal::as_f64)
            .unwrap_or(FRAC_PI_4)
    }

    pub fn set_outer_cone_angle(self, doc: &mut Document, angle: f64) -> Result<Self> {
        self.0.set(doc, "outerConeAngle", angle)?;
        Ok(self)
    }

    fn to_def(self, doc: &Document) -> LightDef {
        let light_type = self.light_type(doc);
        let color = self.color(doc);
        let intensity = self.intensity(doc);
        LightDef {
            name: self.name(doc).to_string(),
            light_type: light_type.as_str().to_string(),
            color: (color != [1.0, 1.0, 1.0]).then_some(color),
            intensity: (intensity != 1.0).then_some(intensity),
            range: self.range(doc),
            spot: (light_type == LightType::Spot).then(|| SpotDef {
                inner_cone_angle: self.inner_cone_angle(doc),
                outer_cone_angle: self.outer_cone_angle(doc),
            }),
        }
    }
}

/// The `KHR_lights_punctual` extension.
#[derive(Debug, Default)]
pub struct LightsPunctual;

impl ExtensionType for LightsPunctual {
    const NAME: &'static str = NAME;

    fn create() -> Self {
        Self
    }
}

impl LightsPunctual {
    pub fn create_light(&self, doc: &mut Document, name: &str) -> Result<Light> {
        let light = Light(doc.create_extension_property(META, "Light"));
        light.set_name(doc, name)
    }

    fn read_light(&self, doc: &mut Document, def: LightDef) -> Result<Light> {
        let light = self.create_light(doc, &def.name)?;
        if let Some(light_type) = LightType::parse(&def.light_type) {
            light.set_light_type(doc, light_type)?;
        }
        if let Some(color) = def.color {
            light.set_color(doc, color)?;
        }
        if let Some(intensity) = def.intensity {
            light.set_intensity(doc, intensity)?;
        }
        light.set_range(doc, def.range)?;
        if let Some(spot) = def.spot {
            light
                .set_inner_cone_angle(doc, spot.inner_cone_angle)?
                .set_outer_cone_angle(doc, spot.outer_cone_angle)?;
        }
        Ok(light)
    }
}

impl Extension for LightsPunctual {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, ctx: &mut ReaderContext<'_>, doc: &mut Document) -> Result<()> {
        let json = ctx.json;
        let Some(value) = json.extensions.get(NAME) else {
            return Ok(());
        };
        let defs: LightsDef = serde_json::from_value(value.clone())?;
        let mut lights = Vec::with_capacity(defs.lights.len());
        for def in defs.lights {
            lights.push(self.read_light(doc, def)?);
        }

        for (index, node_def) in json.nodes.iter().enumerate() {
            let Some(light_index) = node_def
                .extensions
                .get(NAME)
                .and_then(|v| v.get("light"))
                .and_then(|v| v.as_u64())
            else {
                continue;
            };
            match lights.get(light_index as usize) {
                Some(light) => {
                    ctx.nodes[index].set_extension(doc, NAME, Some(light.id()))?;
                }
                None => ctx
                    .logger()
                    .warn(&format!("{}: node {} references missing light {}", NAME, index, light_index)),
            }
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriterContext, doc: &Document) -> Result<()> {
        let mut order: HashMap<PropertyId, usize> = HashMap::new();
        let mut defs = Vec::new();
        for node in doc.root().list_nodes(doc) {
            let Some(id) = node.get_extension(doc, NAME) else {
                continue;
            };
            let index = *order.entry(id).or_insert_with(|| {
                defs.push(Light(ExtensionProperty(id)).to_def(doc));
                defs.len() - 1
            });
            if let Some(extensions) = ctx.extensions_mut_for(node) {
                extensions.insert(NAME.to_string(), json!({ "light": index }));
            }
        }
        if !defs.is_empty() {
            let value = serde_json::to_value(LightsDef { lights: defs })?;
            ctx.json.extensions.insert(NAME.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_defaults() {
        let mut doc = Document::new();
        let ext = doc.create_extension::<LightsPunctual>();
        let light = ext.create_light(&mut doc, "sun").unwrap();
        assert_eq!(light.name(&doc), "sun");
        assert_eq!(light.light_type(&doc), LightType::Point);
        assert_eq!(light.color(&doc), [1.0, 1.0, 1.0]);
        assert_eq!(light.intensity(&doc), 1.0);
        assert_eq!(light.range(&doc), None);
        assert_eq!(light.outer_cone_angle(&doc), FRAC_PI_4);
    }

    #[test]
    fn test_spot_def() {
        let mut doc = Document::new();
        let ext = doc.create_extension::<LightsPunctual>();
        let light = ext.create_light(&mut doc, "").unwrap();
        light
            .set_light_type(&mut doc, LightType::Spot)
            .unwrap()
            .set_intensity(&mut doc, 20.0)
            .unwrap();
        let value = serde_json::to_value(light.to_def(&doc)).unwrap();
        assert_eq!(value["type"], "spot");
        assert_eq!(value["intensity"], 20.0);
        assert!(value.get("color").is_none());
        assert_eq!(value["spot"]["innerConeAngle"], 0.0);
    }

    #[test]
    fn test_shared_between_nodes() {
        let mut doc = Document::new();
        let ext = doc.create_extension::<LightsPunctual>();
        let light = ext.create_light(&mut doc, "lamp").unwrap();
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        a.set_extension(&mut doc, NAME, Some(light.id())).unwrap();
        b.set_extension(&mut doc, NAME, Some(light.id())).unwrap();
        assert_eq!(light.as_property().list_hosts(&doc).len(), 2);
    }
}
