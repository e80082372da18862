//! Keyframe animations.

use super::{attr_str, Accessor, Node};
use crate::document::Document;
use crate::graph::EdgeAttributes;
use crate::util::Result;

property_handle! {
    /// Channels and the samplers they read from.
    Animation => Animation
}

property_handle! {
    /// Binds a sampler's output to one property of a target node.
    AnimationChannel => AnimationChannel
}

property_handle! {
    /// Keyframe input times, output values and interpolation.
    AnimationSampler => AnimationSampler
}

/// Node property driven by a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

impl TargetPath {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Weights => "weights",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "translation" => Some(Self::Translation),
            "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            "weights" => Some(Self::Weights),
            _ => None,
        }
    }
}

/// Keyframe interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::Step => "STEP",
            Self::CubicSpline => "CUBICSPLINE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LINEAR" => Some(Self::Linear),
            "STEP" => Some(Self::Step),
            "CUBICSPLINE" => Some(Self::CubicSpline),
            _ => None,
        }
    }
}

impl Animation {
    pub fn add_channel(self, doc: &mut Document, channel: AnimationChannel) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "channels", channel.0)?;
        Ok(self)
    }

    pub fn remove_channel(self, doc: &mut Document, channel: AnimationChannel) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "channels", channel.0)?;
        Ok(self)
    }

    pub fn list_channels(self, doc: &Document) -> Vec<AnimationChannel> {
        doc.graph().list_refs(self.0, "channels").into_iter().map(AnimationChannel).collect()
    }

    pub fn add_sampler(self, doc: &mut Document, sampler: AnimationSampler) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "samplers", sampler.0)?;
        Ok(self)
    }

    pub fn remove_sampler(self, doc: &mut Document, sampler: AnimationSampler) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "samplers", sampler.0)?;
        Ok(self)
    }

    pub fn list_samplers(self, doc: &Document) -> Vec<AnimationSampler> {
        doc.graph().list_refs(self.0, "samplers").into_iter().map(AnimationSampler).collect()
    }
}

impl AnimationChannel {
    pub fn target_node(self, doc: &Document) -> Option<Node> {
        doc.graph().get_ref(self.0, "targetNode").map(Node)
    }

    pub fn set_target_node(self, doc: &mut Document, node: Option<Node>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "targetNode", node.map(Node::id), EdgeAttributes::default())?;
        Ok(self)
    }

    pub fn target_path(self, doc: &Document) -> Option<TargetPath> {
        attr_str(doc, self.0, "targetPath").and_then(TargetPath::parse)
    }

    pub fn set_target_path(self, doc: &mut Document, path: TargetPath) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "targetPath", path.as_str())?;
        Ok(self)
    }

    pub fn sampler(self, doc: &Document) -> Option<AnimationSampler> {
        doc.graph().get_ref(self.0, "sampler").map(AnimationSampler)
    }

    pub fn set_sampler(self, doc: &mut Document, sampler: Option<AnimationSampler>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "sampler", sampler.map(AnimationSampler::id), EdgeAttributes::default())?;
        Ok(self)
    }
}

impl AnimationSampler {
    /// Keyframe times.
    pub fn input(self, doc: &Document) -> Option<Accessor> {
        doc.graph().get_ref(self.0, "input").map(Accessor)
    }

    pub fn set_input(self, doc: &mut Document, input: Option<Accessor>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "input", input.map(Accessor::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// Keyframe values.
    pub fn output(self, doc: &Document) -> Option<Accessor> {
        doc.graph().get_ref(self.0, "output").map(Accessor)
    }

    pub fn set_output(self, doc: &mut Document, output: Option<Accessor>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "output", output.map(Accessor::id), EdgeAttributes::default())?;
        Ok(self)
    }

    pub fn interpolation(self, doc: &Document) -> Interpolation {
        attr_str(doc, self.0, "interpolation")
            .and_then(Interpolation::parse)
            .unwrap_or_default()
    }

    pub fn set_interpolation(self, doc: &mut Document, interpolation: Interpolation) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "interpolation", interpolation.as_str())?;
        Ok(self)
    }
}
