//! State shared between the reader or writer and extension hooks.

use std::collections::{HashMap, HashSet};

use super::schema::{Extensions, GltfRoot, TextureInfoDef};
use crate::graph::PropertyId;
use crate::properties::{
    Accessor, Animation, Buffer, Camera, Material, Mesh, Node, Primitive, Scene, Skin, Texture,
    TextureInfo, TextureSlot,
};
use crate::property::PropertyType;
use crate::util::SharedLogger;

/// Where a property's JSON object lives in the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DefSlot {
    Root,
    Scene(usize),
    Node(usize),
    Mesh(usize),
    Primitive { mesh: usize, primitive: usize },
    Accessor(usize),
    Buffer(usize),
    Material(usize),
    TextureInfo { material: usize, slot: TextureSlot },
    /// A texture is emitted as a JSON image.
    Image(usize),
    Animation(usize),
    Skin(usize),
    Camera(usize),
}

/// Writer state visible to extensions.
///
/// Every written property has an index within its own kind; extensions
/// look indices up with [`index_of`](Self::index_of) and attach their
/// JSON through [`extensions_mut_for`](Self::extensions_mut_for).
pub struct WriterContext {
    /// Output document, filled in as the writer proceeds.
    pub json: GltfRoot,
    pub(crate) logger: SharedLogger,
    pub(crate) indices: HashMap<PropertyId, u32>,
    pub(crate) slots: HashMap<PropertyId, DefSlot>,
    pub(crate) skipped_accessors: HashSet<PropertyId>,
}

impl WriterContext {
    pub(crate) fn new(logger: SharedLogger) -> Self {
        Self {
            json: GltfRoot::default(),
            logger,
            indices: HashMap::new(),
            slots: HashMap::new(),
            skipped_accessors: HashSet::new(),
        }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Index assigned to a written property within its kind.
    pub fn index_of(&self, id: impl Into<PropertyId>) -> Option<u32> {
        self.indices.get(&id.into()).copied()
    }

    pub(crate) fn assign(&mut self, id: PropertyId, index: u32, slot: DefSlot) {
        self.indices.insert(id, index);
        self.slots.insert(id, slot);
    }

    /// Claim an accessor: the writer will describe it but not pack its
    /// array. The claiming extension supplies the data.
    pub fn skip_accessor(&mut self, accessor: Accessor) {
        self.skipped_accessors.insert(accessor.id());
    }

    pub fn is_skipped(&self, accessor: Accessor) -> bool {
        self.skipped_accessors.contains(&accessor.id())
    }

    /// Extension map of the JSON object written for `id`, or of the
    /// document itself for the root.
    pub fn extensions_mut_for(&mut self, id: impl Into<PropertyId>) -> Option<&mut Extensions> {
        let id = id.into();
        let slot = *self.slots.get(&id)?;
        if let DefSlot::TextureInfo { .. } = slot {
            return self.texture_info_def_mut(TextureInfo(id)).map(|def| &mut def.extensions);
        }
        let json = &mut self.json;
        Some(match slot {
            DefSlot::Root => &mut json.extensions,
            DefSlot::Scene(i) => &mut json.scenes.get_mut(i)?.extensions,
            DefSlot::Node(i) => &mut json.nodes.get_mut(i)?.extensions,
            DefSlot::Mesh(i) => &mut json.meshes.get_mut(i)?.extensions,
            DefSlot::Primitive { mesh, primitive } => {
                &mut json.meshes.get_mut(mesh)?.primitives.get_mut(primitive)?.extensions
            }
            DefSlot::Accessor(i) => &mut json.accessors.get_mut(i)?.extensions,
            DefSlot::Buffer(i) => &mut json.buffers.get_mut(i)?.extensions,
            DefSlot::Material(i) => &mut json.materials.get_mut(i)?.extensions,
            DefSlot::Image(i) => &mut json.images.get_mut(i)?.extensions,
            DefSlot::Animation(i) => &mut json.animations.get_mut(i)?.extensions,
            DefSlot::Skin(i) => &mut json.skins.get_mut(i)?.extensions,
            DefSlot::Camera(i) => &mut json.cameras.get_mut(i)?.extensions,
            DefSlot::TextureInfo { .. } => return None,
        })
    }

    /// The texture reference JSON written for a material slot.
    pub fn texture_info_def_mut(&mut self, info: TextureInfo) -> Option<&mut TextureInfoDef> {
        let DefSlot::TextureInfo { material, slot } = *self.slots.get(&info.id())? else {
            return None;
        };
        let def = self.json.materials.get_mut(material)?;
        match slot {
            TextureSlot::BaseColor => def.pbr_metallic_roughness.as_mut()?.base_color_texture.as_mut(),
            TextureSlot::MetallicRoughness => def
                .pbr_metallic_roughness
                .as_mut()?
                .metallic_roughness_texture
                .as_mut(),
            TextureSlot::Normal => def.normal_texture.as_mut(),
            TextureSlot::Occlusion => def.occlusion_texture.as_mut(),
            TextureSlot::Emissive => def.emissive_texture.as_mut(),
        }
    }
}

/// Reader state visible to extensions.
///
/// Holds the parsed JSON, the resolved buffers and, for each glTF array,
/// the property created for every index.
pub struct ReaderContext<'a> {
    pub json: &'a GltfRoot,
    pub(crate) logger: SharedLogger,
    pub buffer_data: Vec<&'a [u8]>,
    pub buffers: Vec<Buffer>,
    pub accessors: Vec<Accessor>,
    /// One texture per JSON image.
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    /// Primitives per mesh, in JSON order.
    pub primitives: Vec<Vec<Primitive>>,
    pub skins: Vec<Skin>,
    pub cameras: Vec<Camera>,
    pub nodes: Vec<Node>,
    pub animations: Vec<Animation>,
    pub scenes: Vec<Scene>,
    /// Every material texture slot read, with the JSON it came from.
    pub texture_infos: Vec<(TextureInfo, TextureInfoDef)>,
}

impl<'a> ReaderContext<'a> {
    pub(crate) fn new(json: &'a GltfRoot, buffer_data: Vec<&'a [u8]>, logger: SharedLogger) -> Self {
        Self {
            json,
            logger,
            buffer_data,
            buffers: Vec::new(),
            accessors: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            primitives: Vec::new(),
            skins: Vec::new(),
            cameras: Vec::new(),
            nodes: Vec::new(),
            animations: Vec::new(),
            scenes: Vec::new(),
            texture_infos: Vec::new(),
        }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Property created for index `index` of the JSON array holding
    /// `property_type`.
    pub fn property_at(&self, property_type: PropertyType, index: usize) -> Option<PropertyId> {
        match property_type {
            PropertyType::Buffer => self.buffers.get(index).map(|p| p.id()),
            PropertyType::Accessor => self.accessors.get(index).map(|p| p.id()),
            PropertyType::Texture => self.textures.get(index).map(|p| p.id()),
            PropertyType::Material => self.materials.get(index).map(|p| p.id()),
            PropertyType::Mesh => self.meshes.get(index).map(|p| p.id()),
            PropertyType::Skin => self.skins.get(index).map(|p| p.id()),
            PropertyType::Camera => self.cameras.get(index).map(|p| p.id()),
            PropertyType::Node => self.nodes.get(index).map(|p| p.id()),
            PropertyType::Animation => self.animations.get(index).map(|p| p.id()),
            PropertyType::Scene => self.scenes.get(index).map(|p| p.id()),
            _ => None,
        }
    }
}
