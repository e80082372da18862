//! Document to glTF JSON and binary resources.
//!
//! The writer walks the root lists in a fixed order, giving every written
//! property one index within its kind:
//! buffers, accessors, textures, materials, meshes, skins, cameras,
//! nodes, animations, scenes. Accessor arrays and (for GLB) image bytes
//! are packed into buffer views grouped by use:
//!
//! - one view per buffer for all index accessors
//! - one strided view per vertex attribute
//! - one view for every other accessor
//! - one view for sparse indices and values
//! - one view per embedded image
//!
//! Every view starts on a 4-byte boundary.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::Value;

use super::context::{DefSlot, WriterContext};
use super::format::align4;
use super::platform::is_contained_uri;
use super::schema::*;
use super::{ContainerFormat, JsonDocument, UriCollision, WriterOptions, GLB_BUFFER};
use crate::document::Document;
use crate::graph::PropertyId;
use crate::properties::{
    sampler, Accessor, AlphaMode, Buffer, CameraType, Interpolation, Material, Primitive,
    PrimitiveMode, Texture, TextureInfo, TextureSlot,
};
use crate::property::{AccessorArray, ComponentType, PropertyType};
use crate::util::{Error, Result};

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// How an accessor is consumed, which decides its buffer view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Usage {
    Index,
    Vertex,
    Other,
}

/// Serialize `doc` into JSON plus resources.
///
/// Nothing is written anywhere; [`PlatformIo`](super::PlatformIo) turns
/// the result into files or a GLB.
pub fn write_document(doc: &Document, options: &WriterOptions) -> Result<JsonDocument> {
    let mut writer = Writer::new(doc, options);
    writer.run()?;
    Ok(JsonDocument {
        json: writer.ctx.json,
        resources: writer.resources,
    })
}

/// Identity of a written texture object: image, sampler and the
/// serialized texture-level extensions and extras.
type TextureKey = (Option<u32>, Option<u32>, String);

struct Writer<'d> {
    doc: &'d Document,
    options: &'d WriterOptions,
    ctx: WriterContext,
    root: PropertyId,
    unknown_extensions: BTreeSet<String>,
    uris: HashSet<String>,
    resources: BTreeMap<String, Vec<u8>>,
    samplers: HashMap<SamplerDef, u32>,
    textures: HashMap<TextureKey, u32>,
}

impl<'d> Writer<'d> {
    fn new(doc: &'d Document, options: &'d WriterOptions) -> Self {
        Self {
            doc,
            options,
            ctx: WriterContext::new(doc.logger().clone()),
            root: doc.root().id(),
            unknown_extensions: BTreeSet::new(),
            uris: HashSet::new(),
            resources: BTreeMap::new(),
            samplers: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        self.prewrite()?;

        let accessors = self.used_accessors();
        let textures = self.used_textures();
        let plan = self.plan_buffers(&accessors, &textures)?;

        self.index_all(&plan, &accessors, &textures);
        self.write_accessor_defs(&accessors);
        self.write_image_defs(&textures)?;
        self.pack_buffers(&plan)?;

        self.write_materials();
        self.write_meshes();
        self.write_skins();
        self.write_cameras();
        self.write_nodes();
        self.write_animations();
        self.write_scenes();
        self.write_root();

        for extension in self.doc.extensions().list() {
            extension.write(&mut self.ctx, self.doc)?;
        }
        self.write_extension_lists();

        self.ctx.logger().debug(&format!(
            "wrote {} nodes, {} meshes, {} accessors, {} buffers",
            self.ctx.json.nodes.len(),
            self.ctx.json.meshes.len(),
            self.ctx.json.accessors.len(),
            self.ctx.json.buffers.len()
        ));
        Ok(())
    }

    fn prewrite(&mut self) -> Result<()> {
        for extension in self.doc.extensions().list() {
            for property_type in extension.prewrite_types() {
                extension.prewrite(&mut self.ctx, self.doc, *property_type)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// Referenced by anything other than the root.
    fn is_used(&self, id: PropertyId) -> bool {
        self.doc
            .graph()
            .list_parent_edges(id)
            .iter()
            .any(|edge| edge.parent() != self.root)
    }

    fn name_of(&self, id: PropertyId) -> Option<String> {
        let name = self.doc.graph().name(id);
        (!name.is_empty()).then(|| name.to_string())
    }

    fn extras_of(&self, id: PropertyId) -> Value {
        self.doc.graph().extras(id).cloned().unwrap_or(Value::Null)
    }

    /// Opaque extension objects carried through from reading.
    fn unknown_of(&mut self, id: PropertyId) -> Extensions {
        let Ok(data) = self.doc.graph().data(id) else {
            return Extensions::new();
        };
        let unknown = data.unknown_extensions().clone();
        self.unknown_extensions.extend(unknown.keys().cloned());
        unknown
    }

    fn index(&self, id: impl Into<PropertyId>) -> Option<u32> {
        self.ctx.index_of(id)
    }

    /// A property's stored URI if it can name a written side file. URIs
    /// leaving the output directory are replaced by a generated name.
    fn stored_uri(&self, uri: &str) -> Option<String> {
        if uri.is_empty() {
            return None;
        }
        if !is_contained_uri(uri) {
            self.ctx
                .logger()
                .warn(&format!("resource URI {} leaves the output directory, renamed", uri));
            return None;
        }
        Some(uri.to_string())
    }

    /// Reserve `uri`, applying the collision policy.
    fn claim_uri(&mut self, uri: String) -> Result<String> {
        if self.uris.insert(uri.clone()) {
            return Ok(uri);
        }
        if self.options.uri_collision == UriCollision::Fail {
            return Err(Error::DuplicateUri(uri));
        }
        let (stem, ext) = split_extension(&uri);
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}{}", stem, n, ext);
            if self.uris.insert(candidate.clone()) {
                self.ctx
                    .logger()
                    .warn(&format!("duplicate resource URI {}, renamed to {}", uri, candidate));
                return Ok(candidate);
            }
            n += 1;
        }
    }

    // ------------------------------------------------------------------
    // Indexing and packing
    // ------------------------------------------------------------------

    fn used_accessors(&self) -> Vec<Accessor> {
        self.doc
            .root()
            .list_accessors(self.doc)
            .into_iter()
            .filter(|a| self.is_used(a.id()))
            .collect()
    }

    fn used_textures(&self) -> Vec<Texture> {
        let mut out = Vec::new();
        for texture in self.doc.root().list_textures(self.doc) {
            if !self.is_used(texture.id()) {
                continue;
            }
            if texture.image(self.doc).is_none() && texture.uri(self.doc).is_empty() {
                self.ctx
                    .logger()
                    .warn(&format!("texture {:?} has no image data, skipped", texture.name(self.doc)));
                continue;
            }
            out.push(texture);
        }
        out
    }

    fn usage(&self, accessor: Accessor) -> Usage {
        let graph = self.doc.graph();
        let mut usage = Usage::Other;
        for edge in graph.list_parent_edges(accessor.id()) {
            let parent_type = graph.property_type(edge.parent()).ok();
            match (parent_type, edge.name()) {
                (Some(PropertyType::Primitive), "indices") => return Usage::Index,
                (Some(PropertyType::Primitive | PropertyType::PrimitiveTarget), "attributes") => {
                    usage = Usage::Vertex
                }
                _ => {}
            }
        }
        usage
    }

    /// Decide which buffer receives each accessor and image.
    fn plan_buffers(&self, accessors: &[Accessor], textures: &[Texture]) -> Result<Vec<BufferPlan>> {
        let doc = self.doc;
        let buffers = doc.root().list_buffers(doc);
        let mut plans: Vec<BufferPlan> = buffers.iter().map(|b| BufferPlan::new(*b)).collect();
        let position = |buffer: Buffer| buffers.iter().position(|b| *b == buffer);

        for accessor in accessors {
            if self.ctx.is_skipped(*accessor) || accessor.array(doc).map_or(true, AccessorArray::is_empty) {
                continue;
            }
            let slot = accessor
                .buffer(doc)
                .and_then(position)
                .or(if plans.is_empty() { None } else { Some(0) })
                .ok_or_else(|| Error::MissingBuffer(format!("accessor {:?}", accessor.name(doc))))?;
            plans[slot].accessors.push(*accessor);
        }

        if self.options.format == ContainerFormat::Glb {
            for texture in textures {
                if texture.image(doc).is_none() {
                    continue;
                }
                let first = plans
                    .first_mut()
                    .ok_or_else(|| Error::MissingBuffer(format!("texture {:?}", texture.name(doc))))?;
                first.images.push(*texture);
            }
        }

        plans.retain(|p| !p.accessors.is_empty() || !p.images.is_empty());
        if self.options.format == ContainerFormat::Glb && plans.len() > 1 {
            return Err(Error::WriteFailed(format!(
                "GLB holds one buffer, document uses {}",
                plans.len()
            )));
        }
        Ok(plans)
    }

    fn index_all(&mut self, plan: &[BufferPlan], accessors: &[Accessor], textures: &[Texture]) {
        for (i, p) in plan.iter().enumerate() {
            self.ctx.assign(p.buffer.id(), i as u32, DefSlot::Buffer(i));
        }
        for (i, a) in accessors.iter().enumerate() {
            self.ctx.assign(a.id(), i as u32, DefSlot::Accessor(i));
        }
        for (i, t) in textures.iter().enumerate() {
            self.ctx.assign(t.id(), i as u32, DefSlot::Image(i));
        }
        let doc = self.doc;
        let root = doc.root();
        for (i, m) in root.list_materials(doc).into_iter().enumerate() {
            self.ctx.assign(m.id(), i as u32, DefSlot::Material(i));
        }
        for (i, m) in root.list_meshes(doc).into_iter().enumerate() {
            self.ctx.assign(m.id(), i as u32, DefSlot::Mesh(i));
        }
        for (i, s) in root.list_skins(doc).into_iter().enumerate() {
            self.ctx.assign(s.id(), i as u32, DefSlot::Skin(i));
        }
        for (i, c) in root.list_cameras(doc).into_iter().enumerate() {
            self.ctx.assign(c.id(), i as u32, DefSlot::Camera(i));
        }
        for (i, n) in root.list_nodes(doc).into_iter().enumerate() {
            self.ctx.assign(n.id(), i as u32, DefSlot::Node(i));
        }
        for (i, a) in root.list_animations(doc).into_iter().enumerate() {
            self.ctx.assign(a.id(), i as u32, DefSlot::Animation(i));
        }
        for (i, s) in root.list_scenes(doc).into_iter().enumerate() {
            self.ctx.assign(s.id(), i as u32, DefSlot::Scene(i));
        }
        self.ctx.assign(self.root, 0, DefSlot::Root);
    }

    fn write_accessor_defs(&mut self, accessors: &[Accessor]) {
        let doc = self.doc;
        for accessor in accessors {
            let id = accessor.id();
            let (min, max) = accessor.raw_bounds(doc).unwrap_or_default();
            let def = AccessorDef {
                name: self.name_of(id),
                buffer_view: None,
                byte_offset: None,
                component_type: accessor.component_type(doc).gl_enum(),
                normalized: accessor.normalized(doc),
                count: accessor.count(doc) as u64,
                element_type: accessor.element_type(doc).as_str().to_string(),
                min,
                max,
                sparse: None,
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            self.ctx.json.accessors.push(def);
        }
    }

    fn write_image_defs(&mut self, textures: &[Texture]) -> Result<()> {
        let doc = self.doc;
        for (i, texture) in textures.iter().enumerate() {
            let id = texture.id();
            let mime = texture.mime_type(doc);
            let mut def = ImageDef {
                name: self.name_of(id),
                uri: None,
                mime_type: (!mime.is_empty()).then(|| mime.to_string()),
                buffer_view: None,
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            let embedded = self.options.format == ContainerFormat::Glb;
            match texture.image(doc) {
                Some(_) if embedded => {}
                Some(bytes) => {
                    let uri = match self.stored_uri(texture.uri(doc)) {
                        Some(uri) => uri,
                        None => {
                            let stem = self.name_of(id).unwrap_or_else(|| format!("{}_{}", self.options.basename, i));
                            format!("{}.{}", file_stem(&stem), extension_for_mime(mime))
                        }
                    };
                    let uri = self.claim_uri(uri)?;
                    self.resources.insert(uri.clone(), bytes.to_vec());
                    def.uri = Some(uri);
                }
                None => def.uri = Some(texture.uri(doc).to_string()),
            }
            self.ctx.json.images.push(def);
        }
        Ok(())
    }

    fn pack_buffers(&mut self, plans: &[BufferPlan]) -> Result<()> {
        for (buffer_index, plan) in plans.iter().enumerate() {
            let mut data = Vec::new();
            let mut indices = Vec::new();
            let mut vertex = Vec::new();
            let mut other = Vec::new();
            let mut sparse = Vec::new();
            for accessor in &plan.accessors {
                if accessor.sparse(self.doc) && self.has_nonzero_subset(*accessor) {
                    sparse.push(*accessor);
                    continue;
                }
                match self.usage(*accessor) {
                    Usage::Index => indices.push(*accessor),
                    Usage::Vertex => vertex.push(*accessor),
                    Usage::Other => other.push(*accessor),
                }
            }

            self.pack_group(&mut data, buffer_index, &indices, Some(ELEMENT_ARRAY_BUFFER));
            for accessor in &vertex {
                self.pack_vertex(&mut data, buffer_index, *accessor);
            }
            self.pack_group(&mut data, buffer_index, &other, None);
            self.pack_sparse(&mut data, buffer_index, &sparse);
            for texture in &plan.images {
                self.pack_image(&mut data, buffer_index, *texture);
            }
            pad_to_4(&mut data, 0);

            let id = plan.buffer.id();
            let mut def = BufferDef {
                name: self.name_of(id),
                uri: None,
                byte_length: data.len() as u64,
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            match self.options.format {
                ContainerFormat::Glb => {
                    self.resources.insert(GLB_BUFFER.to_string(), data);
                }
                ContainerFormat::Gltf => {
                    let uri = match self.stored_uri(plan.buffer.uri(self.doc)) {
                        Some(uri) => uri,
                        None => format!("{}.bin", file_stem(def.name.as_deref().unwrap_or(&self.options.basename))),
                    };
                    let uri = self.claim_uri(uri)?;
                    self.resources.insert(uri.clone(), data);
                    def.uri = Some(uri);
                }
            }
            self.ctx.json.buffers.push(def);
        }
        Ok(())
    }

    fn accessor_def_mut(&mut self, accessor: Accessor) -> Option<&mut AccessorDef> {
        let index = self.index(accessor)? as usize;
        self.ctx.json.accessors.get_mut(index)
    }

    /// Tightly packed accessors sharing one view.
    fn pack_group(&mut self, data: &mut Vec<u8>, buffer: usize, accessors: &[Accessor], target: Option<u32>) {
        if accessors.is_empty() {
            return;
        }
        pad_to_4(data, 0);
        let view_start = data.len();
        let view_index = self.ctx.json.buffer_views.len() as u32;
        for accessor in accessors {
            let Some(array) = accessor.array(self.doc) else {
                continue;
            };
            pad_to_4(data, 0);
            let offset = (data.len() - view_start) as u64;
            data.extend_from_slice(array.as_bytes());
            if let Some(def) = self.accessor_def_mut(*accessor) {
                def.buffer_view = Some(view_index);
                def.byte_offset = (offset > 0).then_some(offset);
            }
        }
        self.ctx.json.buffer_views.push(BufferViewDef {
            buffer: buffer as u32,
            byte_offset: (view_start > 0).then_some(view_start as u64),
            byte_length: (data.len() - view_start) as u64,
            target,
            ..Default::default()
        });
    }

    /// One view per vertex attribute; elements padded to a 4-byte stride.
    fn pack_vertex(&mut self, data: &mut Vec<u8>, buffer: usize, accessor: Accessor) {
        let doc = self.doc;
        let Some(array) = accessor.array(doc) else {
            return;
        };
        let element_bytes = accessor.element_size(doc) * array.component_type().num_bytes();
        let stride = align4(element_bytes);
        pad_to_4(data, 0);
        let view_start = data.len();
        if stride == element_bytes {
            data.extend_from_slice(array.as_bytes());
        } else {
            for element in array.as_bytes().chunks(element_bytes) {
                data.extend_from_slice(element);
                data.resize(data.len() + stride - element_bytes, 0);
            }
        }
        let view_index = self.ctx.json.buffer_views.len() as u32;
        self.ctx.json.buffer_views.push(BufferViewDef {
            buffer: buffer as u32,
            byte_offset: (view_start > 0).then_some(view_start as u64),
            byte_length: (data.len() - view_start) as u64,
            byte_stride: Some(stride as u32),
            target: Some(ARRAY_BUFFER),
            ..Default::default()
        });
        if let Some(def) = self.accessor_def_mut(accessor) {
            def.buffer_view = Some(view_index);
        }
    }

    /// Elements with any non-zero component, when there is at least one.
    fn nonzero_elements(&self, accessor: Accessor) -> Vec<usize> {
        let doc = self.doc;
        let Some(array) = accessor.array(doc) else {
            return Vec::new();
        };
        let size = accessor.element_size(doc);
        (0..accessor.count(doc))
            .filter(|i| (0..size).any(|k| array.get(i * size + k).is_some_and(|c| c != 0.0)))
            .collect()
    }

    fn has_nonzero_subset(&self, accessor: Accessor) -> bool {
        !self.nonzero_elements(accessor).is_empty()
    }

    /// Sparse indices and values of every sparse accessor share one view.
    fn pack_sparse(&mut self, data: &mut Vec<u8>, buffer: usize, accessors: &[Accessor]) {
        if accessors.is_empty() {
            return;
        }
        let doc = self.doc;
        pad_to_4(data, 0);
        let view_start = data.len();
        let view_index = self.ctx.json.buffer_views.len() as u32;
        for accessor in accessors {
            let Some(array) = accessor.array(doc) else {
                continue;
            };
            let elements = self.nonzero_elements(*accessor);
            let last = elements.last().copied().unwrap_or(0);
            let index_type = if last < 256 {
                ComponentType::UnsignedByte
            } else if last < 65536 {
                ComponentType::UnsignedShort
            } else {
                ComponentType::UnsignedInt
            };

            let indices_offset = (data.len() - view_start) as u64;
            for &i in &elements {
                match index_type {
                    ComponentType::UnsignedByte => data.push(i as u8),
                    ComponentType::UnsignedShort => data.extend_from_slice(&(i as u16).to_le_bytes()),
                    _ => data.extend_from_slice(&(i as u32).to_le_bytes()),
                }
            }
            pad_to_4(data, view_start);

            let values_offset = (data.len() - view_start) as u64;
            let element_bytes = accessor.element_size(doc) * array.component_type().num_bytes();
            let bytes = array.as_bytes();
            for &i in &elements {
                data.extend_from_slice(&bytes[i * element_bytes..(i + 1) * element_bytes]);
            }
            pad_to_4(data, view_start);

            let sparse = SparseDef {
                count: elements.len() as u64,
                indices: SparseIndicesDef {
                    buffer_view: view_index,
                    byte_offset: (indices_offset > 0).then_some(indices_offset),
                    component_type: index_type.gl_enum(),
                },
                values: SparseValuesDef {
                    buffer_view: view_index,
                    byte_offset: Some(values_offset),
                },
            };
            if let Some(def) = self.accessor_def_mut(*accessor) {
                def.sparse = Some(sparse);
            }
        }
        self.ctx.json.buffer_views.push(BufferViewDef {
            buffer: buffer as u32,
            byte_offset: (view_start > 0).then_some(view_start as u64),
            byte_length: (data.len() - view_start) as u64,
            ..Default::default()
        });
    }

    fn pack_image(&mut self, data: &mut Vec<u8>, buffer: usize, texture: Texture) {
        let Some(bytes) = texture.image(self.doc) else {
            return;
        };
        pad_to_4(data, 0);
        let view_start = data.len();
        data.extend_from_slice(bytes);
        let view_index = self.ctx.json.buffer_views.len() as u32;
        self.ctx.json.buffer_views.push(BufferViewDef {
            buffer: buffer as u32,
            byte_offset: (view_start > 0).then_some(view_start as u64),
            byte_length: bytes.len() as u64,
            ..Default::default()
        });
        if let Some(index) = self.index(texture) {
            if let Some(def) = self.ctx.json.images.get_mut(index as usize) {
                def.buffer_view = Some(view_index);
            }
        }
    }

    // ------------------------------------------------------------------
    // JSON emission
    // ------------------------------------------------------------------

    /// glTF texture index for an image sampled with `info`'s settings.
    fn texture_index(&mut self, image: u32, info: TextureInfo) -> u32 {
        let doc = self.doc;
        let sampler_def = SamplerDef {
            mag_filter: info.mag_filter(doc),
            min_filter: info.min_filter(doc),
            wrap_s: Some(info.wrap_s(doc)).filter(|w| *w != sampler::REPEAT),
            wrap_t: Some(info.wrap_t(doc)).filter(|w| *w != sampler::REPEAT),
        };
        let sampler_index = if sampler_def == SamplerDef::default() {
            None
        } else {
            let next = self.samplers.len() as u32;
            let index = *self.samplers.entry(sampler_def.clone()).or_insert(next);
            if index == next {
                self.ctx.json.samplers.push(sampler_def);
            }
            Some(index)
        };
        let source = (!info.extension_source_only(doc)).then_some(image);
        let extensions = self.texture_extensions_of(info);
        let extras = info.texture_extras(doc);
        let opaque = serde_json::to_string(&(&extensions, &extras)).unwrap_or_default();
        let next = self.textures.len() as u32;
        let index = *self.textures.entry((source, sampler_index, opaque)).or_insert(next);
        if index == next {
            self.ctx.json.textures.push(TextureDef {
                sampler: sampler_index,
                source,
                extensions,
                extras,
                ..Default::default()
            });
        }
        index
    }

    /// Texture-object extensions of `info` with their `source` pointing at
    /// written image indices. An extension whose image was not written is
    /// dropped.
    fn texture_extensions_of(&mut self, info: TextureInfo) -> Extensions {
        let doc = self.doc;
        let mut extensions = info.texture_extensions(doc);
        extensions.retain(|name, value| {
            if value.get("source").is_none() {
                return true;
            }
            let image = info.extension_source(doc, name).and_then(|t| self.index(t));
            match (image, value.as_object_mut()) {
                (Some(image), Some(object)) => {
                    object.insert("source".to_string(), Value::from(image));
                    true
                }
                _ => {
                    self.ctx
                        .logger()
                        .warn(&format!("texture extension {} lost its image, dropped", name));
                    false
                }
            }
        });
        self.unknown_extensions.extend(extensions.keys().cloned());
        extensions
    }

    fn texture_info_def(&mut self, material: Material, material_index: usize, slot: TextureSlot) -> Option<TextureInfoDef> {
        let doc = self.doc;
        let image = self.index(material.texture(doc, slot)?)?;
        let info = material.texture_info(doc, slot)?;
        let index = self.texture_index(image, info);
        let tex_coord = info.tex_coord(doc);
        let scale = material.normal_scale(doc);
        let strength = material.occlusion_strength(doc);
        let def = TextureInfoDef {
            index,
            tex_coord: (tex_coord != 0).then_some(tex_coord),
            scale: (slot == TextureSlot::Normal && scale != 1.0).then_some(scale),
            strength: (slot == TextureSlot::Occlusion && strength != 1.0).then_some(strength),
            extensions: self.unknown_of(info.id()),
            extras: self.extras_of(info.id()),
        };
        self.ctx.assign(
            info.id(),
            index,
            DefSlot::TextureInfo {
                material: material_index,
                slot,
            },
        );
        Some(def)
    }

    fn write_materials(&mut self) {
        let doc = self.doc;
        for (i, material) in doc.root().list_materials(doc).into_iter().enumerate() {
            let id = material.id();
            let base_color = material.base_color_factor(doc);
            let metallic = material.metallic_factor(doc);
            let roughness = material.roughness_factor(doc);
            let emissive = material.emissive_factor(doc);
            let alpha_mode = material.alpha_mode(doc);
            let cutoff = material.alpha_cutoff(doc);
            let def = MaterialDef {
                name: self.name_of(id),
                emissive_factor: (emissive != [0.0; 3]).then_some(emissive),
                alpha_mode: (alpha_mode != AlphaMode::Opaque).then(|| alpha_mode.as_str().to_string()),
                alpha_cutoff: (alpha_mode == AlphaMode::Mask && cutoff != 0.5).then_some(cutoff),
                double_sided: material.double_sided(doc),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
                ..Default::default()
            };
            // Must exist before texture infos are assigned to it.
            self.ctx.json.materials.push(def);

            let mut pbr = PbrDef {
                base_color_factor: (base_color != [1.0; 4]).then_some(base_color),
                metallic_factor: (metallic != 1.0).then_some(metallic),
                roughness_factor: (roughness != 1.0).then_some(roughness),
                ..Default::default()
            };
            pbr.base_color_texture = self.texture_info_def(material, i, TextureSlot::BaseColor);
            pbr.metallic_roughness_texture = self.texture_info_def(material, i, TextureSlot::MetallicRoughness);
            let normal = self.texture_info_def(material, i, TextureSlot::Normal);
            let occlusion = self.texture_info_def(material, i, TextureSlot::Occlusion);
            let emissive_texture = self.texture_info_def(material, i, TextureSlot::Emissive);

            if let Some(def) = self.ctx.json.materials.get_mut(i) {
                def.pbr_metallic_roughness = (!pbr.is_empty()).then_some(pbr);
                def.normal_texture = normal;
                def.occlusion_texture = occlusion;
                def.emissive_texture = emissive_texture;
            }
        }
    }

    fn attribute_map(&self, pairs: Vec<(String, Accessor)>) -> BTreeMap<String, u32> {
        pairs
            .into_iter()
            .filter_map(|(semantic, accessor)| Some((semantic, self.index(accessor)?)))
            .collect()
    }

    fn primitive_def(&mut self, primitive: Primitive) -> PrimitiveDef {
        let doc = self.doc;
        let id = primitive.id();
        let mode = primitive.mode(doc);
        let targets = primitive
            .list_targets(doc)
            .into_iter()
            .map(|t| self.attribute_map(t.list_attributes(doc)))
            .collect();
        PrimitiveDef {
            attributes: self.attribute_map(primitive.list_attributes(doc)),
            indices: primitive.indices(doc).and_then(|a| self.index(a)),
            material: primitive.material(doc).and_then(|m| self.index(m)),
            mode: (mode != PrimitiveMode::Triangles).then_some(mode as u32),
            targets,
            extensions: self.unknown_of(id),
            extras: self.extras_of(id),
        }
    }

    fn write_meshes(&mut self) {
        let doc = self.doc;
        for (i, mesh) in doc.root().list_meshes(doc).into_iter().enumerate() {
            let id = mesh.id();
            let mut def = MeshDef {
                name: self.name_of(id),
                primitives: Vec::new(),
                weights: mesh.weights(doc),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            for (j, primitive) in mesh.list_primitives(doc).into_iter().enumerate() {
                def.primitives.push(self.primitive_def(primitive));
                self.ctx.assign(
                    primitive.id(),
                    j as u32,
                    DefSlot::Primitive { mesh: i, primitive: j },
                );
            }
            self.ctx.json.meshes.push(def);
        }
    }

    fn write_skins(&mut self) {
        let doc = self.doc;
        for skin in doc.root().list_skins(doc) {
            let id = skin.id();
            let def = SkinDef {
                name: self.name_of(id),
                inverse_bind_matrices: skin.inverse_bind_matrices(doc).and_then(|a| self.index(a)),
                skeleton: skin.skeleton(doc).and_then(|n| self.index(n)),
                joints: skin.list_joints(doc).into_iter().filter_map(|n| self.index(n)).collect(),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            self.ctx.json.skins.push(def);
        }
    }

    fn write_cameras(&mut self) {
        let doc = self.doc;
        for camera in doc.root().list_cameras(doc) {
            let id = camera.id();
            let camera_type = camera.camera_type(doc);
            let mut def = CameraDef {
                name: self.name_of(id),
                camera_type: camera_type.as_str().to_string(),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
                ..Default::default()
            };
            match camera_type {
                CameraType::Perspective => {
                    def.perspective = Some(PerspectiveDef {
                        aspect_ratio: camera.aspect_ratio(doc),
                        yfov: camera.yfov(doc),
                        zfar: camera.zfar(doc),
                        znear: camera.znear(doc),
                    })
                }
                CameraType::Orthographic => {
                    def.orthographic = Some(OrthographicDef {
                        xmag: camera.xmag(doc),
                        ymag: camera.ymag(doc),
                        zfar: camera.zfar(doc).unwrap_or(100.0),
                        znear: camera.znear(doc),
                    })
                }
            }
            self.ctx.json.cameras.push(def);
        }
    }

    fn write_nodes(&mut self) {
        let doc = self.doc;
        for node in doc.root().list_nodes(doc) {
            let id = node.id();
            let translation = node.translation(doc);
            let rotation = node.rotation(doc);
            let scale = node.scale(doc);
            let def = NodeDef {
                name: self.name_of(id),
                children: node.list_children(doc).into_iter().filter_map(|c| self.index(c)).collect(),
                mesh: node.mesh(doc).and_then(|m| self.index(m)),
                camera: node.camera(doc).and_then(|c| self.index(c)),
                skin: node.skin(doc).and_then(|s| self.index(s)),
                translation: (translation != [0.0; 3]).then_some(translation),
                rotation: (rotation != [0.0, 0.0, 0.0, 1.0]).then_some(rotation),
                scale: (scale != [1.0; 3]).then_some(scale),
                matrix: None,
                weights: node.weights(doc),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            self.ctx.json.nodes.push(def);
        }
    }

    fn write_animations(&mut self) {
        let doc = self.doc;
        for animation in doc.root().list_animations(doc) {
            let id = animation.id();
            let mut def = AnimationDef {
                name: self.name_of(id),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
                ..Default::default()
            };
            let mut local: HashMap<PropertyId, u32> = HashMap::new();
            for sampler in animation.list_samplers(doc) {
                let input = sampler.input(doc).and_then(|a| self.index(a));
                let output = sampler.output(doc).and_then(|a| self.index(a));
                let (Some(input), Some(output)) = (input, output) else {
                    self.ctx.logger().warn(&format!(
                        "animation {:?}: sampler without input or output, skipped",
                        animation.name(doc)
                    ));
                    continue;
                };
                let interpolation = sampler.interpolation(doc);
                local.insert(sampler.id(), def.samplers.len() as u32);
                def.samplers.push(AnimationSamplerDef {
                    input,
                    output,
                    interpolation: (interpolation != Interpolation::Linear)
                        .then(|| interpolation.as_str().to_string()),
                    extensions: self.unknown_of(sampler.id()),
                    extras: self.extras_of(sampler.id()),
                });
            }
            for channel in animation.list_channels(doc) {
                let sampler = channel.sampler(doc).and_then(|s| local.get(&s.id()).copied());
                let (Some(sampler), Some(path)) = (sampler, channel.target_path(doc)) else {
                    self.ctx.logger().warn(&format!(
                        "animation {:?}: channel without sampler or target path, skipped",
                        animation.name(doc)
                    ));
                    continue;
                };
                def.channels.push(ChannelDef {
                    sampler,
                    target: ChannelTargetDef {
                        node: channel.target_node(doc).and_then(|n| self.index(n)),
                        path: path.as_str().to_string(),
                    },
                    extensions: self.unknown_of(channel.id()),
                    extras: self.extras_of(channel.id()),
                });
            }
            self.ctx.json.animations.push(def);
        }
    }

    fn write_scenes(&mut self) {
        let doc = self.doc;
        for scene in doc.root().list_scenes(doc) {
            let id = scene.id();
            let def = SceneDef {
                name: self.name_of(id),
                nodes: scene.list_children(doc).into_iter().filter_map(|n| self.index(n)).collect(),
                extensions: self.unknown_of(id),
                extras: self.extras_of(id),
            };
            self.ctx.json.scenes.push(def);
        }
    }

    fn write_root(&mut self) {
        let doc = self.doc;
        let root = doc.root();
        self.ctx.json.scene = root.default_scene(doc).and_then(|s| self.index(s));
        self.ctx.json.asset = Asset {
            generator: root.generator(doc).map(str::to_string),
            copyright: root.copyright(doc).map(str::to_string),
            min_version: root.min_version(doc).map(str::to_string),
            ..Asset::default()
        };
        self.ctx.json.extensions = self.unknown_of(self.root);
        self.ctx.json.extras = self.extras_of(self.root);
    }

    /// Registered extensions in registration order, then opaque ones.
    fn write_extension_lists(&mut self) {
        let registry = self.doc.extensions();
        let mut used: Vec<String> = registry.names().into_iter().map(str::to_string).collect();
        for name in &self.unknown_extensions {
            if !used.contains(name) {
                used.push(name.clone());
            }
        }
        self.ctx.json.extensions_required = registry
            .names()
            .into_iter()
            .filter(|name| registry.is_required(name))
            .map(str::to_string)
            .collect();
        self.ctx.json.extensions_used = used;
    }
}

/// Accessors and images destined for one buffer.
struct BufferPlan {
    buffer: Buffer,
    accessors: Vec<Accessor>,
    images: Vec<Texture>,
}

impl BufferPlan {
    fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            accessors: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Zero-pad so that `data.len() - base` is a multiple of 4.
fn pad_to_4(data: &mut Vec<u8>, base: usize) {
    let len = data.len() - base;
    data.resize(base + align4(len), 0);
}

/// `name` made safe for a generated file name.
fn file_stem(name: &str) -> String {
    name.replace(['/', '\\', ':'], "_")
}

fn split_extension(uri: &str) -> (&str, &str) {
    let file_start = uri.rfind('/').map_or(0, |i| i + 1);
    match uri[file_start..].rfind('.') {
        Some(dot) => uri.split_at(file_start + dot),
        None => (uri, ""),
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/ktx2" => "ktx2",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ElementType;

    fn triangle(doc: &mut Document) -> Primitive {
        let buffer = doc.create_buffer("geometry");
        let position = doc.create_accessor("position");
        position
            .set_element_type(doc, ElementType::Vec3)
            .unwrap()
            .set_array(doc, vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap()
            .set_buffer(doc, Some(buffer))
            .unwrap();
        let indices = doc.create_accessor("indices");
        indices
            .set_array(doc, vec![0u16, 1, 2])
            .unwrap()
            .set_buffer(doc, Some(buffer))
            .unwrap();
        let prim = doc.create_primitive();
        prim.set_attribute(doc, "POSITION", Some(position))
            .unwrap()
            .set_indices(doc, Some(indices))
            .unwrap();
        let mesh = doc.create_mesh("tri");
        mesh.add_primitive(doc, prim).unwrap();
        prim
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a/b.bin"), ("a/b", ".bin"));
        assert_eq!(split_extension("a.b/c"), ("a.b/c", ""));
    }

    #[test]
    fn test_buffer_views() {
        let mut doc = Document::new();
        triangle(&mut doc);
        let out = write_document(&doc, &WriterOptions::default()).unwrap();
        let json = &out.json;
        assert_eq!(json.accessors.len(), 2);
        assert_eq!(json.buffer_views.len(), 2);
        assert_eq!(json.buffers.len(), 1);
        assert_eq!(json.buffers[0].uri.as_deref(), Some("geometry.bin"));

        let indices_view = &json.buffer_views[0];
        assert_eq!(indices_view.target, Some(ELEMENT_ARRAY_BUFFER));
        assert_eq!(indices_view.byte_length, 6);

        let vertex_view = &json.buffer_views[1];
        assert_eq!(vertex_view.byte_stride, Some(12));
        assert_eq!(vertex_view.byte_offset, Some(8));
        assert_eq!(json.buffers[0].byte_length, 8 + 36);
        assert_eq!(json.accessors[0].min, vec![0.0, 0.0, 0.0]);
        assert_eq!(json.accessors[0].max, vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unused_accessor_skipped() {
        let mut doc = Document::new();
        triangle(&mut doc);
        let stray = doc.create_accessor("stray");
        stray.set_array(&mut doc, vec![1.0f32]).unwrap();
        let out = write_document(&doc, &WriterOptions::default()).unwrap();
        assert_eq!(out.json.accessors.len(), 2);
        assert!(out.json.accessors.iter().all(|a| a.name.as_deref() != Some("stray")));
    }

    #[test]
    fn test_missing_buffer() {
        let mut doc = Document::new();
        let accessor = doc.create_accessor("a");
        accessor.set_array(&mut doc, vec![1.0f32, 2.0]).unwrap();
        let node = doc.create_node("n");
        let mesh = doc.create_mesh("m");
        let prim = doc.create_primitive();
        prim.set_attribute(&mut doc, "POSITION", Some(accessor)).unwrap();
        mesh.add_primitive(&mut doc, prim).unwrap();
        node.set_mesh(&mut doc, Some(mesh)).unwrap();
        let err = write_document(&doc, &WriterOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingBuffer(_)));
    }

    #[test]
    fn test_uri_collision_policy() {
        let mut doc = Document::new();
        let prim = triangle(&mut doc);
        let other = doc.create_buffer("geometry");
        let extra = doc.create_accessor("extra");
        extra
            .set_array(&mut doc, vec![0.5f32; 3])
            .unwrap()
            .set_buffer(&mut doc, Some(other))
            .unwrap();
        prim.set_attribute(&mut doc, "TEXCOORD_0", Some(extra)).unwrap();

        let renamed = write_document(&doc, &WriterOptions::default()).unwrap();
        let uris: Vec<_> = renamed.json.buffers.iter().filter_map(|b| b.uri.clone()).collect();
        assert_eq!(uris, vec!["geometry.bin".to_string(), "geometry_2.bin".to_string()]);

        let strict = WriterOptions::default().with_uri_collision(UriCollision::Fail);
        assert!(matches!(write_document(&doc, &strict), Err(Error::DuplicateUri(_))));
    }

    #[test]
    fn test_sampler_dedup() {
        let mut doc = Document::new();
        let texture = doc.create_texture("t");
        texture.set_image(&mut doc, &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]).unwrap();
        let a = doc.create_material("a");
        let b = doc.create_material("b");
        for material in [a, b] {
            material.set_texture(&mut doc, TextureSlot::BaseColor, Some(texture)).unwrap();
            material
                .texture_info(&doc, TextureSlot::BaseColor)
                .unwrap()
                .set_wrap_s(&mut doc, sampler::CLAMP_TO_EDGE)
                .unwrap();
        }
        let out = write_document(&doc, &WriterOptions::default()).unwrap();
        assert_eq!(out.json.images.len(), 1);
        assert_eq!(out.json.samplers.len(), 1);
        assert_eq!(out.json.textures.len(), 1);
        assert_eq!(out.json.images[0].uri.as_deref(), Some("t.png"));
        assert!(out.resources.contains_key("t.png"));
    }
}
