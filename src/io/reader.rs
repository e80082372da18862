//! glTF JSON and binary resources to a Document.
//!
//! Properties are rebuilt in the writer's order (buffers, accessors,
//! textures, materials, meshes, skins, cameras, nodes, animations,
//! scenes) so every index a JSON object refers to already has its
//! property. Extension read hooks run last.

use std::collections::BTreeMap;

use serde_json::Value;

use super::context::ReaderContext;
use super::schema::*;
use super::{JsonDocument, ReaderOptions, GLB_BUFFER};
use crate::document::Document;
use crate::graph::PropertyId;
use crate::properties::{
    image_size, mime_from_bytes, Accessor, AlphaMode, CameraType, ElementType, Interpolation,
    Material, Node, PrimitiveMode, TargetPath, Texture, TextureSlot,
};
use crate::property::{AccessorArray, ComponentType, PropertyType};
use crate::util::{Error, Result};

/// Rebuild a document from `source`.
///
/// Fails when the asset version is not 2.x, when a required extension is
/// not among `options.extensions`, or when buffer data cannot be
/// resolved. Missing or malformed images are logged and skipped.
pub fn read_document(source: &JsonDocument, options: &ReaderOptions) -> Result<Document> {
    let json = &source.json;
    check_version(&json.asset)?;

    let mut doc = Document::with_config(options.config.clone());
    for name in &json.extensions_required {
        if !options.extensions.iter().any(|c| c.name() == name) {
            return Err(Error::MissingExtension(name.clone()));
        }
    }
    for name in &json.extensions_used {
        match options.extensions.iter().find(|c| c.name() == name) {
            Some(class) => {
                class.install(&mut doc);
                if json.extensions_required.contains(name) {
                    doc.extensions_mut().set_required(name, true);
                }
            }
            None => doc
                .logger()
                .warn(&format!("extension {} is not supported, its data is kept as-is", name)),
        }
    }
    for (key, value) in &options.dependencies {
        doc.extensions_mut().register_dependency(key.clone(), value.clone());
    }

    let buffer_data = resolve_buffers(json, &source.resources)?;
    let ctx = ReaderContext::new(json, buffer_data, options.config.logger.clone());
    let mut reader = Reader {
        json,
        resources: &source.resources,
        ctx,
        doc,
    };
    reader.run()?;
    Ok(reader.doc)
}

/// Largest accessor a GLB container can describe.
const MAX_ACCESSOR_BYTES: u64 = u32::MAX as u64;

fn check_version(asset: &Asset) -> Result<()> {
    if !asset.version.starts_with("2.") {
        return Err(Error::UnsupportedVersion(asset.version.clone()));
    }
    if let Some(min) = &asset.min_version {
        if !min.starts_with("2.") {
            return Err(Error::UnsupportedVersion(min.clone()));
        }
    }
    Ok(())
}

fn resolve_buffers<'a>(json: &GltfRoot, resources: &'a BTreeMap<String, Vec<u8>>) -> Result<Vec<&'a [u8]>> {
    let mut out = Vec::with_capacity(json.buffers.len());
    for (i, def) in json.buffers.iter().enumerate() {
        let key = match &def.uri {
            Some(uri) => uri.as_str(),
            None if i == 0 => GLB_BUFFER,
            None => return Err(Error::MissingResource(format!("buffer {} has no uri", i))),
        };
        let bytes = resources
            .get(key)
            .ok_or_else(|| Error::MissingResource(key.to_string()))?;
        if (bytes.len() as u64) < def.byte_length {
            return Err(Error::UnexpectedEof(bytes.len() as u64));
        }
        out.push(bytes.as_slice());
    }
    Ok(out)
}

struct Reader<'a> {
    json: &'a GltfRoot,
    resources: &'a BTreeMap<String, Vec<u8>>,
    ctx: ReaderContext<'a>,
    doc: Document,
}

impl<'a> Reader<'a> {
    fn run(&mut self) -> Result<()> {
        self.preread(PropertyType::Buffer)?;
        self.read_buffers()?;
        self.preread(PropertyType::Accessor)?;
        self.read_accessors()?;
        self.preread(PropertyType::Texture)?;
        self.read_images()?;
        self.preread(PropertyType::Material)?;
        self.read_materials()?;
        self.preread(PropertyType::Mesh)?;
        self.read_meshes()?;
        self.preread(PropertyType::Skin)?;
        self.read_skins()?;
        self.preread(PropertyType::Camera)?;
        self.read_cameras()?;
        self.preread(PropertyType::Node)?;
        self.read_nodes()?;
        self.link_skins()?;
        self.preread(PropertyType::Animation)?;
        self.read_animations()?;
        self.preread(PropertyType::Scene)?;
        self.read_scenes()?;
        self.read_root()?;

        for extension in self.doc.extensions().list() {
            extension.read(&mut self.ctx, &mut self.doc)?;
        }
        Ok(())
    }

    fn preread(&mut self, property_type: PropertyType) -> Result<()> {
        for extension in self.doc.extensions().list() {
            if extension.preread_types().contains(&property_type) {
                extension.preread(&mut self.ctx, &mut self.doc, property_type)?;
            }
        }
        Ok(())
    }

    /// Store extras and any extension objects no registered extension
    /// will claim.
    fn keep(&mut self, id: PropertyId, extensions: &Extensions, extras: &Value) -> Result<()> {
        for (name, value) in extensions {
            if !self.doc.extensions().contains(name) {
                self.doc.graph_mut().set_unknown_extension(id, name, value.clone())?;
            }
        }
        if !extras.is_null() {
            self.doc.graph_mut().set_extras(id, extras.clone())?;
        }
        Ok(())
    }

    fn warn(&self, message: &str) {
        self.ctx.logger().warn(message);
    }

    /// `count` elements of `element_bytes` each, honoring the view stride.
    ///
    /// Every element must lie inside both the view and its buffer.
    fn view_bytes(&self, view: u32, offset: Option<u64>, element_bytes: usize, count: usize) -> Result<Vec<u8>> {
        let view_def = self
            .json
            .buffer_views
            .get(view as usize)
            .ok_or_else(|| Error::invalid(format!("buffer view {} does not exist", view)))?;
        let data = self
            .ctx
            .buffer_data
            .get(view_def.buffer as usize)
            .ok_or_else(|| Error::invalid(format!("buffer {} does not exist", view_def.buffer)))?;
        let view_start = view_def.byte_offset.unwrap_or(0);
        let view_end = view_start
            .checked_add(view_def.byte_length)
            .ok_or_else(|| Error::invalid(format!("buffer view {} has an overflowing range", view)))?;
        if view_end > data.len() as u64 {
            return Err(Error::UnexpectedEof(view_end));
        }
        let stride = view_def
            .byte_stride
            .map(|s| s as usize)
            .filter(|s| *s > 0)
            .unwrap_or(element_bytes);
        if stride < element_bytes {
            return Err(Error::invalid(format!(
                "buffer view {}: stride {} is smaller than an element ({} bytes)",
                view, stride, element_bytes
            )));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let end = (count as u64 - 1)
            .checked_mul(stride as u64)
            .and_then(|span| span.checked_add(element_bytes as u64))
            .and_then(|span| span.checked_add(view_start))
            .and_then(|span| span.checked_add(offset.unwrap_or(0)))
            .ok_or_else(|| Error::invalid(format!("buffer view {}: {} elements overflow", view, count)))?;
        if end > view_end {
            return Err(Error::UnexpectedEof(end));
        }

        let start = (view_start + offset.unwrap_or(0)) as usize;
        let mut out = Vec::with_capacity(count * element_bytes);
        for i in 0..count {
            let from = start + i * stride;
            let chunk = data
                .get(from..from + element_bytes)
                .ok_or(Error::UnexpectedEof((from + element_bytes) as u64))?;
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }

    fn read_buffers(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.buffers {
            let buffer = self.doc.create_buffer(def.name.as_deref().unwrap_or(""));
            if let Some(uri) = &def.uri {
                buffer.set_uri(&mut self.doc, uri)?;
            }
            self.keep(buffer.id(), &def.extensions, &def.extras)?;
            self.ctx.buffers.push(buffer);
        }
        Ok(())
    }

    fn read_accessors(&mut self) -> Result<()> {
        let json = self.json;
        for (index, def) in json.accessors.iter().enumerate() {
            let element_type = ElementType::parse(&def.element_type)
                .ok_or_else(|| Error::invalid(format!("accessor {}: unknown type {}", index, def.element_type)))?;
            let component_type = ComponentType::from_gl_enum(def.component_type).ok_or_else(|| {
                Error::invalid(format!("accessor {}: unknown component type {}", index, def.component_type))
            })?;
            let size = element_type.size();
            let element_bytes = size * component_type.num_bytes();
            let count = usize::try_from(def.count)
                .ok()
                .filter(|n| n.checked_mul(element_bytes).is_some_and(|b| b as u64 <= MAX_ACCESSOR_BYTES))
                .ok_or_else(|| Error::invalid(format!("accessor {}: count {} is too large", index, def.count)))?;

            let mut array = match def.buffer_view {
                Some(view) => {
                    let bytes = self.view_bytes(view, def.byte_offset, element_bytes, count)?;
                    AccessorArray::from_bytes(component_type, &bytes)?
                }
                None => AccessorArray::zeros(component_type, count * size),
            };
            if let Some(sparse) = &def.sparse {
                self.apply_sparse(&mut array, sparse, component_type, size)?;
            }

            let buffer_view = def
                .buffer_view
                .or_else(|| def.sparse.as_ref().map(|s| s.values.buffer_view));
            let buffer = buffer_view
                .and_then(|v| json.buffer_views.get(v as usize))
                .and_then(|v| self.ctx.buffers.get(v.buffer as usize).copied());

            let doc = &mut self.doc;
            let accessor = doc.create_accessor(def.name.as_deref().unwrap_or(""));
            accessor
                .set_element_type(doc, element_type)?
                .set_array(doc, array)?
                .set_buffer(doc, buffer)?;
            if def.normalized {
                accessor.set_normalized(doc, true)?;
            }
            if def.sparse.is_some() {
                accessor.set_sparse(doc, true)?;
            }
            self.keep(accessor.id(), &def.extensions, &def.extras)?;
            self.ctx.accessors.push(accessor);
        }
        Ok(())
    }

    fn apply_sparse(
        &self,
        array: &mut AccessorArray,
        sparse: &SparseDef,
        component_type: ComponentType,
        size: usize,
    ) -> Result<()> {
        let count = usize::try_from(sparse.count)
            .map_err(|_| Error::invalid(format!("sparse count {} is too large", sparse.count)))?;
        let index_type = ComponentType::from_gl_enum(sparse.indices.component_type)
            .ok_or_else(|| Error::invalid("sparse indices have an unknown component type"))?;
        let index_bytes = self.view_bytes(
            sparse.indices.buffer_view,
            sparse.indices.byte_offset,
            index_type.num_bytes(),
            count,
        )?;
        let indices = AccessorArray::from_bytes(index_type, &index_bytes)?;
        let value_bytes = self.view_bytes(
            sparse.values.buffer_view,
            sparse.values.byte_offset,
            size * component_type.num_bytes(),
            count,
        )?;
        let values = AccessorArray::from_bytes(component_type, &value_bytes)?;
        for k in 0..count {
            let target = indices.get(k).unwrap_or(0.0) as usize;
            let base = target
                .checked_mul(size)
                .ok_or_else(|| Error::invalid(format!("sparse index {} is out of range", target)))?;
            for c in 0..size {
                array.set(base + c, values.get(k * size + c).unwrap_or(0.0))?;
            }
        }
        Ok(())
    }

    /// Encoded bytes of an image, or `None` when unavailable or
    /// unreadable.
    fn image_bytes(&self, index: usize, def: &ImageDef) -> Result<Option<Vec<u8>>> {
        let bytes = match (&def.buffer_view, &def.uri) {
            (Some(view), _) => {
                let length = self
                    .json
                    .buffer_views
                    .get(*view as usize)
                    .map_or(0, |v| v.byte_length as usize);
                self.view_bytes(*view, None, length, 1)?
            }
            (None, Some(uri)) => match self.resources.get(uri) {
                Some(bytes) => bytes.clone(),
                None => {
                    self.warn(&format!("image {}: resource {} not found, skipped", index, uri));
                    return Ok(None);
                }
            },
            (None, None) => return Ok(None),
        };
        let mime = def.mime_type.as_deref().or_else(|| mime_from_bytes(&bytes));
        let checked = matches!(mime, Some("image/png" | "image/jpeg"));
        if checked && image_size(&bytes).is_none() {
            self.warn(&format!("image {}: unreadable {} header, skipped", index, mime.unwrap_or("")));
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    fn read_images(&mut self) -> Result<()> {
        let json = self.json;
        for (index, def) in json.images.iter().enumerate() {
            let bytes = self.image_bytes(index, def)?;
            let doc = &mut self.doc;
            let texture = doc.create_texture(def.name.as_deref().unwrap_or(""));
            if let Some(mime) = &def.mime_type {
                texture.set_mime_type(doc, mime)?;
            }
            if let Some(uri) = &def.uri {
                texture.set_uri(doc, uri)?;
            }
            if let Some(bytes) = bytes {
                texture.set_image(doc, &bytes)?;
            }
            self.keep(texture.id(), &def.extensions, &def.extras)?;
            self.ctx.textures.push(texture);
        }
        Ok(())
    }

    fn read_texture_slot(
        &mut self,
        material: Material,
        slot: TextureSlot,
        info_def: Option<&TextureInfoDef>,
    ) -> Result<()> {
        let Some(info_def) = info_def else {
            return Ok(());
        };
        let json = self.json;
        let Some(texture_def) = json.textures.get(info_def.index as usize) else {
            self.warn(&format!("texture {} does not exist", info_def.index));
            return Ok(());
        };
        let opaque: Extensions = texture_def
            .extensions
            .iter()
            .filter(|(name, _)| !self.doc.extensions().contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        // Opaque extensions such as EXT_texture_webp name an image of their own.
        let extension_sources: Vec<(String, Texture)> = opaque
            .iter()
            .filter_map(|(name, value)| {
                let source = value.get("source")?.as_u64()?;
                let texture = self.ctx.textures.get(usize::try_from(source).ok()?).copied()?;
                Some((name.clone(), texture))
            })
            .collect();
        let core_source = texture_def
            .source
            .and_then(|s| self.ctx.textures.get(s as usize).copied());
        let Some(texture) = core_source.or_else(|| extension_sources.first().map(|(_, t)| *t)) else {
            self.warn(&format!("texture {} has no readable source", info_def.index));
            return Ok(());
        };

        let doc = &mut self.doc;
        material.set_texture(doc, slot, Some(texture))?;
        let Some(info) = material.texture_info(doc, slot) else {
            return Ok(());
        };
        for (name, source) in &extension_sources {
            info.set_extension_source(doc, name, Some(*source))?;
        }
        if core_source.is_none() {
            info.set_extension_source_only(doc, true)?;
        }
        info.set_texture_extensions(doc, opaque)?
            .set_texture_extras(doc, texture_def.extras.clone())?;
        if let Some(tex_coord) = info_def.tex_coord {
            info.set_tex_coord(doc, tex_coord)?;
        }
        if let Some(sampler) = texture_def.sampler.and_then(|s| json.samplers.get(s as usize)) {
            info.set_mag_filter(doc, sampler.mag_filter)?
                .set_min_filter(doc, sampler.min_filter)?;
            if let Some(wrap) = sampler.wrap_s {
                info.set_wrap_s(doc, wrap)?;
            }
            if let Some(wrap) = sampler.wrap_t {
                info.set_wrap_t(doc, wrap)?;
            }
        }
        match slot {
            TextureSlot::Normal => {
                if let Some(scale) = info_def.scale {
                    material.set_normal_scale(doc, scale)?;
                }
            }
            TextureSlot::Occlusion => {
                if let Some(strength) = info_def.strength {
                    material.set_occlusion_strength(doc, strength)?;
                }
            }
            _ => {}
        }
        self.keep(info.id(), &info_def.extensions, &info_def.extras)?;
        self.ctx.texture_infos.push((info, info_def.clone()));
        Ok(())
    }

    fn read_materials(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.materials {
            let doc = &mut self.doc;
            let material = doc.create_material(def.name.as_deref().unwrap_or(""));
            if let Some(mode) = def.alpha_mode.as_deref().and_then(AlphaMode::parse) {
                material.set_alpha_mode(doc, mode)?;
            }
            if let Some(cutoff) = def.alpha_cutoff {
                material.set_alpha_cutoff(doc, cutoff)?;
            }
            if def.double_sided {
                material.set_double_sided(doc, true)?;
            }
            if let Some(factor) = def.emissive_factor {
                material.set_emissive_factor(doc, factor)?;
            }
            let pbr = def.pbr_metallic_roughness.as_ref();
            if let Some(pbr) = pbr {
                if let Some(factor) = pbr.base_color_factor {
                    material.set_base_color_factor(doc, factor)?;
                }
                if let Some(metallic) = pbr.metallic_factor {
                    material.set_metallic_factor(doc, metallic)?;
                }
                if let Some(roughness) = pbr.roughness_factor {
                    material.set_roughness_factor(doc, roughness)?;
                }
            }
            self.read_texture_slot(material, TextureSlot::BaseColor, pbr.and_then(|p| p.base_color_texture.as_ref()))?;
            self.read_texture_slot(
                material,
                TextureSlot::MetallicRoughness,
                pbr.and_then(|p| p.metallic_roughness_texture.as_ref()),
            )?;
            self.read_texture_slot(material, TextureSlot::Normal, def.normal_texture.as_ref())?;
            self.read_texture_slot(material, TextureSlot::Occlusion, def.occlusion_texture.as_ref())?;
            self.read_texture_slot(material, TextureSlot::Emissive, def.emissive_texture.as_ref())?;
            self.keep(material.id(), &def.extensions, &def.extras)?;
            self.ctx.materials.push(material);
        }
        Ok(())
    }

    fn accessor_at(&self, index: u32) -> Result<Accessor> {
        self.ctx
            .accessors
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::invalid(format!("accessor {} does not exist", index)))
    }

    fn read_meshes(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.meshes {
            let mesh = self.doc.create_mesh(def.name.as_deref().unwrap_or(""));
            let mut primitives = Vec::with_capacity(def.primitives.len());
            for prim_def in &def.primitives {
                let primitive = self.doc.create_primitive();
                for (semantic, index) in &prim_def.attributes {
                    let accessor = self.accessor_at(*index)?;
                    primitive.set_attribute(&mut self.doc, semantic, Some(accessor))?;
                }
                if let Some(index) = prim_def.indices {
                    let accessor = self.accessor_at(index)?;
                    primitive.set_indices(&mut self.doc, Some(accessor))?;
                }
                if let Some(index) = prim_def.material {
                    let material = self.ctx.materials.get(index as usize).copied();
                    primitive.set_material(&mut self.doc, material)?;
                }
                if let Some(mode) = prim_def.mode.and_then(PrimitiveMode::from_gl_enum) {
                    primitive.set_mode(&mut self.doc, mode)?;
                }
                for target_def in &prim_def.targets {
                    let target = self.doc.create_primitive_target("");
                    for (semantic, index) in target_def {
                        let accessor = self.accessor_at(*index)?;
                        target.set_attribute(&mut self.doc, semantic, Some(accessor))?;
                    }
                    primitive.add_target(&mut self.doc, target)?;
                }
                mesh.add_primitive(&mut self.doc, primitive)?;
                self.keep(primitive.id(), &prim_def.extensions, &prim_def.extras)?;
                primitives.push(primitive);
            }
            if !def.weights.is_empty() {
                mesh.set_weights(&mut self.doc, &def.weights)?;
            }
            self.keep(mesh.id(), &def.extensions, &def.extras)?;
            self.ctx.meshes.push(mesh);
            self.ctx.primitives.push(primitives);
        }
        Ok(())
    }

    /// Skins are created before nodes; joints are linked afterwards.
    fn read_skins(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.skins {
            let skin = self.doc.create_skin(def.name.as_deref().unwrap_or(""));
            if let Some(index) = def.inverse_bind_matrices {
                let accessor = self.accessor_at(index)?;
                skin.set_inverse_bind_matrices(&mut self.doc, Some(accessor))?;
            }
            self.keep(skin.id(), &def.extensions, &def.extras)?;
            self.ctx.skins.push(skin);
        }
        Ok(())
    }

    fn read_cameras(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.cameras {
            let doc = &mut self.doc;
            let camera = doc.create_camera(def.name.as_deref().unwrap_or(""));
            let camera_type = CameraType::parse(&def.camera_type).unwrap_or_default();
            camera.set_camera_type(doc, camera_type)?;
            if let Some(p) = &def.perspective {
                camera
                    .set_yfov(doc, p.yfov)?
                    .set_znear(doc, p.znear)?
                    .set_aspect_ratio(doc, p.aspect_ratio)?
                    .set_zfar(doc, p.zfar)?;
            }
            if let Some(o) = &def.orthographic {
                camera
                    .set_xmag(doc, o.xmag)?
                    .set_ymag(doc, o.ymag)?
                    .set_znear(doc, o.znear)?
                    .set_zfar(doc, Some(o.zfar))?;
            }
            self.keep(camera.id(), &def.extensions, &def.extras)?;
            self.ctx.cameras.push(camera);
        }
        Ok(())
    }

    fn node_at(&self, index: u32) -> Result<Node> {
        self.ctx
            .nodes
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::invalid(format!("node {} does not exist", index)))
    }

    fn read_nodes(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.nodes {
            let doc = &mut self.doc;
            let node = doc.create_node(def.name.as_deref().unwrap_or(""));
            match def.matrix {
                Some(matrix) => {
                    node.set_matrix(doc, matrix)?;
                }
                None => {
                    if let Some(t) = def.translation {
                        node.set_translation(doc, t)?;
                    }
                    if let Some(r) = def.rotation {
                        node.set_rotation(doc, r)?;
                    }
                    if let Some(s) = def.scale {
                        node.set_scale(doc, s)?;
                    }
                }
            }
            if !def.weights.is_empty() {
                node.set_weights(doc, &def.weights)?;
            }
            if let Some(index) = def.mesh {
                node.set_mesh(doc, self.ctx.meshes.get(index as usize).copied())?;
            }
            if let Some(index) = def.camera {
                node.set_camera(doc, self.ctx.cameras.get(index as usize).copied())?;
            }
            self.keep(node.id(), &def.extensions, &def.extras)?;
            self.ctx.nodes.push(node);
        }
        for (index, def) in json.nodes.iter().enumerate() {
            let node = self.ctx.nodes[index];
            for child in &def.children {
                let child = self.node_at(*child)?;
                node.add_child(&mut self.doc, child)?;
            }
        }
        Ok(())
    }

    fn link_skins(&mut self) -> Result<()> {
        let json = self.json;
        for (index, def) in json.skins.iter().enumerate() {
            let skin = self.ctx.skins[index];
            for joint in &def.joints {
                let joint = self.node_at(*joint)?;
                skin.add_joint(&mut self.doc, joint)?;
            }
            if let Some(skeleton) = def.skeleton {
                let skeleton = self.node_at(skeleton)?;
                skin.set_skeleton(&mut self.doc, Some(skeleton))?;
            }
        }
        for (index, def) in json.nodes.iter().enumerate() {
            if let Some(skin) = def.skin {
                let node = self.ctx.nodes[index];
                node.set_skin(&mut self.doc, self.ctx.skins.get(skin as usize).copied())?;
            }
        }
        Ok(())
    }

    fn read_animations(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.animations {
            let animation = self.doc.create_animation(def.name.as_deref().unwrap_or(""));
            let mut samplers = Vec::with_capacity(def.samplers.len());
            for sampler_def in &def.samplers {
                let input = self.accessor_at(sampler_def.input)?;
                let output = self.accessor_at(sampler_def.output)?;
                let doc = &mut self.doc;
                let sampler = doc.create_animation_sampler();
                sampler.set_input(doc, Some(input))?.set_output(doc, Some(output))?;
                if let Some(interpolation) = sampler_def.interpolation.as_deref().and_then(Interpolation::parse) {
                    sampler.set_interpolation(doc, interpolation)?;
                }
                animation.add_sampler(doc, sampler)?;
                self.keep(sampler.id(), &sampler_def.extensions, &sampler_def.extras)?;
                samplers.push(sampler);
            }
            for channel_def in &def.channels {
                let Some(path) = TargetPath::parse(&channel_def.target.path) else {
                    self.warn(&format!("animation channel path {} is not supported, skipped", channel_def.target.path));
                    continue;
                };
                let target = match channel_def.target.node {
                    Some(index) => Some(self.node_at(index)?),
                    None => None,
                };
                let sampler = samplers.get(channel_def.sampler as usize).copied();
                let doc = &mut self.doc;
                let channel = doc.create_animation_channel();
                channel
                    .set_target_path(doc, path)?
                    .set_target_node(doc, target)?
                    .set_sampler(doc, sampler)?;
                animation.add_channel(doc, channel)?;
                self.keep(channel.id(), &channel_def.extensions, &channel_def.extras)?;
            }
            self.keep(animation.id(), &def.extensions, &def.extras)?;
            self.ctx.animations.push(animation);
        }
        Ok(())
    }

    fn read_scenes(&mut self) -> Result<()> {
        let json = self.json;
        for def in &json.scenes {
            let scene = self.doc.create_scene(def.name.as_deref().unwrap_or(""));
            for index in &def.nodes {
                let node = self.node_at(*index)?;
                scene.add_child(&mut self.doc, node)?;
            }
            self.keep(scene.id(), &def.extensions, &def.extras)?;
            self.ctx.scenes.push(scene);
        }
        Ok(())
    }

    fn read_root(&mut self) -> Result<()> {
        let json = self.json;
        let root = self.doc.root();
        if let Some(index) = json.scene {
            let scene = self.ctx.scenes.get(index as usize).copied();
            root.set_default_scene(&mut self.doc, scene)?;
        }
        if let Some(generator) = &json.asset.generator {
            root.set_generator(&mut self.doc, generator)?;
        }
        if let Some(copyright) = &json.asset.copyright {
            root.set_copyright(&mut self.doc, copyright)?;
        }
        if let Some(min_version) = &json.asset.min_version {
            self.doc.graph_mut().set_attr(root.id(), "minVersion", min_version.as_str())?;
        }
        self.keep(root.id(), &json.extensions, &json.extras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::MaterialsUnlit;
    use crate::io::{write_document, WriterOptions};

    fn minimal(version: &str) -> JsonDocument {
        JsonDocument {
            json: GltfRoot {
                asset: Asset {
                    version: version.to_string(),
                    ..Asset::default()
                },
                ..GltfRoot::default()
            },
            resources: BTreeMap::new(),
        }
    }

    #[test]
    fn test_version_check() {
        assert!(read_document(&minimal("2.0"), &ReaderOptions::default()).is_ok());
        let err = read_document(&minimal("1.0"), &ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(v) if v == "1.0"));
    }

    #[test]
    fn test_required_extension() {
        let mut source = minimal("2.0");
        source.json.extensions_used = vec!["EXT_made_up".into()];
        source.json.extensions_required = vec!["EXT_made_up".into()];
        let err = read_document(&source, &ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingExtension(name) if name == "EXT_made_up"));

        source.json.extensions_required.clear();
        assert!(read_document(&source, &ReaderOptions::default()).is_ok());
    }

    #[test]
    fn test_unknown_extension_kept() {
        let mut source = minimal("2.0");
        source.json.extensions_used = vec!["EXT_made_up".into()];
        source.json.nodes.push(NodeDef {
            name: Some("n".into()),
            extensions: [("EXT_made_up".to_string(), serde_json::json!({"answer": 42}))].into(),
            ..NodeDef::default()
        });
        let doc = read_document(&source, &ReaderOptions::default()).unwrap();
        let out = write_document(&doc, &WriterOptions::default()).unwrap();
        assert_eq!(out.json.extensions_used, vec!["EXT_made_up".to_string()]);
        assert_eq!(out.json.nodes[0].extensions["EXT_made_up"]["answer"], 42);
    }

    #[test]
    fn test_missing_buffer_resource() {
        let mut source = minimal("2.0");
        source.json.buffers.push(BufferDef {
            uri: Some("gone.bin".into()),
            byte_length: 4,
            ..BufferDef::default()
        });
        let err = read_document(&source, &ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingResource(_)));
    }

    #[test]
    fn test_strided_and_sparse() {
        let mut source = minimal("2.0");
        // Two VEC2<u8> elements at stride 4, then one u8 sparse index and
        // one VEC2<u8> sparse value.
        let bin = vec![1u8, 2, 0, 0, 3, 4, 0, 0, 1, 0, 0, 0, 9, 9, 0, 0];
        source.resources.insert("data.bin".into(), bin);
        source.json.buffers.push(BufferDef {
            uri: Some("data.bin".into()),
            byte_length: 16,
            ..BufferDef::default()
        });
        source.json.buffer_views.push(BufferViewDef {
            buffer: 0,
            byte_length: 8,
            byte_stride: Some(4),
            ..BufferViewDef::default()
        });
        source.json.buffer_views.push(BufferViewDef {
            buffer: 0,
            byte_offset: Some(8),
            byte_length: 8,
            ..BufferViewDef::default()
        });
        source.json.accessors.push(AccessorDef {
            buffer_view: Some(0),
            component_type: ComponentType::UnsignedByte.gl_enum(),
            count: 2,
            element_type: "VEC2".into(),
            sparse: Some(SparseDef {
                count: 1,
                indices: SparseIndicesDef {
                    buffer_view: 1,
                    byte_offset: None,
                    component_type: ComponentType::UnsignedByte.gl_enum(),
                },
                values: SparseValuesDef {
                    buffer_view: 1,
                    byte_offset: Some(4),
                },
            }),
            ..AccessorDef::default()
        });
        let doc = read_document(&source, &ReaderOptions::default()).unwrap();
        let accessor = doc.root().list_accessors(&doc)[0];
        assert_eq!(accessor.array(&doc), Some(&AccessorArray::U8(vec![1, 2, 9, 9])));
        assert!(accessor.sparse(&doc));
        assert_eq!(accessor.buffer(&doc), Some(doc.root().list_buffers(&doc)[0]));
    }

    #[test]
    fn test_known_extension_installed() {
        let mut source = minimal("2.0");
        source.json.extensions_used = vec!["KHR_materials_unlit".into()];
        source.json.materials.push(MaterialDef {
            extensions: [("KHR_materials_unlit".to_string(), serde_json::json!({}))].into(),
            ..MaterialDef::default()
        });
        let doc = read_document(&source, &ReaderOptions::default()).unwrap();
        assert!(doc.extension::<MaterialsUnlit>().is_some());
        let material = doc.root().list_materials(&doc)[0];
        assert!(material.get_extension(&doc, "KHR_materials_unlit").is_some());
        assert!(doc.graph().data(material.id()).unwrap().unknown_extensions().is_empty());
    }

    #[test]
    fn test_malformed_image_skipped() {
        let mut source = minimal("2.0");
        source.resources.insert("broken.png".into(), vec![0x89, b'P', b'N', b'G']);
        source.json.images.push(ImageDef {
            uri: Some("broken.png".into()),
            mime_type: Some("image/png".into()),
            ..ImageDef::default()
        });
        let doc = read_document(&source, &ReaderOptions::default()).unwrap();
        let texture = doc.root().list_textures(&doc)[0];
        assert!(texture.image(&doc).is_none());
        assert_eq!(texture.uri(&doc), "broken.png");
    }
}
