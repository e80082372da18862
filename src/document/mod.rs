//! Documents: one graph, one root, the registered extensions.

mod merge;
mod transform;

use std::rc::Rc;

pub use transform::{Transform, TransformFn};

use crate::extension::{ExtensionRegistry, ExtensionType};
use crate::graph::{EdgeAttributes, PropertyId};
use crate::properties::{
    root_slot, Accessor, Animation, AnimationChannel, AnimationSampler, Buffer, Camera,
    ExtensionProperty, Material, Mesh, Node, Primitive, PrimitiveTarget, Root, Scene, Skin,
    Texture, TextureInfo, TextureSlot,
};
use crate::property::{ExtensionMeta, PropertyData, PropertyGraph, PropertyType};
use crate::util::{Result, SharedLogger, TracingLogger, Verbosity};

/// Options fixed when a document is created.
#[derive(Clone)]
pub struct DocumentConfig {
    /// Receives warnings from reading, writing and transforms.
    pub logger: SharedLogger,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            logger: TracingLogger::shared(Verbosity::Warn),
        }
    }
}

impl DocumentConfig {
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

/// An editable glTF asset.
///
/// Owns the property graph and its root. Typed handles such as [`Node`]
/// index into the graph; pass the document to their methods.
pub struct Document {
    graph: PropertyGraph,
    root: Root,
    extensions: ExtensionRegistry,
    config: DocumentConfig,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("extensions", &self.extensions.names())
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        let mut graph = PropertyGraph::new();
        let root = Root(graph.create(PropertyType::Root, ""));
        Self {
            graph,
            root,
            extensions: ExtensionRegistry::new(),
            config,
        }
    }

    #[inline]
    pub fn graph(&self) -> &PropertyGraph {
        &self.graph
    }

    #[inline]
    pub fn graph_mut(&mut self) -> &mut PropertyGraph {
        &mut self.graph
    }

    #[inline]
    pub fn root(&self) -> Root {
        self.root
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.config.logger
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    /// Create a property; top-level kinds join their root list.
    fn create(&mut self, property_type: PropertyType, name: &str) -> PropertyId {
        let id = self.graph.create(property_type, name);
        if let Some(slot) = root_slot(property_type) {
            if let Err(err) = self.graph.add_ref(self.root.id(), slot, id) {
                self.config
                    .logger
                    .error(&format!("cannot list {} on root: {}", property_type, err));
            }
        }
        id
    }

    pub fn create_scene(&mut self, name: &str) -> Scene {
        Scene(self.create(PropertyType::Scene, name))
    }

    pub fn create_node(&mut self, name: &str) -> Node {
        Node(self.create(PropertyType::Node, name))
    }

    pub fn create_mesh(&mut self, name: &str) -> Mesh {
        Mesh(self.create(PropertyType::Mesh, name))
    }

    pub fn create_primitive(&mut self) -> Primitive {
        Primitive(self.create(PropertyType::Primitive, ""))
    }

    pub fn create_primitive_target(&mut self, name: &str) -> PrimitiveTarget {
        PrimitiveTarget(self.create(PropertyType::PrimitiveTarget, name))
    }

    pub fn create_accessor(&mut self, name: &str) -> Accessor {
        Accessor(self.create(PropertyType::Accessor, name))
    }

    pub fn create_buffer(&mut self, name: &str) -> Buffer {
        Buffer(self.create(PropertyType::Buffer, name))
    }

    /// Create a material along with one texture info per slot.
    pub fn create_material(&mut self, name: &str) -> Material {
        let material = Material(self.create(PropertyType::Material, name));
        for slot in TextureSlot::ALL {
            let info = self.create_texture_info();
            if let Err(err) =
                self.graph
                    .set_ref(material.id(), slot.info_attr(), Some(info.id()), EdgeAttributes::default())
            {
                self.config.logger.error(&format!("cannot attach texture info: {}", err));
            }
        }
        material
    }

    pub fn create_texture(&mut self, name: &str) -> Texture {
        Texture(self.create(PropertyType::Texture, name))
    }

    pub fn create_texture_info(&mut self) -> TextureInfo {
        TextureInfo(self.create(PropertyType::TextureInfo, ""))
    }

    pub fn create_animation(&mut self, name: &str) -> Animation {
        Animation(self.create(PropertyType::Animation, name))
    }

    pub fn create_animation_channel(&mut self) -> AnimationChannel {
        AnimationChannel(self.create(PropertyType::AnimationChannel, ""))
    }

    pub fn create_animation_sampler(&mut self) -> AnimationSampler {
        AnimationSampler(self.create(PropertyType::AnimationSampler, ""))
    }

    pub fn create_skin(&mut self, name: &str) -> Skin {
        Skin(self.create(PropertyType::Skin, name))
    }

    pub fn create_camera(&mut self, name: &str) -> Camera {
        Camera(self.create(PropertyType::Camera, name))
    }

    /// Create a property owned by an extension. Extensions call this from
    /// their own factories; `kind` tags the new property type.
    pub fn create_extension_property(&mut self, meta: ExtensionMeta, kind: &'static str) -> ExtensionProperty {
        let mut data = PropertyData::new(PropertyType::Extension(kind), "");
        data.extension = Some(meta);
        ExtensionProperty(self.graph.insert(data))
    }

    /// Shallow clone; top-level kinds are listed on the root as well.
    pub fn clone_property(&mut self, id: PropertyId) -> Result<PropertyId> {
        let copy = self.graph.clone_property(id)?;
        if let Some(slot) = root_slot(self.graph.property_type(copy)?) {
            self.graph.add_ref(self.root.id(), slot, copy)?;
        }
        Ok(copy)
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Register `E` on this document, or return the existing instance.
    pub fn create_extension<E: ExtensionType>(&mut self) -> Rc<E> {
        if !self.extensions.contains(E::NAME) {
            self.config.logger.debug(&format!("registering extension {}", E::NAME));
        }
        self.extensions.get_or_insert::<E>()
    }

    /// The registered instance of `E`, if any.
    pub fn extension<E: ExtensionType>(&self) -> Option<Rc<E>> {
        self.extensions.get_typed::<E>()
    }

    /// Live properties created by the named extension.
    pub fn list_extension_properties(&self, name: &str) -> Vec<ExtensionProperty> {
        self.graph
            .ids()
            .filter(|id| {
                self.graph
                    .data(*id)
                    .ok()
                    .and_then(|d| d.extension())
                    .is_some_and(|m| m.extension_name == name)
            })
            .map(ExtensionProperty)
            .collect()
    }

    /// Unregister an extension and dispose every property it created,
    /// detaching each from all of its hosts. Returns false when the
    /// extension was not registered.
    pub fn dispose_extension(&mut self, name: &str) -> Result<bool> {
        let properties = self.list_extension_properties(name);
        for property in &properties {
            if !self.graph.is_disposed(property.id()) {
                self.graph.dispose(property.id())?;
            }
        }
        let removed = self.extensions.remove(name).is_some();
        if removed {
            self.config.logger.info(&format!(
                "disposed extension {} and {} properties",
                name,
                properties.len()
            ));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{MaterialsUnlit, Unlit};

    #[test]
    fn test_factories_attach_to_root() {
        let mut doc = Document::new();
        let node = doc.create_node("a");
        let prim = doc.create_primitive();
        assert_eq!(doc.root().list_nodes(&doc), vec![node]);
        assert!(doc.graph().list_parents(prim.id()).is_empty());
    }

    #[test]
    fn test_clone_property_lists_on_root() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("m");
        let copy = mesh.clone_in(&mut doc).unwrap();
        assert_eq!(doc.root().list_meshes(&doc), vec![mesh, copy]);
    }

    #[test]
    fn test_extension_singleton() {
        let mut doc = Document::new();
        let a = doc.create_extension::<MaterialsUnlit>();
        let b = doc.create_extension::<MaterialsUnlit>();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(doc.extension::<MaterialsUnlit>().is_some());
    }

    #[test]
    fn test_dispose_extension_detaches_properties() {
        let mut doc = Document::new();
        let unlit_ext = doc.create_extension::<MaterialsUnlit>();
        let mats: Vec<Material> = (0..3).map(|i| doc.create_material(&format!("m{}", i))).collect();
        let unlit: Unlit = unlit_ext.create_unlit(&mut doc);
        for mat in &mats {
            mat.set_extension(&mut doc, "KHR_materials_unlit", Some(unlit.id())).unwrap();
        }
        assert!(doc.dispose_extension("KHR_materials_unlit").unwrap());
        for mat in &mats {
            assert_eq!(mat.get_extension(&doc, "KHR_materials_unlit"), None);
        }
        assert!(unlit.is_disposed(&doc));
        assert!(doc.extension::<MaterialsUnlit>().is_none());
        assert!(!doc.dispose_extension("KHR_materials_unlit").unwrap());
    }
}
