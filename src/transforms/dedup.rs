//! Merging of properties with identical content.
//!
//! Candidates are grouped by an MD5 content key, then confirmed with
//! structural [`equals`](crate::property::PropertyGraph::equals) before
//! every incoming edge of the duplicate is pointed at the survivor.

use std::collections::{HashMap, HashSet};

use futures::future::LocalBoxFuture;

use crate::document::{Document, Transform};
use crate::graph::{EdgeId, PropertyId};
use crate::properties::{Accessor, Buffer, Texture};
use crate::util::{ContentKey, Result};

/// Pipeline step running [`dedup`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Dedup;

impl Transform for Dedup {
    fn name(&self) -> &str {
        "dedup"
    }

    fn apply<'a>(&'a self, doc: &'a mut Document) -> LocalBoxFuture<'a, Result<()>> {
        Box::pin(async move { dedup(doc).map(|_| ()) })
    }
}

/// Counts of properties merged away, and buffer URIs rewritten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub accessors: usize,
    pub textures: usize,
    pub buffers: usize,
    pub renamed_uris: usize,
}

/// Point every non-root edge at `duplicate` to `survivor`, then dispose
/// the duplicate.
fn replace(doc: &mut Document, duplicate: PropertyId, survivor: PropertyId) -> Result<()> {
    let root = doc.root().id();
    let edges: Vec<EdgeId> = doc
        .graph()
        .list_parent_edges(duplicate)
        .into_iter()
        .filter(|e| e.parent() != root)
        .map(|e| e.id())
        .collect();
    let graph = doc.graph_mut();
    for edge in edges {
        graph.swap_child(edge, survivor)?;
    }
    graph.dispose(duplicate)
}

/// Merge each candidate into the first earlier candidate with the same
/// key that `equals` confirms. Returns the number merged.
fn merge_groups(doc: &mut Document, candidates: Vec<(PropertyId, ContentKey)>, skip: &[&str]) -> Result<usize> {
    let mut survivors: HashMap<ContentKey, Vec<PropertyId>> = HashMap::new();
    let mut merged = 0;
    for (id, key) in candidates {
        let group = survivors.entry(key).or_default();
        let found = group
            .iter()
            .copied()
            .find(|s| doc.graph().equals(*s, id, skip, 0));
        match found {
            Some(survivor) => {
                replace(doc, id, survivor)?;
                merged += 1;
            }
            None => group.push(id),
        }
    }
    Ok(merged)
}

fn accessor_key(doc: &Document, accessor: Accessor) -> Option<ContentKey> {
    let array = accessor.array(doc)?;
    let tag = format!(
        "{}:{}:{}:{}",
        accessor.element_type(doc),
        array.component_type().gl_enum(),
        accessor.normalized(doc),
        accessor.sparse(doc)
    );
    Some(ContentKey::with_tag(array.as_bytes(), &tag))
}

fn texture_key(doc: &Document, texture: Texture) -> Option<ContentKey> {
    let image = texture.image(doc)?;
    Some(ContentKey::with_tag(image, texture.mime_type(doc)))
}

/// Accessors stored in `buffer`, in root order.
fn buffer_users(doc: &Document, buffer: Buffer) -> Vec<Accessor> {
    doc.root()
        .list_accessors(doc)
        .into_iter()
        .filter(|a| a.buffer(doc) == Some(buffer))
        .collect()
}

/// Key over the content of every accessor a buffer holds.
fn buffer_key(doc: &Document, buffer: Buffer) -> ContentKey {
    let mut joined = Vec::new();
    for accessor in buffer_users(doc, buffer) {
        if let Some(key) = accessor_key(doc, accessor) {
            joined.extend_from_slice(&key.digest);
        }
    }
    ContentKey::from_data(&joined)
}

/// `stem_2.ext`, `stem_3.ext`, ... for the `n`th use of `uri`.
fn numbered_uri(uri: &str, n: usize) -> String {
    match uri.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{}{}", &uri[..dot], n, &uri[dot..]),
        _ => format!("{}_{}", uri, n),
    }
}

fn rename_buffer_uris(doc: &mut Document) -> Result<usize> {
    let buffers = doc.root().list_buffers(doc);
    let mut taken: HashSet<String> = buffers
        .iter()
        .map(|b| b.uri(doc).to_string())
        .filter(|u| !u.is_empty())
        .collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut renamed = 0;
    for buffer in buffers {
        let uri = buffer.uri(doc).to_string();
        if uri.is_empty() || seen.insert(uri.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = numbered_uri(&uri, n);
        while taken.contains(&candidate) {
            n += 1;
            candidate = numbered_uri(&uri, n);
        }
        doc.logger()
            .warn(&format!("dedup: buffer uri {} is already used, renamed to {}", uri, candidate));
        buffer.set_uri(doc, &candidate)?;
        taken.insert(candidate.clone());
        seen.insert(candidate);
        renamed += 1;
    }
    Ok(renamed)
}

/// Merge byte-identical accessors, textures and buffers, then give
/// buffers that still share a URI distinct ones.
///
/// Names are ignored when comparing. Accessors compare regardless of the
/// buffer they live in; a buffer left without accessors by this pass is
/// disposed.
pub fn dedup(doc: &mut Document) -> Result<DedupReport> {
    let mut report = DedupReport::default();
    let buffers_before: Vec<(Buffer, bool)> = doc
        .root()
        .list_buffers(doc)
        .into_iter()
        .map(|b| (b, !buffer_users(doc, b).is_empty()))
        .collect();

    let accessors: Vec<(PropertyId, ContentKey)> = doc
        .root()
        .list_accessors(doc)
        .into_iter()
        .filter_map(|a| accessor_key(doc, a).map(|k| (a.id(), k)))
        .collect();
    report.accessors = merge_groups(doc, accessors, &["name", "buffer"])?;

    let textures: Vec<(PropertyId, ContentKey)> = doc
        .root()
        .list_textures(doc)
        .into_iter()
        .filter_map(|t| texture_key(doc, t).map(|k| (t.id(), k)))
        .collect();
    report.textures = merge_groups(doc, textures, &["name", "uri"])?;

    for (buffer, had_users) in buffers_before {
        let root = doc.root().id();
        if had_users && doc.graph().list_users(buffer.id(), root).is_empty() {
            buffer.dispose(doc)?;
            report.buffers += 1;
        }
    }
    let buffers: Vec<(PropertyId, ContentKey)> = doc
        .root()
        .list_buffers(doc)
        .into_iter()
        .map(|b| (b.id(), buffer_key(doc, b)))
        .collect();
    report.buffers += merge_groups(doc, buffers, &["name", "uri"])?;

    report.renamed_uris = rename_buffer_uris(doc)?;
    doc.logger().info(&format!(
        "dedup: merged {} accessors, {} textures, {} buffers",
        report.accessors, report.textures, report.buffers
    ));
    Ok(report)
}
