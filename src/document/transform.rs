//! Ordered transform pipelines.

use futures::future::LocalBoxFuture;

use super::Document;
use crate::util::Result;

/// One step of a pipeline run by [`Document::transform`].
///
/// Steps may suspend (for example while an external codec runs). The
/// pipeline awaits each step to completion before the next one starts.
pub trait Transform {
    fn name(&self) -> &str {
        "transform"
    }

    fn apply<'a>(&'a self, doc: &'a mut Document) -> LocalBoxFuture<'a, Result<()>>;
}

/// Synchronous transform from a named function or closure.
pub struct TransformFn<F> {
    name: String,
    func: F,
}

impl<F> TransformFn<F>
where
    F: Fn(&mut Document) -> Result<()>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Transform for TransformFn<F>
where
    F: Fn(&mut Document) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply<'a>(&'a self, doc: &'a mut Document) -> LocalBoxFuture<'a, Result<()>> {
        Box::pin(async move { (self.func)(doc) })
    }
}

impl Document {
    /// Run `transforms` in order. The first failure stops the pipeline
    /// and is returned; changes made before it are kept.
    pub async fn transform(&mut self, transforms: &[&dyn Transform]) -> Result<()> {
        for transform in transforms {
            self.config.logger.debug(&format!("transform: {}", transform.name()));
            transform.apply(self).await?;
        }
        Ok(())
    }

    /// [`transform`](Self::transform), driven to completion on the
    /// calling thread.
    pub fn transform_blocking(&mut self, transforms: &[&dyn Transform]) -> Result<()> {
        futures::executor::block_on(self.transform(transforms))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::util::Error;

    struct Rename(&'static str);

    impl Transform for Rename {
        fn apply<'a>(&'a self, doc: &'a mut Document) -> LocalBoxFuture<'a, Result<()>> {
            Box::pin(async move {
                futures::future::ready(()).await;
                let nodes = doc.root().list_nodes(doc);
                for node in nodes {
                    node.set_name(doc, self.0)?;
                }
                Ok::<(), Error>(())
            })
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let mut doc = Document::new();
        let node = doc.create_node("a");
        let log = RefCell::new(Vec::new());
        let record = TransformFn::new("record", |doc: &mut Document| {
            log.borrow_mut().push(doc.root().list_nodes(doc)[0].name(doc).to_string());
            Ok(())
        });
        doc.transform_blocking(&[&Rename("b"), &record, &Rename("c"), &record])
            .unwrap();
        assert_eq!(*log.borrow(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(node.name(&doc), "c");
    }

    #[test]
    fn test_failure_aborts_without_rollback() {
        let mut doc = Document::new();
        let node = doc.create_node("a");
        let fail = TransformFn::new("fail", |_: &mut Document| Err(Error::other("boom")));
        let result = doc.transform_blocking(&[&Rename("b"), &fail, &Rename("c")]);
        assert!(matches!(result, Err(Error::Other(ref m)) if m == "boom"));
        assert_eq!(node.name(&doc), "b");
    }
}
