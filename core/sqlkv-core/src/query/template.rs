//! Template-based query generator
//!
//! Templates are plain SQL with a `{table}` placeholder. The bucket name is
//! validated first and only then substituted, so an invalid name never
//! reaches the template.

use super::{Operation, QueryGenerator, TableNameValidator};
use crate::error::{KvError, KvResult};
use ahash::AHashMap;

const TABLE_PLACEHOLDER: &str = "{table}";

/// Query generator driven by per-operation SQL templates.
#[derive(Debug, Clone)]
pub struct TemplateQueryGenerator {
    name: &'static str,
    validator: TableNameValidator,
    templates: AHashMap<Operation, &'static str>,
}

impl TemplateQueryGenerator {
    pub fn new(name: &'static str, validator: TableNameValidator) -> Self {
        Self {
            name,
            validator,
            templates: AHashMap::new(),
        }
    }

    /// Adds (or replaces) the template for `op`.
    pub fn with_template(mut self, op: Operation, template: &'static str) -> Self {
        self.templates.insert(op, template);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn supports(&self, op: Operation) -> bool {
        self.templates.contains_key(&op)
    }

    fn render(&self, op: Operation, template: &str, bucket: &str, buf: &mut String) -> KvResult<()> {
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            buf.push_str(&rest[..open]);
            let tail = &rest[open..];
            if !tail.starts_with(TABLE_PLACEHOLDER) {
                let end = tail.find('}').map_or(tail.len(), |i| i + 1);
                return Err(KvError::Generation(format!(
                    "{}: unknown placeholder {} in {} template",
                    self.name,
                    &tail[..end],
                    op
                )));
            }
            buf.push_str(bucket);
            rest = &tail[TABLE_PLACEHOLDER.len()..];
        }
        buf.push_str(rest);
        Ok(())
    }
}

impl QueryGenerator for TemplateQueryGenerator {
    fn write_query(&self, op: Operation, bucket: &str, buf: &mut String) -> KvResult<()> {
        self.validator.validate(bucket)?;
        let template = self.templates.get(&op).ok_or_else(|| {
            KvError::Generation(format!("{}: no template for {}", self.name, op))
        })?;
        self.render(op, template, bucket, buf)
    }
}
