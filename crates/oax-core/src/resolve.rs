use std::borrow::Cow;
use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::error::ResolveError;
use crate::parse::components::Components;
use crate::parse::example::Example;
use crate::parse::media_type::MediaType;
use crate::parse::operation::PathItem;
use crate::parse::parameter::Parameter;
use crate::parse::reference::RefOr;
use crate::parse::request_body::RequestBody;
use crate::parse::response::Response;
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef};
use crate::parse::security::SecurityScheme;
use crate::parse::spec::Document;

const COMPONENTS_PREFIX: &str = "#/components/";

/// A kind of object that can live in a `components` category and be the
/// target of a `$ref`.
pub trait Component: Sized {
    /// Category name as written in pointers, e.g. `schemas`.
    const CATEGORY: &'static str;

    fn table(components: &Components) -> &IndexMap<String, RefOr<Self>>;
}

macro_rules! component {
    ($ty:ty, $category:literal, $field:ident) => {
        impl Component for $ty {
            const CATEGORY: &'static str = $category;

            fn table(components: &Components) -> &IndexMap<String, RefOr<Self>> {
                &components.$field
            }
        }
    };
}

component!(Schema, "schemas", schemas);
component!(Parameter, "parameters", parameters);
component!(Response, "responses", responses);
component!(RequestBody, "requestBodies", request_bodies);
component!(Example, "examples", examples);
component!(SecurityScheme, "securitySchemes", security_schemes);

/// Looks up `$ref` pointers in a document's `components` table.
///
/// The resolver holds nothing but a shared borrow of the document, so it is
/// `Copy` and can be handed to any number of concurrent consumers. Missing
/// targets are reported as `None`; only [`RefResolver::resolve_strict`]
/// produces an error value.
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    document: &'a Document,
}

impl<'a> RefResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Resolve one level. Inline nodes come back unchanged; a reference
    /// yields the component entry it names, which may itself be another
    /// reference.
    pub fn resolve<'n, T: Component>(&self, node: &'n RefOr<T>) -> Option<&'n RefOr<T>>
    where
        'a: 'n,
    {
        match node {
            RefOr::Item(_) => Some(node),
            RefOr::Ref { ref_path } => self.lookup::<T>(ref_path),
        }
    }

    /// Look up a pointer such as `#/components/schemas/Pet`.
    pub fn lookup<T: Component>(&self, ref_path: &str) -> Option<&'a RefOr<T>> {
        match self.lookup_strict::<T>(ref_path) {
            Ok(target) => Some(target),
            Err(e) => {
                debug!("{e}");
                None
            }
        }
    }

    /// Follow references until an inline object is reached. Chains that loop
    /// back on themselves resolve to `None`.
    pub fn resolve_item<'n, T: Component>(&self, node: &'n RefOr<T>) -> Option<&'n T>
    where
        'a: 'n,
    {
        match self.resolve_strict(node) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("{e}");
                None
            }
        }
    }

    /// Like [`resolve_item`](Self::resolve_item), but reports why resolution
    /// failed.
    pub fn resolve_strict<'n, T: Component>(
        &self,
        node: &'n RefOr<T>,
    ) -> Result<&'n T, ResolveError>
    where
        'a: 'n,
    {
        let mut current = node;
        let mut visited: HashSet<&'n str> = HashSet::new();
        loop {
            match current {
                RefOr::Item(item) => return Ok(item),
                RefOr::Ref { ref_path } => {
                    if !visited.insert(ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    current = self.lookup_strict::<T>(ref_path)?;
                }
            }
        }
    }

    /// Named schema from `components/schemas`, following reference chains.
    pub fn component_schema(&self, name: &str) -> Option<&'a Schema> {
        let entry = self.components()?.schemas.get(name)?;
        self.resolve_item(entry)
    }

    fn lookup_strict<T: Component>(&self, ref_path: &str) -> Result<&'a RefOr<T>, ResolveError> {
        let name = parse_ref_name(ref_path, T::CATEGORY)?;
        self.components()
            .and_then(|c| T::table(c).get(name.as_ref()))
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn components(&self) -> Option<&'a Components> {
        self.document.components.as_ref()
    }

    /// Every distinct `$ref` in the document that does not resolve, in
    /// document order: components first, then paths, then webhooks.
    pub fn broken_references(&self) -> Vec<ResolveError> {
        let mut audit = RefAudit {
            resolver: *self,
            seen: HashSet::new(),
            errors: Vec::new(),
        };

        if let Some(components) = self.components() {
            components.schemas.values().for_each(|s| audit.schema(s));
            components.parameters.values().for_each(|p| audit.parameter(p));
            components.request_bodies.values().for_each(|b| audit.request_body(b));
            components.responses.values().for_each(|r| audit.response(r));
            for example in components.examples.values() {
                audit.visit(example);
            }
        }
        for item in self.document.paths.values().chain(self.document.webhooks.values()) {
            audit.path_item(item);
        }

        audit.errors
    }
}

/// Walks inline nodes and checks each reference once. Targets are not
/// followed: they are audited where they are defined.
struct RefAudit<'a> {
    resolver: RefResolver<'a>,
    seen: HashSet<&'a str>,
    errors: Vec<ResolveError>,
}

impl<'a> RefAudit<'a> {
    fn visit<T: Component>(&mut self, node: &'a RefOr<T>) -> Option<&'a T> {
        match node {
            RefOr::Item(item) => Some(item),
            RefOr::Ref { ref_path } => {
                if self.seen.insert(ref_path.as_str()) {
                    if let Err(e) = self.resolver.resolve_strict(node) {
                        self.errors.push(e);
                    }
                }
                None
            }
        }
    }

    fn schema(&mut self, node: &'a SchemaOrRef) {
        let Some(schema) = self.visit(node) else {
            return;
        };
        for property in schema.properties.values() {
            self.schema(property);
        }
        if let Some(ref items) = schema.items {
            self.schema(items);
        }
        if let Some(AdditionalProperties::Schema(ref extra)) = schema.additional_properties {
            self.schema(extra);
        }
        for branch in schema.all_of.iter().chain(&schema.one_of).chain(&schema.any_of) {
            self.schema(branch);
        }
    }

    fn content(&mut self, content: &'a IndexMap<String, MediaType>) {
        for media_type in content.values() {
            if let Some(ref schema) = media_type.schema {
                self.schema(schema);
            }
            for example in media_type.examples.values() {
                self.visit(example);
            }
        }
    }

    fn parameter(&mut self, node: &'a RefOr<Parameter>) {
        if let Some(param) = self.visit(node) {
            if let Some(ref schema) = param.schema {
                self.schema(schema);
            }
            for example in param.examples.values() {
                self.visit(example);
            }
        }
    }

    fn request_body(&mut self, node: &'a RefOr<RequestBody>) {
        if let Some(body) = self.visit(node) {
            self.content(&body.content);
        }
    }

    fn response(&mut self, node: &'a RefOr<Response>) {
        if let Some(response) = self.visit(node) {
            self.content(&response.content);
        }
    }

    fn path_item(&mut self, item: &'a PathItem) {
        item.parameters.iter().for_each(|p| self.parameter(p));
        for (_, operation) in item.operations() {
            operation.parameters.iter().for_each(|p| self.parameter(p));
            if let Some(ref body) = operation.request_body {
                self.request_body(body);
            }
            operation.responses.values().for_each(|r| self.response(r));
        }
    }
}

/// Parse `#/components/<category>/<name>` and return the unescaped name.
fn parse_ref_name<'r>(
    ref_path: &'r str,
    expected_category: &str,
) -> Result<Cow<'r, str>, ResolveError> {
    let stripped = ref_path
        .strip_prefix(COMPONENTS_PREFIX)
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (category, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if category != expected_category {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected category '{}', got '{}' in {}",
            expected_category, category, ref_path
        )));
    }
    if name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(ref_path.to_string()));
    }
    // JSON pointer escapes: `~1` is `/`, `~0` is `~` (in that order).
    if name.contains('~') {
        Ok(Cow::Owned(name.replace("~1", "/").replace("~0", "~")))
    } else {
        Ok(Cow::Borrowed(name))
    }
}
