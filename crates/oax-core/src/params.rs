use crate::endpoint::Endpoint;
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::reference::RefOr;
use crate::resolve::RefResolver;

/// Effective parameter list of an endpoint.
///
/// Path-item parameters come first, in declaration order. Each operation
/// parameter replaces the entry with the same `(name, in)` in place, or is
/// appended when no such entry exists. `$ref` parameters are identified by
/// their resolved target; a reference that does not resolve has no identity,
/// so it is kept but never replaces or gets replaced.
pub fn merged_parameters<'a>(
    endpoint: &Endpoint<'a>,
    resolver: RefResolver<'a>,
) -> Vec<&'a RefOr<Parameter>> {
    merge(
        &endpoint.path_item.parameters,
        &endpoint.operation.parameters,
        resolver,
    )
}

/// Override `base` with `overrides` using the rules of [`merged_parameters`].
pub fn merge<'a>(
    base: &'a [RefOr<Parameter>],
    overrides: &'a [RefOr<Parameter>],
    resolver: RefResolver<'a>,
) -> Vec<&'a RefOr<Parameter>> {
    let mut merged: Vec<&'a RefOr<Parameter>> = Vec::with_capacity(base.len() + overrides.len());

    for param in base.iter().chain(overrides) {
        let position = identity(param, resolver).and_then(|id| {
            merged
                .iter()
                .position(|existing| identity(*existing, resolver) == Some(id))
        });
        match position {
            Some(i) => merged[i] = param,
            None => merged.push(param),
        }
    }

    merged
}

/// Resolve the merged list down to inline parameters, dropping references
/// that do not resolve.
pub fn resolved_parameters<'a>(
    endpoint: &Endpoint<'a>,
    resolver: RefResolver<'a>,
) -> Vec<&'a Parameter> {
    merged_parameters(endpoint, resolver)
        .into_iter()
        .filter_map(|p| resolver.resolve_item(p))
        .collect()
}

fn identity<'a>(
    param: &'a RefOr<Parameter>,
    resolver: RefResolver<'a>,
) -> Option<(&'a str, ParameterLocation)> {
    resolver.resolve_item(param).map(Parameter::identity)
}
