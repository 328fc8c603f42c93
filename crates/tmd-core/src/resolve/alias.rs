//! Alias properties and file-level aliases.

use crate::diagnostic::{ModelElement, ModelErrorKind};
use crate::model::{AliasOrigin, AliasProperty, AliasSlot, Class, ElementId, ModelFile, Property};
use super::{ClassIndex, Resolver};

/// Puts a file back in its unresolved alias shape.
///
/// Re-exported classes and endpoints are dropped (restoring the local entries
/// they replaced), then every expanded alias collapses back to its placeholder.
pub(super) fn reset(file: &mut ModelFile) {
    let resolved = std::mem::take(&mut file.resolved_aliases);

    let mut shadowed = resolved.shadowed_classes;
    file.classes = std::mem::take(&mut file.classes)
        .into_iter()
        .filter_map(|class| {
            if resolved.classes.contains(&class.name) {
                take_where(&mut shadowed, |c| c.name == class.name)
            } else {
                Some(class)
            }
        })
        .collect();

    let mut shadowed = resolved.shadowed_endpoints;
    file.endpoints = std::mem::take(&mut file.endpoints)
        .into_iter()
        .filter_map(|endpoint| {
            if resolved.endpoints.contains(&endpoint.name) {
                take_where(&mut shadowed, |e| e.name == endpoint.name)
            } else {
                Some(endpoint)
            }
        })
        .collect();

    for class in &mut file.classes {
        restore(&mut class.properties, &mut class.alias_slots);
    }
    for endpoint in &mut file.endpoints {
        restore(&mut endpoint.params, &mut endpoint.alias_slots);
        if let Some(placeholder) = endpoint.returns_alias.take() {
            endpoint.returns = Some(Property::Alias(placeholder));
        }
    }
}

/// Drops clones and reinserts placeholders at their written positions.
fn restore(properties: &mut Vec<Property>, slots: &mut Vec<AliasSlot>) {
    properties.retain(|p| p.alias_origin().is_none());
    for slot in slots.drain(..) {
        let position = slot.position.min(properties.len());
        properties.insert(position, Property::Alias(slot.placeholder));
    }
}

/// Positions of `classes` in expansion order: a class aliasing another class
/// of the same file comes after it. Declaration order otherwise.
fn alias_order(classes: &[Class]) -> Vec<usize> {
    fn visit(index: usize, classes: &[Class], visited: &mut [bool], order: &mut Vec<usize>) {
        if visited[index] {
            return;
        }
        visited[index] = true;

        for property in &classes[index].properties {
            if let Property::Alias(alias) = property {
                let target = &alias.reference.class.name;
                if let Some(position) = classes.iter().position(|c| &c.name == target) {
                    visit(position, classes, visited, order);
                }
            }
        }
        order.push(index);
    }

    let mut visited = vec![false; classes.len()];
    let mut order = Vec::with_capacity(classes.len());
    for index in 0..classes.len() {
        visit(index, classes, &mut visited, &mut order);
    }
    order
}

fn take_where<T>(items: &mut Vec<T>, predicate: impl Fn(&T) -> bool) -> Option<T> {
    let position = items.iter().position(predicate)?;
    Some(items.remove(position))
}

/// Puts `item` in place of the entry matching `same`, or appends it.
fn splice<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool, shadowed: &mut Vec<T>) {
    match items.iter().position(same) {
        Some(position) => shadowed.push(std::mem::replace(&mut items[position], item)),
        None => items.push(item),
    }
}

impl<'a> Resolver<'a> {
    /// Replaces every alias placeholder of the file with clones of the
    /// properties it selects.
    pub(super) fn expand_aliases(&mut self, file: &mut ModelFile, classes: &mut ClassIndex<'a>) {
        for index in alias_order(&file.classes) {
            let class = &mut file.classes[index];
            let properties = std::mem::take(&mut class.properties);
            let (properties, slots) = self.expand_list(&class.name, properties, classes);
            class.properties = properties;
            class.alias_slots = slots;
            classes.refresh(class);
        }

        for endpoint in &mut file.endpoints {
            let params = std::mem::take(&mut endpoint.params);
            let (params, slots) = self.expand_list(&endpoint.name, params, classes);
            endpoint.params = params;
            endpoint.alias_slots = slots;

            match endpoint.returns.take() {
                Some(Property::Alias(placeholder)) => {
                    endpoint.returns = self.expand(&endpoint.name, &placeholder, classes).into_iter().next();
                    endpoint.returns_alias = Some(placeholder);
                }
                other => endpoint.returns = other,
            }
        }
    }

    fn expand_list(
        &mut self,
        owner: &str,
        properties: Vec<Property>,
        classes: &ClassIndex<'a>,
    ) -> (Vec<Property>, Vec<AliasSlot>) {
        let mut expanded = Vec::with_capacity(properties.len());
        let mut slots = Vec::new();

        for (position, property) in properties.into_iter().enumerate() {
            match property {
                Property::Alias(placeholder) => {
                    expanded.extend(self.expand(owner, &placeholder, classes));
                    slots.push(AliasSlot { position, placeholder });
                }
                other => expanded.push(other),
            }
        }

        (expanded, slots)
    }

    /// Clones of the properties one placeholder selects, in declared order.
    fn expand(&mut self, owner: &str, placeholder: &AliasProperty, classes: &ClassIndex<'a>) -> Vec<Property> {
        let target = &placeholder.reference;
        let element = ModelElement::Property {
            owner: owner.to_string(),
            name: target.class.name.clone(),
        };

        let list_domain = match &placeholder.list_domain_reference {
            Some(reference) => self.find_domain(reference, element.clone()),
            None => None,
        };

        let Some(entry) = classes.get(&target.class.name) else {
            self.report(
                ModelErrorKind::MissingClass,
                element,
                format!("Class '{}' not found in the file or its dependencies", target.class.name),
                &target.class,
            );
            return Vec::new();
        };
        self.mark_used(entry.via);
        let source = &entry.class;

        let mut valid = true;
        for reference in target.include.iter().chain(&target.exclude) {
            if source.property(&reference.name).is_none() {
                self.report(
                    ModelErrorKind::MissingAliasProperty,
                    element.clone(),
                    format!("Property '{}' not found on class '{}'", reference.name, source.name),
                    reference,
                );
                valid = false;
            }
        }
        if !valid {
            return Vec::new();
        }

        let selected: Vec<&Property> = if target.include.is_empty() {
            source
                .properties
                .iter()
                .filter(|p| !target.exclude.iter().any(|r| p.is_named(&r.name)))
                .collect()
        } else {
            target
                .include
                .iter()
                .filter_map(|r| source.property(&r.name))
                .collect()
        };

        let class = source.id();
        selected
            .into_iter()
            .filter(|p| p.is_field())
            .map(|p| clone_field(placeholder, p, &class, list_domain.as_deref()))
            .collect()
    }

    /// Pulls the classes and endpoints named by the file's `alias` documents
    /// out of its dependencies.
    pub(super) fn apply_file_aliases(&mut self, file: &mut ModelFile, dependencies: &[&'a ModelFile]) {
        for alias in file.aliases.clone() {
            let element = ModelElement::Alias { file: alias.file.name.clone() };

            let Some(&source) = dependencies.iter().find(|d| d.name == alias.file.name) else {
                self.report(
                    ModelErrorKind::MissingAliasFile,
                    element,
                    format!("File '{}' is not among the file's dependencies", alias.file.name),
                    &alias.file,
                );
                continue;
            };
            self.mark_used(Some(&source.name));

            let resolved = &mut file.resolved_aliases;
            for reference in &alias.classes {
                let Some(class) = source.class(&reference.name) else {
                    self.report(
                        ModelErrorKind::MissingAliasClass,
                        element.clone(),
                        format!("Class '{}' not found in file '{}'", reference.name, source.name),
                        reference,
                    );
                    continue;
                };

                if resolved.classes.insert(class.name.clone()) {
                    splice(&mut file.classes, class.clone(), |c| c.name == class.name, &mut resolved.shadowed_classes);
                }
            }

            for reference in &alias.endpoints {
                let Some(endpoint) = source.endpoint(&reference.name) else {
                    self.report(
                        ModelErrorKind::MissingAliasEndpoint,
                        element.clone(),
                        format!("Endpoint '{}' not found in file '{}'", reference.name, source.name),
                        reference,
                    );
                    continue;
                };

                if resolved.endpoints.insert(endpoint.name.clone()) {
                    splice(
                        &mut file.endpoints,
                        endpoint.clone(),
                        |e| e.name == endpoint.name,
                        &mut resolved.shadowed_endpoints,
                    );
                }
            }
        }
    }
}

/// Copy of a field property as seen through an alias.
fn clone_field(placeholder: &AliasProperty, property: &Property, class: &ElementId, list_domain: Option<&str>) -> Property {
    let origin = Some(AliasOrigin {
        class: class.clone(),
        property: property.name().to_string(),
    });

    match property {
        Property::Regular(p) => {
            let mut clone = p.clone();
            clone.name = placeholder.alias_name(&p.name);
            if let Some(label) = &placeholder.label {
                clone.label = Some(label.clone());
            }
            if let Some(comment) = &placeholder.comment {
                clone.comment = comment.clone();
            }
            if let Some(required) = placeholder.required {
                clone.required = required;
            }
            if let (Some(reference), Some(domain)) = (&placeholder.list_domain_reference, list_domain) {
                clone.domain_reference = reference.clone();
                clone.domain = Some(domain.to_string());
            }
            clone.alias_origin = origin;
            Property::Regular(clone)
        }
        Property::Association(p) => {
            let mut clone = p.clone();
            clone.name = placeholder.alias_name(&p.name);
            if let Some(label) = &placeholder.label {
                clone.label = Some(label.clone());
            }
            if let Some(comment) = &placeholder.comment {
                clone.comment = comment.clone();
            }
            if let Some(required) = placeholder.required {
                clone.required = required;
            }
            clone.alias_origin = origin;
            Property::Association(clone)
        }
        other => other.clone(),
    }
}
