//! Checks that bind nothing: `uses` hygiene and class invariants.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::diagnostic::{ModelElement, ModelErrorKind, Reference};
use crate::model::{Class, ModelFile, Property};
use super::Resolver;

impl<'a> Resolver<'a> {
    pub(super) fn check_missing_uses(&mut self, file: &ModelFile) {
        for reference in &file.uses {
            if !self.files.contains_key(&reference.name) {
                self.report(
                    ModelErrorKind::MissingFile,
                    ModelElement::File { name: file.name.clone() },
                    format!("Referenced file '{}' not found", reference.name),
                    reference,
                );
            }
        }
    }

    /// Unused and misordered `uses` entries. Missing files are skipped.
    pub(super) fn check_uses(&mut self, file: &ModelFile) {
        let element = ModelElement::File { name: file.name.clone() };

        let files = self.files;
        for reference in file.uses.iter().filter(|u| files.contains_key(&u.name)) {
            if !self.used.contains(&reference.name) {
                self.report(
                    ModelErrorKind::UnusedUse,
                    element.clone(),
                    format!("Unused import '{}'", reference.name),
                    reference,
                );
            }
        }

        let mut sorted: Vec<&str> = file.uses.iter().map(|u| u.name.as_str()).collect();
        sorted.sort_unstable();

        for (position, reference) in file.uses.iter().enumerate() {
            if !self.files.contains_key(&reference.name) {
                continue;
            }
            if sorted[position] != reference.name {
                self.report(
                    ModelErrorKind::MisorderedUse,
                    element.clone(),
                    format!("Import '{}' is out of order", reference.name),
                    reference,
                );
            }
        }
    }

    /// Order/default properties, duplicate names and composite keys.
    pub(super) fn check_classes(&mut self, file: &ModelFile) {
        let files = self.files;
        for class in &file.classes {
            let chain = inheritance_chain(files, file, class);
            let element = ModelElement::Class { name: class.name.clone() };

            for reference in class.order_property.iter().chain(&class.default_property) {
                let found = chain.iter().any(|c| c.property(&reference.name).is_some());
                if !found {
                    self.report(
                        ModelErrorKind::MissingClassProperty,
                        element.clone(),
                        format!("Property '{}' not found on class '{}'", reference.name, class.name),
                        reference,
                    );
                }
            }

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for property in chain.iter().flat_map(|c| &c.properties) {
                if !matches!(property, Property::Alias(_)) {
                    *counts.entry(property.name()).or_default() += 1;
                }
            }

            let mut reported = BTreeSet::new();
            for property in &class.properties {
                let name = property.name();
                if matches!(property, Property::Alias(_)) || counts.get(name).copied().unwrap_or(0) < 2 {
                    continue;
                }
                if reported.insert(name) {
                    self.report(
                        ModelErrorKind::DuplicateProperty,
                        ModelElement::Property {
                            owner: class.name.clone(),
                            name: name.to_string(),
                        },
                        format!("Property '{name}' is declared more than once in class '{}' or its parents", class.name),
                        &Reference::new(name, property.span().clone()),
                    );
                }
            }

            if !self.config.allow_composite_primary_key {
                let keys: Vec<&str> = class.primary_keys().map(Property::name).collect();
                if keys.len() > 1 {
                    self.report(
                        ModelErrorKind::CompositePrimaryKey,
                        element,
                        format!(
                            "Class '{}' must have a single primary key ({} found)",
                            class.name,
                            keys.join(", ")
                        ),
                        &Reference::new(class.name.clone(), class.span.clone()),
                    );
                }
            }
        }
    }
}

/// `class` followed by its ancestors, stopping at a missing or repeated parent.
fn inheritance_chain<'c>(
    files: &'c BTreeMap<String, Arc<ModelFile>>,
    file: &'c ModelFile,
    class: &'c Class,
) -> Vec<&'c Class> {
    let mut chain = vec![class];
    let mut seen = BTreeSet::from([class.id()]);
    let mut current = class;

    while let Some(parent) = &current.extends {
        if !seen.insert(parent.clone()) {
            break;
        }

        let next = if parent.file == file.name {
            file.class(&parent.name)
        } else {
            files.get(&parent.file).and_then(|f| f.class(&parent.name))
        };

        match next {
            Some(next) => {
                chain.push(next);
                current = next;
            }
            None => break,
        }
    }

    chain
}
