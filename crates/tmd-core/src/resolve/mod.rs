//! Reference resolver.
//!
//! Phase two of loading: binds the references of one file against its own
//! classes, the already-resolved files it `uses`, and the global domain map.
//! Diagnostics are collected, never thrown.
//!
//! Passes, in order:
//!
//! ```text
//! missing uses ─► reset aliases ─► extends / decorators ─► alias expansion
//!      ─► field binding ─► domain links ─► class checks ─► file-level aliases
//!      ─► unused / misordered uses
//! ```
//!
//! Expansion runs before field binding so that association targets see the
//! primary keys contributed by aliases. Clones coming from a dependency keep
//! the association bound there.

mod alias;
mod checks;
mod index;

pub use index::DomainIndex;
pub(crate) use index::ClassIndex;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::ModelConfig;
use crate::diagnostic::{ModelElement, ModelError, ModelErrorKind, Reference};
use crate::model::{ModelFile, Property};
use index::DecoratorIndex;

/// Resolves `file` in place and returns every diagnostic produced.
///
/// `files` must already hold resolved versions of the file's dependencies.
pub fn resolve_file(
    file: &mut ModelFile,
    files: &BTreeMap<String, Arc<ModelFile>>,
    domains: &DomainIndex,
    config: &ModelConfig,
) -> Vec<ModelError> {
    let mut resolver = Resolver {
        file: file.name.clone(),
        files,
        domains,
        config,
        errors: Vec::new(),
        used: BTreeSet::new(),
    };
    resolver.run(file);
    debug!(file = %file.name, diagnostics = resolver.errors.len(), "Resolved file");
    resolver.errors
}

/// State of one resolution pass.
struct Resolver<'a> {
    file: String,
    files: &'a BTreeMap<String, Arc<ModelFile>>,
    domains: &'a DomainIndex,
    config: &'a ModelConfig,
    errors: Vec<ModelError>,
    /// Files something in this file was bound to.
    used: BTreeSet<String>,
}

impl<'a> Resolver<'a> {
    fn run(&mut self, file: &mut ModelFile) {
        self.check_missing_uses(file);
        alias::reset(file);

        let dependencies = self.dependencies(file);
        let mut classes = ClassIndex::build(file, &dependencies);
        let decorators = DecoratorIndex::build(file, &dependencies);

        self.bind_class_links(file, &classes, &decorators);
        self.expand_aliases(file, &mut classes);
        self.bind_fields(file, &classes);
        self.bind_domain_links(file);
        self.check_classes(file);
        self.apply_file_aliases(file, &dependencies);
        self.check_uses(file);
    }

    /// Existing files named in `uses`, in `uses` order.
    fn dependencies(&self, file: &ModelFile) -> Vec<&'a ModelFile> {
        let files = self.files;
        file.uses
            .iter()
            .filter(|u| u.name != file.name)
            .filter_map(|u| files.get(&u.name))
            .map(|f| &**f)
            .collect()
    }

    fn report(&mut self, kind: ModelErrorKind, element: ModelElement, message: String, reference: &Reference) {
        self.errors
            .push(ModelError::new(kind, self.file.clone(), element, message).at(reference));
    }

    fn mark_used(&mut self, file: Option<&str>) {
        if let Some(file) = file {
            if file != self.file {
                self.used.insert(file.to_string());
            }
        }
    }

    /// Looks up a domain, reporting a miss.
    fn find_domain(&mut self, reference: &Reference, element: ModelElement) -> Option<String> {
        match self.domains.file_of(&reference.name) {
            Some(file) => {
                let file = file.to_string();
                self.mark_used(Some(&file));
                Some(reference.name.clone())
            }
            None => {
                self.report(
                    ModelErrorKind::MissingDomain,
                    element,
                    format!("Domain '{}' not found", reference.name),
                    reference,
                );
                None
            }
        }
    }

    /// Binds `extends` and decorators of the file's classes.
    fn bind_class_links(&mut self, file: &mut ModelFile, classes: &ClassIndex<'a>, decorators: &DecoratorIndex<'a>) {
        for class in &mut file.classes {
            class.extends = None;
            if let Some(reference) = class.extends_reference.clone() {
                match classes.get(&reference.name) {
                    Some(entry) => {
                        class.extends = Some(entry.class.id());
                        self.mark_used(entry.via);
                    }
                    None => self.report(
                        ModelErrorKind::MissingClass,
                        ModelElement::Class { name: class.name.clone() },
                        format!("Class '{}' not found in the file or its dependencies", reference.name),
                        &reference,
                    ),
                }
            }

            class.decorators.clear();
            for reference in class.decorator_references.clone() {
                match decorators.get(&reference.name) {
                    Some((id, via)) => {
                        class.decorators.push(id.clone());
                        self.mark_used(*via);
                    }
                    None => self.report(
                        ModelErrorKind::MissingDecorator,
                        ModelElement::Class { name: class.name.clone() },
                        format!("Decorator '{}' not found in the file or its dependencies", reference.name),
                        &reference,
                    ),
                }
            }
        }
    }

    /// Binds domains and target classes of every property.
    fn bind_fields(&mut self, file: &mut ModelFile, classes: &ClassIndex<'a>) {
        for class in &mut file.classes {
            for property in &mut class.properties {
                self.bind_property(&class.name, property, classes);
            }
        }

        for endpoint in &mut file.endpoints {
            for property in endpoint.params.iter_mut().chain(endpoint.returns.as_mut()) {
                self.bind_property(&endpoint.name, property, classes);
            }
        }
    }

    fn bind_property(&mut self, owner: &str, property: &mut Property, classes: &ClassIndex<'a>) {
        let from_dependency = property
            .alias_origin()
            .is_some_and(|origin| origin.class.file != self.file);
        let element = ModelElement::Property {
            owner: owner.to_string(),
            name: property.name().to_string(),
        };

        match property {
            Property::Regular(p) => {
                p.domain = self.find_domain(&p.domain_reference, element);
            }
            Property::Association(p) => {
                if from_dependency {
                    return;
                }

                p.association = None;
                let Some(entry) = classes.get(&p.target.name) else {
                    self.report(
                        ModelErrorKind::MissingClass,
                        element,
                        format!("Class '{}' not found in the file or its dependencies", p.target.name),
                        &p.target,
                    );
                    return;
                };
                self.mark_used(entry.via);

                let keys = entry.class.primary_keys().count();
                if keys != 1 {
                    self.report(
                        ModelErrorKind::AssociationPrimaryKey,
                        element,
                        format!(
                            "Class '{}' must have exactly one primary key to be the target of an association ({keys} found)",
                            p.target.name
                        ),
                        &p.target,
                    );
                    return;
                }

                p.association = Some(entry.class.id());
            }
            Property::Composition(p) => {
                p.composition = None;
                match classes.get(&p.target.name) {
                    Some(entry) => {
                        p.composition = Some(entry.class.id());
                        self.mark_used(entry.via);
                    }
                    None => self.report(
                        ModelErrorKind::MissingClass,
                        element.clone(),
                        format!("Class '{}' not found in the file or its dependencies", p.target.name),
                        &p.target,
                    ),
                }

                p.domain_kind = match &p.domain_kind_reference {
                    Some(reference) => self.find_domain(reference, element),
                    None => None,
                };
            }
            // Placeholders that could not be expanded were already reported.
            Property::Alias(_) => {}
        }
    }

    /// Checks `listDomain` and converters of the file's domains.
    fn bind_domain_links(&mut self, file: &ModelFile) {
        for domain in &file.domains {
            let element = ModelElement::Domain { name: domain.name.clone() };
            for reference in domain.list_domain.iter().chain(domain.converters.references()) {
                self.find_domain(reference, element.clone());
            }
        }
    }
}
