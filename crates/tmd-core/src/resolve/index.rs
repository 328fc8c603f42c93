//! Name lookups visible from one file.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::model::{Class, ElementId, ModelFile};

/// Process-wide domain names, mapped to the file declaring them.
#[derive(Debug, Clone, Default)]
pub struct DomainIndex {
    domains: BTreeMap<String, String>,
}

impl DomainIndex {
    /// Indexes every domain of `files`. On duplicate names the first file
    /// (in iteration order) wins.
    pub fn build<'f>(files: impl IntoIterator<Item = &'f ModelFile>) -> Self {
        let mut domains = BTreeMap::new();
        for file in files {
            for domain in &file.domains {
                domains
                    .entry(domain.name.clone())
                    .or_insert_with(|| file.name.clone());
            }
        }
        Self { domains }
    }

    /// File declaring the domain called `name`.
    pub fn file_of(&self, name: &str) -> Option<&str> {
        self.domains.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// A class visible from the file being resolved.
#[derive(Debug)]
pub(crate) struct ClassEntry<'a> {
    pub class: Cow<'a, Class>,
    /// Dependency the class comes from; `None` for the file's own classes.
    pub via: Option<&'a str>,
}

/// Classes visible from one file: its own, then its dependencies' own classes.
///
/// Own classes shadow dependency classes. Between dependencies the first in
/// `uses` order wins.
#[derive(Debug, Default)]
pub(crate) struct ClassIndex<'a> {
    entries: BTreeMap<String, ClassEntry<'a>>,
}

impl<'a> ClassIndex<'a> {
    pub fn build(file: &ModelFile, dependencies: &[&'a ModelFile]) -> Self {
        let mut entries = BTreeMap::new();

        for &dependency in dependencies {
            for class in dependency.own_classes() {
                entries.entry(class.name.clone()).or_insert(ClassEntry {
                    class: Cow::Borrowed(class),
                    via: Some(dependency.name.as_str()),
                });
            }
        }

        let mut index = Self { entries };
        for class in file.own_classes() {
            index.refresh(class);
        }
        index
    }

    pub fn get(&self, name: &str) -> Option<&ClassEntry<'a>> {
        self.entries.get(name)
    }

    /// Replaces the snapshot of one of the file's own classes.
    pub fn refresh(&mut self, class: &Class) {
        self.entries.insert(
            class.name.clone(),
            ClassEntry {
                class: Cow::Owned(class.clone()),
                via: None,
            },
        );
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Decorators visible from one file, with the dependency they come from.
#[derive(Debug, Default)]
pub(crate) struct DecoratorIndex<'a> {
    entries: BTreeMap<String, (ElementId, Option<&'a str>)>,
}

impl<'a> DecoratorIndex<'a> {
    pub fn build(file: &ModelFile, dependencies: &[&'a ModelFile]) -> Self {
        let mut entries = BTreeMap::new();

        for &dependency in dependencies {
            for decorator in &dependency.decorators {
                entries.entry(decorator.name.clone()).or_insert((
                    ElementId::new(dependency.name.clone(), decorator.name.clone()),
                    Some(dependency.name.as_str()),
                ));
            }
        }

        for decorator in &file.decorators {
            entries.insert(
                decorator.name.clone(),
                (ElementId::new(file.name.clone(), decorator.name.clone()), None),
            );
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&(ElementId, Option<&'a str>)> {
        self.entries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Span;
    use crate::model::{Class, Domain, Namespace, Stereotype};
    use std::path::PathBuf;

    fn class(file: &str, name: &str) -> Class {
        Class {
            name: name.into(),
            label: None,
            trigram: None,
            comment: String::new(),
            stereotype: Stereotype::Plain,
            reference: false,
            extends_reference: None,
            extends: None,
            decorator_references: Vec::new(),
            decorators: Vec::new(),
            order_property: None,
            default_property: None,
            properties: Vec::new(),
            alias_slots: Vec::new(),
            namespace: Namespace::default(),
            file: file.into(),
            span: Span::new(PathBuf::from(file), 1, 1),
        }
    }

    fn domain(file: &str, name: &str) -> Domain {
        Domain {
            name: name.into(),
            label: name.into(),
            length: None,
            scale: None,
            targets: Default::default(),
            sql_type: None,
            list_domain: None,
            converters: Default::default(),
            file: file.into(),
            span: Span::new(PathBuf::from(file), 1, 1),
        }
    }

    #[test]
    fn test_own_classes_shadow_dependencies() {
        let mut dependency = ModelFile::new("Common", "Common.tmd");
        dependency.classes.push(class("Common", "User"));
        dependency.classes.push(class("Common", "Profile"));

        let mut file = ModelFile::new("Users", "Users.tmd");
        file.classes.push(class("Users", "User"));

        let index = ClassIndex::build(&file, &[&dependency]);
        assert_eq!(index.get("User").unwrap().via, None);
        assert_eq!(index.get("Profile").unwrap().via, Some("Common"));
        assert!(index.get("Missing").is_none());
    }

    #[test]
    fn test_reexported_classes_are_not_visible_to_dependents() {
        let mut dependency = ModelFile::new("Api", "Api.tmd");
        dependency.classes.push(class("Common", "User"));
        dependency.resolved_aliases.classes.insert("User".into());

        let file = ModelFile::new("Front", "Front.tmd");
        let index = ClassIndex::build(&file, &[&dependency]);
        assert!(index.get("User").is_none());
    }

    #[test]
    fn test_first_domain_wins() {
        let mut a = ModelFile::new("A", "A.tmd");
        a.domains.push(domain("A", "DO_ID"));
        let mut b = ModelFile::new("B", "B.tmd");
        b.domains.push(domain("B", "DO_ID"));
        b.domains.push(domain("B", "DO_CODE"));

        let index = DomainIndex::build([&a, &b]);
        assert_eq!(index.file_of("DO_ID"), Some("A"));
        assert_eq!(index.file_of("DO_CODE"), Some("B"));
        assert_eq!(index.len(), 2);
    }
}
