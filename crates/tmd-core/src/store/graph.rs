//! The `uses` graph: affected sets and dependency ordering.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::model::ModelFile;

/// Registered files that must be re-resolved after `changed` changed:
/// the changed files themselves and every file that transitively uses one.
///
/// Returned in registry order.
pub fn affected_files(files: &BTreeMap<String, Arc<ModelFile>>, changed: &BTreeSet<String>) -> Vec<String> {
    let mut affected = changed.clone();

    loop {
        let before = affected.len();
        for (name, file) in files {
            if !affected.contains(name) && file.uses.iter().any(|u| affected.contains(&u.name)) {
                affected.insert(name.clone());
            }
        }
        if affected.len() == before {
            break;
        }
    }

    files
        .keys()
        .filter(|name| affected.contains(*name))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Orders `members` so that every file comes after the files it uses.
///
/// Only edges between members count. Independent files keep their input
/// order. On a cycle, returns the files forming it, starting with the first
/// one reached.
pub fn sort(files: &BTreeMap<String, Arc<ModelFile>>, members: &[String]) -> Result<Vec<String>, Vec<String>> {
    let set: BTreeSet<&str> = members.iter().map(String::as_str).collect();
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(members.len());

    for name in members {
        visit(name, files, &set, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    files: &'a BTreeMap<String, Arc<ModelFile>>,
    members: &BTreeSet<&str>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<(), Vec<String>> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|n| *n == name).unwrap_or(0);
            return Err(stack[start..].iter().map(|n| n.to_string()).collect());
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    stack.push(name);

    if let Some(file) = files.get(name) {
        for reference in &file.uses {
            if members.contains(reference.name.as_str()) {
                visit(&reference.name, files, members, marks, stack, order)?;
            }
        }
    }

    stack.pop();
    marks.insert(name, Mark::Done);
    order.push(name.to_string());
    Ok(())
}
