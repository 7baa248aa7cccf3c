//! Content model matching
//!
//! Runs the children of an element through the particle tree of its type.
//! The matcher tracks the set of child positions every branch can reach, so
//! optional and repeated particles never need backtracking. When no branch
//! consumes all children, the furthest position any branch failed at is
//! reported together with the names that would have been accepted there.
//!
//! Which declaration a matched child belongs to is found by name afterwards:
//! within one content model, equally named element particles must share a
//! type, so the first declaration with the child's name is the right one.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::components::{ElementDecl, Particle, Term, Wildcard};
use super::schemas::XsdSchema;

/// Expanded name of a child element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildName<'a> {
    /// Namespace
    pub namespace: Option<&'a str>,
    /// Local name
    pub local_name: &'a str,
}

/// Why a sequence of children does not fit a content model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The child at `index` is not allowed there
    Unexpected {
        /// Child index
        index: usize,
        /// Names accepted at that point
        expected: Vec<String>,
    },
    /// Children ended while more were required
    Incomplete {
        /// Names accepted at the end
        expected: Vec<String>,
    },
}

/// Declaration a child was matched against
#[derive(Debug, Clone)]
pub enum ChildDecl<'a> {
    /// Element declaration
    Element(Arc<ElementDecl>),
    /// Wildcard
    Wildcard(&'a Wildcard),
}

/// Matcher for one content model
pub struct ContentModel<'a> {
    schema: &'a XsdSchema,
    particle: &'a Particle,
}

struct MatchState<'c> {
    children: &'c [ChildName<'c>],
    furthest: Option<(usize, Vec<String>)>,
}

impl<'c> MatchState<'c> {
    fn note_miss(&mut self, position: usize, expected: String) {
        match &mut self.furthest {
            Some((pos, names)) if *pos == position => {
                if !names.contains(&expected) {
                    names.push(expected);
                }
            }
            Some((pos, _)) if *pos > position => {}
            _ => self.furthest = Some((position, vec![expected])),
        }
    }
}

impl<'a> ContentModel<'a> {
    /// Create a matcher for `particle`
    pub fn new(schema: &'a XsdSchema, particle: &'a Particle) -> Self {
        Self { schema, particle }
    }

    /// Check that `children` form a valid sequence for the model
    pub fn check(&self, children: &[ChildName<'_>]) -> std::result::Result<(), ModelError> {
        let mut state = MatchState {
            children,
            furthest: None,
        };
        let ends = self.match_particle(self.particle, BTreeSet::from([0]), &mut state);
        if ends.contains(&children.len()) {
            return Ok(());
        }

        let best_end = ends.iter().next_back().copied().unwrap_or(0);
        match state.furthest {
            Some((pos, expected)) if pos >= best_end => {
                if pos < children.len() {
                    Err(ModelError::Unexpected {
                        index: pos,
                        expected,
                    })
                } else {
                    Err(ModelError::Incomplete { expected })
                }
            }
            _ => Err(ModelError::Unexpected {
                index: best_end,
                expected: Vec::new(),
            }),
        }
    }

    /// Find the declaration a child named `name` is validated against
    pub fn resolve(&self, name: ChildName<'_>) -> Option<ChildDecl<'a>> {
        self.find_element(self.particle, name)
            .map(ChildDecl::Element)
            .or_else(|| self.find_wildcard(self.particle, name).map(ChildDecl::Wildcard))
    }

    fn find_element(&self, particle: &'a Particle, name: ChildName<'_>) -> Option<Arc<ElementDecl>> {
        match &particle.term {
            Term::Element(decl) => decl
                .matches(name.namespace, name.local_name)
                .then(|| decl.clone()),
            Term::ElementRef { namespace, name: local } => {
                if local == name.local_name && namespace.as_deref() == name.namespace {
                    self.schema.global_element(name.namespace, name.local_name)
                } else {
                    None
                }
            }
            Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
                items.iter().find_map(|p| self.find_element(p, name))
            }
            Term::Any(_) => None,
        }
    }

    fn find_wildcard(&self, particle: &'a Particle, name: ChildName<'_>) -> Option<&'a Wildcard> {
        match &particle.term {
            Term::Any(wildcard) => wildcard.allows(name.namespace).then_some(wildcard),
            Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
                items.iter().find_map(|p| self.find_wildcard(p, name))
            }
            _ => None,
        }
    }

    fn match_particle(
        &self,
        particle: &Particle,
        starts: BTreeSet<usize>,
        state: &mut MatchState<'_>,
    ) -> BTreeSet<usize> {
        let occurs = particle.occurs;
        let mut results = if occurs.is_emptiable() {
            starts.clone()
        } else {
            BTreeSet::new()
        };

        let mut current = starts;
        let mut count = 0u32;
        while occurs.allows_more(count) && !current.is_empty() {
            count += 1;
            let mut next = self.match_term(&particle.term, &current, state);
            if count > occurs.min {
                // Past the minimum, only progress is interesting
                next.retain(|pos| !results.contains(pos));
            }
            if next.is_empty() {
                break;
            }
            if count >= occurs.min {
                results.extend(next.iter().copied());
            }
            current = next;
        }
        results
    }

    fn match_term(
        &self,
        term: &Term,
        starts: &BTreeSet<usize>,
        state: &mut MatchState<'_>,
    ) -> BTreeSet<usize> {
        let mut ends = BTreeSet::new();
        match term {
            Term::Element(decl) => {
                for &pos in starts {
                    match state.children.get(pos) {
                        Some(child) if decl.matches(child.namespace, child.local_name) => {
                            ends.insert(pos + 1);
                        }
                        _ => state.note_miss(pos, format!("<{}>", decl.name)),
                    }
                }
            }
            Term::ElementRef { namespace, name } => {
                for &pos in starts {
                    match state.children.get(pos) {
                        Some(child)
                            if child.local_name == name
                                && child.namespace == namespace.as_deref() =>
                        {
                            ends.insert(pos + 1);
                        }
                        _ => state.note_miss(pos, format!("<{}>", name)),
                    }
                }
            }
            Term::Any(wildcard) => {
                for &pos in starts {
                    match state.children.get(pos) {
                        Some(child) if wildcard.allows(child.namespace) => {
                            ends.insert(pos + 1);
                        }
                        _ => state.note_miss(pos, "any element".to_string()),
                    }
                }
            }
            Term::Sequence(items) => {
                let mut current = starts.clone();
                for item in items {
                    current = self.match_particle(item, current, state);
                    if current.is_empty() {
                        break;
                    }
                }
                ends = current;
            }
            Term::Choice(items) => {
                for item in items {
                    ends.extend(self.match_particle(item, starts.clone(), state));
                }
            }
            Term::All(items) => {
                for &start in starts {
                    let mut stack = vec![(start, vec![false; items.len()])];
                    while let Some((pos, used)) = stack.pop() {
                        let complete = items
                            .iter()
                            .zip(&used)
                            .all(|(item, used)| *used || item.occurs.is_emptiable());
                        if complete {
                            ends.insert(pos);
                        }
                        for (i, item) in items.iter().enumerate() {
                            if used[i] {
                                continue;
                            }
                            let reached = self.match_particle(item, BTreeSet::from([pos]), state);
                            for end in reached.into_iter().filter(|end| *end > pos) {
                                let mut next_used = used.clone();
                                next_used[i] = true;
                                stack.push((end, next_used));
                            }
                        }
                    }
                }
            }
        }
        ends
    }
}

/// Render expected names for a message
pub fn describe_expected(expected: &[String]) -> String {
    match expected.len() {
        0 => "no more elements".to_string(),
        1 => expected[0].clone(),
        _ => format!("one of {}", expected.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::components::{
        NamespaceConstraint, Occurs, ProcessContents, TypeRef,
    };
    use crate::xsd::simple_types::SimpleType;
    use crate::xsd::builtins::Builtin;

    fn element(name: &str, min: u32, max: Option<u32>) -> Particle {
        Particle::new(
            Term::Element(Arc::new(ElementDecl {
                name: name.to_string(),
                namespace: None,
                type_ref: TypeRef::Simple(SimpleType::builtin(Builtin::String)),
                nillable: false,
                fixed: None,
            })),
            Occurs::new(min, max),
        )
    }

    fn names<'a>(tags: &'a [&'a str]) -> Vec<ChildName<'a>> {
        tags.iter()
            .map(|t| ChildName {
                namespace: None,
                local_name: t,
            })
            .collect()
    }

    fn sequence(items: Vec<Particle>) -> Particle {
        Particle::new(Term::Sequence(items), Occurs::ONCE)
    }

    #[test]
    fn test_sequence_with_optional_and_repeated() {
        let schema = XsdSchema::empty();
        let model = sequence(vec![
            element("a", 1, Some(1)),
            element("b", 0, Some(1)),
            element("c", 0, None),
        ]);
        let matcher = ContentModel::new(&schema, &model);
        assert!(matcher.check(&names(&["a"])).is_ok());
        assert!(matcher.check(&names(&["a", "c", "c", "c"])).is_ok());
        assert!(matcher.check(&names(&["a", "b", "c"])).is_ok());

        assert_eq!(
            matcher.check(&names(&["a", "c", "b"])),
            Err(ModelError::Unexpected {
                index: 2,
                expected: vec!["<c>".to_string()],
            })
        );
        assert_eq!(
            matcher.check(&names(&[])),
            Err(ModelError::Incomplete {
                expected: vec!["<a>".to_string()],
            })
        );
    }

    #[test]
    fn test_choice_and_all() {
        let schema = XsdSchema::empty();
        let choice = Particle::new(
            Term::Choice(vec![element("x", 1, None), element("y", 1, None)]),
            Occurs::ONCE,
        );
        let matcher = ContentModel::new(&schema, &choice);
        assert!(matcher.check(&names(&["x", "x"])).is_ok());
        assert!(matcher.check(&names(&["y"])).is_ok());
        assert!(matches!(
            matcher.check(&names(&["x", "y"])),
            Err(ModelError::Unexpected { index: 1, .. })
        ));

        let all = Particle::new(
            Term::All(vec![element("p", 1, Some(1)), element("q", 0, Some(1))]),
            Occurs::ONCE,
        );
        let matcher = ContentModel::new(&schema, &all);
        assert!(matcher.check(&names(&["q", "p"])).is_ok());
        assert!(matcher.check(&names(&["p"])).is_ok());
        assert!(matcher.check(&names(&["q"])).is_err());
        assert!(matcher.check(&names(&["p", "p"])).is_err());
    }

    #[test]
    fn test_empty_model_rejects_children() {
        let schema = XsdSchema::empty();
        let model = Particle::empty();
        let matcher = ContentModel::new(&schema, &model);
        assert!(matcher.check(&names(&[])).is_ok());
        assert_eq!(
            matcher.check(&names(&["dataset"])),
            Err(ModelError::Unexpected {
                index: 0,
                expected: vec![],
            })
        );
    }

    #[test]
    fn test_resolve_prefers_declarations_over_wildcards() {
        let schema = XsdSchema::empty();
        let model = sequence(vec![
            element("a", 1, Some(1)),
            Particle::new(
                Term::Any(Wildcard {
                    namespaces: NamespaceConstraint::Any,
                    process_contents: ProcessContents::Skip,
                }),
                Occurs::new(0, None),
            ),
        ]);
        let matcher = ContentModel::new(&schema, &model);
        let child = |t| ChildName {
            namespace: None,
            local_name: t,
        };
        assert!(matches!(matcher.resolve(child("a")), Some(ChildDecl::Element(_))));
        assert!(matches!(matcher.resolve(child("z")), Some(ChildDecl::Wildcard(_))));
        assert!(matcher.check(&names(&["a", "z", "w"])).is_ok());
        assert_eq!(describe_expected(&["<a>".into(), "<b>".into()]), "one of <a>, <b>");
    }
}
