//! Name -> id resolution for query triples.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Role};
use crate::vocab::Vocabulary;

/// Query triple in id form. `object == None` means "rank every entity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedTriple {
    pub subject: usize,
    pub predicate: usize,
    pub object: Option<usize>,
}

/// Query triple in name form, as typed by a user or drawn at random.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTriple {
    pub subject: String,
    pub predicate: String,
    pub object: Option<String>,
}

impl fmt::Display for NamedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "( {}, {}, {} )",
            self.subject,
            self.predicate,
            self.object.as_deref().unwrap_or("?")
        )
    }
}

/// Resolves names against an entity and a relation vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    entities: &'a Vocabulary,
    relations: &'a Vocabulary,
}

impl<'a> Resolver<'a> {
    pub fn new(entities: &'a Vocabulary, relations: &'a Vocabulary) -> Self {
        Self {
            entities,
            relations,
        }
    }

    /// Map subject, predicate and (unless empty) object to ids.
    ///
    /// Names are checked in that order and the first miss is returned as
    /// [`Error::UnresolvedName`]. Lookups are exact.
    pub fn resolve(&self, subject: &str, predicate: &str, object: &str) -> Result<ResolvedTriple> {
        let subject = lookup(self.entities, Role::Subject, subject)?;
        let predicate = lookup(self.relations, Role::Predicate, predicate)?;
        let object = if object.is_empty() {
            None
        } else {
            Some(lookup(self.entities, Role::Object, object)?)
        };
        Ok(ResolvedTriple {
            subject,
            predicate,
            object,
        })
    }

    /// Draw a subject and a predicate uniformly at random.
    ///
    /// `None` only when either vocabulary is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(NamedTriple, ResolvedTriple)> {
        let subject = self.entities.sample(rng)?;
        let predicate = self.relations.sample(rng)?;
        let resolved = ResolvedTriple {
            subject: self.entities.id(subject)?,
            predicate: self.relations.id(predicate)?,
            object: None,
        };
        let named = NamedTriple {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: None,
        };
        Some((named, resolved))
    }
}

fn lookup(vocab: &Vocabulary, role: Role, name: &str) -> Result<usize> {
    vocab.id(name).ok_or_else(|| Error::UnresolvedName {
        role,
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vocabs() -> (Vocabulary, Vocabulary) {
        (
            Vocabulary::from_names(["a", "b"]).unwrap(),
            Vocabulary::from_names(["p"]).unwrap(),
        )
    }

    #[test]
    fn test_resolve_full_triple() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        assert_eq!(
            resolver.resolve("b", "p", "a").unwrap(),
            ResolvedTriple {
                subject: 1,
                predicate: 0,
                object: Some(0)
            }
        );
    }

    #[test]
    fn test_empty_object_ranks_all() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        assert_eq!(resolver.resolve("a", "p", "").unwrap().object, None);
    }

    #[test]
    fn test_unknown_object() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        let err = resolver.resolve("a", "p", "z").unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedName { role: Role::Object, ref name } if name == "z"
        ));
    }

    #[test]
    fn test_first_miss_wins() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        let err = resolver.resolve("x", "y", "z").unwrap_err();
        assert!(matches!(err, Error::UnresolvedName { role: Role::Subject, .. }));

        let err = resolver.resolve("a", "y", "z").unwrap_err();
        assert!(matches!(err, Error::UnresolvedName { role: Role::Predicate, ref name } if name == "y"));
    }

    #[test]
    fn test_entity_name_is_not_a_relation() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        let err = resolver.resolve("a", "a", "").unwrap_err();
        assert!(matches!(err, Error::UnresolvedName { role: Role::Predicate, .. }));
    }

    #[test]
    fn test_lookup_is_exact() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        assert!(resolver.resolve(" a", "p", "").is_err());
        assert!(resolver.resolve("A", "p", "").is_err());
    }

    #[test]
    fn test_sample() {
        let (entities, relations) = vocabs();
        let resolver = Resolver::new(&entities, &relations);
        let mut rng = StdRng::seed_from_u64(3);
        let (named, resolved) = resolver.sample(&mut rng).unwrap();
        assert_eq!(named.object, None);
        assert_eq!(resolved.object, None);
        assert_eq!(entities.name(resolved.subject), Some(named.subject.as_str()));
        assert_eq!(named.predicate, "p");
        assert_eq!(named.to_string(), format!("( {}, p, ? )", named.subject));
    }

    #[test]
    fn test_sample_empty() {
        let entities = Vocabulary::default();
        let relations = Vocabulary::from_names(["p"]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(Resolver::new(&entities, &relations).sample(&mut rng).is_none());
    }

    #[test]
    fn test_display() {
        let triple = NamedTriple {
            subject: "a".into(),
            predicate: "p".into(),
            object: Some("b".into()),
        };
        assert_eq!(triple.to_string(), "( a, p, b )");
    }
}
