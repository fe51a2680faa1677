pub mod normalizer;
pub mod parser;
pub mod schema;

pub use normalizer::{remove_stop_words_and_punct, strip_control_characters};
pub use parser::{DependencyParser, SpacyClient};
pub use schema::{Role, SvoTriple, Token};

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A token's text kept together with its character offset
#[derive(Debug, Clone, PartialEq)]
pub struct Positioned {
    pub text: String,
    pub idx: usize,
}

/// Subjects, verbs and objects of one parse, in token order.
/// Verbs carry their lemma, subjects and objects their surface text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoleLists {
    pub subjects: Vec<Positioned>,
    pub verbs: Vec<Positioned>,
    pub objects: Vec<Positioned>,
}

pub fn partition_roles(tokens: &[Token]) -> RoleLists {
    let mut lists = RoleLists::default();

    for token in tokens {
        match Role::of(&token.dep) {
            Some(Role::Subject) => lists.subjects.push(Positioned {
                text: token.text.clone(),
                idx: token.idx,
            }),
            Some(Role::Verb) => lists.verbs.push(Positioned {
                text: token.lemma.clone(),
                idx: token.idx,
            }),
            Some(Role::Object) => lists.objects.push(Positioned {
                text: token.text.clone(),
                idx: token.idx,
            }),
            None => {}
        }
    }

    lists
}

/// Verb closest to `offset`; the first one wins on ties
pub fn nearest_verb(offset: usize, verbs: &[Positioned]) -> Option<&Positioned> {
    verbs.iter().min_by_key(|v| v.idx.abs_diff(offset))
}

/// Keep the first triple for each distinct object
pub fn dedup_by_object(triples: Vec<SvoTriple>) -> Vec<SvoTriple> {
    let mut seen = HashSet::new();
    triples
        .into_iter()
        .filter(|t| seen.insert(t.object.clone()))
        .collect()
}

/// Drop triples whose object is only digits, which are mostly years
pub fn remove_numeric_objects(triples: Vec<SvoTriple>) -> Vec<SvoTriple> {
    triples
        .into_iter()
        .filter(|t| !is_numeric(&t.object))
        .collect()
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_numeric)
}

pub struct SvoExtractor<P> {
    parser: P,
}

impl<P: DependencyParser> SvoExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Extract subject-verb-object triples from a piece of text
    pub async fn extract_triples(&self, text: &str) -> Result<Vec<SvoTriple>> {
        let clean_text = strip_control_characters(text);
        let tokens = self.parser
            .parse(&clean_text)
            .await
            .context("Failed to parse text")?;

        let lists = partition_roles(&tokens);

        if lists.verbs.is_empty() || lists.subjects.is_empty() || lists.objects.is_empty() {
            debug!(
                subjects = lists.subjects.len(),
                verbs = lists.verbs.len(),
                objects = lists.objects.len(),
                "Nothing to pair in parse"
            );
            return Ok(Vec::new());
        }

        // subjects and objects repeat across pairs, strip each span once
        let mut stripped: HashMap<String, String> = HashMap::new();
        for span in lists.subjects.iter().chain(&lists.objects) {
            if !stripped.contains_key(&span.text) {
                let content = remove_stop_words_and_punct(&self.parser, &span.text).await?;
                stripped.insert(span.text.clone(), content);
            }
        }

        let mut triples = Vec::new();
        for subject in &lists.subjects {
            for object in &lists.objects {
                let Some(verb) = nearest_verb(object.idx, &lists.verbs) else {
                    continue;
                };

                let subj = stripped.get(&subject.text).map(String::as_str).unwrap_or("");
                let obj = stripped.get(&object.text).map(String::as_str).unwrap_or("");

                if subj.is_empty() || obj.is_empty() || subj == obj {
                    continue;
                }

                triples.push(SvoTriple::new(subj, verb.text.as_str(), obj));
            }
        }

        let triples = remove_numeric_objects(dedup_by_object(triples));
        debug!(count = triples.len(), "Extracted SVO triples");

        Ok(triples)
    }
}
