use serde::{Deserialize, Serialize};

/// Dependency labels that mark a token as a subject
pub const SUBJECT_ROLES: &[&str] = &["nsubj", "nsubjpass", "csubj", "csubjpass", "agent", "expl"];

/// Dependency labels that mark a token as a verb
pub const VERB_ROLES: &[&str] = &["ROOT", "advcl"];

/// Dependency labels that mark a token as an object
pub const OBJECT_ROLES: &[&str] = &["dobj", "dative", "attr", "oprd", "pobj"];

/// One parsed token as reported by the parser service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lower: String,
    pub lemma: String,
    /// Character offset of the token in the parsed text
    pub idx: usize,
    pub dep: String,
    #[serde(default)]
    pub is_stop: bool,
    #[serde(default)]
    pub is_punct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Subject,
    Verb,
    Object,
}

impl Role {
    pub fn of(dep: &str) -> Option<Role> {
        if SUBJECT_ROLES.contains(&dep) {
            Some(Role::Subject)
        } else if VERB_ROLES.contains(&dep) {
            Some(Role::Verb)
        } else if OBJECT_ROLES.contains(&dep) {
            Some(Role::Object)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SvoTriple {
    pub subject: String,
    pub verb: String,
    pub object: String,
}

impl SvoTriple {
    pub fn new(
        subject: impl Into<String>,
        verb: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            verb: verb.into(),
            object: object.into(),
        }
    }
}
