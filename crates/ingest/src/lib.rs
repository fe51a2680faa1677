pub mod reader;
pub mod wikipedia;

pub use reader::FileReader;
pub use wikipedia::{AcquisitionError, WikipediaClient};

use serde::{Deserialize, Serialize};

/// A piece of source text together with the title it was fetched under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceText {
    pub title: String,
    pub text: String,
}

impl SourceText {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}
