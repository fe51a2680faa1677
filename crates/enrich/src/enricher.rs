use tracing::{debug, warn};

use extract::SvoTriple;

use crate::EnrichedTriple;
use crate::knowledge_graph::{EntityLookup, LookupError};

/// What happened when the object of a triple was looked up
#[derive(Debug)]
pub enum LookupOutcome {
    Found,
    NoMatch,
    Failed(LookupError),
}

#[derive(Debug)]
pub struct Enriched {
    pub triple: EnrichedTriple,
    pub outcome: LookupOutcome,
}

#[derive(Debug, Default)]
pub struct EnrichmentBatch {
    pub triples: Vec<EnrichedTriple>,
    pub found: usize,
    pub misses: usize,
    pub failures: usize,
}

pub struct EntityEnricher<L> {
    lookup: L,
}

impl<L: EntityLookup> EntityEnricher<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Attach the object's description, type labels and url.
    /// A failed or empty lookup leaves those fields blank.
    pub async fn enrich(&self, triple: SvoTriple) -> Enriched {
        match self.lookup.lookup(&triple.object).await {
            Ok(Some(found)) => Enriched {
                triple: EnrichedTriple {
                    triple,
                    description: found.description,
                    labels: found.labels,
                    url: found.url,
                },
                outcome: LookupOutcome::Found,
            },
            Ok(None) => Enriched {
                triple: EnrichedTriple::blank(triple),
                outcome: LookupOutcome::NoMatch,
            },
            Err(e) => Enriched {
                triple: EnrichedTriple::blank(triple),
                outcome: LookupOutcome::Failed(e),
            },
        }
    }

    pub async fn enrich_all(&self, triples: Vec<SvoTriple>) -> EnrichmentBatch {
        let mut batch = EnrichmentBatch::default();

        for triple in triples {
            let enriched = self.enrich(triple).await;
            match &enriched.outcome {
                LookupOutcome::Found => batch.found += 1,
                LookupOutcome::NoMatch => {
                    debug!(object = %enriched.triple.triple.object, "No knowledge graph match");
                    batch.misses += 1;
                }
                LookupOutcome::Failed(e) => {
                    warn!(
                        object = %enriched.triple.triple.object,
                        error = %e,
                        "Knowledge graph lookup failed, keeping triple without enrichment"
                    );
                    batch.failures += 1;
                }
            }
            batch.triples.push(enriched.triple);
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_graph::EntityMatch;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubLookup {
        entries: HashMap<String, EntityMatch>,
    }

    #[async_trait]
    impl EntityLookup for StubLookup {
        async fn lookup(&self, query: &str) -> Result<Option<EntityMatch>, LookupError> {
            if query == "broken" {
                let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
                return Err(LookupError::Malformed(err));
            }
            Ok(self.entries.get(query).cloned())
        }
    }

    fn enricher() -> EntityEnricher<StubLookup> {
        let mut entries = HashMap::new();
        entries.insert(
            "biden".to_string(),
            EntityMatch {
                name: "Joe Biden".to_string(),
                description: "44th President...".to_string(),
                labels: vec!["Thing".to_string(), "Person".to_string()],
                url: "https://en.wikipedia.org/wiki/Joe_Biden".to_string(),
            },
        );
        EntityEnricher::new(StubLookup { entries })
    }

    #[tokio::test]
    async fn test_enrich_found() {
        let enriched = enricher().enrich(SvoTriple::new("obama", "meet", "biden")).await;

        assert!(matches!(enriched.outcome, LookupOutcome::Found));
        assert_eq!(enriched.triple.description, "44th President...");
        assert_eq!(enriched.triple.labels, vec!["Thing", "Person"]);
        assert_eq!(enriched.triple.triple.object, "biden");
    }

    #[tokio::test]
    async fn test_no_results_gives_blank_fields() {
        let enriched = enricher().enrich(SvoTriple::new("obama", "visit", "nowhere")).await;

        assert!(matches!(enriched.outcome, LookupOutcome::NoMatch));
        assert_eq!(enriched.triple.description, "");
        assert!(enriched.triple.labels.is_empty());
        assert_eq!(enriched.triple.url, "");
    }

    #[tokio::test]
    async fn test_failure_is_absorbed() {
        let enriched = enricher().enrich(SvoTriple::new("obama", "read", "broken")).await;

        assert!(matches!(enriched.outcome, LookupOutcome::Failed(_)));
        assert!(!enriched.triple.has_description());
    }

    #[tokio::test]
    async fn test_enrich_all_counts_outcomes() {
        let batch = enricher()
            .enrich_all(vec![
                SvoTriple::new("obama", "meet", "biden"),
                SvoTriple::new("obama", "visit", "nowhere"),
                SvoTriple::new("obama", "read", "broken"),
            ])
            .await;

        assert_eq!(batch.triples.len(), 3);
        assert_eq!((batch.found, batch.misses, batch.failures), (1, 1, 1));
    }
}
