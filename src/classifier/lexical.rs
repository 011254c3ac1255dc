//! Lexical intent classifier.

use regex::{Regex, RegexBuilder};

use super::IntentClassifier;
use super::extract::{Phrase, tokenize};
use super::vocabulary::Vocabulary;
use crate::core::{
    Complexity, Entities, EntityFilters, Identity, IntentDescriptor, QueryType, ToolKind, ToolSet,
};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
struct CompiledRule {
    query_type: Option<QueryType>,
    phrases: Vec<Phrase>,
    tools: Vec<ToolKind>,
    needs_context: bool,
}

impl CompiledRule {
    /// Sum of the word lengths of every matched phrase.
    fn score(&self, tokens: &[String]) -> usize {
        self.phrases
            .iter()
            .filter(|p| p.found_in(tokens))
            .map(Phrase::len)
            .sum()
    }
}

#[derive(Debug, Clone)]
struct Named {
    name: String,
    phrases: Vec<Phrase>,
}

impl Named {
    fn position(&self, tokens: &[String]) -> Option<usize> {
        self.phrases.iter().filter_map(|p| p.position(tokens)).min()
    }

    fn is_called(&self, name: &str) -> bool {
        let wanted = tokenize(name);
        self.phrases.iter().any(|p| p.position(&wanted) == Some(0) && p.len() == wanted.len())
    }
}

#[derive(Debug, Clone)]
struct CompiledEvent {
    category: String,
    keywords: Vec<Phrase>,
    generic: bool,
}

/// Keyword classifier over a [`Vocabulary`].
///
/// The highest-scoring typed rule decides the query type; every matching
/// rule contributes its tools. Construction compiles the vocabulary once so
/// classification itself is infallible.
#[derive(Debug, Clone)]
pub struct LexicalClassifier {
    rules: Vec<CompiledRule>,
    subjects: Vec<Named>,
    opponents: Vec<Named>,
    windows: Vec<(String, Regex)>,
    comparison: Vec<Phrase>,
    trend: Vec<Phrase>,
    self_references: Vec<Phrase>,
    events: Vec<CompiledEvent>,
    domain_terms: Vec<Phrase>,
    domain_suffix: String,
}

fn phrases(items: &[String]) -> Vec<Phrase> {
    items
        .iter()
        .map(|s| Phrase::new(s))
        .filter(|p| !p.is_empty())
        .collect()
}

impl LexicalClassifier {
    /// Compiles a vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a time-window pattern is not a
    /// valid regular expression.
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, ConfigError> {
        let windows = vocabulary
            .time_windows
            .iter()
            .map(|w| {
                RegexBuilder::new(&w.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (w.name.clone(), re))
                    .map_err(|e| ConfigError::Invalid {
                        field: "time_windows",
                        message: format!("{}: {e}", w.name),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: vocabulary
                .rules
                .iter()
                .map(|r| CompiledRule {
                    query_type: r.query_type,
                    phrases: phrases(&r.phrases),
                    tools: r.tools.clone(),
                    needs_context: r.needs_context,
                })
                .collect(),
            subjects: vocabulary
                .subjects
                .iter()
                .map(|s| {
                    let mut all = vec![s.name.clone()];
                    all.extend(s.aliases.iter().cloned());
                    Named {
                        name: s.name.clone(),
                        phrases: phrases(&all),
                    }
                })
                .collect(),
            opponents: vocabulary
                .opponents
                .iter()
                .map(|o| Named {
                    name: o.clone(),
                    phrases: phrases(std::slice::from_ref(o)),
                })
                .collect(),
            windows,
            comparison: phrases(&vocabulary.comparison_markers),
            trend: phrases(&vocabulary.trend_markers),
            self_references: phrases(&vocabulary.self_references),
            events: vocabulary
                .events
                .iter()
                .map(|e| CompiledEvent {
                    category: e.category.clone(),
                    keywords: phrases(&e.keywords),
                    generic: e.generic,
                })
                .collect(),
            domain_terms: phrases(&vocabulary.domain_terms),
            domain_suffix: vocabulary.domain_suffix.trim().to_string(),
        })
    }

    /// Compiles the built-in vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a built-in pattern fails to compile.
    pub fn with_default_vocabulary() -> Result<Self, ConfigError> {
        Self::new(&Vocabulary::default())
    }

    /// Names matched in first-seen order.
    fn find_named(named: &[Named], tokens: &[String]) -> Vec<String> {
        let mut hits: Vec<(usize, &str)> = named
            .iter()
            .filter_map(|n| n.position(tokens).map(|pos| (pos, n.name.as_str())))
            .collect();
        hits.sort_by_key(|(pos, _)| *pos);
        let mut out: Vec<String> = Vec::with_capacity(hits.len());
        for (_, name) in hits {
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        out
    }

    fn entities(&self, query: &str, tokens: &[String], identity: &Identity) -> Entities {
        let mut subjects = Self::find_named(&self.subjects, tokens);

        if self.self_references.iter().any(|p| p.found_in(tokens))
            && let Some(me) = self.subjects.iter().find(|s| s.is_called(identity.name()))
            && !subjects.contains(&me.name)
        {
            subjects.insert(0, me.name.clone());
        }

        Entities {
            subjects,
            opponents: Self::find_named(&self.opponents, tokens),
            time_window: self
                .windows
                .iter()
                .find(|(_, re)| re.is_match(query))
                .map(|(name, _)| name.clone()),
        }
    }

    fn complexity(&self, entities: &Entities, tokens: &[String]) -> Complexity {
        let qualified = self
            .comparison
            .iter()
            .chain(&self.trend)
            .any(|p| p.found_in(tokens));
        if qualified {
            return Complexity::Complex;
        }
        match entities.count() {
            0 | 1 => Complexity::Simple,
            2 => Complexity::Moderate,
            _ => Complexity::Complex,
        }
    }
}

impl IntentClassifier for LexicalClassifier {
    fn classify(&self, query: &str, identity: &Identity) -> IntentDescriptor {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return IntentDescriptor::general();
        }

        let mut tools = ToolSet::new();
        let mut needs_context = false;
        let mut best: Option<(usize, QueryType)> = None;
        let mut any_rule = false;

        for rule in &self.rules {
            let score = rule.score(&tokens);
            if score == 0 {
                continue;
            }
            any_rule = true;
            for tool in &rule.tools {
                tools.insert(*tool);
            }
            needs_context |= rule.needs_context;
            if let Some(query_type) = rule.query_type
                && best.is_none_or(|(top, _)| score > top)
            {
                best = Some((score, query_type));
            }
        }

        let entities = self.entities(query, &tokens, identity);

        if !any_rule && !entities.subjects.is_empty() {
            tools.insert(ToolKind::StructuredQuery);
        }

        let query_type = match best {
            Some((_, query_type)) => query_type,
            None if !entities.subjects.is_empty() => QueryType::PlayerAnalysis,
            None => QueryType::GeneralKnowledge,
        };

        IntentDescriptor {
            query_type,
            complexity: self.complexity(&entities, &tokens),
            required_tools: tools,
            needs_context,
            entities,
        }
    }

    fn extract_filters(&self, query: &str, identity: &Identity) -> EntityFilters {
        let tokens = tokenize(query);
        let entities = self.entities(query, &tokens, identity);
        let categories = self
            .events
            .iter()
            .filter(|e| !e.generic && e.keywords.iter().any(|k| k.found_in(&tokens)))
            .map(|e| e.category.clone())
            .collect();

        EntityFilters {
            subjects: entities.subjects,
            categories,
            opponents: entities.opponents,
            time_window: entities.time_window,
            teams: Vec::new(),
        }
    }

    fn search_query(&self, query: &str) -> String {
        let tokens = tokenize(query);
        if self.domain_suffix.is_empty() || self.domain_terms.iter().any(|t| t.found_in(&tokens)) {
            return query.to_string();
        }
        format!("{} {}", query.trim_end(), self.domain_suffix)
    }
}
