//! In-process topic exchange.
//!
//! Bindings follow AMQP topic semantics: routing keys are `.`-separated
//! words, `*` in a pattern matches exactly one word and `#` matches zero or
//! more words.

use serde::Serialize;

/// A `(pattern, queue)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub pattern: String,
    pub queue: String,
}

#[derive(Debug, Clone)]
pub struct TopicExchange {
    name: String,
    bindings: Vec<Binding>,
}

impl TopicExchange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `queue` to `pattern`. Binding the same pair twice is a no-op.
    pub fn bind(mut self, pattern: impl Into<String>, queue: impl Into<String>) -> Self {
        let binding = Binding {
            pattern: pattern.into(),
            queue: queue.into(),
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
        self
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Queues a message with `routing_key` is delivered to, in binding order
    /// and without duplicates.
    pub fn route(&self, routing_key: &str) -> Vec<&str> {
        let mut queues: Vec<&str> = Vec::new();
        for binding in &self.bindings {
            if topic_matches(&binding.pattern, routing_key) && !queues.contains(&binding.queue.as_str())
            {
                queues.push(&binding.queue);
            }
        }
        queues
    }
}

/// Whether `routing_key` matches the topic `pattern`.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| match_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&head, tail)) => (word == "*" || word == head) && match_words(rest, tail),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matching() {
        assert!(topic_matches("transaction.created", "transaction.created"));
        assert!(!topic_matches("transaction.created", "transaction.deleted"));
        assert!(topic_matches("transaction.*", "transaction.deleted"));
        assert!(!topic_matches("transaction.*", "transaction"));
        assert!(!topic_matches("transaction.*", "transaction.created.v2"));
        assert!(topic_matches("transaction.#", "transaction"));
        assert!(topic_matches("transaction.#", "transaction.created.v2"));
        assert!(topic_matches("#", "anything.at.all"));
        assert!(topic_matches("*.created", "goal.created"));
        assert!(topic_matches("#.created", "a.b.created"));
        assert!(!topic_matches("#.created", "a.b.deleted"));
    }

    #[test]
    fn test_route_deduplicates_queues() {
        let exchange = TopicExchange::new("finance_exchange")
            .bind("transaction.created", "created_q")
            .bind("transaction.deleted", "deleted_q")
            .bind("transaction.#", "audit_q")
            .bind("transaction.*", "audit_q")
            .bind("transaction.created", "created_q");

        assert_eq!(exchange.bindings().len(), 4);
        assert_eq!(
            exchange.route("transaction.created"),
            vec!["created_q", "audit_q"]
        );
        assert_eq!(exchange.route("transaction.deleted"), vec!["deleted_q", "audit_q"]);
        assert!(exchange.route("goal.created").is_empty());
    }
}
