//! Context Window Assembly
//!
//! Builds the message window for a run from persisted history. The most
//! recent `recent_window` messages and the new question are always kept;
//! older history is included newest-first until the estimated-token budget
//! would be exceeded.

use crate::message::Message;
use crate::trace::TraceMessage;

/// Heuristic token cost of one message: three per whitespace-separated word plus four for the role
pub fn estimate_tokens(content: &str) -> u32 {
    let words = u32::try_from(content.split_whitespace().count()).unwrap_or(u32::MAX);
    words.saturating_mul(3).saturating_add(4)
}

#[derive(Clone, Debug)]
pub struct ContextBudgetAssembler {
    pub token_budget: u32,
    pub recent_window: usize,
}

impl Default for ContextBudgetAssembler {
    fn default() -> Self {
        Self {
            token_budget: 3000,
            recent_window: 5,
        }
    }
}

impl ContextBudgetAssembler {
    pub fn new(token_budget: u32, recent_window: usize) -> Self {
        Self {
            token_budget,
            recent_window,
        }
    }

    /// Assemble `history` (oldest first) plus `question` into a model window.
    pub fn assemble(&self, history: &[Message], question: &str) -> Vec<TraceMessage> {
        let split = history.len().saturating_sub(self.recent_window);
        let (older, recent) = history.split_at(split);

        let mut spent: u32 = 0;
        let mut kept_older = 0;
        for msg in older.iter().rev() {
            let cost = estimate_tokens(&msg.content);
            if spent.saturating_add(cost) > self.token_budget {
                break;
            }
            spent += cost;
            kept_older += 1;
        }

        let included = &older[older.len() - kept_older..];
        tracing::debug!(
            history = history.len(),
            older_kept = kept_older,
            older_dropped = older.len() - kept_older,
            estimated_tokens = spent,
            "Assembled context window"
        );

        included
            .iter()
            .chain(recent)
            .filter_map(TraceMessage::from_history)
            .chain(std::iter::once(TraceMessage::user(question)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn history(n: usize, words_each: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                let content = vec![format!("m{i}"); words_each].join(" ");
                if i % 2 == 0 { Message::user(content) } else { Message::assistant(content) }
            })
            .collect()
    }

    fn texts(window: &[TraceMessage]) -> Vec<String> {
        window.iter().map(|m| m.text().unwrap_or_default().to_string()).collect()
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 4);
        assert_eq!(estimate_tokens("What is 7 times 5"), 19);
        assert_eq!(estimate_tokens("  spaced\n\tout  "), 10);
    }

    #[test]
    fn test_empty_history() {
        let window = ContextBudgetAssembler::default().assemble(&[], "Hi");
        assert_eq!(window, vec![TraceMessage::user("Hi")]);
    }

    #[test]
    fn test_short_history_fully_kept() {
        let h = history(3, 1);
        let window = ContextBudgetAssembler::new(0, 5).assemble(&h, "q");
        assert_eq!(texts(&window), vec!["m0", "m1", "m2", "q"]);
        assert!(window[1] == TraceMessage::assistant("m1"));
    }

    #[test]
    fn test_recent_window_survives_zero_budget() {
        let h = history(12, 10);
        let window = ContextBudgetAssembler::new(0, 5).assemble(&h, "q");
        assert_eq!(texts(&window).len(), 6);
        assert_eq!(window.first().unwrap().text(), Some(h[7].content.as_str()));
        assert_eq!(window.last().unwrap(), &TraceMessage::user("q"));
    }

    #[test]
    fn test_budget_includes_newest_older_first() {
        // each message costs 2 * 3 + 4 = 10
        let h = history(10, 2);
        let window = ContextBudgetAssembler::new(25, 5).assemble(&h, "q");
        // two of the five older messages fit: m3 and m4
        let got = texts(&window);
        assert_eq!(got[0], h[3].content);
        assert_eq!(got[1], h[4].content);
        assert_eq!(got.len(), 2 + 5 + 1);
    }

    #[test]
    fn test_overflowing_message_stops_inclusion() {
        let mut h = history(8, 1); // cost 7 each
        h[2].content = vec!["big"; 100].join(" "); // cost 304
        let window = ContextBudgetAssembler::new(100, 5).assemble(&h, "q");
        // older = h[0..3]; h[2] overflows so nothing older is kept even though h[0], h[1] would fit
        assert_eq!(window.len(), 5 + 1);
        assert_eq!(window[0].text(), Some("m3"));
    }

    #[test]
    fn test_chronological_subsequence() {
        let h = history(20, 3);
        let window = ContextBudgetAssembler::new(60, 5).assemble(&h, "q");
        let got = texts(&window[..window.len() - 1]);
        let all: Vec<String> = h.iter().map(|m| m.content.clone()).collect();
        let mut cursor = all.iter();
        for text in &got {
            assert!(cursor.any(|c| c == text), "{text} out of order");
        }
    }

    #[test]
    fn test_unknown_roles_dropped_after_budgeting() {
        let mut h = history(3, 1);
        h[1].role = Role::Unknown;
        let window = ContextBudgetAssembler::default().assemble(&h, "q");
        assert_eq!(texts(&window), vec!["m0", "m2", "q"]);
    }
}
