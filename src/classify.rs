//! Free-text category classification.

use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Maps a free-text description (room name, wall note) to a category.
///
/// Returning `None` leaves the choice to the material family's default.
pub trait CategoryClassifier {
    fn classify(&self, description: &str) -> Option<Category>;
}

impl<F> CategoryClassifier for F
where
    F: Fn(&str) -> Option<Category>,
{
    fn classify(&self, description: &str) -> Option<Category> {
        self(description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub category: Category,
}

/// First rule with a keyword that starts any word of the description wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordClassifier {
    pub rules: Vec<KeywordRule>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Rules for board ratings: fire-exposed rooms first, then wet rooms.
    pub fn builtin() -> Self {
        let rule = |category: &str, keywords: &[&str]| KeywordRule {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: Category::new(category),
        };
        Self::new(vec![
            rule(
                "fire-resistant",
                &["fire", "garage", "boiler", "furnace", "stair", "escape"],
            ),
            rule(
                "moisture-resistant",
                &[
                    "bath", "shower", "wet", "kitchen", "laundry", "toilet", "wc", "sauna",
                    "humid", "utility",
                ],
            ),
        ])
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, description: &str) -> Option<Category> {
        let lower = description.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.rules
            .iter()
            .find(|rule| {
                rule.keywords.iter().any(|kw| {
                    let kw = kw.to_lowercase();
                    words.iter().any(|w| w.starts_with(kw.as_str()))
                })
            })
            .map(|rule| rule.category.clone())
    }
}
