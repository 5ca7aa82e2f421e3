//! Classification of activities by their modifier names.

use std::fmt;

/// The kinds of activity worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Raid,
    Dungeon,
    Grandmaster,
}

impl Category {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Raid => "Raid",
            Self::Dungeon => "Dungeon",
            Self::Grandmaster => "Grandmaster",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

struct Rule {
    category: Category,
    matches: fn(&[&str]) -> bool,
}

/// Evaluated top to bottom; the first matching rule wins.
const RULES: &[Rule] = &[
    Rule {
        category: Category::Raid,
        matches: is_raid,
    },
    Rule {
        category: Category::Dungeon,
        matches: is_dungeon,
    },
    Rule {
        category: Category::Grandmaster,
        matches: is_grandmaster,
    },
];

/// Position of the difficulty tier in a dungeon's modifier list.
const DUNGEON_TIER_INDEX: usize = 4;

fn is_raid(names: &[&str]) -> bool {
    names
        .iter()
        .any(|name| matches!(*name, "Raid Challenges" | "summoning Ritual"))
}

fn is_dungeon(names: &[&str]) -> bool {
    names.get(DUNGEON_TIER_INDEX) == Some(&"Master Modifiers")
}

fn is_grandmaster(names: &[&str]) -> bool {
    names.contains(&"Grandmaster Modifiers")
}

/// Drops empty and whitespace-only names, keeping the order of the rest.
pub fn significant_modifiers<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Classifies a modifier list, or returns `None` when no rule matches.
pub fn classify<S: AsRef<str>>(modifier_names: &[S]) -> Option<Category> {
    let names = significant_modifiers(modifier_names);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&names))
        .map(|rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raid_takes_priority_over_grandmaster() {
        assert_eq!(
            classify(&["Raid Challenges", "Grandmaster Modifiers"]),
            Some(Category::Raid)
        );
        assert_eq!(classify(&["summoning Ritual"]), Some(Category::Raid));
    }

    #[test]
    fn dungeon_requires_master_modifiers_at_index_four() {
        let five = ["a", "b", "c", "d", "Master Modifiers"];
        assert_eq!(classify(&five), Some(Category::Dungeon));

        let four = ["a", "b", "c", "Master Modifiers"];
        assert_eq!(classify(&four), None);

        let six = ["a", "b", "c", "d", "e", "Master Modifiers"];
        assert_eq!(classify(&six), None);
    }

    #[test]
    fn empty_names_are_discarded_before_indexing() {
        let padded = ["", "a", "b", "  ", "c", "d", "Master Modifiers"];
        assert_eq!(classify(&padded), Some(Category::Dungeon));

        let sparse = ["a", "b", "c", "", "Master Modifiers"];
        assert_eq!(classify(&sparse), None);
    }

    #[test]
    fn grandmaster_matches_anywhere() {
        assert_eq!(
            classify(&["", "Grandmaster Modifiers"]),
            Some(Category::Grandmaster)
        );
    }

    #[test]
    fn unmatched_lists_are_discarded() {
        assert_eq!(classify::<&str>(&[]), None);
        assert_eq!(classify(&["raid challenges", "Master"]), None);
    }
}
