use std::collections::HashMap;

use crate::{cfg::ClassEntry, error::Error};

/// Maps Canvas course labels to the class labels used on the board.
#[derive(Debug, Clone, Default)]
pub struct ClassMapping {
    labels: HashMap<String, String>,
}

impl ClassMapping {
    pub fn new(entries: &[ClassEntry]) -> Self {
        Self {
            labels: entries
                .iter()
                .map(|entry| (entry.course.clone(), entry.label.clone()))
                .collect(),
        }
    }

    /// Resolves a course name such as `Hon English Smith` to its class label.
    ///
    /// Canvas appends the teacher name to the course label, and teacher names
    /// can contain spaces: the exact name is tried first, then the name without
    /// its last word, then without its last two words.
    pub fn resolve(&self, course: &str) -> Result<&str, Error> {
        let words: Vec<&str> = course.split_whitespace().collect();

        (0..=2)
            .filter(|strip| *strip < words.len() || *strip == 0)
            .map(|strip| words[..words.len() - strip].join(" "))
            .find_map(|candidate| self.labels.get(&candidate))
            .map(String::as_str)
            .ok_or_else(|| Error::ClassLabelResolution {
                course: course.to_string(),
            })
    }
}

/// Turns a class label into the name discord gives the matching channel.
///
/// `Art & Design 🎨` becomes `art-design-🎨`.
pub fn channel_name(label: &str) -> String {
    let lowered = label.to_lowercase().replace('&', "").replace(' ', "-");

    let mut name = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        // discord collapses repeated hyphens
        if c == '-' && name.ends_with('-') {
            continue;
        }
        name.push(c);
    }

    name.trim_matches('-').to_string()
}

/// Removes a decorative trailing segment, such as the emoji in `math-📐`.
pub fn strip_decoration(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((head, tail)) if !head.is_empty() && !tail.chars().any(|c| c.is_ascii_alphanumeric()) => {
            head
        }
        _ => name,
    }
}

/// Reverses [`channel_name`] as well as it can: `english-📖` gives `English 📖`.
pub fn label_from_channel(channel: &str) -> String {
    let spaced = channel.replace('-', " ");
    let mut chars = spaced.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use crate::cfg::ClassEntry;

    use super::{channel_name, label_from_channel, strip_decoration, ClassMapping};

    fn mapping() -> ClassMapping {
        ClassMapping::new(&[
            ClassEntry {
                course: "Hon English".to_string(),
                label: "English 📖".to_string(),
            },
            ClassEntry {
                course: "Algorithm Data".to_string(),
                label: "Computer Science 💻".to_string(),
            },
        ])
    }

    #[test]
    fn resolve_exact() {
        assert_eq!(mapping().resolve("Hon English").unwrap(), "English 📖");
    }

    #[test]
    fn resolve_teacher_names() {
        let mapping = mapping();
        assert_eq!(mapping.resolve("Algorithm Data Smith").unwrap(), "Computer Science 💻");
        assert_eq!(mapping.resolve("Hon English Van Dyke").unwrap(), "English 📖");
    }

    #[test]
    fn resolve_failure() {
        let mapping = mapping();
        assert!(mapping.resolve("Hon English Anna Van Dyke").is_err());
        assert!(mapping.resolve("Found Of Tech").is_err());
        assert!(mapping.resolve("").is_err());
    }

    #[test]
    fn channel_names() {
        assert_eq!(channel_name("Math 📐"), "math-📐");
        assert_eq!(channel_name("Art & Design 🎨"), "art-design-🎨");
        assert_eq!(channel_name("APUSH ⚖️"), "apush-⚖️");
    }

    #[test]
    fn decorations() {
        assert_eq!(strip_decoration("math-📐"), "math");
        assert_eq!(strip_decoration("math"), "math");
        assert_eq!(strip_decoration("computer-science"), "computer-science");
        assert_eq!(strip_decoration("computer-science-💻"), "computer-science");
        assert_eq!(strip_decoration("-📐"), "-📐");
    }

    #[test]
    fn labels_from_channels() {
        assert_eq!(label_from_channel("english-📖"), "English 📖");
        assert_eq!(label_from_channel("computer-science-💻"), "Computer science 💻");
        assert_eq!(label_from_channel(""), "");
    }
}
