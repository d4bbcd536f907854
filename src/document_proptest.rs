//! Property-based tests for the INI document model.
//!
//! These tests use proptest to generate random well-formed config files and
//! verify that the round-trip and mutation invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::document::Document;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    // ============================================================================
    // Strategies: generate well-formed yum-style config text
    // ============================================================================

    fn key_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}"
    }

    fn value_strategy() -> impl Strategy<Value = String> {
        // values may contain '=', URLs, globs; never newlines
        "[a-zA-Z0-9 =/:.*$_-]{0,20}"
    }

    fn section_name_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,12}"
    }

    prop_compose! {
        /// One section rendered as text lines: optional leading comment,
        /// header, unique keys, optional trailing blank line.
        fn section_lines()(
            name in section_name_strategy(),
            entries in prop::collection::btree_map(key_strategy(), value_strategy(), 0..5),
            comment in prop::option::of("[ a-zA-Z0-9]{0,16}"),
            spaced in any::<bool>(),
            trailing_blank in any::<bool>(),
        ) -> (String, Vec<String>) {
            let mut lines = Vec::new();
            if let Some(text) = comment {
                lines.push(format!("#{}", text));
            }
            lines.push(format!("[{}]", name));
            for (key, value) in &entries {
                if spaced {
                    lines.push(format!("{} = {}", key, value));
                } else {
                    lines.push(format!("{}={}", key, value));
                }
            }
            if trailing_blank {
                lines.push(String::new());
            }
            (name, lines)
        }
    }

    prop_compose! {
        /// A whole config file with unique section names.
        fn config_text()(
            sections in prop::collection::vec(section_lines(), 0..5),
            final_newline in any::<bool>(),
        ) -> String {
            let mut seen = BTreeMap::new();
            let mut lines: Vec<String> = Vec::new();
            for (name, section) in sections {
                // the parser rejects duplicate section names
                if seen.insert(name, ()).is_some() {
                    continue;
                }
                lines.extend(section);
            }
            let mut text = lines.join("\n");
            if final_newline && !text.is_empty() {
                text.push('\n');
            }
            text
        }
    }

    // ============================================================================
    // Round-trip properties
    // ============================================================================

    proptest! {
        /// Property: rendering a parsed document reproduces the input bytes
        #[test]
        fn render_after_parse_is_identity(text in config_text()) {
            let doc = Document::parse(&text, "prop.repo").unwrap();
            prop_assert_eq!(doc.render(), text);
        }

        /// Property: parsing a rendered document yields an equal document
        #[test]
        fn parse_after_render_is_identity(text in config_text()) {
            let doc = Document::parse(&text, "prop.repo").unwrap();
            let reparsed = Document::parse(&doc.render(), "prop.repo").unwrap();
            prop_assert_eq!(reparsed, doc);
        }

        /// Property: parsing is deterministic
        #[test]
        fn parse_is_deterministic(text in config_text()) {
            let doc1 = Document::parse(&text, "prop.repo").unwrap();
            let doc2 = Document::parse(&text, "prop.repo").unwrap();
            prop_assert_eq!(doc1, doc2);
        }
    }

    // ============================================================================
    // Mutation properties
    // ============================================================================

    proptest! {
        /// Property: set_key twice with the same value equals set_key once
        #[test]
        fn set_key_is_idempotent(
            text in config_text(),
            key in key_strategy(),
            value in value_strategy(),
        ) {
            let doc = Document::parse(&text, "prop.repo").unwrap();
            let sections: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assume!(!sections.is_empty());

            let mut once = doc.clone();
            once.set_key(&sections[0], &key, &value).unwrap();
            let mut twice = once.clone();
            twice.set_key(&sections[0], &key, &value).unwrap();
            prop_assert_eq!(twice.render(), once.render());
        }

        /// Property: set_key makes get return the new value
        #[test]
        fn set_key_then_get_returns_value(
            text in config_text(),
            key in key_strategy(),
            value in value_strategy(),
        ) {
            let mut doc = Document::parse(&text, "prop.repo").unwrap();
            let sections: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assume!(!sections.is_empty());

            doc.set_key(&sections[0], &key, &value).unwrap();
            prop_assert_eq!(doc.get(&sections[0], &key), Some(value.trim().to_string()));
        }

        /// Property: a set_key result still parses cleanly
        #[test]
        fn set_key_output_reparses(
            text in config_text(),
            key in key_strategy(),
            value in "[a-zA-Z0-9/:.*_-]{0,20}",
        ) {
            let mut doc = Document::parse(&text, "prop.repo").unwrap();
            let sections: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assume!(!sections.is_empty());

            doc.set_key(&sections[0], &key, &value).unwrap();
            prop_assert!(Document::parse(&doc.render(), "prop.repo").is_ok());
        }

        /// Property: set_key touches only the target section; every other
        /// section's entries are unchanged
        #[test]
        fn set_key_leaves_other_sections_alone(
            text in config_text(),
            key in key_strategy(),
            value in value_strategy(),
        ) {
            let mut doc = Document::parse(&text, "prop.repo").unwrap();
            let sections: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assume!(sections.len() >= 2);

            let before: Vec<_> = sections[1..]
                .iter()
                .map(|name| doc.entries(name))
                .collect();
            doc.set_key(&sections[0], &key, &value).unwrap();
            let after: Vec<_> = sections[1..]
                .iter()
                .map(|name| doc.entries(name))
                .collect();
            prop_assert_eq!(before, after);
        }

        /// Property: remove_section removes exactly the named section
        #[test]
        fn remove_section_removes_only_target(text in config_text()) {
            let mut doc = Document::parse(&text, "prop.repo").unwrap();
            let sections: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assume!(!sections.is_empty());

            doc.remove_section(&sections[0]).unwrap();
            let remaining: Vec<String> =
                doc.sections().iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(remaining, sections[1..].to_vec());
        }
    }
}
