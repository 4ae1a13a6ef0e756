//! Apply parsed directives to a legacy template

use tracing::debug;

use super::parser::{Directive, Line, Parity};
use super::seed::SeedDigits;

/// Marker line written in place of a collapsed choice
pub const SELECTED_PREFIX: &str = "SELECTED OPTION: ";
/// Note written under the selected option
pub const SELECTED_NOTE: &str = "(Automatically selected using random seed)";

/// Render a collapsed choice
pub fn selected_block(text: &str) -> String {
    format!("{}{}\n{}", SELECTED_PREFIX, text, SELECTED_NOTE)
}

#[derive(Debug, Clone)]
enum LineEdit {
    Keep,
    Drop,
    Replace(String),
}

/// Rewrite template lines according to the directives.
///
/// A labeled A/B choice replaces the whole body. Otherwise even/odd clauses
/// keep only the branch matching the seed's last digit, and each modulo list
/// whose computed index exists collapses to a selected-option block. Lists
/// without a matching index are left untouched. `on_select` is called with
/// each modulo selection.
pub fn apply_directives(
    lines: &[Line<'_>],
    directives: &[Directive<'_>],
    seed: &SeedDigits,
    mut on_select: impl FnMut(&str),
) -> String {
    let parity = Parity::of(seed);

    if let Some(choice) = directives.iter().find_map(|d| match d {
        Directive::LabeledChoice(choice) => Some(choice),
        _ => None,
    }) {
        debug!(?parity, "apply_directives: labeled choice replaces body");
        return selected_block(choice.pick(parity));
    }

    let mut edits = vec![LineEdit::Keep; lines.len()];
    for directive in directives {
        match directive {
            Directive::EvenOdd(clauses) => {
                for clause in clauses {
                    edits[clause.line] = if clause.parity == parity {
                        LineEdit::Replace(format!("{}{}", clause.lead, clause.branch))
                    } else {
                        LineEdit::Drop
                    };
                }
            }
            Directive::Modulo(list) => match list.select(seed) {
                Some(text) => {
                    debug!(modulus = list.modulus, digits = ?list.digits, text, "apply_directives: modulo selection");
                    for edit in &mut edits[list.lines.clone()] {
                        *edit = LineEdit::Drop;
                    }
                    edits[list.lines.start] = LineEdit::Replace(selected_block(text));
                    on_select(text);
                }
                None => debug!(modulus = list.modulus, "apply_directives: no listed index matches"),
            },
            Directive::LabeledChoice(_) => {}
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (line, edit) in lines.iter().zip(edits) {
        match edit {
            LineEdit::Keep => out.push(line.raw.to_string()),
            LineEdit::Drop => {}
            LineEdit::Replace(text) => out.push(text),
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::parser::{parse_directives, tokenize};

    fn rewrite(text: &str, seed: i64) -> (String, Vec<String>) {
        let lines = tokenize(text);
        let directives = parse_directives(&lines);
        let mut picked = Vec::new();
        let out = apply_directives(&lines, &directives, &SeedDigits::from_seed(seed), |t| {
            picked.push(t.to_string())
        });
        (out, picked)
    }

    #[test]
    fn test_even_odd_keeps_matching_branch() {
        let text = "Add an accessory:\n- If the last digit is even: a red hat\n- If the last digit is odd: a blue scarf\nKeep the face.";

        let (even, _) = rewrite(text, 42);
        assert_eq!(even, "Add an accessory:\n- a red hat\nKeep the face.");

        let (odd, _) = rewrite(text, 41);
        assert_eq!(odd, "Add an accessory:\n- a blue scarf\nKeep the face.");
    }

    #[test]
    fn test_labeled_choice_replaces_body() {
        let text = "Use the last digit: even means A.\nIf Option A: cyberpunk city\nIf Option B: medieval village";
        let (out, picked) = rewrite(text, 7);
        assert_eq!(out, "SELECTED OPTION: medieval village\n(Automatically selected using random seed)");
        assert!(picked.is_empty());
    }

    #[test]
    fn test_modulo_collapse_records_selection() {
        let text = "Make it an animal.\nUse the random seed modulo 3:\n- 0: Dogs\n- 1: Cats\n- 2: Birds\nKeep the background.";
        let (out, picked) = rewrite(text, 1007);
        assert_eq!(
            out,
            "Make it an animal.\nSELECTED OPTION: Cats\n(Automatically selected using random seed)\nKeep the background."
        );
        assert_eq!(picked, vec!["Cats"]);
    }

    #[test]
    fn test_modulo_missing_index_left_untouched() {
        let text = "Use the random seed modulo 4:\n- 0: Dogs\n- 1: Cats";
        let (out, picked) = rewrite(text, 3);
        assert_eq!(out, text);
        assert!(picked.is_empty());
    }

    #[test]
    fn test_last_three_digits() {
        let text = "Take the last three digits of the seed modulo 7:\n- 0: a\n- 1: b\n- 2: c\n- 3: d\n- 4: e\n- 5: f\n- 6: g";
        // 123 % 7 = 4
        let (out, picked) = rewrite(text, 9123);
        assert_eq!(picked, vec!["e"]);
        assert!(out.starts_with("SELECTED OPTION: e"));
    }

    #[test]
    fn test_even_odd_then_modulo() {
        let text = "- If the last digit is even: bright\n- If the last digit is odd: dark\nUse the seed modulo 2:\n- 0: day\n- 1: night";
        let (out, picked) = rewrite(text, 10);
        assert_eq!(out, "- bright\nSELECTED OPTION: day\n(Automatically selected using random seed)");
        assert_eq!(picked, vec!["day"]);
    }
}
