//! Post-selection cleanup of legacy templates

/// Instruction lines that only made sense next to a selection block
const ORPHAN_PREFIXES: &[&str] = &[
    "if none is specified",
    "if none are specified",
    "if nothing is specified",
    "if no option is specified",
    "if not specified",
    "otherwise select",
    "otherwise, select",
    "otherwise choose",
    "otherwise, choose",
    "otherwise pick",
    "otherwise, pick",
];

/// Level given to `STYLE:` headers; they nest under any `#` header
const COLON_HEADER_LEVEL: usize = 7;

/// What the next kept non-blank line is, seen from a line above it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    End,
    Content,
    Header(usize),
}

/// Drop orphaned instruction lines and empty all-caps headers, then collapse
/// runs of blank lines to a single blank line. Untouched lines keep their
/// exact bytes.
///
/// A header is empty when the next kept line is the end of the text or a
/// header of the same or a higher level. A deeper header below it counts as
/// content.
pub fn cleanup(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').filter(|line| !is_orphan_instruction(line)).collect();

    // Walk backwards so a header can see what follows it
    let mut keep = vec![true; lines.len()];
    let mut next = Next::End;
    for (i, line) in lines.iter().enumerate().rev() {
        if line.trim().is_empty() {
            continue;
        }
        match header_level(line) {
            Some(level) => {
                let has_body = match next {
                    Next::End => false,
                    Next::Content => true,
                    Next::Header(below) => below > level,
                };
                if has_body {
                    next = Next::Header(level);
                } else {
                    keep[i] = false;
                }
            }
            None => next = Next::Content,
        }
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blank_run = 0;
    for (line, kept) in lines.iter().zip(keep) {
        if !kept {
            continue;
        }
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

fn is_orphan_instruction(line: &str) -> bool {
    let trimmed = line.trim_start().trim_start_matches(['-', '*', '•']).trim_start();
    let lower = trimmed.to_lowercase();
    ORPHAN_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// `## STYLE`, `STYLE:` or `LIGHTING OPTIONS:` - uppercase letters, no lowercase.
///
/// Hash headers have one level per `#`; colon-only headers are the deepest.
fn header_level(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    let body = trimmed[hashes..].trim();
    let colon = body.ends_with(':');
    if hashes == 0 && !colon {
        return None;
    }
    let body = body.trim_end_matches(':');
    let letters = body.chars().filter(|c| c.is_alphabetic()).count();
    if letters < 2 || body.chars().any(|c| c.is_lowercase()) {
        return None;
    }
    Some(if hashes > 0 { hashes } else { COLON_HEADER_LEVEL })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_text_is_identical() {
        let text = "Randomly choose a fun hat.\n\nKeep the face.\n";
        assert_eq!(cleanup(text), text);
    }

    #[test]
    fn test_orphan_instruction_lines_removed() {
        let text = "SELECTED OPTION: Cats\nIf none is specified, use Dogs.\n- Otherwise SELECT a random animal.\nDone.";
        assert_eq!(cleanup(text), "SELECTED OPTION: Cats\nDone.");
    }

    #[test]
    fn test_empty_headers_removed() {
        let text = "## STYLE\nWatercolor\n\nACCESSORIES:\n\n## NOTES\n";
        assert_eq!(cleanup(text), "## STYLE\nWatercolor\n");
    }

    #[test]
    fn test_parent_header_with_nested_header_kept() {
        let text = "## STYLE\n### SUBSTYLE\nWatercolor";
        assert_eq!(cleanup(text), text);

        let text = "## STYLE\nLIGHTING:\nSoft light";
        assert_eq!(cleanup(text), text);
    }

    #[test]
    fn test_header_followed_by_sibling_or_parent_dropped() {
        assert_eq!(cleanup("## A\n## B\ntext"), "## B\ntext");
        assert_eq!(cleanup("### A\n\n## B\ntext"), "\n## B\ntext");
        assert_eq!(cleanup("LIGHTING:\n# STYLE\nInk"), "# STYLE\nInk");
        // Empty child leaves the parent with nothing below it
        assert_eq!(cleanup("intro\n## STYLE\n### EMPTY\n"), "intro\n");
    }

    #[test]
    fn test_header_levels() {
        assert_eq!(header_level("# STYLE"), Some(1));
        assert_eq!(header_level("  ### SUB STYLE:"), Some(3));
        assert_eq!(header_level("ACCESSORIES:"), Some(COLON_HEADER_LEVEL));
        assert_eq!(header_level("## Style"), None);
        assert_eq!(header_level("Plain text"), None);
    }

    #[test]
    fn test_header_with_content_kept() {
        let text = "LIGHTING:\nSoft light";
        assert_eq!(cleanup(text), text);
    }

    #[test]
    fn test_blank_runs_collapse() {
        let text = "one\n\n\n\ntwo\n\nthree";
        assert_eq!(cleanup(text), "one\n\ntwo\n\nthree");
    }

    #[test]
    fn test_selected_option_line_is_not_a_header() {
        assert!(!header_level("SELECTED OPTION: Cats").is_some());
        assert!(header_level("RANDOM SELECTION:").is_some());
        assert!(header_level("# STYLE").is_some());
        assert!(!header_level("Note:").is_some());
        assert!(!header_level("A:").is_some());
    }
}
