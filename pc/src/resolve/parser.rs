//! Template tokenizer and directive parser
//!
//! Legacy templates encode seeded choices in plain prose. The message is split
//! into lines, each line is classified into a [`LineToken`], and the token
//! stream is folded into typed [`Directive`]s. Every pattern is matched against
//! a single line with the `regex` crate, whose automata run in linear time.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::seed::{DigitClass, SeedDigits};
use crate::domain::{Preset, PresetOption};

/// Words that mark a message as possibly carrying selection instructions
pub const SELECTION_KEYWORDS: &[&str] = &[
    "random",
    "select",
    "selection",
    "choose",
    "modulo",
    "last digit",
    "last two digits",
    "last three digits",
];

static INDEXED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*(\d+)\s*:\s*(\S.*?)\s*$").expect("indexed item pattern"));
static LABELED_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*•]\s*)?if\s+option\s+([ab])\s*:\s*(.*?)\s*$").expect("labeled branch pattern")
});
static INLINE_OPTION_B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bif\s+option\s+b\s*:").expect("inline option pattern"));
static PARITY_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*[-*•]\s*)([^:]+):\s*(\S.*?)\s*$").expect("parity clause pattern"));
static EVEN_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\beven\b").expect("even pattern"));
static ODD_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bodd\b").expect("odd pattern"));
static DIGIT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:digit|digits|seed|number)\b").expect("digit reference pattern"));
static MODULO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bmodulo\s+(\d+)").expect("modulo pattern"));
static LAST_THREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+three\s+digits\b").expect("last three pattern"));
static LAST_TWO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+two\s+digits\b").expect("last two pattern"));
static LAST_ONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blast\s+digit\b").expect("last digit pattern"));
static SEED_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bseed\b").expect("seed pattern"));

/// Case-insensitive keyword scan. A miss means the message needs no parsing.
pub fn has_selection_keywords(message: &str) -> bool {
    let lower = message.to_lowercase();
    SELECTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(digits: &SeedDigits) -> Self {
        if digits.is_even() { Self::Even } else { Self::Odd }
    }
}

/// Label of an `If Option A:` / `If Option B:` branch. A is taken on even seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionLabel {
    A,
    B,
}

/// Classification of a single template line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    Blank,
    /// `- <index>: <text>`
    IndexedItem { index: u64, text: &'a str },
    /// `If Option A: <text>`
    LabeledBranch { label: OptionLabel, text: &'a str },
    /// `- If the last digit is even: <branch>`
    ParityClause {
        lead: &'a str,
        parity: Parity,
        branch: &'a str,
    },
    /// A line containing `modulo <N>`
    ModuloInstruction {
        modulus: u64,
        digits: Option<DigitClass>,
        names_seed: bool,
    },
    Text,
}

/// A template line with its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub raw: &'a str,
    pub token: LineToken<'a>,
}

/// Split on `\n` (so joining with `\n` restores the input) and classify each line
pub fn tokenize(text: &str) -> Vec<Line<'_>> {
    text.split('\n')
        .map(|raw| Line {
            raw,
            token: classify_line(raw),
        })
        .collect()
}

fn classify_line(raw: &str) -> LineToken<'_> {
    if raw.trim().is_empty() {
        return LineToken::Blank;
    }

    if let Some(caps) = INDEXED_ITEM.captures(raw)
        && let (Some(index), Some(text)) = (caps.get(1), caps.get(2))
        && let Ok(index) = index.as_str().parse::<u64>()
    {
        return LineToken::IndexedItem {
            index,
            text: text.as_str(),
        };
    }

    if let Some(caps) = LABELED_BRANCH.captures(raw)
        && let (Some(label), Some(text)) = (caps.get(1), caps.get(2))
    {
        let label = if label.as_str().eq_ignore_ascii_case("a") {
            OptionLabel::A
        } else {
            OptionLabel::B
        };
        return LineToken::LabeledBranch {
            label,
            text: text.as_str(),
        };
    }

    if let Some(caps) = PARITY_CLAUSE.captures(raw)
        && let (Some(lead), Some(cond), Some(branch)) = (caps.get(1), caps.get(2), caps.get(3))
        && let Some(parity) = condition_parity(cond.as_str())
    {
        return LineToken::ParityClause {
            lead: lead.as_str(),
            parity,
            branch: branch.as_str(),
        };
    }

    if let Some(caps) = MODULO.captures(raw)
        && let Some(modulus) = caps.get(1)
        && let Ok(modulus) = modulus.as_str().parse::<u64>()
    {
        let (digits, names_seed) = instruction_refs(raw);
        return LineToken::ModuloInstruction {
            modulus,
            digits,
            names_seed,
        };
    }

    LineToken::Text
}

/// A condition names exactly one parity and refers to the seed's digits
fn condition_parity(cond: &str) -> Option<Parity> {
    if !DIGIT_REF.is_match(cond) {
        return None;
    }
    match (EVEN_WORD.is_match(cond), ODD_WORD.is_match(cond)) {
        (true, false) => Some(Parity::Even),
        (false, true) => Some(Parity::Odd),
        _ => None,
    }
}

/// Which digit class (if any) an instruction names, and whether it mentions the seed
fn instruction_refs(raw: &str) -> (Option<DigitClass>, bool) {
    let digits = if LAST_THREE.is_match(raw) {
        Some(DigitClass::LastThreeDigits)
    } else if LAST_TWO.is_match(raw) {
        Some(DigitClass::LastTwoDigits)
    } else if LAST_ONE.is_match(raw) {
        Some(DigitClass::LastDigit)
    } else {
        None
    };
    (digits, SEED_WORD.is_match(raw))
}

/// One even/odd bullet clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityClause<'a> {
    /// Line index in the token stream
    pub line: usize,
    /// Leading indentation and bullet marker
    pub lead: &'a str,
    pub parity: Parity,
    pub branch: &'a str,
}

/// An `If Option A: … If Option B: …` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledChoice {
    pub option_a: String,
    pub option_b: String,
}

impl LabeledChoice {
    pub fn pick(&self, parity: Parity) -> &str {
        match parity {
            Parity::Even => &self.option_a,
            Parity::Odd => &self.option_b,
        }
    }
}

/// A modulo-indexed option list and the instruction lines that introduce it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuloList<'a> {
    /// Lines covered by the instruction and the list
    pub lines: Range<usize>,
    pub digits: DigitClass,
    pub modulus: u64,
    pub items: Vec<(u64, &'a str)>,
}

impl<'a> ModuloList<'a> {
    /// Option whose declared index equals `value mod modulus`, if any
    pub fn select(&self, seed: &SeedDigits) -> Option<&'a str> {
        let index = seed.value(self.digits).checked_rem(self.modulus)?;
        self.items.iter().find(|(i, _)| *i == index).map(|(_, text)| *text)
    }
}

/// Seeded selection found in a legacy template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    EvenOdd(Vec<ParityClause<'a>>),
    LabeledChoice(LabeledChoice),
    Modulo(ModuloList<'a>),
}

/// How a preset's template must be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateKind<'a> {
    /// Explicit option list
    Structured(&'a [PresetOption]),
    /// Free-text message with keyword hits; directives may be empty
    Legacy {
        lines: Vec<Line<'a>>,
        directives: Vec<Directive<'a>>,
    },
    /// Message used verbatim
    Plain,
}

/// Classify a preset's template. Structured options always win.
pub fn classify(preset: &Preset) -> TemplateKind<'_> {
    if preset.is_structured() {
        return TemplateKind::Structured(&preset.options);
    }
    if !has_selection_keywords(&preset.message) {
        return TemplateKind::Plain;
    }
    let lines = tokenize(&preset.message);
    let directives = parse_directives(&lines);
    TemplateKind::Legacy { lines, directives }
}

/// Fold a token stream into directives, even/odd forms first
pub fn parse_directives<'a>(lines: &[Line<'a>]) -> Vec<Directive<'a>> {
    let mut directives = Vec::new();

    if let Some(choice) = parse_labeled_choice(lines) {
        directives.push(Directive::LabeledChoice(choice));
    }

    let clauses: Vec<ParityClause<'a>> = lines
        .iter()
        .enumerate()
        .filter_map(|(line, l)| match l.token {
            LineToken::ParityClause { lead, parity, branch } => Some(ParityClause {
                line,
                lead,
                parity,
                branch,
            }),
            _ => None,
        })
        .collect();
    if !clauses.is_empty() {
        directives.push(Directive::EvenOdd(clauses));
    }

    let mut i = 0;
    while i < lines.len() {
        if let Some(list) = parse_modulo_list(lines, i) {
            i = list.lines.end;
            directives.push(Directive::Modulo(list));
        } else {
            i += 1;
        }
    }

    directives
}

fn parse_labeled_choice(lines: &[Line<'_>]) -> Option<LabeledChoice> {
    let find = |wanted: OptionLabel| {
        lines.iter().position(
            |l| matches!(l.token, LineToken::LabeledBranch { label, .. } if label == wanted),
        )
    };

    let a_at = find(OptionLabel::A)?;
    let LineToken::LabeledBranch { text: a_text, .. } = lines[a_at].token else {
        return None;
    };

    if let Some(m) = INLINE_OPTION_B.find(a_text) {
        return Some(LabeledChoice {
            option_a: a_text[..m.start()].trim().to_string(),
            option_b: a_text[m.end()..].trim().to_string(),
        });
    }

    let b_at = find(OptionLabel::B)?;
    Some(LabeledChoice {
        option_a: branch_text(lines, a_at),
        option_b: branch_text(lines, b_at),
    })
}

/// Branch text plus any plain continuation lines up to a blank line
fn branch_text(lines: &[Line<'_>], at: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let LineToken::LabeledBranch { text, .. } = lines[at].token
        && !text.is_empty()
    {
        parts.push(text);
    }
    for line in &lines[at + 1..] {
        match line.token {
            LineToken::Text => parts.push(line.raw.trim()),
            _ => break,
        }
    }
    parts.join("\n")
}

fn parse_modulo_list<'a>(lines: &[Line<'a>], at: usize) -> Option<ModuloList<'a>> {
    let LineToken::ModuloInstruction {
        modulus,
        mut digits,
        mut names_seed,
    } = lines[at].token
    else {
        return None;
    };

    let mut start = at;
    if digits.is_none() && !names_seed && at > 0 && lines[at - 1].token == LineToken::Text {
        let (prev_digits, prev_seed) = instruction_refs(lines[at - 1].raw);
        if prev_digits.is_some() || prev_seed {
            start = at - 1;
            digits = prev_digits;
            names_seed = prev_seed;
        }
    }
    if digits.is_none() && !names_seed {
        return None;
    }

    let mut end = at + 1;
    while end < lines.len() && lines[end].token == LineToken::Blank {
        end += 1;
    }
    let mut items = Vec::new();
    while let Some(LineToken::IndexedItem { index, text }) = lines.get(end).map(|l| l.token) {
        items.push((index, text));
        end += 1;
    }
    if items.is_empty() {
        return None;
    }

    Some(ModuloList {
        lines: start..end,
        digits: digits.unwrap_or(DigitClass::LastTwoDigits),
        modulus,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_scan_case_insensitive() {
        assert!(has_selection_keywords("RANDOMLY pick a hat"));
        assert!(has_selection_keywords("use the Last Digit"));
        assert!(has_selection_keywords("Choose one"));
        assert!(!has_selection_keywords("Turn the photo into a watercolor."));
    }

    #[test]
    fn test_tokenize_preserves_lines() {
        let text = "a\n\n- 0: Dogs\r\nlast";
        let lines = tokenize(text);
        let joined: Vec<&str> = lines.iter().map(|l| l.raw).collect();
        assert_eq!(joined.join("\n"), text);
        assert_eq!(lines[1].token, LineToken::Blank);
        assert_eq!(lines[2].token, LineToken::IndexedItem { index: 0, text: "Dogs" });
    }

    #[test]
    fn test_classify_parity_clause() {
        let line = "  - If the last digit of the seed is even: add a red hat ";
        assert_eq!(
            classify_line(line),
            LineToken::ParityClause {
                lead: "  - ",
                parity: Parity::Even,
                branch: "add a red hat",
            }
        );

        // no digit reference: plain bullet
        assert_eq!(classify_line("- Even better: smile"), LineToken::Text);
        // both parities named: ambiguous
        assert_eq!(classify_line("- If the digit is even or odd: x"), LineToken::Text);
    }

    #[test]
    fn test_classify_modulo_instruction() {
        assert_eq!(
            classify_line("Take the LAST THREE DIGITS modulo 12:"),
            LineToken::ModuloInstruction {
                modulus: 12,
                digits: Some(DigitClass::LastThreeDigits),
                names_seed: false,
            }
        );
        assert_eq!(
            classify_line("Use the random seed modulo 3:"),
            LineToken::ModuloInstruction {
                modulus: 3,
                digits: None,
                names_seed: true,
            }
        );
    }

    #[test]
    fn test_modulo_list_defaults_to_two_digits() {
        let text = "Intro\nUse the random seed modulo 3:\n- 0: Dogs\n- 1: Cats\n- 2: Birds";
        let lines = tokenize(text);
        let directives = parse_directives(&lines);
        assert_eq!(directives.len(), 1);
        let Directive::Modulo(list) = &directives[0] else {
            panic!("expected modulo directive");
        };
        assert_eq!(list.lines, 1..5);
        assert_eq!(list.digits, DigitClass::LastTwoDigits);
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.select(&SeedDigits::from_seed(1007)), Some("Cats"));
    }

    #[test]
    fn test_modulo_instruction_on_previous_line() {
        let text = "Look at the LAST DIGIT of the seed.\nCompute it modulo 2:\n\n- 0: Hat\n- 1: Scarf";
        let lines = tokenize(text);
        let directives = parse_directives(&lines);
        let Directive::Modulo(list) = &directives[0] else {
            panic!("expected modulo directive");
        };
        assert_eq!(list.lines, 0..5);
        assert_eq!(list.digits, DigitClass::LastDigit);
        assert_eq!(list.select(&SeedDigits::from_seed(13)), Some("Scarf"));
    }

    #[test]
    fn test_modulo_without_seed_reference_ignored() {
        let lines = tokenize("Count apples modulo 3:\n- 0: a\n- 1: b");
        assert!(parse_directives(&lines).is_empty());
    }

    #[test]
    fn test_modulo_zero_never_selects() {
        let lines = tokenize("Use the seed modulo 0:\n- 0: a");
        let directives = parse_directives(&lines);
        let Directive::Modulo(list) = &directives[0] else {
            panic!("expected modulo directive");
        };
        assert_eq!(list.select(&SeedDigits::from_seed(5)), None);
    }

    #[test]
    fn test_labeled_choice_multiline_and_inline() {
        let lines = tokenize("Pick one.\nIf Option A: a red hat\nwith feathers\nIf Option B: a blue scarf");
        let directives = parse_directives(&lines);
        assert_eq!(
            directives[0],
            Directive::LabeledChoice(LabeledChoice {
                option_a: "a red hat\nwith feathers".to_string(),
                option_b: "a blue scarf".to_string(),
            })
        );

        let lines = tokenize("If Option A: hat. If option B: scarf.");
        let Directive::LabeledChoice(choice) = &parse_directives(&lines)[0] else {
            panic!("expected labeled choice");
        };
        assert_eq!(choice.pick(Parity::Even), "hat.");
        assert_eq!(choice.pick(Parity::Odd), "scarf.");
    }

    #[test]
    fn test_directive_precedence_order() {
        let text = "- If the last digit is even: x\n- If the last digit is odd: y\nUse the seed modulo 2:\n- 0: a\n- 1: b";
        let directives = parse_directives(&tokenize(text));
        assert!(matches!(directives[0], Directive::EvenOdd(_)));
        assert!(matches!(directives[1], Directive::Modulo(_)));
    }

    #[test]
    fn test_classify_template_kinds() {
        let plain = Preset::new("Plain", "Watercolor painting");
        assert_eq!(classify(&plain), TemplateKind::Plain);

        let structured = Preset::new("S", "Use the random seed").with_options(vec![PresetOption::new("001", "A")]);
        assert!(matches!(classify(&structured), TemplateKind::Structured(opts) if opts.len() == 1));

        let legacy = Preset::new("L", "Choose something nice");
        assert!(matches!(classify(&legacy), TemplateKind::Legacy { directives, .. } if directives.is_empty()));
    }
}
