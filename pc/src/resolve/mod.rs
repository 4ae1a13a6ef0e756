//! Prompt resolution
//!
//! Reduces a preset's template to the exact instruction string sent to the
//! image-transform service:
//!
//! 1. message
//! 2. + master prompt (never parsed)
//! 3. structured options: seeded random / manual / first choice, or
//! 4. legacy text: even/odd collapse, then modulo collapse, then cleanup
//! 5. + aspect-ratio sentence
//!
//! Resolution never fails. Unrecognized legacy text is returned cleaned up.

mod cleanup;
mod parser;
mod rewrite;
mod seed;
mod settings;

pub use cleanup::cleanup;
pub use parser::{
    Directive, LabeledChoice, Line, LineToken, ModuloList, OptionLabel, Parity, ParityClause, SELECTION_KEYWORDS,
    TemplateKind, classify, has_selection_keywords, parse_directives, tokenize,
};
pub use rewrite::{SELECTED_NOTE, SELECTED_PREFIX, apply_directives, selected_block};
pub use seed::{ClockSeed, DigitClass, FixedSeed, SeedDigits, SeedProvider};
pub use settings::{AspectRatio, LETTERBOX_SUFFIX, ResolveSettings, SQUARE_SUFFIX};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::{Preset, PresetOption};
use crate::history::SelectionLog;

/// Resolve a preset into its final instruction string.
///
/// `manual_choice` is only consulted for structured presets that do not
/// randomize. Selections are reported to `history`.
pub fn resolve_prompt(
    preset: &Preset,
    settings: &ResolveSettings,
    seed: i64,
    manual_choice: Option<&str>,
    history: &mut dyn SelectionLog,
) -> String {
    let mut text = match classify(preset) {
        TemplateKind::Structured(options) => {
            let chosen = choose_option(options, preset.randomize_options, seed, manual_choice);
            debug!(preset = %preset.name, chosen = %chosen, "resolve_prompt: structured option");
            history.add_selection(&preset.name, &chosen);
            format!("{}\n\n{}", with_master_prompt(&preset.message, settings), chosen)
        }
        TemplateKind::Legacy { lines, directives } => {
            debug!(preset = %preset.name, directives = directives.len(), seed, "resolve_prompt: legacy template");
            let digits = SeedDigits::from_seed(seed);
            let rewritten = apply_directives(&lines, &directives, &digits, |text| {
                history.add_selection(&preset.name, text)
            });
            with_master_prompt(&cleanup(&rewritten), settings)
        }
        TemplateKind::Plain => with_master_prompt(&preset.message, settings),
    };

    if let Some(suffix) = settings.aspect_ratio.suffix() {
        text.push(' ');
        text.push_str(suffix);
    }
    text
}

fn with_master_prompt(body: &str, settings: &ResolveSettings) -> String {
    match settings.master_prompt() {
        Some(master) => format!("{} {}", body, master),
        None => body.to_string(),
    }
}

/// Pick the text of a structured option. `options` must be non-empty.
fn choose_option(options: &[PresetOption], randomize: bool, seed: i64, manual_choice: Option<&str>) -> String {
    if randomize {
        let mut rng = StdRng::seed_from_u64(seed as u64);
        return options[rng.random_range(0..options.len())].text.clone();
    }
    match manual_choice {
        Some(choice) => choice.to_string(),
        None => options[0].text.clone(),
    }
}

/// A resolved prompt and the seed that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub seed: i64,
    pub prompt: String,
}

/// Bundles a seed source and a selection log for hosts that resolve at capture time
pub struct PromptResolver<P: SeedProvider, L: SelectionLog> {
    seeds: P,
    history: L,
}

impl<P: SeedProvider, L: SelectionLog> PromptResolver<P, L> {
    pub fn new(seeds: P, history: L) -> Self {
        Self { seeds, history }
    }

    pub fn history(&self) -> &L {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut L {
        &mut self.history
    }

    /// Draw a seed and resolve the preset with it
    pub fn resolve(&mut self, preset: &Preset, settings: &ResolveSettings, manual_choice: Option<&str>) -> Resolution {
        let seed = self.seeds.next_seed();
        let prompt = resolve_prompt(preset, settings, seed, manual_choice, &mut self.history);
        Resolution { seed, prompt }
    }
}
