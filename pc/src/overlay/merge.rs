//! Pure merge of a base catalog with user overlay records

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{Preset, PresetPatch};

/// Merge a base catalog with modification, deletion and new-preset overlays.
///
/// 1. Duplicate names inside `base` collapse (last one wins, moved to the end).
/// 2. Base presets named in `deletions` are dropped. Deletion beats modification.
/// 3. Surviving base presets get their patch applied. A patch that renames a
///    preset onto another surviving name replaces that entry and moves to the end.
/// 4. Each new preset replaces any same-named entry and is appended in order.
///
/// Patches for names with no surviving base preset are ignored.
pub fn merge_presets(
    base: &[Preset],
    modifications: &HashMap<String, PresetPatch>,
    deletions: &HashSet<String>,
    new_presets: &[Preset],
) -> Vec<Preset> {
    let mut survivors: Vec<Preset> = Vec::with_capacity(base.len() + new_presets.len());
    for preset in base {
        push_last_wins(&mut survivors, preset.clone());
    }
    survivors.retain(|p| !deletions.contains(&p.name));

    let mut patched: Vec<(Preset, bool)> = Vec::with_capacity(survivors.len());
    for mut preset in survivors {
        let renamed = match modifications.get(&preset.name) {
            Some(patch) => {
                let original = preset.name.clone();
                patch.apply(&mut preset);
                preset.name != original
            }
            None => false,
        };
        patched.push((preset, renamed));
    }

    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for (preset, _) in &patched {
        *name_counts.entry(preset.name.clone()).or_default() += 1;
    }

    let mut merged: Vec<Preset> = Vec::with_capacity(patched.len() + new_presets.len());
    let mut relocated = Vec::new();
    for (preset, renamed) in patched {
        if renamed && name_counts.get(&preset.name).copied().unwrap_or(0) > 1 {
            relocated.push(preset);
        } else {
            merged.push(preset);
        }
    }
    for preset in relocated {
        push_last_wins(&mut merged, preset);
    }

    for preset in new_presets {
        let mut preset = preset.clone();
        preset.internal = false;
        push_last_wins(&mut merged, preset);
    }

    debug!(
        base = base.len(),
        modifications = modifications.len(),
        deletions = deletions.len(),
        new = new_presets.len(),
        merged = merged.len(),
        "merge_presets: done"
    );
    merged
}

/// Append a preset, removing any entry that already carries its name
fn push_last_wins(list: &mut Vec<Preset>, preset: Preset) {
    if list.iter().any(|p| p.name == preset.name) {
        debug!(name = %preset.name, "push_last_wins: replacing duplicate name");
        list.retain(|p| p.name != preset.name);
    }
    list.push(preset);
}
