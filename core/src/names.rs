//! Unique Julia names for synthesized functions.
//!
//! Every synthesized function lives in Julia's `Main`, so two Rust functions
//! called `add` must not both define `_jlext_add`. The registry of issued names
//! is shared by the whole process and only ever grows.

use crate::synth::map_name;
use hashbrown::{HashMap, HashSet};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Prefix of every generated name.
pub const PREFIX: &str = "_jlext_";

#[derive(Default)]
struct Registry {
    /// Next suffix to try, per base name.
    counters: HashMap<String, usize>,
    /// Every name handed out or reserved so far, with its batch helper.
    issued: HashSet<String>,
}

impl Registry {
    fn is_free(&self, name: &str) -> bool {
        !self.issued.contains(name) && !self.issued.contains(&map_name(name))
    }

    fn take(&mut self, name: &str) {
        self.issued.insert(map_name(name));
        self.issued.insert(name.to_string());
    }
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::default()));

/// Reserve the next free name for `base`.
///
/// The first reservation is `_jlext_{base}`, later ones `_jlext_{base}_1`,
/// `_jlext_{base}_2`, ... A candidate already issued for another base (the
/// second `fib` and the first `fib_1` would both be `_jlext_fib_1`) is skipped,
/// as is one whose batch helper name is taken.
pub fn unique_name(base: &str) -> String {
    let mut registry = REGISTRY.lock();
    let mut counter = registry.counters.get(base).copied().unwrap_or(0);
    let name = loop {
        let candidate = if counter == 0 {
            format!("{PREFIX}{base}")
        } else {
            format!("{PREFIX}{base}_{counter}")
        };
        counter += 1;
        if registry.is_free(&candidate) {
            break candidate;
        }
    };
    registry.counters.insert(base.to_string(), counter);
    registry.take(&name);
    name
}

/// Mark an author-chosen `name` and its batch helper as taken so generated
/// names avoid them.
pub fn reserve(name: &str) {
    REGISTRY.lock().take(name);
}
