//! Configuration options for the Julia runtime.

use std::path::PathBuf;

/// Environment variable naming the Julia executable.
pub const JULIA_ENV: &str = "JLEXT_JULIA";

/// Environment variable naming the Julia project to activate.
pub const PROJECT_ENV: &str = "JLEXT_PROJECT";

/// Environment variable with extra whitespace-separated Julia arguments.
pub const ARGS_ENV: &str = "JLEXT_JULIA_ARGS";

/// Configuration options for a [`Runtime`](crate::Runtime).
///
/// # Example
///
/// ```
/// use jlext_core::RuntimeOptions;
///
/// let options = RuntimeOptions {
///     julia: "/opt/julia/bin/julia".into(),
///     extra_args: vec!["--threads=4".to_string()],
///     ..RuntimeOptions::default()
/// };
/// assert_eq!(options.eval_cache_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Path or name of the `julia` executable.
    ///
    /// Default: `julia`
    pub julia: PathBuf,

    /// Project directory passed as `--project=...`, if any.
    pub project: Option<PathBuf>,

    /// Additional command-line arguments for Julia.
    pub extra_args: Vec<String>,

    /// Number of `eval_cached` results kept.
    ///
    /// Default: 512
    pub eval_cache_capacity: usize,

    /// Number of resolved function handles kept for calls by name.
    ///
    /// Default: 256
    pub resolve_cache_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            julia: PathBuf::from("julia"),
            project: None,
            extra_args: Vec::new(),
            eval_cache_capacity: 512,
            resolve_cache_capacity: 256,
        }
    }
}

impl RuntimeOptions {
    /// Defaults overridden by `JLEXT_JULIA`, `JLEXT_PROJECT` and `JLEXT_JULIA_ARGS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(julia) = lookup(JULIA_ENV).filter(|v| !v.trim().is_empty()) {
            options.julia = PathBuf::from(julia);
        }
        if let Some(project) = lookup(PROJECT_ENV).filter(|v| !v.trim().is_empty()) {
            options.project = Some(PathBuf::from(project));
        }
        if let Some(args) = lookup(ARGS_ENV) {
            options.extra_args = args.split_whitespace().map(str::to_string).collect();
        }
        options
    }

    /// Full argument list for the Julia process, minus the driver script.
    pub(crate) fn julia_args(&self) -> Vec<String> {
        let mut args = vec![
            "--startup-file=no".to_string(),
            "--history-file=no".to_string(),
        ];
        if let Some(project) = &self.project {
            args.push(format!("--project={}", project.display()));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
