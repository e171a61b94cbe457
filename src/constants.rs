// src/constants.rs
//! Fixed vocabularies shared by the scanners, the validator and their callers.

/// Directory names never descended into during discovery.
pub const EXCLUDE_DIRS: &[&str] = &["node_modules", ".next", "dist", "build", ".git", ".agents"];

/// Extensions (without the dot) of files the auditors read.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Default line ceiling for a single source file.
pub const DEFAULT_MAX_FILE_LINES: usize = 500;

/// Canonical order in which an agent is expected to run its workflow steps.
pub const WORKFLOW_ORDER: &[&str] = &[
    "Consultar Memória",
    "Obter Recomendações",
    "Consultar Repositórios",
    "Aplicar Aprendizados",
    "Registrar Resultado",
];

/// Steps that should always appear as completed, whatever their `required` flag.
pub const CRITICAL_STEPS: &[&str] = &["Consultar Memória", "Registrar Resultado"];

/// Returns true if a directory with this name must be skipped.
#[must_use]
pub fn should_prune(name: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|d| d == name)
}
