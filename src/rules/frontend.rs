// src/rules/frontend.rs
//! UI component checks: states, accessibility, images, responsiveness.
//!
//! Severity carries the front-end triage: P0 blocks (issue), P1 needs a look
//! (warning), P2 is a recommendation.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

use super::typing::ANY_RE;
use super::{check_unsanitized_html, Rule};

static LOADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)loading|isLoading|isPending").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static ERROR_STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error|isError").unwrap_or_else(|_| panic!("Invalid Regex")));
static ARIA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"aria-label|aria-labelledby").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static VISUAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<div|<main|<section|<header|<footer|className")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static RESPONSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(sm:|md:|lg:|xl:|2xl:|max-w-|min-w-|flex-wrap|grid-cols-)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Checks run by the front-end agent.
pub const FRONTEND_RULES: &[Rule] = &[
    Rule { id: "component-size", check: check_component_size },
    Rule { id: "component-any", check: check_component_any },
    Rule { id: "ui-states", check: check_ui_states },
    Rule { id: "button-aria", check: check_button_aria },
    Rule { id: "image-component", check: check_image_component },
    Rule { id: "unsanitized-html", check: check_unsanitized_html },
    Rule { id: "responsive-classes", check: check_responsive_classes },
];

/// Oversized components are a warning here, not a blocker.
fn check_component_size(file: &SourceFile, config: &RuleConfig) -> Vec<Violation> {
    let count = file.line_count();
    if count <= config.max_file_lines {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "file-too-long",
        Severity::P1,
        format!("Component has {count} lines (limit: {})", config.max_file_lines),
        "Split into child components or extract hooks",
    )]
}

fn check_component_any(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !ANY_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "typescript-any",
        Severity::P1,
        "\"any\" used in a component",
        "Prefer specific prop and state types",
    )]
}

/// Stateful components should render loading and error states.
fn check_ui_states(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.content.contains("useState") {
        return Vec::new();
    }
    let mut out = Vec::new();
    if !LOADING_RE.is_match(&file.content) {
        out.push(Violation::file_level(
            &file.path,
            "missing-loading-state",
            Severity::P2,
            "Stateful component without a loading state",
            "Render a loading indicator while data is pending",
        ));
    }
    if !ERROR_STATE_RE.is_match(&file.content) {
        out.push(Violation::file_level(
            &file.path,
            "missing-error-state",
            Severity::P2,
            "Stateful component without error handling",
            "Track and render an error state",
        ));
    }
    out
}

fn check_button_aria(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.content.contains("<button") || ARIA_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "accessibility",
        Severity::P1,
        "Buttons without aria-label",
        "Add aria-label or aria-labelledby to icon-only buttons",
    )]
}

fn check_image_component(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.content.contains("<img") || file.content.contains("next/image") {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "image-optimization",
        Severity::P2,
        "Plain <img> element used",
        "Use next/image for automatic optimization",
    )]
}

fn check_responsive_classes(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !VISUAL_RE.is_match(&file.content) || RESPONSIVE_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "responsiveness",
        Severity::P1,
        "Component has no responsive classes (sm:, md:, lg:, ...)",
        "Check the layout on mobile and add breakpoint classes",
    )]
}
