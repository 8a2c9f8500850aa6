//! Interactive criteria collection.
//!
//! Prompts mirror the command-line flags one to one, so interactive and
//! flag-driven runs build the exact same [`ScanCriteria`].

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use dialoguer::{Confirm, Input};

use crate::scanner::criteria::{CriteriaBuilder, ScanCriteria};

use super::parse_day_bound;

/// Everything a prompt session collects.
#[derive(Debug)]
pub struct PromptOutcome {
    pub root: PathBuf,
    pub criteria: ScanCriteria,
}

/// Walk the user through every filter parameter. Blank answers leave the
/// corresponding filter unset.
pub fn collect() -> Result<PromptOutcome> {
    let root: String = Input::new()
        .with_prompt("Folder to scan")
        .default(".".to_string())
        .interact_text()?;

    let extensions: String = Input::new()
        .with_prompt("File extensions, comma separated (e.g. txt,log)")
        .allow_empty(true)
        .interact_text()?;
    let mut builder = CriteriaBuilder::new().extensions(
        extensions
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty()),
    );

    let pattern: String = Input::new()
        .with_prompt("Name pattern (blank for none)")
        .allow_empty(true)
        .interact_text()?;
    if !pattern.trim().is_empty() {
        builder = builder.name_pattern(pattern.trim());
    }

    let search: String = Input::new()
        .with_prompt("Search term (blank for none)")
        .allow_empty(true)
        .interact_text()?;
    if !search.is_empty() {
        builder = builder.search_term(search);
    }

    let after: String = Input::new()
        .with_prompt("Modified on or after, YYYY-MM-DD (blank for none)")
        .allow_empty(true)
        .interact_text()?;
    if !after.trim().is_empty() {
        builder = builder.modified_after(parse_day_bound(&after, false)?);
    }

    let before: String = Input::new()
        .with_prompt("Modified on or before, YYYY-MM-DD (blank for none)")
        .allow_empty(true)
        .interact_text()?;
    if !before.trim().is_empty() {
        builder = builder.modified_before(parse_day_bound(&before, true)?);
    }

    if let Some(bytes) = prompt_size("Minimum file size in bytes (blank for none)")? {
        builder = builder.min_size(bytes);
    }
    if let Some(bytes) = prompt_size("Maximum file size in bytes (blank for none)")? {
        builder = builder.max_size(bytes);
    }

    let depth: String = Input::new()
        .with_prompt("Maximum depth, 0 = root only (blank for unlimited)")
        .allow_empty(true)
        .interact_text()?;
    if !depth.trim().is_empty() {
        let depth: usize = depth
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid depth `{}`: {}", depth, e))?;
        builder = builder.max_depth(depth);
    }

    builder = builder
        .writable_only(
            Confirm::new()
                .with_prompt("Writable files only?")
                .default(false)
                .interact()?,
        )
        .executable_only(
            Confirm::new()
                .with_prompt("Executable files only?")
                .default(false)
                .interact()?,
        );

    Ok(PromptOutcome {
        root: PathBuf::from(root.trim()),
        criteria: builder.build()?,
    })
}

fn prompt_size(prompt: &str) -> Result<Option<u64>> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    if answer.trim().is_empty() {
        return Ok(None);
    }
    answer
        .trim()
        .parse()
        .map(Some)
        .map_err(|e| anyhow!("invalid size `{}`: {}", answer, e))
}
