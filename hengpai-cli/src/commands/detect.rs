//! Detect command implementation

use anyhow::{bail, Context, Result};
use hengpai_core::{detect_path, Verdict};
use serde::Serialize;
use std::path::Path;

/// Detection output
#[derive(Serialize)]
struct DetectionReport {
    path: String,
    #[serde(flatten)]
    verdict: Verdict,
}

/// Report whether an EPUB uses vertical layout
pub fn detect(input: &Path, json: bool) -> Result<()> {
    if !input.is_file() {
        bail!("File not found: {}", input.display());
    }

    let verdict =
        detect_path(input).with_context(|| format!("Failed to inspect {}", input.display()))?;

    let report = DetectionReport {
        path: input.display().to_string(),
        verdict,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File:             {}", report.path);
        println!("Vertical CSS:     {}", yes_no(verdict.has_vertical_css()));
        println!("RTL spine:        {}", yes_no(verdict.has_rtl_spine()));
        println!("Needs conversion: {}", yes_no(verdict.needs_conversion()));
    }

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
