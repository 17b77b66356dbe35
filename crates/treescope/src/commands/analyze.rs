use std::fs::File;
use std::io::{self, Write};

use anyhow::{anyhow, Result};

use crate::analyzer::analyze_file;
use crate::formatter::{formatter_for, formatter_names};
use crate::AnalyzeArgs;

/// The main entry point for the `analyze` command.
pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let formatter = formatter_for(&args.format).ok_or_else(|| {
        anyhow!(
            "unknown format '{}'; expected one of: {}",
            args.format,
            formatter_names().join(", ")
        )
    })?;

    let result = analyze_file(&args.file, args.language.as_deref())?;
    let rendered = formatter.format(&result.elements);

    let mut writer: Box<dyn Write> = if let Some(output_path) = &args.output {
        Box::new(File::create(output_path)?)
    } else {
        Box::new(io::stdout())
    };
    writeln!(writer, "{rendered}")?;
    Ok(())
}
