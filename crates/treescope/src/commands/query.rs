use anyhow::Result;

use crate::language::detect_language;
use crate::query_service::execute_query;
use crate::QueryArgs;

/// The main entry point for the `query` command.
pub fn run_query(args: QueryArgs) -> Result<()> {
    let language = match &args.language {
        Some(language) => language.clone(),
        None => detect_language(&args.file)?.to_string(),
    };

    let records = execute_query(
        &args.file,
        &language,
        args.key.as_deref(),
        args.query_string.as_deref(),
        args.filter.as_deref(),
    )?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
