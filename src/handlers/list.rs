use crate::analyzer::kubescore::{Check, CheckRegistry};
use crate::error::Result;

/// Print every registered check as CSV, in registration order.
pub fn handle_list() -> Result<()> {
    let registry = CheckRegistry::with_builtin_checks()?;
    print!("{}", format_check_list(&registry));
    Ok(())
}

/// `id,target,comment,default|optional` per check.
pub fn format_check_list(registry: &CheckRegistry) -> String {
    registry.all_checks().map(csv_row).collect()
}

fn csv_row(check: &Check) -> String {
    let mode = if check.optional { "optional" } else { "default" };
    format!(
        "{},{},{},{}\n",
        csv_field(&check.id),
        csv_field(check.target.as_str()),
        csv_field(&check.comment),
        mode
    )
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
