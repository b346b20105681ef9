pub mod analyze;
pub mod ask;
pub mod benchmark;
pub mod compare;
pub mod info;
pub mod onboard;
pub mod runtime;

/// Pretty-print a result as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
