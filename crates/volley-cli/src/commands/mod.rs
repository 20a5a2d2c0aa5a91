pub mod fields;
pub mod inspect;
pub mod record;
pub mod resolve;
pub mod run;

use volley_capture::ReadMode;
use volley_schema::{SchemaSource, TypeResolver, XmlSchemaSource};

/// Loads FOM modules in the order given.
fn load_resolver(foms: &[String]) -> Result<TypeResolver, Box<dyn std::error::Error>> {
    let uris: Vec<&str> = foms.iter().map(String::as_str).collect();
    let documents = XmlSchemaSource
        .load(&uris)
        .map_err(|e| format!("Failed to load FOM modules: {}", e))?;
    Ok(TypeResolver::new(documents))
}

fn read_mode(permissive: bool) -> ReadMode {
    if permissive {
        ReadMode::Permissive
    } else {
        ReadMode::Strict
    }
}
