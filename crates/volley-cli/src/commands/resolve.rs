//! Resolve command implementation.

use crate::output;

pub fn run(type_name: String, foms: Vec<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = super::load_resolver(&foms)?;
    let node = resolver
        .resolve(&type_name)
        .map_err(|e| format!("Cannot resolve {}: {}", type_name, e))?;

    if json {
        println!("{}", output::format_json(&node));
    } else {
        print!("{}", node.render());
    }
    Ok(())
}
