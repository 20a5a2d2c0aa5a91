//! Fields command implementation.

use crate::output::{self, Column};
use volley_schema::ClassKind;

const COLUMNS: [Column; 3] = [("FIELD", 32), ("DATATYPE", 32), ("DECODER", 0)];

pub fn run(
    class: String,
    foms: Vec<String>,
    object: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = super::load_resolver(&foms)?;
    let kind = if object {
        ClassKind::Object
    } else {
        ClassKind::Interaction
    };
    let definition = resolver
        .locator()
        .find(kind, &class)
        .map_err(|e| format!("Cannot find {} class {}: {}", kind.label(), class, e))?;

    if json {
        println!("{}", output::format_json(&definition));
        return Ok(());
    }

    println!("{} {} ({})", kind.label(), definition.name, definition.source_uri);
    output::print_table_header(&COLUMNS);
    for field in definition.fields() {
        let declared = field
            .declared_type()
            .map(str::to_string)
            .unwrap_or_else(|e| format!("<{}>", e));
        let decoder = match resolver.decoder_for_field(&definition, field.name()) {
            Ok(node) => node.type_name().to_string(),
            Err(e) => format!("unresolved: {}", e),
        };
        println!(
            "{}",
            output::format_table_row(&COLUMNS, &[field.name().to_string(), declared, decoder])
        );
    }
    Ok(())
}
