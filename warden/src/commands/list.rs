// warden/src/commands/list.rs
//
// USE CASE: Show the registered validators in report order.

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use warden_core::application::registry;

pub fn execute() -> anyhow::Result<()> {
    let validators = registry();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Validator", "Description"]);
    for (i, validator) in validators.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            validator.name().to_string(),
            validator.description().to_string(),
        ]);
    }

    println!("📋 {} validators registered:", validators.len());
    println!("{table}");
    Ok(())
}
