use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table as ConsoleTable};
use core_types::{Cell, Table};

/// Renders a table for the terminal, numbers right-aligned.
pub fn render(table: &Table) -> String {
    let mut out = ConsoleTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(table.columns.iter().map(String::as_str));

    for row in &table.rows {
        out.add_row(row.iter().map(|cell| {
            let rendered = comfy_table::Cell::new(cell);
            match cell {
                Cell::Integer(_) | Cell::Decimal(_) | Cell::Float(_) => {
                    rendered.set_alignment(CellAlignment::Right)
                }
                _ => rendered,
            }
        }));
    }
    format!("{}\n{out}", title(&table.name))
}

/// `regional_analysis` -> `Regional Analysis`.
fn title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
