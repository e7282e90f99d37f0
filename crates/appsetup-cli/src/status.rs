//! Installation status table.

use appsetup_core::InstallStatus;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

pub fn print_status(status: &InstallStatus) {
    println!("{}", status_table(status));
}

pub fn status_table(status: &InstallStatus) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![header_cell("Item"), header_cell("State")]);

    table.add_row(vec![Cell::new("Installed"), flag_cell(status.installed)]);
    table.add_row(vec![
        Cell::new("Install directory"),
        Cell::new(status.install_dir.display()),
    ]);
    table.add_row(vec![
        Cell::new("Version"),
        optional_cell(status.version.as_deref()),
    ]);
    let installed_at = status
        .installed_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());
    table.add_row(vec![
        Cell::new("Installed at"),
        optional_cell(installed_at.as_deref()),
    ]);
    table.add_row(vec![
        Cell::new("Launcher"),
        if status.desktop_file_present {
            Cell::new(status.desktop_file.display())
        } else {
            flag_cell(false)
        },
    ]);
    let icon = status
        .current_icon
        .as_ref()
        .map(|path| path.display().to_string());
    table.add_row(vec![Cell::new("Launcher icon"), optional_cell(icon.as_deref())]);
    for (label, present) in &status.icons {
        table.add_row(vec![Cell::new(label), flag_cell(*present)]);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
