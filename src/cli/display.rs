use chrono::{TimeZone, Utc};
use colored::*;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::docker::ImageRecord;

/// Render a list of images as a table, newest first.
pub fn print_images_table(images: &[ImageRecord]) {
    if images.is_empty() {
        println!("   {}", "(no images found)".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .set_header(vec![
            header_cell("Name"),
            header_cell("ID"),
            header_cell("Created"),
            header_cell("Size"),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for image in images {
        table.add_row(vec![
            Cell::new(&image.name).fg(comfy_table::Color::Green),
            Cell::new(&image.id)
                .fg(comfy_table::Color::Yellow)
                .set_alignment(CellAlignment::Center),
            Cell::new(format_created(image.created)).fg(comfy_table::Color::DarkGrey),
            Cell::new(format_size(image.size))
                .fg(comfy_table::Color::Blue)
                .set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
}

fn header_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn format_created(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0) {
        chrono::offset::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "-".to_string(),
    }
}

fn format_size(bytes: i64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_rendered_in_megabytes() {
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1536 * 1024), "1.5 MB");
    }

    #[test]
    fn timestamps_are_rendered_as_utc_dates() {
        assert_eq!(format_created(0), "1970-01-01 00:00:00");
    }
}
