use comfy_table::{Attribute, Cell, Color, Row, Table};
use diary_core::models::{Calendar, Color as ScheduleColor, Granularity, OccurrenceDto};

fn cell_color(color: ScheduleColor) -> Color {
    match color {
        ScheduleColor::Red => Color::Red,
        ScheduleColor::Orange => Color::DarkYellow,
        ScheduleColor::Yellow => Color::Yellow,
        ScheduleColor::Green => Color::Green,
        ScheduleColor::Blue => Color::Blue,
        ScheduleColor::Navy => Color::DarkBlue,
        ScheduleColor::Purple => Color::Magenta,
        ScheduleColor::Gray => Color::Grey,
    }
}

pub fn display_occurrences(occurrences: &[OccurrenceDto], granularity: Granularity) {
    if occurrences.is_empty() {
        println!("No schedules found.");
        return;
    }

    let detailed = granularity == Granularity::Day;
    let mut table = Table::new();
    let mut header = vec!["Date", "Time", "Title"];
    if detailed {
        header.extend(["Location", "Notes", "ID"]);
    }
    table.set_header(header);

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(occurrence.start.format("%Y-%m-%d")));
        row.add_cell(Cell::new(format!(
            "{}-{}",
            occurrence.start.format("%H:%M"),
            occurrence.end.format("%H:%M")
        )));

        let mut title = String::new();
        if occurrence.is_repeat_instance {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&occurrence.title);
        row.add_cell(Cell::new(title).fg(cell_color(occurrence.color)).add_attribute(Attribute::Bold));

        if detailed {
            row.add_cell(Cell::new(occurrence.location.as_deref().unwrap_or("")));
            row.add_cell(Cell::new(occurrence.content.as_deref().unwrap_or("")));
            row.add_cell(Cell::new(occurrence.id.map(|id| id.to_string()).unwrap_or_default()).fg(Color::DarkGrey));
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_calendars(calendars: &[Calendar]) {
    if calendars.is_empty() {
        println!("No calendars found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Created"]);
    for calendar in calendars {
        table.add_row(vec![
            Cell::new(calendar.id),
            Cell::new(&calendar.name),
            Cell::new(calendar.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
}
