//! Pipe tables.

/// Convert runs of pipe-bounded lines into `<table>` elements.
///
/// The first line of a run is the header, the second (separator) is
/// discarded, the rest are body rows. Runs shorter than two lines are left
/// as text.
pub(super) fn convert_tables(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut idx = 0;

    while idx < lines.len() {
        let run = lines[idx..]
            .iter()
            .take_while(|line| is_table_line(line))
            .count();

        if run >= 2 {
            out.push(render_table(&lines[idx..idx + run]));
            idx += run;
        } else {
            out.push(lines[idx].to_owned());
            idx += 1;
        }
    }

    out.join("\n")
}

fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// Split a table line into trimmed cells.
fn cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn render_table(rows: &[&str]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for cell in cells(rows[0]) {
        html.push_str("<th>");
        html.push_str(cell);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead>");

    let body = &rows[2..];
    if !body.is_empty() {
        html.push_str("<tbody>");
        for row in body {
            html.push_str("<tr>");
            for cell in cells(row) {
                html.push_str("<td>");
                html.push_str(cell);
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");
    }

    html.push_str("</table>");
    html
}
