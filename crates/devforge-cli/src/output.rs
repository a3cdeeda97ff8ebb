use devforge_core::types::Step;
use devforge_core::Project;
use serde::Serialize;

/// Activity entries shown under the step table.
const RECENT_ACTIVITY: usize = 5;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Fixed-width columns separated by two spaces. The last column is not
/// padded, so long error messages and idea text do not leave trailing blanks.
pub fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let widths: [usize; N] = std::array::from_fn(|col| {
        rows.iter()
            .map(|row| row[col].chars().count())
            .fold(headers[col].len(), usize::max)
    });
    let line = |cells: [&str; N]| -> String {
        let mut out = String::new();
        for (col, cell) in cells.iter().enumerate() {
            if col + 1 == N {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{cell:<w$}  ", w = widths[col]));
            }
        }
        out.trim_end().to_string()
    };

    let mut out = line(headers);
    out.push('\n');
    out.push_str(&line(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str)));
    for row in rows {
        out.push('\n');
        out.push_str(&line(row.each_ref().map(String::as_str)));
    }
    out
}

pub fn print_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) {
    println!("{}", render_table(headers, rows));
}

/// Step table plus the most recent activity.
pub fn print_project(project: &Project) {
    println!(
        "Project: {}   Step: {}   Revision: {}",
        project.id, project.current_step, project.revision
    );
    println!();

    let rows: Vec<[String; 4]> = Step::all()
        .iter()
        .map(|&step| {
            let state = project.steps.get(step);
            let marker = if step == project.current_step { ">" } else { "" };
            [
                marker.to_string(),
                step.to_string(),
                state.status.to_string(),
                state.error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(["", "STEP", "STATUS", "ERROR"], &rows);

    if let Some(deployment) = &project.deployment {
        println!();
        println!("Site: {}", deployment.site_url);
    }

    let recent: Vec<_> = project.activity.iter().rev().take(RECENT_ACTIVITY).collect();
    if !recent.is_empty() {
        println!();
        println!("RECENT ACTIVITY");
        for entry in recent.into_iter().rev() {
            println!(
                "  {} [{}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.level,
                entry.step,
                entry.message
            );
        }
    }
}

/// JSON or human rendering of an aggregate.
pub fn emit_project(project: &Project, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(project)
    } else {
        print_project(project);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_all_but_last_column() {
        let rows = [
            [">".to_string(), "idea".to_string(), "active".to_string()],
            [String::new(), "deploy".to_string(), "locked".to_string()],
        ];
        let table = render_table(["", "STEP", "STATUS"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "   STEP    STATUS");
        assert_eq!(lines[1], "-  ------  ------");
        assert_eq!(lines[2], ">  idea    active");
        assert_eq!(lines[3], "   deploy  locked");
    }

    #[test]
    fn empty_trailing_cell_leaves_no_blanks() {
        let rows = [["plan".to_string(), String::new()]];
        let table = render_table(["STEP", "ERROR"], &rows);
        assert_eq!(table.lines().nth(2), Some("plan"));
    }
}
