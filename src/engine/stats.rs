use prettytable::{Cell, Row, Table};

use crate::engine::RefinementStats;

/// Renders refinement counters as a human-readable table, for diagnosing why
/// a puzzle needed many iterations.
pub fn render_stats_table(stats: &RefinementStats) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Metric"),
        Cell::new("Count"),
    ]));

    let rows: [(&str, u64); 4] = [
        ("Solver calls", stats.solver_calls),
        ("Refinement iterations", stats.iterations),
        ("Counterexample shapes", stats.counterexamples),
        ("Blocking constraints added", stats.constraints_added),
    ];
    for (label, count) in rows {
        table.add_row(Row::new(vec![
            Cell::new(label),
            Cell::new(&count.to_string()),
        ]));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_counter() {
        let stats = RefinementStats {
            solver_calls: 3,
            iterations: 2,
            counterexamples: 5,
            constraints_added: 5,
        };
        let rendered = render_stats_table(&stats);
        assert!(rendered.contains("Solver calls"));
        assert!(rendered.contains("Counterexample shapes"));
        assert!(rendered.contains('5'));
    }
}
