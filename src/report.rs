use std::fmt::Write;

use crate::filter::{Criteria, Selection};
use crate::session::DashboardView;

fn describe_selection(selection: &Selection) -> String {
    match selection {
        Selection::All => "all".to_string(),
        Selection::Only(labels) if labels.is_empty() => "none".to_string(),
        Selection::Only(labels) => labels.iter().cloned().collect::<Vec<_>>().join(", "),
    }
}

fn describe_criteria(criteria: &Criteria) -> Vec<String> {
    let from = criteria
        .date_from
        .map_or_else(|| "start".to_string(), |d| d.to_string());
    let to = criteria
        .date_to
        .map_or_else(|| "end".to_string(), |d| d.to_string());

    vec![
        format!("Dates: {from} to {to}"),
        format!("Departments: {}", describe_selection(&criteria.departments)),
        format!("Statuses: {}", describe_selection(&criteria.statuses)),
        format!("Request types: {}", describe_selection(&criteria.types)),
        format!("Communities: {}", describe_selection(&criteria.communities)),
    ]
}

pub fn build_report(criteria: &Criteria, view: &DashboardView) -> String {
    let mut output = String::new();
    let kpis = &view.kpis;

    let _ = writeln!(output, "# Customer Service Requests Report");
    let _ = writeln!(
        output,
        "Filtered records: {} / {}",
        kpis.total, view.loaded_rows
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Filters");
    for line in describe_criteria(criteria) {
        let _ = writeln!(output, "- {line}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Metrics");
    let _ = writeln!(output, "- Total requests: {}", kpis.total);
    let _ = writeln!(
        output,
        "- Closed: {} ({:.1}%)",
        kpis.closed_count, kpis.closed_pct
    );
    let _ = writeln!(
        output,
        "- Open/other: {} ({:.1}%)",
        kpis.open_count, kpis.open_pct
    );
    let _ = writeln!(output, "- Request types: {}", kpis.distinct_types);
    let _ = writeln!(output, "- Departments: {}", kpis.distinct_departments);

    if kpis.total == 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "No requests match these filters.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Requests Over Time ({})", view.granularity);
    let _ = writeln!(output, "| Period start | Requests |");
    let _ = writeln!(output, "|---|---:|");
    for bucket in &view.time_series {
        let _ = writeln!(output, "| {} | {} |", bucket.start, bucket.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Departments");
    for department in &view.departments {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            department.label, department.count, department.pct
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Distribution");
    for status in &view.statuses {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            status.label, status.count, status.pct
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Request Types");
    for request_type in &view.types {
        let _ = writeln!(output, "- {}: {}", request_type.label, request_type.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Communities");
    for community in &view.communities {
        let _ = writeln!(output, "- {}: {}", community.label, community.count);
    }

    output
}
