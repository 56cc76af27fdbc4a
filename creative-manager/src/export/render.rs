//! The textual renderings of an [`ExportSnapshot`].
use chrono::{DateTime, Utc};
use primitives::{util::slug::slugify, CopyField, ExportSnapshot};

/// File name stem of the bundle: the slug of the ad name, or of `prefix` for unnamed ads.
pub fn base_name(snapshot: &ExportSnapshot, prefix: &str) -> String {
    [snapshot.brief.ad_name.as_str(), prefix]
        .into_iter()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| "creative".to_string())
}

pub fn archive_name(base: &str, exported_at: DateTime<Utc>) -> String {
    format!("{base}-{}.zip", exported_at.format("%Y%m%d-%H%M%S"))
}

/// The snapshot as pretty JSON, without the inline payloads.
pub fn snapshot_json(snapshot: &ExportSnapshot) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(&snapshot.without_inline_payloads())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub group: &'static str,
    pub field: String,
    pub value: String,
}

fn row(group: &'static str, field: impl Into<String>, value: impl Into<String>) -> Row {
    Row {
        group,
        field: field.into(),
        value: value.into(),
    }
}

/// Every exported field, grouped, in the order they are rendered.
pub fn rows(snapshot: &ExportSnapshot) -> Vec<Row> {
    let brief = &snapshot.brief;
    let copy = &snapshot.ad_copy;
    let mut rows = vec![
        row("Brief", "Ad name", &brief.ad_name),
        row("Brief", "Objective", brief.objective.to_string()),
        row("Brief", "Website", &brief.website_url),
        row("Brief", "Company overview", &brief.company_overview),
    ];

    if let Some(flight) = &brief.flight {
        rows.push(row("Brief", "Flight start", flight.start.to_string()));
        if let Some(end) = flight.end {
            rows.push(row("Brief", "Flight end", end.to_string()));
        }
    }

    rows.push(row("Identity", "Page URL", &brief.identity_url));
    rows.push(row("Identity", "Status", snapshot.identity.status()));
    if let Some(record) = snapshot.identity.record() {
        rows.push(row("Identity", "Name", &record.name));
        rows.push(row("Identity", "Source", record.source.to_string()));
    }

    for field in CopyField::ALL {
        let text = copy.field(field);
        let label = match field {
            CopyField::PrimaryText => "Primary text",
            CopyField::Headline => "Headline",
            CopyField::Description => "Description",
        };
        rows.push(row("Copy", label, text));
        rows.push(row(
            "Copy",
            format!("{label} length"),
            format!("{}/{}", text.chars().count(), field.limit()),
        ));
    }
    rows.extend([
        row("Copy", "Call to action", copy.call_to_action.to_string()),
        row("Copy", "Destination URL", &copy.destination_url),
        row("Copy", "Display link", &copy.display_link),
    ]);

    rows.extend(
        brief
            .utm
            .pairs()
            .into_iter()
            .map(|(param, value)| row("Tracking", param, value)),
    );
    rows.push(row("Tracking", "Tracked URL", &snapshot.tracked_url));

    for (role, asset) in brief.assets.iter() {
        let dimensions = asset
            .dimensions
            .map(|dimensions| format!(", {dimensions}"))
            .unwrap_or_default();
        rows.push(row(
            "Assets",
            role.to_string(),
            format!("{} ({}{dimensions})", asset.name, asset.mime),
        ));
    }

    if let Some(shared) = &snapshot.shared {
        rows.push(row("Share", "Public URL", shared.public_url.as_str()));
    }

    rows.extend(
        snapshot
            .copy_warnings
            .iter()
            .map(|warning| row("Warnings", warning.field.to_string(), warning.to_string())),
    );

    rows
}

/// `Section,Field,Value` rows, quoted as needed.
pub fn spreadsheet(snapshot: &ExportSnapshot) -> Vec<u8> {
    let mut csv = String::from("Section,Field,Value\r\n");

    for Row {
        group,
        field,
        value,
    } in rows(snapshot)
    {
        let line = [group, field.as_str(), value.as_str()]
            .into_iter()
            .map(csv_field)
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push_str("\r\n");
    }

    csv.into_bytes()
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// A plain-text summary to paste into an email.
pub fn summary(snapshot: &ExportSnapshot) -> String {
    let title = if snapshot.brief.ad_name.trim().is_empty() {
        "Untitled creative"
    } else {
        snapshot.brief.ad_name.trim()
    };
    let mut text = format!(
        "{title}\n{}\nExported {}\n",
        "=".repeat(title.chars().count()),
        snapshot.exported_at.format("%Y-%m-%d %H:%M UTC")
    );

    let mut current_group = "";
    for Row {
        group,
        field,
        value,
    } in rows(snapshot)
    {
        if group != current_group {
            text.push_str(&format!("\n[{group}]\n"));
            current_group = group;
        }
        text.push_str(&format!("{field}: {value}\n"));
    }

    text
}
