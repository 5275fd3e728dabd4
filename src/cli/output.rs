//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::format_short_id;
use crate::cli::OutputFormat;
use crate::core::line::Line;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Row of the line table
#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "SEQ")]
    sequence: i64,
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "UNIT")]
    unit: String,
    #[tabled(rename = "FROM")]
    from: String,
    #[tabled(rename = "TO")]
    to: String,
    #[tabled(rename = "DEPTH")]
    depth: u32,
}

impl From<&Line> for LineRow {
    fn from(line: &Line) -> Self {
        Self {
            id: format_short_id(&line.id),
            sequence: line.sequence,
            product: line.product.to_string(),
            quantity: line.quantity.to_string(),
            unit: line.unit.to_string(),
            from: line.from_location.to_string(),
            to: line.to_location.to_string(),
            depth: line.kit_depth,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "id",
    "sequence",
    "product",
    "quantity",
    "unit",
    "from_location",
    "to_location",
    "kit_depth",
    "kit_parent_line",
];

fn csv_record(line: &Line) -> [String; 9] {
    [
        line.id.to_string(),
        line.sequence.to_string(),
        line.product.to_string(),
        line.quantity.to_string(),
        line.unit.to_string(),
        line.from_location.to_string(),
        line.to_location.to_string(),
        line.kit_depth.to_string(),
        line.kit_parent_line
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default(),
    ]
}

/// Render a list of lines in the requested format
pub fn render_lines(lines: &[Line], format: OutputFormat, pretty: bool) -> Result<String> {
    let out = match effective_format(format, true) {
        OutputFormat::Json => serde_json::to_string_pretty(lines).into_diagnostic()? + "\n",
        OutputFormat::Yaml => serde_yml::to_string(lines).into_diagnostic()?,
        OutputFormat::Id => lines.iter().map(|l| format!("{}\n", l.id)).collect(),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(CSV_HEADER).into_diagnostic()?;
            for line in lines {
                writer.write_record(csv_record(line)).into_diagnostic()?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| miette::miette!("{}", e.error()))?;
            String::from_utf8(bytes).into_diagnostic()?
        }
        OutputFormat::Tsv if pretty => {
            let rows: Vec<LineRow> = lines.iter().map(LineRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::psql());
            format!("{}\n", table)
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            let mut out = CSV_HEADER.join("\t");
            out.push('\n');
            for line in lines {
                out.push_str(&csv_record(line).join("\t"));
                out.push('\n');
            }
            out
        }
    };
    Ok(out)
}

/// Render one line in the requested format
pub fn render_line(line: &Line, format: OutputFormat) -> Result<String> {
    let out = match effective_format(format, false) {
        OutputFormat::Json => serde_json::to_string_pretty(line).into_diagnostic()? + "\n",
        OutputFormat::Id => format!("{}\n", line.id),
        OutputFormat::Tsv | OutputFormat::Csv => {
            return render_lines(std::slice::from_ref(line), format, false)
        }
        OutputFormat::Yaml | OutputFormat::Auto => serde_yml::to_string(line).into_diagnostic()?,
    };
    Ok(out)
}
