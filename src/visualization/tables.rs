use std::collections::BTreeSet;

use colored::Colorize;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement,
    Table,
};
use indexmap::IndexMap;

use crate::analysis::{DiameterRange, DroppedRecord, SpeciesOutcome, StandSummary, TransitionResult};
use crate::models::CensusRow;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn heading(title: &str, width: usize) -> String {
    format!("\n{}\n{}\n", title.bold().green(), "=".repeat(width))
}

/// Format the diameter class ranges as a string.
pub fn format_ranges_table(ranges: &[DiameterRange]) -> String {
    let mut output = heading("Diameter Classes", 40);

    let mut table = new_table();
    table.set_header(vec!["Class", "Lower (incl.)", "Upper (excl.)"]);
    for range in ranges {
        table.add_row(vec![
            Cell::new(range.label),
            Cell::new(format!("{:.1}", range.min)),
            Cell::new(format!("{:.1}", range.max)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the diameter class ranges.
pub fn print_ranges_table(ranges: &[DiameterRange]) {
    print!("{}", format_ranges_table(ranges));
}

/// Format a census as a species by diameter-class matrix of stem counts.
pub fn format_census_table(title: &str, rows: &[CensusRow]) -> String {
    let mut output = heading(title, 60);

    if rows.is_empty() {
        output.push_str("  No data available.\n");
        return output;
    }

    let classes: BTreeSet<u32> = rows.iter().map(|r| r.diameter_class).collect();
    let mut matrix: IndexMap<&str, Vec<u64>> = IndexMap::new();
    for row in rows {
        let counts = matrix
            .entry(row.species.as_str())
            .or_insert_with(|| vec![0; classes.len()]);
        if let Some(pos) = classes.iter().position(|c| *c == row.diameter_class) {
            counts[pos] += row.stem_count;
        }
    }

    let mut header = vec!["Species".to_string()];
    header.extend(classes.iter().map(|c| c.to_string()));
    header.push("Total".to_string());

    let mut table = new_table();
    table.set_header(header);
    for (species, counts) in &matrix {
        let mut cells = vec![Cell::new(species)];
        cells.extend(
            counts
                .iter()
                .map(|n| Cell::new(n).set_alignment(CellAlignment::Right)),
        );
        cells.push(
            Cell::new(counts.iter().sum::<u64>()).set_alignment(CellAlignment::Right),
        );
        table.add_row(cells);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print a census matrix.
pub fn print_census_table(title: &str, rows: &[CensusRow]) {
    print!("{}", format_census_table(title, rows));
}

/// Format the records left out of a classification.
pub fn format_dropped_table(dropped: &[DroppedRecord]) -> String {
    let mut output = heading("Unclassified Records", 50);
    output.push_str(&format!(
        "{}\n",
        format!("{} record(s) fell outside every class", dropped.len()).dimmed()
    ));

    let mut table = new_table();
    table.set_header(vec!["Row", "Species", "DBH", "Reason"]);
    for record in dropped {
        table.add_row(vec![
            Cell::new(record.index + 1),
            Cell::new(&record.species),
            Cell::new(format!("{:.1}", record.dbh)),
            Cell::new(record.reason.to_string()),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the records left out of a classification.
pub fn print_dropped_table(dropped: &[DroppedRecord]) {
    print!("{}", format_dropped_table(dropped));
}

/// Format stand covariates and their species / class breakdown.
pub fn format_stand_summary(summary: &StandSummary) -> String {
    let mut output = heading("Stand Summary", 50);

    let mut table = new_table();
    table.set_header(vec!["Metric", "Value", "Unit"]);
    let metrics = [
        ("Stand Area", format!("{:.1}", summary.stand_area), "m²"),
        ("Stems", summary.total_stems.to_string(), ""),
        (
            "Stems per Hectare",
            format!("{:.1}", summary.stems_per_hectare),
            "stems/ha",
        ),
        (
            "Basal Area",
            format!("{:.4}", summary.covariates.total_basal_area),
            "per m² of stand",
        ),
        (
            "Species Diversity (H1)",
            format!("{:.4}", summary.covariates.species_diversity),
            "",
        ),
        (
            "Diameter Diversity (H2)",
            format!("{:.4}", summary.covariates.diameter_diversity),
            "",
        ),
    ];
    for (name, value, unit) in metrics {
        table.add_row(vec![Cell::new(name), Cell::new(value), Cell::new(unit)]);
    }
    output.push_str(&format!("{table}"));

    output.push_str(&heading("Species Composition", 50));
    let mut species = new_table();
    species.set_header(vec!["Species", "Stems", "Basal Area", "% BA"]);
    for sp in &summary.species {
        species.add_row(vec![
            Cell::new(&sp.species),
            Cell::new(sp.stems),
            Cell::new(format!("{:.4}", sp.basal_area)),
            Cell::new(format!("{:.1}%", sp.percent_basal_area)),
        ]);
    }
    output.push_str(&format!("{species}"));

    output.push_str(&heading("Diameter Classes", 50));
    let mut classes = new_table();
    classes.set_header(vec!["Class", "Stems", "Basal Area", "% BA"]);
    for class in &summary.classes {
        classes.add_row(vec![
            Cell::new(class.diameter_class),
            Cell::new(class.stems),
            Cell::new(format!("{:.4}", class.basal_area)),
            Cell::new(format!("{:.1}%", class.percent_basal_area)),
        ]);
    }
    output.push_str(&format!("{classes}"));
    output
}

/// Print stand covariates and their breakdown.
pub fn print_stand_summary(summary: &StandSummary) {
    print!("{}", format_stand_summary(summary));
}

/// Format the per-species outcome of a transition step.
pub fn format_transition_table(result: &TransitionResult) -> String {
    let mut output = heading("Transition Step", 70);
    output.push_str(&format!(
        "{}\n",
        format!(
            "H1 = {:.4} | H2 = {:.4} | B = {:.4}",
            result.covariates.species_diversity,
            result.covariates.diameter_diversity,
            result.covariates.total_basal_area
        )
        .dimmed()
    ));

    let mut table = new_table();
    table.set_header(vec![
        "Species",
        "Status",
        "Stock/ha",
        "Recruits",
        "Stems Next",
        "Carry",
        "Clamped",
    ]);

    for outcome in &result.outcomes {
        match outcome {
            SpeciesOutcome::Projected(p) => {
                table.add_row(vec![
                    Cell::new(&p.species),
                    Cell::new("projected"),
                    Cell::new(format!("{:.1}", p.stock_per_hectare)),
                    Cell::new(format!("{:.2}", p.recruitment)),
                    Cell::new(format!("{:.0}", p.rounded_total)),
                    Cell::new(format!("{:+.3}", p.residual_carry)),
                    Cell::new(p.clamped_survival_classes),
                ]);
            }
            SpeciesOutcome::Diverged { species, .. } => {
                table.add_row(vec![
                    Cell::new(species),
                    Cell::new("diverged (held)"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
            SpeciesOutcome::Skipped { species, missing } => {
                table.add_row(vec![
                    Cell::new(species),
                    Cell::new(format!("skipped (no {missing})")),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the per-species outcome of a transition step.
pub fn print_transition_table(result: &TransitionResult) {
    print!("{}", format_transition_table(result));
}
