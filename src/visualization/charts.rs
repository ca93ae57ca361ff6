use std::collections::BTreeMap;

use colored::Colorize;

use crate::analysis::basal_area;
use crate::models::CensusRow;

/// Format a text histogram of stems per diameter class, all species pooled.
pub fn format_class_histogram(rows: &[CensusRow], stand_area: f64) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Diameter Distribution".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let mut classes: BTreeMap<u32, u64> = BTreeMap::new();
    for row in rows {
        *classes.entry(row.diameter_class).or_insert(0) += row.stem_count;
    }

    if classes.is_empty() {
        output.push_str("  No data available.\n");
        return output;
    }

    let max_stems = classes.values().copied().max().unwrap_or(0);
    let bar_width = 40;

    output.push_str(&format!(
        "  {:>6}  {:>8}  {:>10}  Distribution\n",
        "Class", "Stems", "BA"
    ));
    output.push_str(&format!("  {}\n", "-".repeat(70)));

    for (&class, &stems) in &classes {
        let bar_len = if max_stems > 0 {
            ((stems as f64 / max_stems as f64) * bar_width as f64).round() as usize
        } else {
            0
        };
        let bar = "\u{2588}".repeat(bar_len);
        let ba = stems as f64 * basal_area(class, stand_area);

        output.push_str(&format!(
            "  {:>6}  {:>8}  {:>10.4}  {}\n",
            class,
            stems,
            ba,
            bar.green()
        ));
    }

    output.push('\n');
    output
}

/// Print a text histogram of stems per diameter class.
pub fn print_class_histogram(rows: &[CensusRow], stand_area: f64) {
    print!("{}", format_class_histogram(rows, stand_area));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_histogram_empty() {
        let output = format_class_histogram(&[], 400.0);
        assert!(output.contains("No data available."));
        assert!(output.contains("Diameter Distribution"));
    }

    #[test]
    fn test_format_histogram_pools_species() {
        let rows = vec![
            CensusRow::new("Pinus", 6, 10),
            CensusRow::new("Quercus", 6, 7),
            CensusRow::new("Quercus", 8, 3),
        ];
        let output = format_class_histogram(&rows, 400.0);
        assert!(output.contains("17"));
        assert!(output.contains("Stems"));
        assert!(output.contains('\u{2588}'));
    }

    #[test]
    fn test_format_histogram_all_zero() {
        let rows = vec![CensusRow::new("Pinus", 6, 0)];
        let output = format_class_histogram(&rows, 400.0);
        assert!(!output.contains('\u{2588}'));
    }
}
