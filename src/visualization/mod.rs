mod tables;
mod charts;

pub use tables::{
    format_census_table, print_census_table,
    format_dropped_table, print_dropped_table,
    format_ranges_table, print_ranges_table,
    format_stand_summary, print_stand_summary,
    format_transition_table, print_transition_table,
};
pub use charts::{format_class_histogram, print_class_histogram};
