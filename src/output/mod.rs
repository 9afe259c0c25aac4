pub mod formatter;

pub use formatter::{
    format_benchmark_report, format_classification_table, format_compact, format_monitoring_report,
    format_quality_report, format_test_report, format_tier, format_tsv, should_use_colors,
};
