// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_scan_config, history_db_path, load_urls_from_file, load_urls_from_source,
    parse_url_line, report_path_for,
};

// Re-export analysis functionality from seoscan-core
pub use seoscan_core::analysis::{AnalysisOptions, execute_analysis};
pub use seoscan_core::report::ReportFormat;
