pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod history;
pub mod report;
pub mod score;

pub use aggregate::{AnalysisResult, PageDetail, overall_score};
pub use analysis::{AnalysisOptions, execute_analysis};
pub use error::CoreError;
pub use history::{HistoryEntry, HistoryStats, HistoryStore};
pub use report::ReportFormat;
pub use score::{Category, CategoryResult};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
  ___  ___  ___  ___  ___ __ _ _ __
 / __|/ _ \/ _ \/ __|/ __/ _` | '_ \
 \__ \  __/ (_) \__ \ (_| (_| | | | |
 |___/\___|\___/|___/\___\__,_|_| |_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "sitemap-aware on-page SEO auditor".dimmed(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
