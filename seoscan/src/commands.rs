use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("seoscan")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("seoscan")
        .about("Crawl a site through its sitemaps, score its on-page SEO and report the findings")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("analyze")
                .about(
                    "Analyze a site: discover pages from robots.txt, sitemaps and homepage \
                links, then score titles, headings, meta tags, images and more.",
                )
                .arg(
                    arg!([URL])
                        .required(false)
                        .help("The site to analyze (scheme optional, https assumed)")
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of sites to analyze")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("URL"),
                )
                .arg(
                    arg!(-m --"max-pages" <NUM>)
                        .required(false)
                        .help("Maximum number of pages to fetch per site")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-d --"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Pause between page requests (raised to robots.txt Crawl-delay)")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("500"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"headless")
                        .required(false)
                        .help("Render pages in a headless browser (needs the `headless` feature)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"skip-legal")
                        .required(false)
                        .help("Skip privacy, cookie and legal-notice pages")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"no-history")
                        .required(false)
                        .help("Do not record this analysis in the history database")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Directory holding the history database")
                        .default_value("~/.config/seoscan/"),
                ),
        )
        .subcommand(
            command!("history")
                .about("Show or manage previously analyzed sites")
                .subcommand_required(true)
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Directory holding the history database")
                        .default_value("~/.config/seoscan/")
                        .global(true),
                )
                .subcommand(
                    command!("list").about("List recent analyses").arg(
                        arg!(-n --"limit" <NUM>)
                            .required(false)
                            .help("Number of entries to show")
                            .value_parser(clap::value_parser!(usize))
                            .default_value("10"),
                    ),
                )
                .subcommand(command!("stats").about("Summary statistics over stored analyses"))
                .subcommand(
                    command!("clear").about("Delete all stored analyses").arg(
                        arg!(-f - -"force")
                            .help("Do not ask for confirmation")
                            .required(false),
                    ),
                ),
        )
}
