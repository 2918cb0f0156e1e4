pub mod analysis;
pub mod config;
pub mod crawl;
pub mod report;
pub mod summary;
pub mod survey;
pub mod table;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
           _ _    _
 __      _(_) | _(_) __ _  __ _ _ __
 \ \ /\ / / | |/ / |/ _` |/ _` | '_ \
  \ V  V /| |   <| | (_| | (_| | |_) |
   \_/\_/ |_|_|\_\_|\__, |\__,_| .__/
                    |___/      |_|
"#;
    println!("{}", banner.cyan());
    println!(
        "  {} {}\n",
        "what the other editions are missing".dimmed(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}
