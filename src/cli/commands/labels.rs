//! Taxonomy listing command.

use console::style;

use papermark::config::Config;
use papermark::labels::NONE_CATEGORY;

pub fn cmd_labels(config: &Config) -> anyhow::Result<()> {
    let taxonomy = &config.taxonomy;

    println!("{}", style("Categories").bold());
    for category in &taxonomy.categories {
        println!(
            "  {} {:<14} {}",
            style(category.color.to_hex()).dim(),
            category.key,
            category.description
        );
    }
    println!(
        "  {} {:<14} {} (not highlighted)",
        style("-------").dim(),
        NONE_CATEGORY,
        taxonomy.none_description
    );
    println!();
    println!(
        "{} Unknown categories use {}",
        style("→").dim(),
        taxonomy.default_color.to_hex()
    );
    Ok(())
}
