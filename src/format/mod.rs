//! Output formatting for sale results (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::coordinator::TermStatus;
use crate::eshop::{EshopResults, Price, SwitchGame};

const TITLE_WIDTH: usize = 50;

/// Formats games for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a fetch result, ordered by nsuid.
    pub fn format_results(&self, results: &EshopResults) -> String {
        let games: Vec<&SwitchGame> = results.values().collect();
        self.format_games(&games)
    }

    /// Formats a list of games.
    pub fn format_games(&self, games: &[&SwitchGame]) -> String {
        if games.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No wishlist games on sale.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_games(games),
            OutputFormat::Table => self.table_games(games),
            OutputFormat::Markdown => self.markdown_games(games),
            OutputFormat::Csv => self.csv_games(games),
        }
    }

    /// Formats the on-sale state of every wishlist entry.
    pub fn format_statuses(&self, statuses: &[TermStatus]) -> String {
        match self.format {
            OutputFormat::Json => self.json_statuses(statuses),
            OutputFormat::Csv => self.csv_statuses(statuses),
            OutputFormat::Table | OutputFormat::Markdown => self.summary_statuses(statuses),
        }
    }

    // JSON formatting

    fn json_games(&self, games: &[&SwitchGame]) -> String {
        serde_json::to_string_pretty(games).unwrap_or_else(|_| "[]".to_string())
    }

    fn json_statuses(&self, statuses: &[TermStatus]) -> String {
        let value: Vec<serde_json::Value> = statuses
            .iter()
            .map(|s| {
                serde_json::json!({
                    "term": s.term,
                    "on_sale": s.is_on_sale(),
                    "matches": s.matches,
                })
            })
            .collect();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_games(&self, games: &[&SwitchGame]) -> String {
        let nsuid_width = 14;
        let price_width = 10;
        let off_width = 5;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<nsuid_width$}  {:>price_width$}  {:>price_width$}  {:>off_width$}  {}",
            "NSUID", "Normal", "Sale", "Off", "Title"
        ));
        lines.push(format!(
            "{:-<nsuid_width$}  {:-<price_width$}  {:-<price_width$}  {:-<off_width$}  {:-<TITLE_WIDTH$}",
            "", "", "", "", ""
        ));

        for game in games {
            lines.push(format!(
                "{:<nsuid_width$}  {:>price_width$}  {:>price_width$}  {:>off_width$}  {}",
                game.nsuid,
                price_cell(game.normal_price.as_ref()),
                price_cell(game.sale_price.as_ref()),
                format!("{}%", game.percent_off),
                truncate(&game.title, TITLE_WIDTH)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} games on sale", games.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_games(&self, games: &[&SwitchGame]) -> String {
        let mut lines = Vec::new();

        lines.push("| Title | Normal | Sale | Off | Box art |".to_string());
        lines.push("|-------|--------|------|-----|---------|".to_string());

        for game in games {
            lines.push(format!(
                "| {} | {} | {} | {}% | [image]({}) |",
                game.title.replace('|', "\\|"),
                price_cell(game.normal_price.as_ref()),
                price_cell(game.sale_price.as_ref()),
                game.percent_off,
                game.box_art_url
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} games on sale*", games.len()));

        lines.join("\n")
    }

    // Plain summary for watch mode

    fn summary_statuses(&self, statuses: &[TermStatus]) -> String {
        let mut lines = Vec::new();
        let on_sale = statuses.iter().filter(|s| s.is_on_sale()).count();
        lines.push(format!("{} of {} wishlist entries on sale", on_sale, statuses.len()));

        for status in statuses {
            if status.matches.is_empty() {
                lines.push(format!("  {}: not on sale", status.term));
                continue;
            }
            lines.push(format!("  {}:", status.term));
            for game in &status.matches {
                let sale = match &game.sale_price {
                    Some(price) => format!(" ({})", price),
                    None => String::new(),
                };
                lines.push(format!("    {} -{}%{}", game.title, game.percent_off, sale));
            }
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "nsuid,title,normal_price,sale_price,percent_off,box_art_url".to_string()
    }

    fn csv_games(&self, games: &[&SwitchGame]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for game in games {
            lines.push(format!(
                "{},{},{},{},{},{}",
                game.nsuid,
                Self::csv_escape(&game.title),
                game.normal_price.as_ref().map(|p| Self::csv_escape(&p.to_string())).unwrap_or_default(),
                game.sale_price.as_ref().map(|p| Self::csv_escape(&p.to_string())).unwrap_or_default(),
                game.percent_off,
                game.box_art_url
            ));
        }

        lines.join("\n")
    }

    fn csv_statuses(&self, statuses: &[TermStatus]) -> String {
        let mut lines = vec!["term,on_sale,matches".to_string()];
        for status in statuses {
            let titles: Vec<&str> = status.matches.iter().map(|g| g.title.as_str()).collect();
            lines.push(format!(
                "{},{},{}",
                Self::csv_escape(&status.term),
                status.is_on_sale(),
                Self::csv_escape(&titles.join("; "))
            ));
        }
        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn price_cell(price: Option<&Price>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() > width {
        let head: String = title.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
