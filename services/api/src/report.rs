use crate::infra::build_service;
use clap::Args;
use credlens::catalog::CardCatalog;
use credlens::config::AppConfig;
use credlens::domain::SpendProfile;
use credlens::error::AppError;
use credlens::format::{format_inr, format_rate};
use credlens::ranking::COMPARISON_SIZE;
use credlens::recommendation::{
    CardEvaluation, RecommendationReport, RecommendationRequest, RecommendationStatus,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

const CLI_SESSION: &str = "cli";

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Monthly income in rupees
    #[arg(long)]
    pub(crate) income: Decimal,
    /// Monthly online shopping spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) online: Decimal,
    /// Monthly travel spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) travel: Decimal,
    /// Monthly dining spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) dining: Decimal,
    /// Monthly utility bill spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) utilities: Decimal,
    /// Monthly UPI spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) upi: Decimal,
    /// Monthly offline / everything-else spend
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub(crate) offline: Decimal,
    /// Only consider cards with airport lounge access
    #[arg(long)]
    pub(crate) lounge: bool,
    /// Override the configured card catalog CSV
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Skip the advisory one-liner
    #[arg(long)]
    pub(crate) no_advisory: bool,
    /// Print the per-category reward breakdown for the winner
    #[arg(long)]
    pub(crate) breakdown: bool,
}

impl RecommendArgs {
    fn request(&self) -> RecommendationRequest {
        let spend = SpendProfile {
            online: self.online,
            travel: self.travel,
            dining: self.dining,
            utilities: self.utilities,
            upi: self.upi,
            offline: self.offline,
        };
        let mut request = RecommendationRequest::new(self.income, spend);
        request.require_lounge = self.lounge;
        request.include_advisory = !self.no_advisory;
        request.session_id = Some(CLI_SESSION.to_string());
        request
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct CardsArgs {
    /// Override the configured card catalog CSV
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(catalog) = args.catalog.clone() {
        config.catalog.path = catalog;
    }

    // A missing catalog here is a usage mistake, not a degraded service.
    CardCatalog::from_path(&config.catalog.path)?;

    let service = build_service(&config);
    let report = service.recommend(args.request()).await?;
    print!("{}", render_report(&report, args.breakdown));
    Ok(())
}

pub(crate) fn run_cards(args: CardsArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(catalog) = args.catalog {
        config.catalog.path = catalog;
    }

    let catalog = CardCatalog::from_path(&config.catalog.path)?;
    print!("{}", render_catalog(&catalog));
    Ok(())
}

pub(crate) fn render_report(report: &RecommendationReport, breakdown: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Profile: income {} | monthly spend {} | annual spend {}\n",
        format_inr(report.income),
        format_inr(report.monthly_spend),
        format_inr(report.annual_spend)
    ));
    if let Some(warning) = &report.catalog_warning {
        out.push_str(&format!("Catalog warning: {}\n", warning));
    }

    let winner = match (&report.status, &report.winner) {
        (RecommendationStatus::Recommended, Some(winner)) => winner,
        _ => {
            out.push_str("No eligible cards for this income and filter.\n");
            return out;
        }
    };

    out.push_str(&format!(
        "\nBest card: {} [{}]\n",
        winner.card.name, winner.verdict_label
    ));
    out.push_str(&format!(
        "- Net savings {} / yr (rewards {} - fee {})\n",
        format_inr(winner.net_savings()),
        format_inr(winner.yield_result.capped_reward),
        format_inr(winner.card.fee)
    ));
    if winner.yield_result.cap_applied {
        out.push_str(&format!(
            "- Reward cap hit: earned {} before the {} annual ceiling\n",
            format_inr(winner.yield_result.gross_reward),
            winner
                .card
                .annual_cap()
                .map(format_inr)
                .unwrap_or_else(|| "unbounded".to_string())
        ));
    }
    out.push_str(&break_even_line(winner));
    if let Some(warning) = &winner.card.details.warning_text {
        out.push_str(&format!("- Warning: {}\n", warning));
    }
    out.push_str(&format!(
        "- Pro: {} | Con: {}\n",
        winner.card.details.pro_reason, winner.card.details.con_reason
    ));

    if breakdown {
        out.push_str("\nReward breakdown:\n");
        for line in &winner.yield_result.breakdown {
            out.push_str(&format!(
                "  - {}: {} x {} = {}\n",
                line.category,
                format_inr(line.annual_spend),
                format_rate(line.rate),
                format_inr(line.reward)
            ));
        }
    }

    out.push_str("\nComparison:\n");
    for entry in report.comparison(COMPARISON_SIZE) {
        out.push_str(&format!(
            "  {}. {} | {} | {}\n",
            entry.rank,
            entry.card.name,
            format_inr(entry.net_savings()),
            entry.verdict_label
        ));
    }

    if let Some(advisory) = &report.advisory {
        out.push_str(&format!("\nAdvisor: {}\n", advisory));
    }

    out
}

fn break_even_line(winner: &CardEvaluation) -> String {
    let stats = &winner.break_even;
    if winner.card.fee.is_zero() {
        return "- Lifetime free: no fee to recover\n".to_string();
    }
    if !stats.is_reachable() {
        return format!(
            "- Fee never recovered at this spend ({:.0}% recovered)\n",
            stats.percent_recovered * Decimal::ONE_HUNDRED
        );
    }
    format!(
        "- Break-even spend {} / yr | {:.0}% of fee recovered\n",
        format_inr(stats.break_even_spend),
        stats.percent_recovered * Decimal::ONE_HUNDRED
    )
}

pub(crate) fn render_catalog(catalog: &CardCatalog) -> String {
    let mut out = format!("{} cards", catalog.len());
    if catalog.skipped_rows() > 0 {
        out.push_str(&format!(" ({} rows skipped)", catalog.skipped_rows()));
    }
    out.push('\n');

    for card in catalog.cards() {
        out.push_str(&format!(
            "- {} | fee {} | min income {} | {} | {}{}\n",
            card.name,
            format_inr(card.fee),
            format_inr(card.min_income),
            card.reward_type.label(),
            card.details.status.label(),
            if card.lounge_access { " | lounge" } else { "" }
        ));
    }
    out
}
