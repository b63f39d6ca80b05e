use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::output::{banner, preview};
use crate::ai::analyst::{
    FundamentalData, StockQuote, StrategyRequest, TechnicalData, TradingAnalyst,
};
use crate::ai::news::{NewsAnalyst, NewsItem};
use crate::chat::ChatClient;
use crate::core::AppConfig;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisKind {
    Technical,
    Fundamental,
    Comprehensive,
    Compare,
    Strategy,
    News,
}

#[derive(Debug, Deserialize)]
struct StockInput<T> {
    code: String,
    name: String,
    #[serde(default)]
    data: T,
}

#[derive(Debug, Deserialize)]
struct ComprehensiveInput {
    code: String,
    name: String,
    #[serde(default)]
    technical: TechnicalData,
    #[serde(default)]
    fundamental: FundamentalData,
}

#[derive(Debug, Deserialize)]
struct CompareInput {
    stocks: Vec<StockQuote>,
}

#[derive(Debug, Deserialize)]
struct NewsInput {
    code: String,
    name: String,
    news: Vec<NewsItem>,
}

fn parse_input<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).context("Invalid analysis input")
}

pub async fn run(config: &AppConfig, kind: AnalysisKind, input: &Path) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read file: {}", input.display()))?;

    match kind {
        AnalysisKind::Technical => {
            let input: StockInput<TechnicalData> = parse_input(&raw)?;
            let mut analyst = TradingAnalyst::new(ChatClient::from_config(config));
            let result = analyst
                .analyze_technical(&input.code, &input.name, &input.data)
                .await?;
            banner(&format!("Technical analysis: {} {}", input.code, input.name));
            println!("{}", result);
        }
        AnalysisKind::Fundamental => {
            let input: StockInput<FundamentalData> = parse_input(&raw)?;
            let mut analyst = TradingAnalyst::new(ChatClient::from_config(config));
            let result = analyst
                .analyze_fundamental(&input.code, &input.name, &input.data)
                .await?;
            banner(&format!("Fundamental analysis: {} {}", input.code, input.name));
            println!("{}", result);
        }
        AnalysisKind::Comprehensive => {
            let input: ComprehensiveInput = parse_input(&raw)?;
            let mut analyst = TradingAnalyst::new(ChatClient::from_config(config));
            let report = analyst
                .comprehensive_analysis(
                    &input.code,
                    &input.name,
                    &input.technical,
                    &input.fundamental,
                )
                .await?;
            banner(&format!("Technical analysis: {} {}", input.code, input.name));
            println!("{}", report.technical_analysis);
            banner("Fundamental analysis");
            println!("{}", report.fundamental_analysis);
            banner("Recommendation");
            println!("{}", report.synthesis);
            println!("\nGenerated at {}", report.timestamp);
        }
        AnalysisKind::Compare => {
            let input: CompareInput = parse_input(&raw)?;
            if input.stocks.is_empty() {
                anyhow::bail!("No stocks to compare");
            }
            let mut analyst = TradingAnalyst::new(ChatClient::from_config(config));
            let result = analyst.compare_stocks(&input.stocks).await?;
            banner(&format!("Comparing {} stocks", input.stocks.len()));
            println!("{}", result);
        }
        AnalysisKind::Strategy => {
            let input: StrategyRequest = parse_input(&raw)?;
            let mut analyst = TradingAnalyst::new(ChatClient::from_config(config));
            let result = analyst.generate_trading_strategy(&input).await?;
            banner("Trading strategy");
            println!("{}", result);
        }
        AnalysisKind::News => {
            let input: NewsInput = parse_input(&raw)?;
            let mut analyst = NewsAnalyst::new(ChatClient::from_config(config));
            let reports = analyst
                .batch_analyze_news_with_progress(
                    &input.news,
                    &input.code,
                    &input.name,
                    |i, n, item| {
                        println!(
                            "[{}/{}] Analyzing news: {}",
                            i,
                            n,
                            preview(&item.title, 30)
                        )
                    },
                )
                .await?;
            for (i, report) in reports.iter().enumerate() {
                banner(&format!("News {}: {}", i + 1, report.news.title));
                println!("{}", report.analysis.analysis);
            }
        }
    }

    Ok(())
}
