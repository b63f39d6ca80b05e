//! Stock analysis on top of the chat client. Each analysis renders a
//! prompt from structured market data and asks the model with a fixed
//! analyst persona and a low temperature so the answers stay
//! consistent between runs.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use super::prompt::{Prompt, render, templates};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::Result;

const ANALYST_SYSTEM_PROMPT: &str = r#"You are a professional stock analyst with the following strengths:

1. Technical analysis: fluent in indicators such as MA, MACD, RSI and BOLL
2. Fundamental analysis: reads financial statements, industry trends and company fundamentals
3. Risk management: takes risk control seriously and gives sensible stop-loss advice
4. Objectivity: works from the data without undue optimism or pessimism
5. Clear, concise and professional language

When analyzing:
- Cover the technical picture first, then the fundamentals
- Name the support and resistance levels
- Give a concrete recommendation (buy / hold / sell)
- Call out risks and caveats
- Stay objective and avoid absolute statements"#;

/// Figures are optional since data feeds are often incomplete. Missing
/// ones show up as `N/A` in the prompt.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalData {
    pub price: Option<f64>,
    pub change_pct: Option<f64>,
    pub volume: Option<String>,
    pub turnover_rate: Option<f64>,
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub macd: Option<String>,
    pub rsi: Option<f64>,
    pub kdj: Option<String>,
    pub boll: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalData {
    pub industry: Option<String>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub revenue: Option<f64>,
    pub net_profit: Option<f64>,
    pub profit_growth: Option<f64>,
    pub roe: Option<f64>,
    pub debt_ratio: Option<f64>,
    pub operating_cashflow: Option<f64>,
    pub free_cashflow: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StockQuote {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_pct: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub pb_ratio: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyRequest {
    /// e.g. bull, bear or sideways
    pub market_condition: String,
    /// e.g. conservative, balanced or aggressive
    pub risk_preference: String,
    /// In units of 10K CNY
    pub capital: f64,
    /// e.g. short, medium or long term
    pub holding_period: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub technical_analysis: String,
    pub fundamental_analysis: String,
    pub synthesis: String,
    pub timestamp: String,
}

#[derive(Serialize)]
struct StockContext<'a, T: Serialize> {
    code: &'a str,
    name: &'a str,
    data: &'a T,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    technical: &'a str,
    fundamental: &'a str,
}

#[derive(Serialize)]
struct CompareContext<'a> {
    stocks: &'a [StockQuote],
}

pub struct TradingAnalyst {
    client: ChatClient,
    templates: Handlebars<'static>,
}

impl TradingAnalyst {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            templates: templates(),
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    async fn ask(
        &mut self,
        prompt: Prompt,
        data: &impl Serialize,
        opts: RequestOptions,
    ) -> Result<String> {
        let message = render(&self.templates, prompt, data)?;
        tracing::debug!("Running {} analysis", prompt);
        self.client
            .chat_with(&message, Some(ANALYST_SYSTEM_PROMPT), &opts)
            .await
    }

    pub async fn analyze_technical(
        &mut self,
        code: &str,
        name: &str,
        data: &TechnicalData,
    ) -> Result<String> {
        let ctx = StockContext { code, name, data };
        self.ask(Prompt::TechnicalAnalysis, &ctx, RequestOptions::new(2000, 0.3))
            .await
    }

    pub async fn analyze_fundamental(
        &mut self,
        code: &str,
        name: &str,
        data: &FundamentalData,
    ) -> Result<String> {
        let ctx = StockContext { code, name, data };
        self.ask(Prompt::FundamentalAnalysis, &ctx, RequestOptions::new(2000, 0.3))
            .await
    }

    /// Technical and fundamental analysis followed by a synthesis of
    /// the two. Three requests, run in order since the last one needs
    /// both answers.
    pub async fn comprehensive_analysis(
        &mut self,
        code: &str,
        name: &str,
        technical: &TechnicalData,
        fundamental: &FundamentalData,
    ) -> Result<ComprehensiveReport> {
        let technical_analysis = self.analyze_technical(code, name, technical).await?;
        let fundamental_analysis = self.analyze_fundamental(code, name, fundamental).await?;

        let ctx = SynthesisContext {
            technical: &technical_analysis,
            fundamental: &fundamental_analysis,
        };
        let synthesis = self
            .ask(Prompt::Synthesis, &ctx, RequestOptions::new(1500, 0.3))
            .await?;

        Ok(ComprehensiveReport {
            technical_analysis,
            fundamental_analysis,
            synthesis,
            timestamp: chrono::Local::now().to_rfc3339(),
        })
    }

    pub async fn compare_stocks(&mut self, stocks: &[StockQuote]) -> Result<String> {
        self.ask(
            Prompt::CompareStocks,
            &CompareContext { stocks },
            RequestOptions::new(2500, 0.3),
        )
        .await
    }

    pub async fn generate_trading_strategy(&mut self, request: &StrategyRequest) -> Result<String> {
        self.ask(Prompt::TradingStrategy, request, RequestOptions::new(2500, 0.5))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::backend::testing::FakeBackend;
    use crate::core::AppConfig;
    use crate::openai::Role;

    fn analyst(backend: &FakeBackend) -> TradingAnalyst {
        let config = AppConfig::new("test-key", "http://localhost/v1");
        TradingAnalyst::new(ChatClient::new(Box::new(backend.clone()), &config))
    }

    #[test]
    fn test_technical_data_from_partial_json() {
        let data: TechnicalData =
            serde_json::from_str(r#"{"price": 1680.5, "volume": "1.2M"}"#).unwrap();
        assert_eq!(data.price, Some(1680.5));
        assert_eq!(data.volume.as_deref(), Some("1.2M"));
        assert!(data.rsi.is_none());
    }

    #[tokio::test]
    async fn test_analyze_technical_request() {
        let backend = FakeBackend::new(&["Uptrend."]);
        let mut analyst = analyst(&backend);

        let data = TechnicalData {
            price: Some(1680.5),
            ma5: Some(1675.2),
            ..Default::default()
        };
        let reply = analyst
            .analyze_technical("600519", "Kweichow Moutai", &data)
            .await
            .unwrap();
        assert_eq!(reply, "Uptrend.");

        let request = &backend.requests()[0];
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, ANALYST_SYSTEM_PROMPT);
        let prompt = &request.messages[1].content;
        assert!(prompt.contains("Code: 600519"));
        assert!(prompt.contains("Price: 1680.5"));
        assert!(prompt.contains("MA5: 1675.2"));
        assert!(prompt.contains("MA60: N/A"));
    }

    #[tokio::test]
    async fn test_comprehensive_analysis_feeds_synthesis() {
        let backend = FakeBackend::new(&["TECH", "FUND", "BUY"]);
        let mut analyst = analyst(&backend);

        let report = analyst
            .comprehensive_analysis(
                "600519",
                "Kweichow Moutai",
                &TechnicalData::default(),
                &FundamentalData::default(),
            )
            .await
            .unwrap();

        assert_eq!(report.technical_analysis, "TECH");
        assert_eq!(report.fundamental_analysis, "FUND");
        assert_eq!(report.synthesis, "BUY");
        assert!(!report.timestamp.is_empty());

        let requests = backend.requests();
        assert_eq!(requests.len(), 3);
        let synthesis_prompt = &requests[2].messages[1].content;
        assert!(synthesis_prompt.contains("[Technical analysis]\nTECH"));
        assert!(synthesis_prompt.contains("[Fundamental analysis]\nFUND"));
        assert_eq!(requests[2].max_tokens, 1500);
        assert_eq!(analyst.client().stats().total_requests, 3);
    }

    #[tokio::test]
    async fn test_comprehensive_analysis_stops_on_error() {
        let backend = FakeBackend::new(&["TECH"]);
        let mut analyst = analyst(&backend);

        let result = analyst
            .comprehensive_analysis(
                "600519",
                "Kweichow Moutai",
                &TechnicalData::default(),
                &FundamentalData::default(),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_strategy_uses_higher_temperature() {
        let backend = FakeBackend::new(&["Plan"]);
        let mut analyst = analyst(&backend);

        let request = StrategyRequest {
            market_condition: "sideways".to_string(),
            risk_preference: "balanced".to_string(),
            capital: 50.0,
            holding_period: "medium term".to_string(),
        };
        analyst.generate_trading_strategy(&request).await.unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.temperature, 0.5);
        assert_eq!(sent.max_tokens, 2500);
        assert!(sent.messages[1].content.contains("Risk preference: balanced"));
    }

    #[tokio::test]
    async fn test_compare_stocks_lists_every_stock() {
        let backend = FakeBackend::new(&["Ranking"]);
        let mut analyst = analyst(&backend);

        let stocks: Vec<StockQuote> = serde_json::from_str(
            r#"[{"code": "600519", "name": "Moutai", "pe_ratio": 35.6},
                {"code": "000858", "name": "Wuliangye"}]"#,
        )
        .unwrap();
        analyst.compare_stocks(&stocks).await.unwrap();

        let prompt = &backend.requests()[0].messages[1].content;
        assert!(prompt.contains("Code: 600519"));
        assert!(prompt.contains("P/E: 35.6"));
        assert!(prompt.contains("Code: 000858"));
    }
}
