//! Reusable prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. Strict mode is on so a typo
//! in a field name fails loudly instead of rendering an empty string.

use std::fmt;

use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;
use serde_json::Value;

use crate::core::Result;

// Missing figures are rendered as `N/A`. Fields still have to be
// present (as `null`) because of strict mode.
handlebars_helper!(or_na: |v: Json| match v {
    Value::Null => "N/A".to_string(),
    Value::String(s) if s.is_empty() => "N/A".to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
});

// A simple `inc` helper for use with `each` and `@index` so that
// there can be natural number sequences when rendering (instead of
// starting at 0).
handlebars_helper!(inc: |v: i64| format!("{}", v + 1));

#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    AnalyzeFile,
    CodeReview,
    Complexity,
    StockOverview,
    TechnicalAnalysis,
    FundamentalAnalysis,
    Synthesis,
    CompareStocks,
    TradingStrategy,
    NewsImpact,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

pub const CODE_REVIEWER_SYSTEM_PROMPT: &str =
    "You are an expert code reviewer who is good at finding problems in code and suggesting improvements.";

pub const STOCK_ANALYST_SYSTEM_PROMPT: &str =
    "You are a professional stock analyst, skilled at both fundamental and technical analysis.";

const ANALYZE_FILE_PROMPT: &str = r"
{{#if question}}
Analyze the following file and answer the question.

Question: {{question}}
{{else}}
Analyze the following file.

File path: {{path}}
{{/if}}

File contents:
```
{{content}}
```
";

const CODE_REVIEW_PROMPT: &str = r"
Review the following code professionally.

File path: {{path}}

Code:
```{{language}}
{{code}}
```

Review it from these angles:
1. Code quality and readability
2. Potential bugs and issues
3. Performance improvements
4. Security issues
5. Best practices
";

const COMPLEXITY_PROMPT: &str = r"
Analyze the time and space complexity of the following code and suggest optimizations.

File path: {{path}}

Code:
```{{language}}
{{code}}
```

Provide:
1. Time complexity of each function, in big-O notation
2. Space complexity of each function
3. The hot spots that dominate the cost
4. Concrete optimizations, with the complexity they would achieve
";

const STOCK_OVERVIEW_PROMPT: &str = r"
Analyze the stock {{code}}, including:

1. Basic information (if you know it)
2. Industry and position within it
3. Main business
4. Recent performance
5. Investment advice

Note: base the analysis on what you know and say so when real-time data would be needed.
";

const TECHNICAL_ANALYSIS_PROMPT: &str = r"
Perform a technical analysis of the following stock:

[Basics]
Code: {{code}}
Name: {{name}}

[Indicators]
Price: {{or_na data.price}}
Change: {{or_na data.change_pct}}%
Volume: {{or_na data.volume}}
Turnover rate: {{or_na data.turnover_rate}}%

[Moving averages]
MA5: {{or_na data.ma5}}
MA10: {{or_na data.ma10}}
MA20: {{or_na data.ma20}}
MA60: {{or_na data.ma60}}

[Oscillators]
MACD: {{or_na data.macd}}
RSI: {{or_na data.rsi}}
KDJ: {{or_na data.kdj}}
BOLL: {{or_na data.boll}}

Cover the following:
1. Trend (up / down / sideways)
2. Support and resistance levels
3. Buy and sell signals
4. Recommended action
5. Risks
";

const FUNDAMENTAL_ANALYSIS_PROMPT: &str = r"
Perform a fundamental analysis of the following stock:

[Basics]
Code: {{code}}
Name: {{name}}
Industry: {{or_na data.industry}}

[Valuation]
P/E: {{or_na data.pe_ratio}}
P/B: {{or_na data.pb_ratio}}
P/S: {{or_na data.ps_ratio}}
Market cap: {{or_na data.market_cap}} (100M CNY)

[Financials]
Revenue: {{or_na data.revenue}} (100M CNY)
Net profit: {{or_na data.net_profit}} (100M CNY)
Net profit growth: {{or_na data.profit_growth}}%
ROE: {{or_na data.roe}}%
Debt ratio: {{or_na data.debt_ratio}}%

[Cash flow]
Operating cash flow: {{or_na data.operating_cashflow}} (100M CNY)
Free cash flow: {{or_na data.free_cashflow}} (100M CNY)

Cover the following:
1. Valuation (over / fair / under)
2. Profitability
3. Growth
4. Financial health
5. Investment value
";

const SYNTHESIS_PROMPT: &str = r"
Based on the technical and fundamental analyses below, give an overall investment recommendation.

[Technical analysis]
{{technical}}

[Fundamental analysis]
{{fundamental}}

Provide:
1. Overall score (1-10)
2. Recommendation (strong buy / buy / hold / sell / strong sell)
3. Target price
4. Stop-loss price
5. Position sizing (suggested share of the portfolio)
6. Risk level (low / medium / high)
7. Key risks
";

const COMPARE_STOCKS_PROMPT: &str = r"
Compare the following stocks and rank them by investment priority:
{{#each stocks}}

Stock {{inc @index}}
Code: {{code}}
Name: {{name}}
Price: {{or_na price}}
Change: {{or_na change_pct}}%
P/E: {{or_na pe_ratio}}
P/B: {{or_na pb_ratio}}
ROE: {{or_na roe}}%
{{/each}}

Compare them on:
1. Valuation
2. Profitability
3. Growth
4. Risk
5. Investment priority (highest first)
6. Strengths and weaknesses of each
";

const TRADING_STRATEGY_PROMPT: &str = r"
Design a trading strategy for the following situation:

[Market]
Current market condition: {{market_condition}}

[Investor]
Risk preference: {{risk_preference}}
Available capital: {{capital}} (10K CNY)
Holding period: {{holding_period}}

Provide:
1. Asset allocation (stocks / bonds / cash)
2. Sector allocation
3. Stock selection criteria
4. Position management
5. Take-profit and stop-loss rules
6. Risk controls
7. Concrete steps
";

const NEWS_IMPACT_PROMPT: &str = r"
Analyze the impact of the following news on the stock:

[Stock]
Code: {{code}}
Name: {{name}}

[Headline]
{{news.title}}

[Body]
{{news.content}}

Provide:
1. Summary (under 50 words)
2. Direction (positive / negative / neutral)
3. Magnitude (major / moderate / minor)
4. Duration (short / medium / long term)
5. Key drivers
6. Investment advice
7. Risks

Return the result as JSON.
";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, escaping HTML would mangle code
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_helper("or_na", Box::new(or_na));
    registry.register_helper("inc", Box::new(inc));

    let prompts = [
        (Prompt::AnalyzeFile, ANALYZE_FILE_PROMPT),
        (Prompt::CodeReview, CODE_REVIEW_PROMPT),
        (Prompt::Complexity, COMPLEXITY_PROMPT),
        (Prompt::StockOverview, STOCK_OVERVIEW_PROMPT),
        (Prompt::TechnicalAnalysis, TECHNICAL_ANALYSIS_PROMPT),
        (Prompt::FundamentalAnalysis, FUNDAMENTAL_ANALYSIS_PROMPT),
        (Prompt::Synthesis, SYNTHESIS_PROMPT),
        (Prompt::CompareStocks, COMPARE_STOCKS_PROMPT),
        (Prompt::TradingStrategy, TRADING_STRATEGY_PROMPT),
        (Prompt::NewsImpact, NEWS_IMPACT_PROMPT),
    ];
    for (prompt, template) in prompts {
        registry
            .register_template_string(&prompt.to_string(), template)
            .expect("Failed to register template");
    }
    registry
}

pub fn render<T: Serialize>(registry: &Handlebars, prompt: Prompt, data: &T) -> Result<String> {
    Ok(registry.render(&prompt.to_string(), data)?)
}

#[derive(Serialize)]
struct FileContext<'a> {
    path: &'a str,
    question: Option<&'a str>,
    content: &'a str,
}

#[derive(Serialize)]
struct CodeContext<'a> {
    path: &'a str,
    language: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct StockContext<'a> {
    code: &'a str,
}

pub fn analyze_file_prompt(path: &str, content: &str, question: Option<&str>) -> Result<String> {
    render(
        &templates(),
        Prompt::AnalyzeFile,
        &FileContext {
            path,
            question,
            content,
        },
    )
}

/// `language` is usually the file extension and is only used to tag
/// the fenced code block.
pub fn code_review_prompt(path: &str, language: &str, code: &str) -> Result<String> {
    render(
        &templates(),
        Prompt::CodeReview,
        &CodeContext {
            path,
            language,
            code,
        },
    )
}

pub fn complexity_prompt(path: &str, language: &str, code: &str) -> Result<String> {
    render(
        &templates(),
        Prompt::Complexity,
        &CodeContext {
            path,
            language,
            code,
        },
    )
}

pub fn stock_overview_prompt(code: &str) -> Result<String> {
    render(&templates(), Prompt::StockOverview, &StockContext { code })
}
