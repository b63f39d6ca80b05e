use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use super::prompt::{Prompt, render, templates};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::Result;

const NEWS_ANALYST_SYSTEM_PROMPT: &str = r#"You are a professional financial news analyst, skilled at:

1. Quickly extracting the key facts from a story
2. Judging the impact on a stock (positive / negative / neutral)
3. Estimating how strong the impact is and how long it lasts
4. Giving investment advice

Stay objective and base every judgement on the facts."#;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsAnalysis {
    pub analysis: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsReport {
    pub news: NewsItem,
    pub analysis: NewsAnalysis,
}

#[derive(Serialize)]
struct NewsContext<'a> {
    code: &'a str,
    name: &'a str,
    news: &'a NewsItem,
}

/// Rates how a news story affects a single stock.
pub struct NewsAnalyst {
    client: ChatClient,
    templates: Handlebars<'static>,
}

impl NewsAnalyst {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            templates: templates(),
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub async fn analyze_news(
        &mut self,
        news: &NewsItem,
        code: &str,
        name: &str,
    ) -> Result<NewsAnalysis> {
        let prompt = render(
            &self.templates,
            Prompt::NewsImpact,
            &NewsContext { code, name, news },
        )?;
        let analysis = self
            .client
            .chat_with(
                &prompt,
                Some(NEWS_ANALYST_SYSTEM_PROMPT),
                &RequestOptions::new(1500, 0.3),
            )
            .await?;

        Ok(NewsAnalysis {
            analysis,
            timestamp: chrono::Local::now().to_rfc3339(),
        })
    }

    /// Analyzes each story in order. The first failure aborts the batch.
    pub async fn batch_analyze_news(
        &mut self,
        news: &[NewsItem],
        code: &str,
        name: &str,
    ) -> Result<Vec<NewsReport>> {
        self.batch_analyze_news_with_progress(news, code, name, |_, _, _| {})
            .await
    }

    /// Like `batch_analyze_news` but calls `on_progress` with the
    /// 1-based position, the batch size and the story before each
    /// request.
    pub async fn batch_analyze_news_with_progress<F>(
        &mut self,
        news: &[NewsItem],
        code: &str,
        name: &str,
        mut on_progress: F,
    ) -> Result<Vec<NewsReport>>
    where
        F: FnMut(usize, usize, &NewsItem),
    {
        let mut reports = Vec::with_capacity(news.len());
        for (i, item) in news.iter().enumerate() {
            on_progress(i + 1, news.len(), item);
            tracing::info!(
                "[{}/{}] Analyzing news: {}",
                i + 1,
                news.len(),
                item.title.chars().take(30).collect::<String>()
            );
            let analysis = self.analyze_news(item, code, name).await?;
            reports.push(NewsReport {
                news: item.clone(),
                analysis,
            });
        }
        Ok(reports)
    }
}
