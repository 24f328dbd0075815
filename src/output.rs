//! Result types produced by the extractor and the pipeline.

use serde::{Deserialize, Serialize};

/// How the report text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded text layer read directly from the PDF.
    TextLayer,
    /// Pages rasterised and run through OCR.
    Ocr,
}

/// Text extracted from a report, with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
    pub page_count: usize,
}

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
}

/// Everything a successful pipeline run produced.
///
/// Only built once all three stages have succeeded; a failed run never
/// yields a partially filled report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Output of the analysis stage, `"Analysis of blood test report: …"`.
    pub analysis: String,
    /// Query the search stage sent to the provider.
    pub search_query: String,
    /// Search hits, at most `num_search_results` of them.
    pub articles: Vec<Article>,
    /// Final recommendations, the user-facing result.
    pub recommendations: String,
    /// Wall-clock duration of the three stages.
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serialises_articles_in_order() {
        let report = PipelineReport {
            analysis: "Analysis of blood test report: low iron".into(),
            search_query: "low ferritin diet".into(),
            articles: vec![
                Article {
                    title: "Iron deficiency".into(),
                    link: "https://a.example.org".into(),
                },
                Article {
                    title: "Ferritin test".into(),
                    link: "https://b.example.org".into(),
                },
            ],
            recommendations: "Eat more lentils.".into(),
            duration_ms: 1200,
        };
        let json = report.to_json_pretty().unwrap();
        let first = json.find("Iron deficiency").unwrap();
        let second = json.find("Ferritin test").unwrap();
        assert!(first < second);
    }

    #[test]
    fn extraction_method_uses_snake_case() {
        let json = serde_json::to_string(&ExtractionMethod::TextLayer).unwrap();
        assert_eq!(json, "\"text_layer\"");
    }
}
