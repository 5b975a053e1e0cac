//! End-to-end analysis against a mocked TEI server.

use std::collections::HashMap;

use sefx_core::CommentRecord;
use sefx_engine::{Analyzer, CachedEmbedder, LexiconSynonyms, ScoringSettings, TeiClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers `/embed` from a fixed text → vector table.
struct TableResponder {
    table: HashMap<&'static str, Vec<f32>>,
}

impl Respond for TableResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let Some(inputs) = body["inputs"].as_array() else {
            return ResponseTemplate::new(400);
        };
        let mut vectors = Vec::with_capacity(inputs.len());
        for input in inputs {
            match input.as_str().and_then(|t| self.table.get(t)) {
                Some(v) => vectors.push(v.clone()),
                None => return ResponseTemplate::new(422),
            }
        }
        ResponseTemplate::new(200).set_body_json(vectors)
    }
}

async fn tei_server() -> MockServer {
    let server = MockServer::start().await;
    let table = HashMap::from([
        ("nausea", vec![1.0, 0.0, 0.0]),
        ("queasiness", vec![0.9, 0.3, 0.0]),
        ("insomnia", vec![0.0, 0.0, 1.0]),
        ("test comment one", vec![0.8, 0.6, 0.0]),
        ("test comment two", vec![0.9, 0.0, 0.436]),
        ("test comment three", vec![0.7, 0.0, 0.714]),
    ]);
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(TableResponder { table })
        .mount(&server)
        .await;
    server
}

fn records() -> Vec<CommentRecord> {
    vec![
        CommentRecord::new("DrugA", "Test comment one"),
        CommentRecord::new("DrugB", "Test comment two"),
        CommentRecord::new("DrugA", "Test comment three"),
    ]
}

#[tokio::test]
async fn analysis_through_tei_annotates_and_scores() {
    let server = tei_server().await;
    let tei = TeiClient::new(&server.uri(), 5)
        .expect("client construction should not fail")
        .with_batch_size(2);
    let embedder = CachedEmbedder::new(tei);
    let mut lexicon = LexiconSynonyms::new();
    lexicon.insert("nausea", ["queasiness"]);
    let official = vec!["insomnia".to_string()];

    let report = Analyzer::new(&embedder, &lexicon, &official, ScoringSettings::default())
        .analyze_corpus(&["nausea".to_string()], records())
        .await
        .expect("analysis should succeed");

    assert_eq!(report.drugs.len(), 2);
    assert_eq!(report.drugs[0].drug, "DrugA");
    assert_eq!(report.drugs[0].comment_count, 2);
    assert!(report.drugs[0].score("nausea").unwrap() > 0.0);

    // DrugA has two comments; the median sits halfway, so only the closer one matches.
    assert_eq!(report.comments[0].side_effects, vec!["nausea"]);
    assert!(report.comments[2].side_effects.is_empty());
    assert_eq!(report.comments[1].side_effects, vec!["nausea"]);

    let evidence: Vec<_> = report.evidence().collect();
    assert_eq!(evidence.len(), 2);
    assert_eq!(evidence[0].drug, "DrugA");
    assert_eq!(evidence[0].comment, "Test comment one");
}

#[tokio::test]
async fn provider_rejection_surfaces_as_error() {
    let server = tei_server().await;
    let tei = TeiClient::new(&server.uri(), 5).expect("client construction should not fail");
    let mut records = records();
    records.push(CommentRecord::new("DrugA", "never seen before"));

    let result = Analyzer::new(&tei, &sefx_engine::NoSynonyms, &[], ScoringSettings::default())
        .analyze_corpus(&["nausea".to_string()], records)
        .await;

    assert!(result.is_err());
}
