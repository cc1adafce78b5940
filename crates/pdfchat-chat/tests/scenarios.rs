//! End-to-end conversations over a generated PDF.

use std::sync::Arc;

use pdfchat_chat::{
    ChatError, RagOrchestrator, SessionStore, TurnSettings, CONTEXTUALIZE_SYSTEM_PROMPT,
};
use pdfchat_core::config::IngestConfig;
use pdfchat_core::error::PdfChatError;
use pdfchat_core::types::ChatRole;
use pdfchat_ingest::{fixture, DocumentIngestor};
use pdfchat_llm::{LlmError, ScriptedModel};
use pdfchat_vector::{
    DocumentSlot, DynEmbeddingService, EmbeddingService, HashEmbedding, IndexBuilder,
};

const PAGES: [&str; 3] = [
    "Geography notes.\nThe capital of France is Paris.",
    "Rivers of Europe.\nThe Seine flows through the city.",
    "Appendix.\nNo further facts.",
];

/// Stands in for the hosted model: resolves "its" against France when the
/// history mentions it, and only answers "Paris" when that fact is in context.
fn geography_model() -> ScriptedModel {
    ScriptedModel::new(|call| {
        if call.system_prompt == CONTEXTUALIZE_SYSTEM_PROMPT {
            let mentions_france = call.history.iter().any(|m| m.content.contains("France"));
            if mentions_france && call.user_message.contains("its population") {
                return Ok("What is the population of France?".to_string());
            }
            return Ok(call.user_message.clone());
        }
        if call.user_message.contains("capital of France")
            && call.system_prompt.contains("The capital of France is Paris.")
        {
            return Ok("The capital of France is Paris.".to_string());
        }
        Ok("I don't know.".to_string())
    })
}

/// Hash embedding that fails for any text containing "FAIL".
struct FlakyEmbedding(HashEmbedding);

impl EmbeddingService for FlakyEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PdfChatError> {
        if text.contains("FAIL") {
            return Err(PdfChatError::Embedding("embedding backend offline".to_string()));
        }
        self.0.embed(text).await
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(&self.0)
    }
}

fn build(model: ScriptedModel, embedder: Arc<dyn DynEmbeddingService>) -> RagOrchestrator {
    RagOrchestrator::new(
        Arc::new(model),
        Arc::new(DocumentIngestor::new(&IngestConfig::default()).unwrap()),
        IndexBuilder::new(embedder),
        DocumentSlot::new(),
        SessionStore::new(),
        TurnSettings::default(),
    )
}

async fn ready(model: ScriptedModel) -> RagOrchestrator {
    let orch = build(model, Arc::new(HashEmbedding::new()));
    let info = orch
        .load_document("geography.pdf", fixture::build_pdf(&PAGES))
        .await
        .unwrap();
    assert_eq!(info.page_count, 3);
    orch
}

#[tokio::test]
async fn capital_of_france_is_answered_from_page_one() {
    let orch = ready(geography_model()).await;

    let outcome = orch
        .handle_turn("default_session", "What is the capital of France?")
        .await
        .unwrap();

    assert!(outcome.answer.contains("Paris"));
    assert!(outcome.sources.len() <= 4);
    assert!(outcome
        .sources
        .iter()
        .any(|s| s.page_index == 0 && s.preview.contains("The capital of France is Paris.")));

    let transcript = orch.sessions().get_or_create("default_session").await.unwrap();
    assert_eq!(transcript.len(), 1);
}

#[tokio::test]
async fn follow_up_is_reformulated_with_history() {
    let model = geography_model();
    let orch = ready(model.clone()).await;

    orch.handle_turn("s", "What is the capital of France?")
        .await
        .unwrap();
    let outcome = orch.handle_turn("s", "What is its population?").await.unwrap();

    assert!(outcome.standalone_question.contains("France"));
    assert!(!outcome.standalone_question.contains("its"));

    let calls = model.calls();
    let reformulation = calls
        .iter()
        .find(|c| c.system_prompt == CONTEXTUALIZE_SYSTEM_PROMPT)
        .unwrap();
    assert_eq!(reformulation.history.len(), 2);
    assert_eq!(reformulation.history[0].role, ChatRole::User);

    // The answer call runs on the rewritten question.
    let last = calls.last().unwrap();
    assert_eq!(last.user_message, "What is the population of France?");

    let messages = &outcome.history;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].content, "What is its population?");
}

#[tokio::test]
async fn question_before_upload_is_not_ready() {
    let orch = build(geography_model(), Arc::new(HashEmbedding::new()));
    orch.sessions().append("s", "earlier", "turn").await.unwrap();

    let result = orch.handle_turn("s", "What is the capital of France?").await;
    assert!(matches!(result, Err(ChatError::NotReady)));
    assert_eq!(orch.sessions().get_or_create("s").await.unwrap().len(), 1);
}

#[tokio::test]
async fn sessions_do_not_leak_into_each_other() {
    let orch = ready(geography_model()).await;

    orch.handle_turn("A", "What is the capital of France?")
        .await
        .unwrap();
    let b = orch.handle_turn("B", "What is its population?").await.unwrap();

    // B has no history, so nothing was rewritten.
    assert_eq!(b.standalone_question, "What is its population?");
    assert_eq!(b.history.len(), 2);
    assert!(b.history.iter().all(|m| !m.content.contains("capital")));
    assert_eq!(orch.sessions().get_or_create("A").await.unwrap().len(), 1);
}

#[tokio::test]
async fn transcript_follows_call_order() {
    let orch = ready(geography_model()).await;
    let questions = ["first question", "second question", "third question"];
    for q in questions {
        orch.handle_turn("s", q).await.unwrap();
    }

    let transcript = orch.sessions().get_or_create("s").await.unwrap();
    let recorded: Vec<&str> = transcript
        .turns()
        .iter()
        .map(|t| t.question.as_str())
        .collect();
    assert_eq!(recorded, questions);
}

#[tokio::test]
async fn failed_synthesis_leaves_transcript_unchanged() {
    let model = ScriptedModel::new(|call| {
        if call.user_message.contains("explode") {
            Err(LlmError::Authentication("Invalid API Key".to_string()))
        } else {
            Ok("fine".to_string())
        }
    });
    let orch = ready(model).await;

    orch.handle_turn("s", "What is the capital of France?")
        .await
        .unwrap();
    let err = orch.handle_turn("s", "please explode").await.unwrap_err();

    assert!(matches!(err, ChatError::Generation(ref e) if e.is_authentication()));
    assert_eq!(orch.sessions().get_or_create("s").await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_query_embedding_leaves_transcript_unchanged() {
    let orch = build(
        geography_model(),
        Arc::new(FlakyEmbedding(HashEmbedding::new())),
    );
    orch.load_document("geography.pdf", fixture::build_pdf(&PAGES))
        .await
        .unwrap();

    let err = orch.handle_turn("s", "FAIL this lookup").await.unwrap_err();
    assert!(matches!(err, ChatError::Embedding(_)));
    assert!(orch.sessions().get_or_create("s").await.unwrap().is_empty());
}

#[tokio::test]
async fn unparseable_upload_is_ingestion_error_and_keeps_previous_document() {
    let orch = ready(geography_model()).await;

    let err = orch
        .load_document("broken.pdf", b"%PDF-1.5 garbage".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Ingestion(_)));

    let current = orch.current_document().unwrap().unwrap();
    assert_eq!(current.file_name, "geography.pdf");
}

#[tokio::test]
async fn new_upload_replaces_document() {
    let orch = ready(geography_model()).await;
    let info = orch
        .load_document("other.pdf", fixture::build_pdf(&["Only one page about cheese."]))
        .await
        .unwrap();
    assert_eq!(info.page_count, 1);

    let outcome = orch.handle_turn("s", "cheese?").await.unwrap();
    assert_eq!(outcome.sources.len(), 1);
    assert!(outcome.sources[0].preview.contains("cheese"));
}

#[tokio::test]
async fn concurrent_turns_in_one_session_are_serialized() {
    let model = geography_model();
    let orch = ready(model.clone()).await;

    let (first, second) = tokio::join!(
        orch.handle_turn("s", "What is the capital of France?"),
        orch.handle_turn("s", "Tell me about rivers"),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(orch.sessions().get_or_create("s").await.unwrap().len(), 2);
    // Exactly one turn saw the other's history and needed reformulating.
    let reformulations: Vec<_> = model
        .calls()
        .into_iter()
        .filter(|c| c.system_prompt == CONTEXTUALIZE_SYSTEM_PROMPT)
        .collect();
    assert_eq!(reformulations.len(), 1);
    assert_eq!(reformulations[0].history.len(), 2);
}
