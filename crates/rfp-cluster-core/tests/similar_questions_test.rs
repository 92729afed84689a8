//! End-to-end similar-question lookups over the in-memory stubs.
//!
//! Covers self-exclusion, threshold resolution and boundaries, stale-vector
//! tolerance, answer enrichment, and result ordering.

use std::sync::Arc;

use uuid::Uuid;

use rfp_cluster_core::similarity::dense::cosine_similarity;
use rfp_cluster_core::stubs::{
    InMemoryClusterRepository, InMemoryQuestionRepository, InMemoryVectorIndex, StubAnswerStore,
    StubEmbeddingProvider,
};
use rfp_cluster_core::traits::ProjectRecord;
use rfp_cluster_core::types::Question;
use rfp_cluster_core::{ClusterEngine, EngineConfig, EngineError};

const Q_RETENTION_1: &str = "What is your data retention policy?";
const Q_RETENTION_2: &str = "Describe your data retention policy.";
const Q_RETENTION_3: &str = "How long do you retain data?";
const Q_SSO: &str = "Do you offer SSO integration?";

const V_RETENTION_1: [f32; 4] = [1.0, 0.0, 0.0, 0.0];
const V_RETENTION_2: [f32; 4] = [0.95, 0.312, 0.0, 0.0];
const V_RETENTION_3: [f32; 4] = [0.93, -0.368, 0.0, 0.0];
const V_SSO: [f32; 4] = [0.0, 0.0, 1.0, 0.0];

struct Harness {
    engine: ClusterEngine,
    questions: Arc<InMemoryQuestionRepository>,
    answers: Arc<StubAnswerStore>,
    project_id: Uuid,
    org_id: Uuid,
    ids: [Uuid; 4],
}

/// Build a harness, seed the four questions, and run one reconciliation so
/// the vectors are in the index and the retention trio shares a cluster.
async fn seeded_harness() -> Harness {
    let embeddings = Arc::new(
        StubEmbeddingProvider::new(4)
            .with_vector(Q_RETENTION_1, V_RETENTION_1.to_vec())
            .with_vector(Q_RETENTION_2, V_RETENTION_2.to_vec())
            .with_vector(Q_RETENTION_3, V_RETENTION_3.to_vec())
            .with_vector(Q_SSO, V_SSO.to_vec()),
    );
    let index = Arc::new(InMemoryVectorIndex::new());
    let questions = Arc::new(InMemoryQuestionRepository::new());
    let clusters = Arc::new(InMemoryClusterRepository::new());
    let answers = Arc::new(StubAnswerStore::new());

    let project_id = Uuid::new_v4();
    let org_id = Uuid::new_v4();
    questions.add_project(ProjectRecord {
        project_id,
        org_id: Some(org_id),
    });

    let mut ids = [Uuid::nil(); 4];
    for (slot, text) in [Q_RETENTION_1, Q_RETENTION_2, Q_RETENTION_3, Q_SSO]
        .iter()
        .enumerate()
    {
        let q = Question::new(Uuid::new_v4(), project_id, org_id, *text);
        ids[slot] = q.question_id;
        questions.add_question(q).expect("valid question");
    }

    let engine = ClusterEngine::new(
        embeddings,
        index,
        questions.clone(),
        clusters,
        answers.clone(),
        EngineConfig::default(),
    )
    .expect("default config is valid");

    engine.reconcile_clusters(project_id).await.unwrap();

    Harness {
        engine,
        questions,
        answers,
        project_id,
        org_id,
        ids,
    }
}

#[tokio::test]
async fn excludes_self_and_sorts_by_similarity() {
    let h = seeded_harness().await;
    let [r1, r2, r3, sso] = h.ids;

    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(0.5), None)
        .await
        .unwrap();

    let returned: Vec<Uuid> = similar.iter().map(|s| s.question_id).collect();
    assert!(!returned.contains(&r1), "never returns the source question");
    assert!(!returned.contains(&sso), "orthogonal question is below 0.5");
    assert_eq!(returned, vec![r2, r3], "sorted by similarity descending");
    assert!(similar[0].similarity >= similar[1].similarity);
}

#[tokio::test]
async fn threshold_boundary_is_inclusive() {
    let h = seeded_harness().await;
    let [r1, r2, _, _] = h.ids;

    // Exactly at the score: included.
    let score = cosine_similarity(&V_RETENTION_1, &V_RETENTION_2);
    let at = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(score), None)
        .await
        .unwrap();
    assert!(at.iter().any(|s| s.question_id == r2));

    // A hair above: excluded.
    let above = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(score + 1e-6), None)
        .await
        .unwrap();
    assert!(!above.iter().any(|s| s.question_id == r2));
}

#[tokio::test]
async fn stale_vector_match_is_dropped_silently() {
    let h = seeded_harness().await;
    let [r1, r2, r3, _] = h.ids;

    // Delete a question; its vector stays in the index.
    h.questions.remove_question(r3);

    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(0.5), None)
        .await
        .unwrap();
    let returned: Vec<Uuid> = similar.iter().map(|s| s.question_id).collect();
    assert_eq!(returned, vec![r2], "stale hit dropped without raising");
}

#[tokio::test]
async fn limit_caps_results() {
    let h = seeded_harness().await;
    let [r1, r2, _, _] = h.ids;

    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(0.5), Some(1))
        .await
        .unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].question_id, r2, "best match survives the cap");
}

#[tokio::test]
async fn enriches_answer_and_cluster_fields() {
    let h = seeded_harness().await;
    let [r1, r2, r3, sso] = h.ids;

    let long_answer = "A".repeat(200);
    h.answers.set_answer(h.project_id, r2, long_answer);
    h.answers.set_answer(h.project_id, sso, "Yes, via SAML.");

    // Threshold 0.0 keeps even the orthogonal question in scope.
    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(0.0), None)
        .await
        .unwrap();

    let by_id = |id: Uuid| similar.iter().find(|s| s.question_id == id).unwrap();

    let answered = by_id(r2);
    assert!(answered.has_answer);
    let preview = answered.answer_preview.as_deref().unwrap();
    assert_eq!(preview.chars().count(), 153);
    assert!(preview.ends_with("..."));
    assert!(answered.in_same_cluster, "retention trio shares a cluster");

    let unanswered = by_id(r3);
    assert!(!unanswered.has_answer);
    assert!(unanswered.answer_preview.is_none());
    assert!(unanswered.in_same_cluster);

    let unrelated = by_id(sso);
    assert!(unrelated.has_answer);
    assert_eq!(unrelated.answer_preview.as_deref(), Some("Yes, via SAML."));
    assert!(!unrelated.in_same_cluster, "orphan shares no cluster");
}

#[tokio::test]
async fn explicit_threshold_skips_org_settings() {
    let h = seeded_harness().await;
    let [r1, r2, _, _] = h.ids;

    // Even a hard settings outage is invisible when a threshold is passed.
    h.questions.set_settings_failing(true);
    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, Some(0.5), None)
        .await
        .unwrap();
    assert!(similar.iter().any(|s| s.question_id == r2));

    // Without an explicit threshold the default (0.50) applies silently.
    let similar = h
        .engine
        .find_similar_questions(h.project_id, r1, None, None)
        .await
        .unwrap();
    assert!(similar.iter().any(|s| s.question_id == r2));
}

#[tokio::test]
async fn missing_question_is_not_found() {
    let h = seeded_harness().await;
    let err = h
        .engine
        .find_similar_questions(h.project_id, Uuid::new_v4(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::QuestionNotFound(_)));
}

#[tokio::test]
async fn empty_text_question_is_not_found() {
    let h = seeded_harness().await;
    let blank = Question::new(Uuid::new_v4(), h.project_id, h.org_id, "   ");
    let blank_id = blank.question_id;
    h.questions.add_question(blank).unwrap();

    let err = h
        .engine
        .find_similar_questions(h.project_id, blank_id, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::QuestionNotFound(_)));
}
