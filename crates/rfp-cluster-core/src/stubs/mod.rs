//! In-memory stub implementations of the collaborator traits.
//!
//! # TEST ONLY - DO NOT USE IN PRODUCTION
//!
//! These stubs back the engine's unit and integration tests. They implement
//! the real trait contracts with real algorithms (linear-scan cosine search,
//! additive member appends, paginated listings), not mocks, but they do full
//! table scans and hold everything in memory.
//!
//! ## When to use
//!
//! - Unit and integration tests of `ClusterEngine`
//! - Prototyping without the real providers
//!
//! ## When NOT to use
//!
//! - Production (wire the real embedding provider, vector index, and stores)
//! - Benchmarks (O(n) scans will skew results)

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, UpstreamError};
use crate::similarity::dense::{cosine_similarity, normalize};
use crate::traits::{
    AnswerStore, ClusterPage, ClusterRepository, EmbeddingProvider, OrganizationSettings,
    ProjectRecord, QuestionPage, QuestionRepository, VectorFilter, VectorIndex, VectorMatch,
    VectorMetadata,
};
use crate::types::{Cluster, ClusterFieldUpdate, ClusterMember, Question};

// ============================================================================
// EMBEDDING PROVIDER STUB
// ============================================================================

/// Deterministic embedding provider for tests.
///
/// Texts registered with [`with_vector`](Self::with_vector) return their
/// registered vectors, letting tests control pairwise similarities exactly.
/// Unregistered texts get a deterministic hash-derived unit vector, so
/// distinct texts are (almost surely) dissimilar and repeated embeds of the
/// same text are identical.
pub struct StubEmbeddingProvider {
    vectors: DashMap<String, Vec<f32>>,
    dimensions: usize,
    fail: AtomicBool,
}

impl StubEmbeddingProvider {
    /// Create a provider producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            vectors: DashMap::new(),
            dimensions,
            fail: AtomicBool::new(false),
        }
    }

    /// Register an exact vector for a text.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Make every subsequent `embed` call fail, simulating an outage.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, AtomicOrdering::SeqCst);
    }

    fn hash_vector(&self, text: &str) -> Vec<f32> {
        // FNV-1a seed, splitmix64 fill.
        let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            seed ^= u64::from(byte);
            seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let mut vector = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = seed;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^= z >> 31;
            vector.push((z as f64 / u64::MAX as f64) as f32 * 2.0 - 1.0);
        }
        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        if self.fail.load(AtomicOrdering::SeqCst) {
            return Err(EngineError::Upstream(UpstreamError::Embedding {
                reason: "stub provider set to fail".into(),
            }));
        }
        if let Some(vector) = self.vectors.get(text) {
            return Ok(vector.clone());
        }
        Ok(self.hash_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "stub-embedding-v1"
    }
}

// ============================================================================
// VECTOR INDEX STUB
// ============================================================================

struct StoredVector {
    vector: Vec<f32>,
    metadata: VectorMetadata,
}

/// Linear-scan in-memory vector index, namespaced like the real one.
///
/// Entries are never pruned when questions are deleted, which is exactly the
/// stale-vector condition the engine has to tolerate.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    records: DashMap<(Uuid, Uuid), StoredVector>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors across all namespaces.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(
        &self,
        org_id: Uuid,
        id: Uuid,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> EngineResult<()> {
        self.records
            .insert((org_id, id), StoredVector { vector, metadata });
        Ok(())
    }

    async fn query(
        &self,
        org_id: Uuid,
        vector: &[f32],
        top_k: usize,
        filter: VectorFilter,
    ) -> EngineResult<Vec<VectorMatch>> {
        let mut hits: Vec<VectorMatch> = self
            .records
            .iter()
            .filter(|entry| {
                let (namespace, _) = entry.key();
                *namespace == org_id
                    && entry.value().metadata.record_type == filter.record_type
                    && entry.value().metadata.project_id == filter.project_id
            })
            .map(|entry| VectorMatch {
                id: entry.key().1,
                score: cosine_similarity(vector, &entry.value().vector),
                metadata: Some(entry.value().metadata.clone()),
            })
            .collect();
        // Descending score, id as a deterministic tie-break.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

// ============================================================================
// QUESTION REPOSITORY STUB
// ============================================================================

/// In-memory question repository with real pagination.
///
/// `page_size` defaults to 100; tests shrink it to exercise the drain loop.
/// `set_settings_failing` simulates an org-settings outage, the one upstream
/// failure the engine recovers from locally.
pub struct InMemoryQuestionRepository {
    projects: DashMap<Uuid, ProjectRecord>,
    settings: DashMap<Uuid, OrganizationSettings>,
    questions: DashMap<Uuid, (usize, Question)>,
    seq: AtomicUsize,
    page_size: usize,
    fail_settings: AtomicBool,
    settings_calls: AtomicUsize,
}

impl InMemoryQuestionRepository {
    /// Create an empty repository with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    /// Create an empty repository with an explicit page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            projects: DashMap::new(),
            settings: DashMap::new(),
            questions: DashMap::new(),
            seq: AtomicUsize::new(0),
            page_size: page_size.max(1),
            fail_settings: AtomicBool::new(false),
            settings_calls: AtomicUsize::new(0),
        }
    }

    /// Register a project.
    pub fn add_project(&self, project: ProjectRecord) {
        self.projects.insert(project.project_id, project);
    }

    /// Register organization settings.
    pub fn add_organization_settings(&self, org_id: Uuid, settings: OrganizationSettings) {
        self.settings.insert(org_id, settings);
    }

    /// Insert a question, validating at the boundary.
    pub fn add_question(&self, question: Question) -> EngineResult<()> {
        question.validate()?;
        let seq = self.seq.fetch_add(1, AtomicOrdering::SeqCst);
        self.questions
            .insert(question.question_id, (seq, question));
        Ok(())
    }

    /// Delete a question, leaving any vector-index entry behind (the stale
    /// condition).
    pub fn remove_question(&self, question_id: Uuid) {
        self.questions.remove(&question_id);
    }

    /// Make every subsequent settings lookup fail.
    pub fn set_settings_failing(&self, failing: bool) {
        self.fail_settings.store(failing, AtomicOrdering::SeqCst);
    }

    /// Number of settings lookups served (or failed) so far.
    pub fn settings_calls(&self) -> usize {
        self.settings_calls.load(AtomicOrdering::SeqCst)
    }

    fn sorted_project_questions(&self, project_id: Uuid) -> Vec<Question> {
        let mut items: Vec<(usize, Question)> = self
            .questions
            .iter()
            .filter(|entry| entry.value().1.project_id == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, q)| q).collect()
    }
}

impl Default for InMemoryQuestionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn get_project(&self, project_id: Uuid) -> EngineResult<Option<ProjectRecord>> {
        Ok(self.projects.get(&project_id).map(|p| p.clone()))
    }

    async fn list_questions(
        &self,
        project_id: Uuid,
        token: Option<String>,
    ) -> EngineResult<QuestionPage> {
        let offset = token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let all = self.sorted_project_questions(project_id);
        let end = (offset + self.page_size).min(all.len());
        let items = all[offset.min(all.len())..end].to_vec();
        let next_token = (end < all.len()).then(|| end.to_string());
        Ok(QuestionPage { items, next_token })
    }

    async fn get_organization_settings(&self, org_id: Uuid) -> EngineResult<OrganizationSettings> {
        self.settings_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_settings.load(AtomicOrdering::SeqCst) {
            return Err(EngineError::Upstream(UpstreamError::Repository {
                operation: "get_organization_settings".into(),
                reason: "stub repository set to fail settings lookups".into(),
            }));
        }
        Ok(self
            .settings
            .get(&org_id)
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    async fn get_question(
        &self,
        project_id: Uuid,
        question_id: Uuid,
    ) -> EngineResult<Option<Question>> {
        Ok(self
            .questions
            .get(&question_id)
            .filter(|entry| entry.value().1.project_id == project_id)
            .map(|entry| entry.value().1.clone()))
    }

    async fn update_cluster_fields(
        &self,
        project_id: Uuid,
        question_id: Uuid,
        fields: ClusterFieldUpdate,
    ) -> EngineResult<()> {
        let mut entry = self.questions.get_mut(&question_id).ok_or_else(|| {
            EngineError::Upstream(UpstreamError::Repository {
                operation: "update_cluster_fields".into(),
                reason: format!("question {question_id} not found"),
            })
        })?;
        if entry.value().1.project_id != project_id {
            return Err(EngineError::Upstream(UpstreamError::Repository {
                operation: "update_cluster_fields".into(),
                reason: format!("question {question_id} not in project {project_id}"),
            }));
        }
        entry.value_mut().1.apply_cluster_fields(&fields);
        Ok(())
    }
}

// ============================================================================
// CLUSTER REPOSITORY STUB
// ============================================================================

/// In-memory cluster repository with an atomic member append.
pub struct InMemoryClusterRepository {
    clusters: DashMap<Uuid, (usize, Cluster)>,
    seq: AtomicUsize,
    page_size: usize,
}

impl InMemoryClusterRepository {
    /// Create an empty repository with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    /// Create an empty repository with an explicit page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            clusters: DashMap::new(),
            seq: AtomicUsize::new(0),
            page_size: page_size.max(1),
        }
    }

    /// Direct read of a cluster record, for test assertions.
    pub fn get(&self, cluster_id: Uuid) -> Option<Cluster> {
        self.clusters.get(&cluster_id).map(|c| c.value().1.clone())
    }
}

impl Default for InMemoryClusterRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterRepository for InMemoryClusterRepository {
    async fn create_cluster(&self, cluster: Cluster) -> EngineResult<()> {
        if self.clusters.contains_key(&cluster.cluster_id) {
            return Err(EngineError::Upstream(UpstreamError::Repository {
                operation: "create_cluster".into(),
                reason: format!("cluster {} already exists", cluster.cluster_id),
            }));
        }
        let seq = self.seq.fetch_add(1, AtomicOrdering::SeqCst);
        self.clusters.insert(cluster.cluster_id, (seq, cluster));
        Ok(())
    }

    async fn append_member(&self, cluster_id: Uuid, member: ClusterMember) -> EngineResult<()> {
        // DashMap entry lock makes push + increment a single atomic step.
        let mut entry = self.clusters.get_mut(&cluster_id).ok_or_else(|| {
            EngineError::Upstream(UpstreamError::Repository {
                operation: "append_member".into(),
                reason: format!("cluster {cluster_id} not found"),
            })
        })?;
        let cluster = &mut entry.value_mut().1;
        cluster.members.push(member);
        cluster.question_count += 1;
        cluster.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn list_clusters(
        &self,
        project_id: Uuid,
        token: Option<String>,
    ) -> EngineResult<ClusterPage> {
        let offset = token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let mut all: Vec<(usize, Cluster)> = self
            .clusters
            .iter()
            .filter(|entry| entry.value().1.project_id == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        let clusters: Vec<Cluster> = all.into_iter().map(|(_, c)| c).collect();
        let end = (offset + self.page_size).min(clusters.len());
        let items = clusters[offset.min(clusters.len())..end].to_vec();
        let next_token = (end < clusters.len()).then(|| end.to_string());
        Ok(ClusterPage { items, next_token })
    }
}

// ============================================================================
// ANSWER STORE STUB
// ============================================================================

/// In-memory answer store.
#[derive(Default)]
pub struct StubAnswerStore {
    answers: DashMap<(Uuid, Uuid), String>,
}

impl StubAnswerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer for a question.
    pub fn set_answer(&self, project_id: Uuid, question_id: Uuid, text: impl Into<String>) {
        self.answers.insert((project_id, question_id), text.into());
    }
}

#[async_trait]
impl AnswerStore for StubAnswerStore {
    async fn answer_text(
        &self,
        project_id: Uuid,
        question_id: Uuid,
    ) -> EngineResult<Option<String>> {
        Ok(self
            .answers
            .get(&(project_id, question_id))
            .map(|a| a.clone()))
    }
}
