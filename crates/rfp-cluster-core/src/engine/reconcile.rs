//! Incremental reconciliation: the full per-project clustering pass.
//!
//! The pass is idempotent at per-question granularity. Already-clustered
//! questions are never touched again, new questions either attach to an
//! existing cluster master or go through orphan grouping, and every write is
//! additive. An upstream failure mid-run leaves committed writes in place;
//! rerunning resumes from the survivors (at-least-once, not exactly-once).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{truncate_chars, ClusterEngine};
use crate::error::{EngineError, EngineResult, UpstreamError};
use crate::similarity::{group_by_threshold, order_for_output, EmbeddedQuestion};
use crate::traits::{VectorFilter, VectorMetadata, RECORD_TYPE_QUESTION};
use crate::types::{Cluster, ClusterFieldUpdate, ClusterMember, Question, ReconcileOutcome};

impl ClusterEngine {
    /// Run one reconciliation pass over a project.
    ///
    /// Phases: resolve the organization, fully drain the paginated question
    /// listing, partition into already-clustered and new, resolve the
    /// cluster threshold (org settings with logged fallback), embed and
    /// upsert the new questions in bounded batches, match them against
    /// existing cluster masters through the vector index, group the
    /// remaining orphans with the similarity engine, persist additively,
    /// and return the stably ordered result.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] on a nil project id.
    /// - [`EngineError::ProjectNotFound`] when the project or its
    ///   organization is missing.
    /// - [`EngineError::Upstream`] on embedding, vector-index, or repository
    ///   failure; the run aborts and is safe to retry.
    pub async fn reconcile_clusters(&self, project_id: Uuid) -> EngineResult<ReconcileOutcome> {
        if project_id.is_nil() {
            return Err(EngineError::Validation("project_id is nil".into()));
        }
        let project = self
            .questions
            .get_project(project_id)
            .await?
            .ok_or(EngineError::ProjectNotFound(project_id))?;
        let org_id = project
            .org_id
            .ok_or(EngineError::ProjectNotFound(project_id))?;

        let all = self.drain_questions(project_id).await?;
        let total_count = all.len();
        let fresh: Vec<Question> = all.iter().filter(|q| !q.is_clustered()).cloned().collect();
        let already_clustered = total_count - fresh.len();
        debug!(
            %project_id,
            total = total_count,
            already_clustered,
            new = fresh.len(),
            "loaded project questions"
        );

        if total_count < 2 {
            return Ok(ReconcileOutcome {
                questions: all,
                total_count,
                clusters_created: 0,
            });
        }
        if fresh.is_empty() {
            info!(%project_id, total = total_count, "no new questions, pass is a no-op");
            return Ok(ReconcileOutcome {
                questions: order_for_output(all),
                total_count,
                clusters_created: 0,
            });
        }

        let threshold = self.resolve_cluster_threshold(org_id).await;
        let embedded = self.embed_questions(&fresh).await?;
        for item in &embedded {
            let metadata = VectorMetadata {
                record_type: RECORD_TYPE_QUESTION.to_string(),
                project_id,
                question_id: item.question_id,
                text_preview: truncate_chars(&item.text, self.config().metadata_text_chars),
            };
            self.vector_index
                .upsert(org_id, item.question_id, item.vector.clone(), metadata)
                .await?;
        }

        // Masters already settled by previous runs, keyed by question id.
        let existing_masters: HashMap<Uuid, Uuid> = all
            .iter()
            .filter(|q| q.is_cluster_master)
            .filter_map(|q| q.cluster_id.map(|cluster_id| (q.question_id, cluster_id)))
            .collect();

        let mut updates: HashMap<Uuid, ClusterFieldUpdate> = HashMap::new();
        let mut orphans: Vec<EmbeddedQuestion> = Vec::new();
        let mut attached = 0usize;

        if existing_masters.is_empty() {
            orphans = embedded;
        } else {
            // The index holds every project vector, including the batch just
            // upserted, so the query must reach past self and sibling
            // newcomers to find a master hit.
            let top_k = total_count;
            for item in embedded {
                match self
                    .match_against_masters(
                        org_id,
                        project_id,
                        &item,
                        threshold,
                        top_k,
                        &existing_masters,
                    )
                    .await?
                {
                    Some((cluster_id, master_question_id, score)) => {
                        let update =
                            ClusterFieldUpdate::member(cluster_id, master_question_id, score);
                        self.questions
                            .update_cluster_fields(project_id, item.question_id, update.clone())
                            .await?;
                        self.clusters
                            .append_member(
                                cluster_id,
                                ClusterMember {
                                    question_id: item.question_id,
                                    text: item.text.clone(),
                                    similarity: score,
                                    has_answer: false,
                                },
                            )
                            .await?;
                        updates.insert(item.question_id, update);
                        attached += 1;
                    }
                    None => orphans.push(item),
                }
            }
        }

        let mut clusters_created = 0usize;
        if orphans.len() >= 2 {
            let grouping = group_by_threshold(&orphans, threshold);
            for draft in &grouping.clusters {
                let cluster_id = Uuid::new_v4();
                let master = &orphans[draft.master];
                let members: Vec<ClusterMember> = draft
                    .members
                    .iter()
                    .map(|m| ClusterMember {
                        question_id: orphans[m.index].question_id,
                        text: orphans[m.index].text.clone(),
                        similarity: m.similarity,
                        has_answer: false,
                    })
                    .collect();
                self.clusters
                    .create_cluster(Cluster::new(
                        cluster_id,
                        project_id,
                        master.question_id,
                        master.text.clone(),
                        members,
                        draft.avg_similarity,
                    ))
                    .await?;

                let master_update = ClusterFieldUpdate::master(cluster_id, master.question_id);
                self.questions
                    .update_cluster_fields(project_id, master.question_id, master_update.clone())
                    .await?;
                updates.insert(master.question_id, master_update);
                for m in &draft.members {
                    let member = &orphans[m.index];
                    let update =
                        ClusterFieldUpdate::member(cluster_id, master.question_id, m.similarity);
                    self.questions
                        .update_cluster_fields(project_id, member.question_id, update.clone())
                        .await?;
                    updates.insert(member.question_id, update);
                }
                clusters_created += 1;
            }
        }

        let merged: Vec<Question> = all
            .into_iter()
            .map(|mut q| {
                if let Some(update) = updates.get(&q.question_id) {
                    q.apply_cluster_fields(update);
                }
                q
            })
            .collect();

        info!(
            %project_id,
            total = total_count,
            attached,
            clusters_created,
            "reconciliation pass complete"
        );
        Ok(ReconcileOutcome {
            questions: order_for_output(merged),
            total_count,
            clusters_created,
        })
    }

    /// Fully drain the paginated question listing.
    async fn drain_questions(&self, project_id: Uuid) -> EngineResult<Vec<Question>> {
        let mut questions = Vec::new();
        let mut token = None;
        loop {
            let page = self.questions.list_questions(project_id, token).await?;
            questions.extend(page.items);
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }
        Ok(questions)
    }

    /// Resolve the cluster threshold from org settings.
    ///
    /// A settings failure must never abort the run.
    async fn resolve_cluster_threshold(&self, org_id: Uuid) -> f32 {
        match self.questions.get_organization_settings(org_id).await {
            Ok(settings) => settings
                .cluster_threshold
                .unwrap_or(self.config().default_cluster_threshold),
            Err(err) => {
                warn!(
                    %org_id,
                    error = %err,
                    fallback = self.config().default_cluster_threshold,
                    "organization settings lookup failed, using default cluster threshold"
                );
                self.config().default_cluster_threshold
            }
        }
    }

    /// Embed new questions in fixed-size batches with bounded concurrency.
    ///
    /// Output order matches input order. Any embedding failure aborts.
    async fn embed_questions(&self, fresh: &[Question]) -> EngineResult<Vec<EmbeddedQuestion>> {
        debug!(
            model = self.embeddings.model_id(),
            dimensions = self.embeddings.dimensions(),
            count = fresh.len(),
            "embedding new questions"
        );
        let semaphore = Arc::new(Semaphore::new(self.config().max_concurrent_embeds));
        let mut out = Vec::with_capacity(fresh.len());

        for chunk in fresh.chunks(self.config().embed_batch_size) {
            let mut join_set = JoinSet::new();
            for (slot, question) in chunk.iter().enumerate() {
                let provider = Arc::clone(&self.embeddings);
                let semaphore = Arc::clone(&semaphore);
                let question_id = question.question_id;
                let text = question.text.clone();
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.map_err(|e| {
                        EngineError::Upstream(UpstreamError::Embedding {
                            reason: e.to_string(),
                        })
                    })?;
                    let vector = provider.embed(&text).await?;
                    Ok::<_, EngineError>((
                        slot,
                        EmbeddedQuestion {
                            question_id,
                            text,
                            vector,
                        },
                    ))
                });
            }

            let mut batch: Vec<Option<EmbeddedQuestion>> =
                (0..chunk.len()).map(|_| None).collect();
            while let Some(joined) = join_set.join_next().await {
                let (slot, item) = joined.map_err(|e| {
                    EngineError::Upstream(UpstreamError::Embedding {
                        reason: e.to_string(),
                    })
                })??;
                batch[slot] = Some(item);
            }
            out.extend(batch.into_iter().flatten());
        }
        Ok(out)
    }

    /// Query the vector index for the question's best existing-master match.
    ///
    /// The question's own vector was just upserted, and so were its batch
    /// siblings, so the top hits can all be non-masters. The scan skips past
    /// self and every non-master hit and accepts the nearest known master
    /// whose score meets the threshold. Hits arrive best first, so the scan
    /// stops at the first sub-threshold score.
    async fn match_against_masters(
        &self,
        org_id: Uuid,
        project_id: Uuid,
        item: &EmbeddedQuestion,
        threshold: f32,
        top_k: usize,
        existing_masters: &HashMap<Uuid, Uuid>,
    ) -> EngineResult<Option<(Uuid, Uuid, f32)>> {
        let matches = self
            .vector_index
            .query(
                org_id,
                &item.vector,
                top_k,
                VectorFilter::questions(project_id),
            )
            .await?;
        for m in matches {
            if m.score < threshold {
                break;
            }
            if let Some(&cluster_id) = existing_masters.get(&m.id) {
                return Ok(Some((cluster_id, m.id, m.score)));
            }
        }
        Ok(None)
    }
}
