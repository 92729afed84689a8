//! Threshold grouping, master selection, and the output ordering contract.

use uuid::Uuid;

use super::dense::cosine_similarity;
use crate::types::Question;

/// A question paired with its transient embedding for the duration of a
/// grouping pass.
#[derive(Debug, Clone)]
pub struct EmbeddedQuestion {
    /// The question's id.
    pub question_id: Uuid,
    /// The question's text.
    pub text: String,
    /// The embedding vector. Never persisted.
    pub vector: Vec<f32>,
}

impl EmbeddedQuestion {
    fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A non-master member of a draft cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMember {
    /// Index into the grouping input.
    pub index: usize,
    /// Cosine similarity to the chosen master's vector (recomputed, not the
    /// detection-time value).
    pub similarity: f32,
}

/// A cluster produced by one grouping pass, expressed as input indices.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftCluster {
    /// Input index of the master (longest text, earliest on ties).
    pub master: usize,
    /// Non-master members. Always non-empty.
    pub members: Vec<DraftMember>,
    /// Mean of the member similarities.
    pub avg_similarity: f32,
}

/// Result of a grouping pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingResult {
    /// Emitted clusters, in detection order.
    pub clusters: Vec<DraftCluster>,
    /// Input indices that joined no cluster, in input order.
    pub unclustered: Vec<usize>,
}

/// Partition embedded questions into clusters at the given threshold.
///
/// Builds the symmetric cosine matrix (unit diagonal), then walks the input
/// in order: for each unvisited index, the neighbor set is every index whose
/// similarity meets the threshold (inclusive). A set of fewer than two
/// questions emits nothing. Otherwise all set members are marked visited,
/// the longest text becomes master (earliest input index on ties), and each
/// other member's similarity is recomputed directly against the master's
/// vector.
pub fn group_by_threshold(items: &[EmbeddedQuestion], threshold: f32) -> GroupingResult {
    let n = items.len();
    let matrix = similarity_matrix(items);
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();

    for i in 0..n {
        if visited[i] {
            continue;
        }
        let neighbors: Vec<usize> = (0..n)
            .filter(|&j| !visited[j] && matrix[i][j] >= threshold)
            .collect();
        if neighbors.len() < 2 {
            continue;
        }
        for &j in &neighbors {
            visited[j] = true;
        }
        let master = select_master(&neighbors, items);
        let members: Vec<DraftMember> = neighbors
            .iter()
            .filter(|&&j| j != master)
            .map(|&j| DraftMember {
                index: j,
                similarity: cosine_similarity(&items[j].vector, &items[master].vector),
            })
            .collect();
        let avg_similarity =
            members.iter().map(|m| m.similarity).sum::<f32>() / members.len() as f32;
        clusters.push(DraftCluster {
            master,
            members,
            avg_similarity,
        });
    }

    let unclustered = (0..n).filter(|&i| !visited[i]).collect();
    GroupingResult {
        clusters,
        unclustered,
    }
}

/// Symmetric cosine matrix with a unit diagonal.
fn similarity_matrix(items: &[EmbeddedQuestion]) -> Vec<Vec<f32>> {
    let n = items.len();
    let mut matrix = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine_similarity(&items[i].vector, &items[j].vector);
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }
    matrix
}

/// Longest text wins; equal lengths resolve to the earliest input index.
fn select_master(candidates: &[usize], items: &[EmbeddedQuestion]) -> usize {
    let mut best = candidates[0];
    for &idx in &candidates[1..] {
        if items[idx].text_len() > items[best].text_len() {
            best = idx;
        }
    }
    best
}

/// Reorder questions per the output contract:
/// masters sorted by text length descending, then unclustered questions in
/// input order, then non-master members in input order.
///
/// This is the shape every reconciliation result takes, so downstream answer
/// generation sees one representative per cluster before any duplicates.
pub fn order_for_output(questions: Vec<Question>) -> Vec<Question> {
    let mut masters = Vec::new();
    let mut unclustered = Vec::new();
    let mut members = Vec::new();
    for q in questions {
        if q.is_cluster_master {
            masters.push(q);
        } else if q.is_clustered() {
            members.push(q);
        } else {
            unclustered.push(q);
        }
    }
    // Stable sort keeps input order for equal lengths.
    masters.sort_by_key(|q| std::cmp::Reverse(q.text_len()));
    masters.extend(unclustered);
    masters.extend(members);
    masters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterFieldUpdate;

    fn item(text: &str, vector: Vec<f32>) -> EmbeddedQuestion {
        EmbeddedQuestion {
            question_id: Uuid::new_v4(),
            text: text.to_string(),
            vector,
        }
    }

    // Three near-duplicates (pairwise >= 0.80) plus two unrelated axes.
    fn retention_fixture() -> Vec<EmbeddedQuestion> {
        vec![
            item("What is your data retention policy?", vec![1.0, 0.0, 0.0, 0.0]),
            item(
                "Describe your data retention policy.",
                vec![0.95, 0.312, 0.0, 0.0],
            ),
            item(
                "How long do you retain data?",
                vec![0.95, -0.312, 0.0, 0.0],
            ),
            item("Do you offer SSO?", vec![0.0, 0.0, 1.0, 0.0]),
            item("What is pricing?", vec![0.0, 0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn groups_near_duplicates_into_one_cluster() {
        let items = retention_fixture();
        let result = group_by_threshold(&items, 0.80);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.unclustered, vec![3, 4]);

        let cluster = &result.clusters[0];
        // Longest text: "Describe your data retention policy." (36 chars)
        assert_eq!(cluster.master, 1);
        assert_eq!(cluster.members.len(), 2);
        let member_indices: Vec<usize> = cluster.members.iter().map(|m| m.index).collect();
        assert_eq!(member_indices, vec![0, 2]);
    }

    #[test]
    fn member_similarity_is_recomputed_against_master() {
        let items = retention_fixture();
        let result = group_by_threshold(&items, 0.80);
        let cluster = &result.clusters[0];
        for member in &cluster.members {
            let expected =
                cosine_similarity(&items[member.index].vector, &items[cluster.master].vector);
            assert_eq!(member.similarity, expected);
        }
        let mean = cluster.members.iter().map(|m| m.similarity).sum::<f32>()
            / cluster.members.len() as f32;
        assert!((cluster.avg_similarity - mean).abs() < 1e-6);
    }

    #[test]
    fn singleton_neighbor_set_emits_nothing() {
        let items = vec![
            item("alpha question", vec![1.0, 0.0]),
            item("beta question", vec![0.0, 1.0]),
        ];
        let result = group_by_threshold(&items, 0.80);
        assert!(result.clusters.is_empty());
        assert_eq!(result.unclustered, vec![0, 1]);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 1.0];
        let boundary = cosine_similarity(&a, &b);
        let items = vec![item("first question", a), item("second question x", b)];

        let included = group_by_threshold(&items, boundary);
        assert_eq!(included.clusters.len(), 1);

        let excluded = group_by_threshold(&items, boundary + 1e-6);
        assert!(excluded.clusters.is_empty());
    }

    #[test]
    fn master_tie_resolves_to_earliest_input() {
        let items = vec![
            item("same length!", vec![1.0, 0.0]),
            item("same length?", vec![0.99, 0.1]),
        ];
        let result = group_by_threshold(&items, 0.80);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].master, 0);
    }

    #[test]
    fn longer_text_wins_master_even_when_later() {
        let items = vec![
            item("short text", vec![1.0, 0.0]),
            item("a noticeably longer question text", vec![0.99, 0.1]),
        ];
        let result = group_by_threshold(&items, 0.80);
        assert_eq!(result.clusters[0].master, 1);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = group_by_threshold(&[], 0.80);
        assert!(result.clusters.is_empty());
        assert!(result.unclustered.is_empty());
    }

    #[test]
    fn output_order_masters_then_unclustered_then_members() {
        let project = Uuid::new_v4();
        let org = Uuid::new_v4();
        let mk = |text: &str| Question::new(Uuid::new_v4(), project, org, text);

        let mut master_a = mk("long master text here");
        let cluster_a = Uuid::new_v4();
        master_a.apply_cluster_fields(&ClusterFieldUpdate::master(cluster_a, master_a.question_id));
        let mut member_a = mk("member one");
        member_a.apply_cluster_fields(&ClusterFieldUpdate::member(
            cluster_a,
            master_a.question_id,
            0.9,
        ));
        let orphan = mk("an orphan");
        let mut master_b = mk("an even longer master text here");
        let cluster_b = Uuid::new_v4();
        master_b.apply_cluster_fields(&ClusterFieldUpdate::master(cluster_b, master_b.question_id));
        let mut member_b = mk("member two");
        member_b.apply_cluster_fields(&ClusterFieldUpdate::member(
            cluster_b,
            master_b.question_id,
            0.85,
        ));

        let ordered = order_for_output(vec![
            member_a.clone(),
            master_a.clone(),
            orphan.clone(),
            master_b.clone(),
            member_b.clone(),
        ]);
        let ids: Vec<Uuid> = ordered.iter().map(|q| q.question_id).collect();
        assert_eq!(
            ids,
            vec![
                master_b.question_id, // longer master first
                master_a.question_id,
                orphan.question_id,
                member_a.question_id, // members keep input order
                member_b.question_id,
            ]
        );
    }
}
