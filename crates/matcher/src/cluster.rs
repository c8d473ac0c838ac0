//! Threshold-based grouping of collections into duplicate clusters.

use ingest::Collection;
use tracing::info;

use crate::engine::SimilarityMatrix;
use crate::types::{ClusterStrategy, DuplicateCluster, MatchError};

/// Group collections whose overlap strictly exceeds `threshold`.
///
/// Every collection lands in exactly one cluster; singletons are included.
pub fn cluster(
    collections: &[Collection],
    threshold: usize,
    strategy: ClusterStrategy,
) -> Result<Vec<DuplicateCluster>, MatchError> {
    let matrix = SimilarityMatrix::build(collections, false)?;
    Ok(cluster_matrix(&matrix, threshold, strategy))
}

/// Same as [`cluster`] over an already computed matrix.
pub fn cluster_matrix(
    matrix: &SimilarityMatrix,
    threshold: usize,
    strategy: ClusterStrategy,
) -> Vec<DuplicateCluster> {
    let groups = match strategy {
        ClusterStrategy::Greedy => greedy(matrix, threshold),
        ClusterStrategy::Transitive => transitive(matrix, threshold),
    };
    let clusters: Vec<DuplicateCluster> = groups
        .into_iter()
        .map(|group| DuplicateCluster {
            members: group.into_iter().map(|i| matrix.ids()[i].clone()).collect(),
        })
        .collect();

    info!(
        strategy = ?strategy,
        threshold,
        clusters = clusters.len(),
        duplicate_groups = clusters.iter().filter(|c| c.is_duplicate()).count(),
        "clustering_complete"
    );
    clusters
}

fn greedy(matrix: &SimilarityMatrix, threshold: usize) -> Vec<Vec<usize>> {
    let n = matrix.len();
    let mut processed = vec![false; n];
    let mut groups = Vec::new();

    for seed in 0..n {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;
        let mut group = vec![seed];
        // Ids before the seed are already processed.
        for other in (seed + 1)..n {
            if !processed[other] && matrix.at(seed, other) > threshold {
                processed[other] = true;
                group.push(other);
            }
        }
        groups.push(group);
    }
    groups
}

fn transitive(matrix: &SimilarityMatrix, threshold: usize) -> Vec<Vec<usize>> {
    let n = matrix.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if matrix.at(i, j) > threshold {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    // Smaller index stays root so groups come out in id order.
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root = vec![usize::MAX; n];
    for i in 0..n {
        let root = find(&mut parent, i);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = groups.len();
            groups.push(Vec::new());
        }
        groups[slot_of_root[root]].push(i);
    }
    groups
}
