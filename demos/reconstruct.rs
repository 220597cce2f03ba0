//! Ancestral state reconstruction, one network per alignment column.
//!
//! A fixed four-leaf tree ((s1, s2)n1, (s3, s4)n2)root carries a nucleotide at every node. Each
//! column of the alignment observes the leaves; the internal nodes are explained by an MPE query
//! and the root is also queried for its posterior. Columns are independent, so they run as one
//! batch on the worker pool.
//!
//! Run with `cargo run --example reconstruct`. Set `HYBRIDNET_THREADS` to fix the worker count.

use hybridnet::init::Initialization;
use hybridnet::{
    Assignment, DirectedModel, DirectedModelBuilder, InferenceEngine, Pool, PoolConfig, Result,
    VarElim, Variable,
};
use ndarray::Array2;

const BASES: [&str; 4] = ["A", "C", "G", "T"];

const ALIGNMENT: [&str; 4] = [
    "ACGTTGCA",
    "ACGTTGCC",
    "ATGTAGCA",
    "ATGCAGGA",
];

/// Jukes-Cantor substitution probabilities along a branch of length `t`
fn substitution(t: f64) -> Array2<f64> {
    let same = 0.25 + 0.75 * (-4.0 * t / 3.0).exp();
    let diff = 0.25 - 0.25 * (-4.0 * t / 3.0).exp();
    Array2::from_shape_fn((4, 4), |(i, j)| if i == j { same } else { diff })
}

struct Tree {
    model: DirectedModel,
    root: Variable,
    internal: Vec<Variable>,
    leaves: Vec<Variable>,
}

fn build_tree() -> Result<Tree> {
    let root = Variable::enumerated("root", &BASES);
    let n1 = Variable::enumerated("n1", &BASES);
    let n2 = Variable::enumerated("n2", &BASES);
    let leaves: Vec<Variable> = (1..=4)
        .map(|i| Variable::enumerated(&format!("s{}", i), &BASES))
        .collect();

    let model = DirectedModelBuilder::new()
        .with_variable(&root, vec![], Initialization::Uniform)
        .with_variable(&n1, vec![root.clone()], Initialization::Table(substitution(0.1).into_dyn()))
        .with_variable(&n2, vec![root.clone()], Initialization::Table(substitution(0.2).into_dyn()))
        .with_variable(&leaves[0], vec![n1.clone()], Initialization::Table(substitution(0.05).into_dyn()))
        .with_variable(&leaves[1], vec![n1.clone()], Initialization::Table(substitution(0.05).into_dyn()))
        .with_variable(&leaves[2], vec![n2.clone()], Initialization::Table(substitution(0.15).into_dyn()))
        .with_variable(&leaves[3], vec![n2.clone()], Initialization::Table(substitution(0.15).into_dyn()))
        .build()?;

    Ok(Tree { model, root, internal: vec![n1, n2], leaves })
}

/// Reconstruct one column: the most probable ancestral bases and P(root) for the column
fn reconstruct(tree: &Tree, column: &[usize]) -> Result<(String, Vec<f64>)> {
    let mut evidence = Assignment::new();
    for (leaf, &base) in tree.leaves.iter().zip(column.iter()) {
        evidence.set(leaf, base);
    }

    let engine = VarElim::instantiate(&tree.model);

    let mut ancestors = vec![tree.root.clone()];
    ancestors.extend(tree.internal.iter().cloned());
    let explanation = engine.infer(&engine.make_mpe(&ancestors, &evidence)?)?.mpe()?;

    let bases: String = ancestors
        .iter()
        .map(|v| explanation.discrete(v).map_or("?", |k| BASES[k]))
        .collect();

    let posterior = engine.infer(&engine.make_query(&[tree.root.clone()], &evidence)?)?;
    let probs = posterior.query_discrete(&tree.root)?.probs().to_vec();

    Ok((bases, probs))
}

fn main() {
    let columns: Vec<Vec<usize>> = (0..ALIGNMENT[0].len())
        .map(|i| {
            ALIGNMENT
                .iter()
                .map(|row| {
                    let c = &row[i..i + 1];
                    BASES.iter().position(|b| *b == c).unwrap_or(0)
                })
                .collect()
        })
        .collect();

    let config = PoolConfig::from_env().unwrap_or_default();
    let pool = match Pool::new(config) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("could not start the worker pool: {}", e);
            return;
        }
    };

    // every unit builds its own network
    let report = pool.run(columns, |_, column| {
        let tree = build_tree()?;
        reconstruct(&tree, &column)
    });

    println!("reconstructed {} columns on {} threads", report.len(), pool.threads());
    println!("column  root n1 n2  P(root)");
    for (i, (bases, probs)) in report.results.iter() {
        let probs: Vec<String> = probs.iter().map(|p| format!("{:.3}", p)).collect();
        let b: Vec<char> = bases.chars().collect();
        println!("{:>6}  {:>4} {:>2} {:>2}  [{}]", i, b[0], b[1], b[2], probs.join(", "));
    }
    for (i, e) in report.errors.iter() {
        println!("{:>6}  failed: {}", i, e);
    }
}
