//! TF-IDF relevance index over historically classified items.
//!
//! Pure-Rust, CPU-only, built once per pipeline run before oracle dispatch
//! and read-only thereafter, safe to query concurrently from batch tasks
//! without additional synchronization.
//!
//! Tokens are maximal runs of letters/digits, lowercased. Each document
//! gets a sparse TF-IDF vector; queries are ranked by cosine similarity.

use std::collections::HashMap;

use tracing::debug;

use reportweave_core::HistoricalExample;

/// Tokenize a description: lowercase, maximal alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A read-only TF-IDF index over a corpus of historical examples.
#[derive(Debug, Default)]
pub struct RelevanceIndex {
    examples: Vec<HistoricalExample>,
    /// Sparse TF-IDF vector per document, parallel to `examples`.
    vectors: Vec<HashMap<String, f64>>,
    /// Euclidean norm per document vector.
    norms: Vec<f64>,
    /// Inverse document frequency per corpus term.
    idf: HashMap<String, f64>,
}

impl RelevanceIndex {
    /// Build the index. Terms present in every document weigh zero.
    pub fn build(examples: Vec<HistoricalExample>) -> Self {
        let doc_tokens: Vec<Vec<String>> =
            examples.iter().map(|e| tokenize(&e.description)).collect();
        let n_docs = examples.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for tokens in &doc_tokens {
            let mut seen: Vec<&str> = Vec::new();
            for t in tokens {
                if !seen.contains(&t.as_str()) {
                    seen.push(t);
                    *df.entry(t).or_insert(0) += 1;
                }
            }
        }

        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, d)| (term.to_string(), (n_docs as f64 / d as f64).ln()))
            .collect();

        let mut vectors = Vec::with_capacity(n_docs);
        let mut norms = Vec::with_capacity(n_docs);
        for tokens in &doc_tokens {
            let mut tf: HashMap<String, f64> = HashMap::new();
            for t in tokens {
                *tf.entry(t.clone()).or_insert(0.0) += 1.0;
            }
            let vector: HashMap<String, f64> = tf
                .into_iter()
                .map(|(term, count)| {
                    let weight = count * idf.get(&term).copied().unwrap_or(0.0);
                    (term, weight)
                })
                .collect();
            norms.push(norm(&vector));
            vectors.push(vector);
        }

        debug!(
            documents = n_docs,
            vocabulary = idf.len(),
            "relevance index built"
        );
        Self {
            examples,
            vectors,
            norms,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Cosine similarity of the query against every document, in corpus
    /// order. Query terms outside the corpus vocabulary contribute nothing.
    fn similarities(&self, query: &str) -> Vec<f64> {
        let mut q_vec: HashMap<String, f64> = HashMap::new();
        for token in tokenize(query) {
            if let Some(idf) = self.idf.get(&token) {
                *q_vec.entry(token).or_insert(0.0) += idf;
            }
        }
        let q_norm = norm(&q_vec);
        if q_norm < f64::EPSILON {
            return vec![0.0; self.examples.len()];
        }

        self.vectors
            .iter()
            .zip(&self.norms)
            .map(|(doc, doc_norm)| {
                if *doc_norm < f64::EPSILON {
                    return 0.0;
                }
                let dot: f64 = q_vec
                    .iter()
                    .map(|(term, w)| w * doc.get(term).copied().unwrap_or(0.0))
                    .sum();
                dot / (q_norm * doc_norm)
            })
            .collect()
    }

    /// The up-to-`k` most similar examples, highest similarity first, ties
    /// keeping corpus order. Zero-similarity documents are never returned.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<HistoricalExample> {
        let sims = self.similarities(query);
        let mut ranked: Vec<(usize, f64)> = sims
            .into_iter()
            .enumerate()
            .filter(|(_, sim)| *sim > 0.0)
            .collect();
        // Stable sort: equal similarities keep ascending corpus order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked
            .into_iter()
            .map(|(i, _)| self.examples[i].clone())
            .collect()
    }

    /// Union of ranked results across several queries: each example appears
    /// at most once, credited with its best similarity over all queries,
    /// capped at `k`.
    pub fn top_k_for_batch(&self, queries: &[String], k: usize) -> Vec<HistoricalExample> {
        let mut best: HashMap<usize, f64> = HashMap::new();
        for query in queries {
            for (i, sim) in self.similarities(query).into_iter().enumerate() {
                if sim <= 0.0 {
                    continue;
                }
                let entry = best.entry(i).or_insert(0.0);
                if sim > *entry {
                    *entry = sim;
                }
            }
        }
        let mut ranked: Vec<(usize, f64)> = best.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
            .into_iter()
            .map(|(i, _)| self.examples[i].clone())
            .collect()
    }
}

fn norm(vector: &HashMap<String, f64>) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}
