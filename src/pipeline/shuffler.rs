// src/pipeline/shuffler.rs

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{models::question::QuestionRecord, pipeline::renumber};

/// Builds a shuffled variant of an exam.
///
/// Question order is permuted, then each question's option texts are
/// permuted over the labels A-D with the correct answer following its text.
/// Numbers are reassigned to the new order. The same seed yields the same
/// variant.
pub fn make_variant(questions: &[QuestionRecord], seed: Option<u64>) -> Vec<QuestionRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    shuffle_with(questions, &mut rng)
}

pub fn shuffle_with<R: Rng + ?Sized>(questions: &[QuestionRecord], rng: &mut R) -> Vec<QuestionRecord> {
    let mut variant = questions.to_vec();
    variant.shuffle(rng);

    for question in &mut variant {
        let mut order = [0, 1, 2, 3];
        order.shuffle(rng);
        question.permute_options(order);
    }

    renumber(&mut variant);
    variant
}
