use quiz_core::model::{OptionId, Question, QuestionId, QuizOption};

/// Built-in questions for running without network access.
#[must_use]
pub fn questions() -> Vec<Question> {
    let raw: [(&str, [(&str, bool); 4]); 3] = [
        (
            "Which organelle holds most of a cell's DNA?",
            [
                ("Ribosome", false),
                ("Nucleus", true),
                ("Golgi apparatus", false),
                ("Lysosome", false),
            ],
        ),
        (
            "Which base pairs with adenine in DNA?",
            [
                ("Cytosine", false),
                ("Guanine", false),
                ("Thymine", true),
                ("Uracil", false),
            ],
        ),
        (
            "What molecule carries amino acids to the ribosome?",
            [
                ("mRNA", false),
                ("tRNA", true),
                ("rRNA", false),
                ("DNA polymerase", false),
            ],
        ),
    ];

    raw.into_iter()
        .zip(1_u64..)
        .map(|((prompt, options), qid)| {
            let options = options
                .into_iter()
                .zip(1_u64..)
                .map(|((text, correct), oid)| {
                    QuizOption::new(OptionId::new(qid * 10 + oid), text, correct)
                })
                .collect();
            Question::new(QuestionId::new(qid), prompt, options)
        })
        .collect()
}
