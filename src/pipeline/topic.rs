// src/pipeline/topic.rs

use crate::models::question::DEFAULT_TOPIC;

/// Keyword lists per topic, Spanish and English. Earlier entries win ties.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Matemáticas",
        &[
            "ecuación", "ecuaciones", "número", "números", "suma", "resta", "fracción",
            "porcentaje", "calcula", "calcular", "álgebra", "geometría", "triángulo", "ángulo",
            "área", "perímetro", "derivada", "integral", "equation", "calculate", "fraction",
            "percentage", "algebra", "geometry", "triangle", "angle", "area", "derivative",
        ],
    ),
    (
        "Ciencias",
        &[
            "célula", "energía", "átomo", "molécula", "química", "física", "biología", "fuerza",
            "masa", "velocidad", "planeta", "ecosistema", "gas", "gases", "cell", "energy",
            "atom", "molecule", "chemistry", "physics", "biology", "force", "mass", "velocity",
            "planet", "ecosystem",
        ],
    ),
    (
        "Historia",
        &[
            "guerra", "revolución", "siglo", "independencia", "imperio", "rey", "batalla",
            "historia", "war", "revolution", "century", "independence", "empire", "king",
            "battle", "history",
        ],
    ),
    (
        "Geografía",
        &[
            "capital", "país", "continente", "río", "montaña", "océano", "clima", "población",
            "country", "continent", "river", "mountain", "ocean", "climate", "population",
        ],
    ),
    (
        "Lengua",
        &[
            "verbo", "sustantivo", "adjetivo", "oración", "sinónimo", "antónimo", "ortografía",
            "gramática", "verb", "noun", "adjective", "sentence", "synonym", "antonym",
            "grammar",
        ],
    ),
    (
        "Programación",
        &[
            "algoritmo", "variable", "función", "código", "programa", "bucle", "compilador",
            "algorithm", "function", "code", "program", "loop", "compiler",
        ],
    ),
];

/// Coarse topic label for a set of question texts, by keyword hits.
/// Returns [`DEFAULT_TOPIC`] when nothing matches.
pub fn sniff_topic<'a>(texts: impl IntoIterator<Item = &'a str>) -> &'static str {
    let mut hits = [0usize; TOPIC_KEYWORDS.len()];

    for text in texts {
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            for (i, (_, keywords)) in TOPIC_KEYWORDS.iter().enumerate() {
                if keywords.contains(&word) {
                    hits[i] += 1;
                }
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (i, &count) in hits.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((i, count));
        }
    }

    best.map(|(i, _)| TOPIC_KEYWORDS[i].0).unwrap_or(DEFAULT_TOPIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_geography() {
        assert_eq!(sniff_topic(["What is the capital of France?"]), "Geografía");
    }

    #[test]
    fn test_majority_wins_across_texts() {
        let texts = [
            "Resuelve la ecuación 2x + 3 = 7",
            "Calcula el área del triángulo",
            "¿En qué siglo ocurrió la batalla?",
        ];
        assert_eq!(sniff_topic(texts), "Matemáticas");
    }

    #[test]
    fn test_unknown_text_is_general() {
        assert_eq!(sniff_topic(["What is 2+2?"]), DEFAULT_TOPIC);
        assert_eq!(sniff_topic(std::iter::empty::<&str>()), DEFAULT_TOPIC);
    }

    #[test]
    fn test_accented_uppercase_keywords_match() {
        assert_eq!(sniff_topic(["¿Qué FUNCIÓN cumple el BUCLE?"]), "Programación");
    }
}
