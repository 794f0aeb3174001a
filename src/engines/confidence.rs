//! Text-quality heuristics used when an engine reports no confidence score

/// Score recognized text between 0 and 1
///
/// Blends four signals: share of letters vs. stray symbols, average word
/// length, whitespace density, and long runs of one repeated character.
pub fn score(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if text.chars().count() < 5 {
        return 0.5;
    }

    let weighted = 0.40 * symbol_score(text)
        + 0.30 * word_score(text)
        + 0.15 * spacing_score(text)
        + 0.15 * run_score(text);

    weighted.clamp(0.0, 1.0)
}

fn symbol_score(text: &str) -> f32 {
    let total = text.chars().count() as f32;
    let (letters, stray) = text.chars().fold((0usize, 0usize), |(letters, stray), c| {
        if c.is_alphabetic() {
            (letters + 1, stray)
        } else if !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation() {
            (letters, stray + 1)
        } else {
            (letters, stray)
        }
    });

    let stray_penalty = 1.0 - (stray as f32 / total * 10.0).min(1.0);
    let letter_share = (letters as f32 / total * 1.5).min(1.0);

    stray_penalty * 0.6 + letter_share * 0.4
}

fn word_score(text: &str) -> f32 {
    let lengths: Vec<usize> = text.split_whitespace().map(|w| w.chars().count()).collect();
    if lengths.is_empty() {
        return 0.5;
    }

    let words = lengths.len() as f32;
    let average = lengths.iter().sum::<usize>() as f32 / words;
    let base = match average as usize {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let singles = lengths.iter().filter(|&&len| len == 1).count() as f32;
    base * (1.0 - (singles / words * 1.5).min(0.5))
}

fn spacing_score(text: &str) -> f32 {
    let total = text.chars().count() as f32;
    let spaces = text.chars().filter(|c| c.is_whitespace()).count() as f32;

    match (spaces / total * 100.0) as usize {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

fn run_score(text: &str) -> f32 {
    let mut longest = 1;
    let mut current = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if next == c && !c.is_whitespace() => {
                current += 1;
                longest = longest.max(current);
            }
            _ => current = 1,
        }
    }

    match longest {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_short_text() {
        assert_eq!(score(""), 0.0);
        assert_eq!(score("Hi"), 0.5);
    }

    #[test]
    fn test_sentence_scores_high() {
        let s = score("The quick brown fox jumps over the lazy dog.");
        assert!(s > 0.75, "Expected > 0.75, got {}", s);
    }

    #[test]
    fn test_symbol_soup_scores_low() {
        let s = score("§±®©¥€£¢¤");
        assert!(s < 0.5, "Expected < 0.5, got {}", s);
    }

    #[test]
    fn test_single_letter_words_penalized() {
        let s = score("a b c d e f g h i j k l m n o p");
        assert!(s < 0.7, "Expected < 0.7, got {}", s);
    }

    #[test]
    fn test_runs_detected() {
        assert_eq!(run_score("Hello World"), 1.0);
        assert!(run_score("Hellooooooo World") < 1.0);
    }
}
