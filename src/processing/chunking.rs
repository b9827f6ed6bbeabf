//! Word-window chunking.
//!
//! Text is split on whitespace and cut into windows of `chunk_size` words. Each window starts
//! `chunk_size - overlap` words after the previous one, so neighbours share `overlap` words and
//! a sentence cut at one boundary is still whole in the next chunk. The final window may be
//! shorter; the loop stops as soon as a window reaches the last word.

use super::types::ChunkingError;

/// Split `text` into overlapping word windows.
///
/// Returns an empty vector for text without words; callers treat that as nothing to index.
pub fn chunk_words(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            chunk_size,
            overlap,
        });
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|index| format!("w{index}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn expected_count(words: usize, size: usize, overlap: usize) -> usize {
        if words == 0 {
            0
        } else if words <= size {
            1
        } else {
            (words - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_words("", 300, 50).expect("chunks").is_empty());
        assert!(chunk_words(" \n ", 300, 50).expect("chunks").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_words("one two three", 300, 50).expect("chunks");
        assert_eq!(chunks, vec!["one two three".to_string()]);
    }

    #[test]
    fn windows_advance_by_size_minus_overlap() {
        let chunks = chunk_words(&numbered_words(10), 4, 1).expect("chunks");
        assert_eq!(
            chunks,
            vec![
                "w0 w1 w2 w3".to_string(),
                "w3 w4 w5 w6".to_string(),
                "w6 w7 w8 w9".to_string(),
            ]
        );
    }

    #[test]
    fn chunk_count_matches_window_formula() {
        for (size, overlap) in [(4, 1), (5, 0), (300, 50), (7, 6), (3, 2)] {
            for words in [1, 2, 5, 7, 12, 49, 50, 51, 301, 650, 1000] {
                let chunks = chunk_words(&numbered_words(words), size, overlap).expect("chunks");
                assert_eq!(
                    chunks.len(),
                    expected_count(words, size, overlap),
                    "words={words} size={size} overlap={overlap}"
                );
            }
        }
    }

    #[test]
    fn last_chunk_ends_with_last_word_and_neighbours_overlap() {
        let (size, overlap) = (6, 2);
        let text = numbered_words(23);
        let chunks = chunk_words(&text, size, overlap).expect("chunks");

        let last = chunks.last().expect("last chunk");
        assert_eq!(last.split_whitespace().last(), Some("w22"));

        for pair in chunks.windows(2) {
            let previous: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            assert_eq!(&previous[previous.len() - overlap..], &next[..overlap]);
        }
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            chunk_words("a b", 0, 0),
            Err(ChunkingError::InvalidChunkSize)
        );
        assert_eq!(
            chunk_words("a b", 3, 3),
            Err(ChunkingError::OverlapTooLarge {
                chunk_size: 3,
                overlap: 3
            })
        );
    }
}
