//! Rank-driven pair merging over the characters of one pre-token.

use super::vocab::VocabularyStore;

/// Splits `word` into characters and fuses ranked pairs until none remain.
///
/// Every iteration fuses at least one pair, so the piece count strictly
/// decreases and the loop ends after at most `chars - 1` rounds.
pub(crate) fn merge_word(word: &str, vocab: &VocabularyStore) -> Vec<String> {
    let mut pieces: Vec<String> = word.chars().map(String::from).collect();
    if pieces.len() < 2 {
        return pieces;
    }

    while let Some((left, right)) = best_pair(&pieces, vocab) {
        let before = pieces.len();
        pieces = fuse(pieces, &left, &right);
        debug_assert!(pieces.len() < before);
    }

    pieces
}

fn best_pair(pieces: &[String], vocab: &VocabularyStore) -> Option<(String, String)> {
    pieces
        .windows(2)
        .filter_map(|pair| {
            vocab
                .merge_rank(&pair[0], &pair[1])
                .map(|rank| (rank, pair))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, pair)| (pair[0].clone(), pair[1].clone()))
}

/// Fuses every left-to-right, non-overlapping occurrence of `left right`.
fn fuse(pieces: Vec<String>, left: &str, right: &str) -> Vec<String> {
    let mut fused = Vec::with_capacity(pieces.len());
    let mut iter = pieces.into_iter().peekable();

    while let Some(mut piece) = iter.next() {
        if piece == left && iter.peek().is_some_and(|next| next == right) {
            if let Some(next) = iter.next() {
                piece.push_str(&next);
            }
        }
        fused.push(piece);
    }

    fused
}

/// Maps merged pieces to ids, degrading to characters and then `<unk>`.
pub(crate) fn resolve_pieces(pieces: &[String], vocab: &VocabularyStore, ids: &mut Vec<i64>) {
    let unknown = vocab.specials().unknown;
    let mut buf = [0u8; 4];

    for piece in pieces {
        if let Some(id) = vocab.resolve(piece) {
            ids.push(id);
            continue;
        }
        for ch in piece.chars() {
            let ch: &str = ch.encode_utf8(&mut buf);
            ids.push(vocab.resolve(ch).unwrap_or(unknown));
        }
    }
}
