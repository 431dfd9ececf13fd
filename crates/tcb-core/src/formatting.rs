//! Chat-length reply chunking.

/// Split `text` into chat-sized chunks.
///
/// Tokens are whitespace-delimited and accumulated greedily, space-separated,
/// while the chunk stays within `soft_limit` characters. A token longer than the
/// limit is emitted whole in its own chunk. When more than one chunk results,
/// each is prefixed with `(i/N) `.
pub fn chunk_reply(text: &str, soft_limit: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for token in text.split_whitespace() {
        let token_len = token.chars().count();
        if current.is_empty() {
            current.push_str(token);
            current_len = token_len;
            continue;
        }

        if current_len + 1 + token_len > soft_limit {
            chunks.push(std::mem::take(&mut current));
            current.push_str(token);
            current_len = token_len;
        } else {
            current.push(' ');
            current.push_str(token);
            current_len += 1 + token_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.len() <= 1 {
        return chunks;
    }

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("({}/{total}) {chunk}", i + 1))
        .collect()
}

/// Room left for the `(i/N) ` counter when chunking against a hard ceiling.
const COUNTER_ROOM: usize = 10;

/// Prepare `text` for a transport that rejects messages over `ceiling` chars.
///
/// Text that fits is passed through untouched. Anything longer is chunked with
/// `soft_limit`, tightened so a counter-prefixed chunk still fits the ceiling.
pub fn split_for_chat(text: &str, ceiling: usize, soft_limit: usize) -> Vec<String> {
    if text.chars().count() <= ceiling {
        return vec![text.to_string()];
    }
    let limit = soft_limit.min(ceiling.saturating_sub(COUNTER_ROOM)).max(1);
    chunk_reply(text, limit)
}
