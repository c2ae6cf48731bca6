use std::num::NonZeroUsize;

/// Splits `ids` into consecutive chunks of at most `chunk_size` elements.
///
/// Concatenating the chunks in order reproduces `ids` exactly; only the last
/// chunk may be shorter. An empty input yields no chunks.
pub fn plan_chunks<T: Clone>(ids: &[T], chunk_size: NonZeroUsize) -> Vec<Vec<T>> {
    ids.chunks(chunk_size.get()).map(<[T]>::to_vec).collect()
}
