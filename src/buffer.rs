//! Fixed-capacity lag buffers, most recent entry first.

/// Push `a` onto the front of a fixed-capacity buffer, dropping the oldest
/// entry. Returns the shifted buffer; an empty buffer stays empty.
pub fn backshift<D: Copy>(x: &[D], a: D) -> Vec<D> {
    if x.is_empty() {
        return Vec::new();
    }
    let mut shifted = Vec::with_capacity(x.len());
    shifted.push(a);
    shifted.extend_from_slice(&x[..x.len() - 1]);
    shifted
}
