use crate::bitset::BitSet;

/// Packs a leaf bitset into bytes, 8 leaves per byte, bit 0 = lowest
/// leaf index — the raw (uncompressed) row `compress_row` expects, and
/// the layout `FormatShim`'s visdata lump stores runs of.
pub fn pack_bytes(bits: &BitSet) -> Vec<u8> {
    let num_bytes = bits.len().div_ceil(8);
    let mut out = vec![0u8; num_bytes];
    for i in 0..bits.len() {
        if bits.get(i) {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

/// Run-length-encodes one decompressed leaf row (qbsp/vis's
/// `CompressRow`, spec.md §4.7). Every byte is emitted; a zero byte is
/// immediately followed by a repeat count (capped at 255) for the run
/// of zero bytes starting there, including itself.
pub fn compress_row(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        out.push(bytes[i]);
        if bytes[i] != 0 {
            i += 1;
            continue;
        }
        let mut rep: u8 = 1;
        i += 1;
        while i < bytes.len() && bytes[i] == 0 && rep < 255 {
            rep += 1;
            i += 1;
        }
        out.push(rep);
    }
    out
}

/// Inverse of [`compress_row`], expanding back to exactly `num_bytes`
/// bytes.
pub fn decompress_row(compressed: &[u8], num_bytes: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(num_bytes);
    let mut i = 0;
    while out.len() < num_bytes {
        let b = compressed[i];
        i += 1;
        if b != 0 {
            out.push(b);
            continue;
        }
        let rep = compressed[i];
        i += 1;
        for _ in 0..rep {
            out.push(0);
        }
    }
    out.truncate(num_bytes);
    out
}
