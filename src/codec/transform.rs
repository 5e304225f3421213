//! Reversible byte transformations applied to stored entry payloads.
//!
//! Two passes, both deterministic and keyed only by the payload itself:
//!
//! - [`interleave`] / [`deinterleave`]: a length-keyed permutation that
//!   "weaves" bytes front and back. Even output positions take input bytes
//!   in order; the remaining positions are filled walking backwards from
//!   the tail. `deinterleave` is the exact inverse.
//! - [`swap_multiples`]: reverses every maximal run of two or more
//!   consecutive bytes whose values are divisible by the given multiple
//!   (zero counts). The pass is an involution: applying it twice restores
//!   the input.
//!
//! The EDF format fixes the swap multiple at [`SWAP_MULTIPLE`].

/// The divisor used by the swap-multiples pass in EDF data files.
pub const SWAP_MULTIPLE: u8 = 7;

/// Interleaves `data` in place.
///
/// For input `abcde` the output is `aebdc`; more precisely: output
/// positions `0, 2, 4, ...` receive input bytes `0, 1, 2, ...`, then the
/// remaining odd positions are filled from the highest odd position
/// downwards with the rest of the input.
pub fn interleave(data: &mut [u8]) {
    if data.len() < 2 {
        return;
    }
    let mut buffer = vec![0u8; data.len()];
    let mut src = 0;

    let mut dst = 0;
    while dst < data.len() {
        buffer[dst] = data[src];
        dst += 2;
        src += 1;
    }

    let mut dst = dst as isize - 1;
    if data.len() % 2 != 0 {
        dst -= 2;
    }
    while dst >= 0 {
        buffer[dst as usize] = data[src];
        dst -= 2;
        src += 1;
    }

    data.copy_from_slice(&buffer);
}

/// Deinterleaves `data` in place, undoing [`interleave`].
pub fn deinterleave(data: &mut [u8]) {
    if data.len() < 2 {
        return;
    }
    let mut buffer = vec![0u8; data.len()];
    let mut dst = 0;

    let mut src = 0;
    while src < data.len() {
        buffer[dst] = data[src];
        src += 2;
        dst += 1;
    }

    let mut src = src as isize - 1;
    if data.len() % 2 != 0 {
        src -= 2;
    }
    while src >= 0 {
        buffer[dst] = data[src as usize];
        src -= 2;
        dst += 1;
    }

    data.copy_from_slice(&buffer);
}

/// Reverses every maximal run of two or more consecutive bytes divisible
/// by `multiple`, in place. A `multiple` of zero leaves `data` unchanged.
pub fn swap_multiples(data: &mut [u8], multiple: u8) {
    if multiple == 0 {
        return;
    }
    let mut run = 0usize;
    for i in 0..=data.len() {
        if i != data.len() && data[i] % multiple == 0 {
            run += 1;
        } else {
            if run > 1 {
                data[i - run..i].reverse();
            }
            run = 0;
        }
    }
}
