//! Harmonic coefficient storage.

use rustfft::num_complex::Complex64;

/// Complex harmonic coefficients `a_lm` for `0 <= m <= l <= lmax`.
///
/// Stored l-major: the coefficients of one multipole are contiguous, and
/// the coefficients of a contiguous multipole range form one contiguous
/// slice. Negative `m` follow from `a_{l,-m} = (-1)^m conj(a_lm)` for real
/// fields and are not stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Alm {
    lmax: u32,
    data: Vec<Complex64>,
}

impl Alm {
    /// All-zero coefficients up to `lmax`.
    pub fn zeros(lmax: u32) -> Self {
        Self {
            lmax,
            data: vec![Complex64::new(0.0, 0.0); Self::len_for(lmax)],
        }
    }

    /// Number of stored coefficients for a given `lmax`.
    pub fn len_for(lmax: u32) -> usize {
        let n = lmax as usize + 1;
        n * (n + 1) / 2
    }

    /// Offset of the first coefficient of multipole `l`.
    pub fn row_start(l: u32) -> usize {
        let l = l as usize;
        l * (l + 1) / 2
    }

    /// Largest stored multipole.
    pub fn lmax(&self) -> u32 {
        self.lmax
    }

    /// Number of stored coefficients.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no coefficient is stored (never, since `a_00` always is).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coefficient `a_lm`, or `None` outside `0 <= m <= l <= lmax`.
    pub fn get(&self, l: u32, m: u32) -> Option<Complex64> {
        if m > l || l > self.lmax {
            return None;
        }
        self.data.get(Self::row_start(l) + m as usize).copied()
    }

    /// Mutable access to `a_lm`.
    pub fn get_mut(&mut self, l: u32, m: u32) -> Option<&mut Complex64> {
        if m > l || l > self.lmax {
            return None;
        }
        self.data.get_mut(Self::row_start(l) + m as usize)
    }

    /// Coefficients `a_l0 ..= a_ll`.
    pub fn row(&self, l: u32) -> Option<&[Complex64]> {
        if l > self.lmax {
            return None;
        }
        let start = Self::row_start(l);
        self.data.get(start..start + l as usize + 1)
    }

    /// Mutable coefficients of multipole `l`.
    pub fn row_mut(&mut self, l: u32) -> Option<&mut [Complex64]> {
        if l > self.lmax {
            return None;
        }
        let start = Self::row_start(l);
        self.data.get_mut(start..start + l as usize + 1)
    }

    /// All coefficients in storage order.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    /// Mutable view of all coefficients in storage order.
    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Iterate `(l, m, a_lm)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Complex64)> + '_ {
        (0..=self.lmax).flat_map(move |l| {
            let start = Self::row_start(l);
            (0..=l).map(move |m| (l, m, self.data[start + m as usize]))
        })
    }
}
