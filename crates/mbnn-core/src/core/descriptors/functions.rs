use super::params::{AngularFunction, RadialFunction};
use crate::core::numeric::{Real, real};
use nalgebra::{one, zero};

/// Cosine cutoff `f_c(r) = ½ (cos(π r / r_c) + 1)` for `r < r_c`, zero beyond.
///
/// Returns `(f_c, df_c/dr)`. Both vanish at `r_c`, so every G-function built on
/// it is continuously differentiable across the cutoff.
#[inline]
pub fn cosine_cutoff<T: Real>(r: T, cutoff: T) -> (T, T) {
    if r >= cutoff {
        return (zero(), zero());
    }
    let half: T = real(0.5);
    let arg = T::pi() * r / cutoff;
    (
        half * (arg.cos() + one()),
        -half * T::pi() / cutoff * arg.sin(),
    )
}

/// One radial term for a single neighbor distance. Returns `(G, dG/dr)`.
#[inline]
pub fn radial<T: Real>(r: T, f: &RadialFunction<T>) -> (T, T) {
    let (fc, dfc) = cosine_cutoff(r, f.cutoff);
    if fc == zero() {
        return (zero(), zero());
    }
    let two: T = real(2.0);
    let dr = r - f.shift;
    let gauss = (-f.eta * dr * dr).exp();
    (gauss * fc, gauss * (dfc - two * f.eta * dr * fc))
}

/// One angular term for the triangle `(i, j, k)` centred on `i`.
///
/// Takes the three side lengths `r_ij`, `r_ik`, `r_jk` and returns the term
/// together with its partial derivatives with respect to each of them, in
/// the same order.
#[inline]
pub fn angular<T: Real>(r_ij: T, r_ik: T, r_jk: T, f: &AngularFunction<T>) -> (T, [T; 3]) {
    let (fc_ij, dfc_ij) = cosine_cutoff(r_ij, f.cutoff);
    let (fc_ik, dfc_ik) = cosine_cutoff(r_ik, f.cutoff);
    let (fc_jk, dfc_jk) = cosine_cutoff(r_jk, f.cutoff);
    let fc = fc_ij * fc_ik * fc_jk;
    if fc == zero() {
        return (zero(), [zero(); 3]);
    }

    let one: T = one();
    let two: T = real(2.0);

    let cos = (r_ij * r_ij + r_ik * r_ik - r_jk * r_jk) / (two * r_ij * r_ik);
    let base = (one + f.lambda * cos).max(zero());
    let angle = base.powf(f.zeta);
    let d_angle = f.zeta * f.lambda * base.powf(f.zeta - one);

    let gauss = (-f.eta * (r_ij * r_ij + r_ik * r_ik + r_jk * r_jk)).exp();
    let norm = two.powf(one - f.zeta);
    let value = norm * angle * gauss * fc;

    let dcos = [
        one / r_ik - cos / r_ij,
        one / r_ij - cos / r_ik,
        -r_jk / (r_ij * r_ik),
    ];
    let dfc = [
        dfc_ij * fc_ik * fc_jk,
        fc_ij * dfc_ik * fc_jk,
        fc_ij * fc_ik * dfc_jk,
    ];
    let sides = [r_ij, r_ik, r_jk];

    let mut grad = [zero(); 3];
    for s in 0..3 {
        grad[s] = norm
            * gauss
            * (d_angle * dcos[s] * fc - two * f.eta * sides[s] * angle * fc + angle * dfc[s]);
    }
    (value, grad)
}
