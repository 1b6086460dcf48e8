// src/elliptic.rs
//
// Bulirsch's general complete elliptic integral
//
//   cel(kc, p, c, s) = ∫_0^{π/2} (c cos²φ + s sin²φ)
//                       / ((cos²φ + p sin²φ) sqrt(cos²φ + kc² sin²φ)) dφ
//
// evaluated with the AGM-style iteration from R. Bulirsch, Numer. Math. 13
// (1969). Covers K, E, Π and every combination the cylinder field needs in a
// single routine. p <= 0 is handled by the transformation branch.

use std::f64::consts::FRAC_PI_2;

const CEL_TOL: f64 = 1e-10;
const CEL_MAX_ITER: usize = 64;

/// General complete elliptic integral. Returns NaN for kc == 0 (divergent).
pub fn cel(kc: f64, p: f64, c: f64, s: f64) -> f64 {
    if kc == 0.0 {
        return f64::NAN;
    }

    let mut k = kc.abs();
    let mut pp;
    let mut cc = c;
    let mut ss;
    let mut em = 1.0;

    if p > 0.0 {
        pp = p.sqrt();
        ss = s / pp;
    } else {
        let mut f = kc * kc;
        let mut q = 1.0 - f;
        let g = 1.0 - p;
        f -= p;
        q *= s - c * p;
        pp = (f / g).sqrt();
        cc = (c - s) / g;
        ss = -q / (g * g * pp) + cc * pp;
    }

    let mut f = cc;
    cc += ss / pp;
    let mut g = k / pp;
    ss = 2.0 * (ss + f * g);
    pp += g;
    g = em;
    em += k;
    let mut kk = k;

    for _ in 0..CEL_MAX_ITER {
        if (g - k).abs() <= g * CEL_TOL {
            break;
        }
        k = 2.0 * kk.sqrt();
        kk = k * em;
        f = cc;
        cc += ss / pp;
        g = kk / pp;
        ss = 2.0 * (ss + f * g);
        pp += g;
        g = em;
        em += k;
    }

    FRAC_PI_2 * (ss + cc * em) / (em * (em + pp))
}
