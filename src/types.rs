use crate::N;
use zeroize::Zeroize;


/// Polynomial in `R_q = Z_q[x]/(x^256 + 1)`.
///
/// Coefficients are reduced representatives: canonical `[0, q)` after ring
/// operations, centered small values for freshly sampled noise/mask
/// polynomials. Pack/unpack functions receive the expected range explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub(crate) struct Poly(pub(crate) [i32; N]);

impl Poly {
    pub(crate) const fn zero() -> Self { Poly([0i32; N]) }
}


/// Ordered sequence of polynomials; length is the module rank `k` or `l`.
pub(crate) type PolyVec = Vec<Poly>;

/// Row-major matrix of polynomials, `rows × cols`.
pub(crate) type PolyMat = Vec<PolyVec>;


pub(crate) fn zero_vec(len: usize) -> PolyVec {
    vec![Poly::zero(); len]
}
