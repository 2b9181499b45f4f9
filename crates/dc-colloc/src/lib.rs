//! Orthogonal-collocation coefficients from a Lagrange polynomial basis.
//!
//! A [`CollocationScheme`] of degree `d` holds `d + 1` nodes on `[0, 1]`
//! (the interval start plus `d` collocation points) and three coefficient sets:
//!
//! - `C[j][r]`: derivative of basis polynomial `j` at node `r` (collocation equations)
//! - `D[j]`: basis polynomial `j` at `1` (continuity equation)
//! - `B[j]`: integral of basis polynomial `j` over `[0, 1]` (quadrature)
//!
//! All three are computed with exact polynomial arithmetic.

pub mod error;
pub mod nodes;
pub mod poly;
pub mod scheme;

pub use error::{ColocError, ColocResult};
pub use nodes::{NodeScheme, legendre_points, radau_points};
pub use poly::Polynomial;
pub use scheme::CollocationScheme;
