use std::fmt::{self, Display, Formatter};

/// Renders an `f64` the way diagnostics in this crate expect it.
///
/// Non-finite values come out as `nan`, `inf`, and `-inf`, both signed zeros come out as `0`,
/// and everything else uses the shortest representation that round-trips: plain decimal for
/// magnitudes in `[1e-4, 1e16)`, scientific notation otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Real(pub(crate) f64);

impl Display for Real {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            f.write_str("nan")
        } else if value.is_infinite() {
            f.write_str(if value > 0. { "inf" } else { "-inf" })
        } else if value == 0. {
            f.write_str("0")
        } else if (1e-4..1e16).contains(&value.abs()) {
            write!(f, "{value}")
        } else {
            write!(f, "{value:e}")
        }
    }
}
