//! Error handling foundation for switchboard.
//!
//! Layer-local error enums (dialog rejections, transport failures, adapter
//! failures) stay plain values inside their crate. Where a failure leaves a
//! crate's public surface, for example a turn that hit a wiring bug, it is
//! wrapped in a rootcause `Report` through this alias.

use rootcause::Report;

/// Result whose error is a `Report` carrying a context of type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct LaneGone;

    impl fmt::Display for LaneGone {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("lane gone")
        }
    }

    impl std::error::Error for LaneGone {}

    fn enqueue(open: bool) -> Result<u32, LaneGone> {
        if !open {
            return Err(LaneGone.into());
        }
        Ok(1)
    }

    #[test]
    fn domain_error_becomes_report() {
        assert_eq!(enqueue(true).expect("open lane"), 1);
        assert!(enqueue(false).is_err());
    }
}
