//! A two-case tagged union.

/// Either a left or a right value.
///
/// Encoded as `("Left" x)` or `("Right" y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    pub fn left(self) -> Option<L> {
        match self {
            Either::Left(value) => Some(value),
            Either::Right(_) => None,
        }
    }

    pub fn right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(value) => Some(value),
        }
    }

    /// Converts a `Result`, with errors on the left.
    pub fn from_result(result: Result<R, L>) -> Self {
        match result {
            Ok(value) => Either::Right(value),
            Err(value) => Either::Left(value),
        }
    }
}

crate::derive_union!(Either<L, R> {
    Left(value: L),
    Right(value: R),
});

#[cfg(test)]
mod tests {
    use rhizome_knot_sexp::Sexp;

    use super::*;
    use crate::{DecodeError, DerivedUnion, SexpCodec};

    type E = Either<i32, String>;

    #[test]
    fn test_encoding() {
        assert_eq!(E::Left(3).to_sexp().to_string(), r#"("Left" "3")"#);
        assert_eq!(
            E::Right("three".into()).to_sexp().to_string(),
            r#"("Right" "three")"#
        );
    }

    #[test]
    fn test_roundtrip() {
        for value in [E::Left(-1), E::Right(String::new()), E::Right("x".into())] {
            assert_eq!(E::from_sexp(&value.to_sexp()), Ok(value));
        }
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(
            E::from_sexp(&Sexp::list([Sexp::atom("Middle"), Sexp::atom("1")])),
            Err(DecodeError::UnknownTag {
                union: "Either".into(),
                tag: "Middle".into()
            })
        );
        assert!(E::from_sexp(&Sexp::list([Sexp::atom("Left")])).is_err());
        assert!(E::from_sexp(&Sexp::list([Sexp::atom("Left"), Sexp::atom("x")])).is_err());
        assert!(E::from_sexp(&Sexp::atom("Left")).is_err());
    }

    #[test]
    fn test_shape() {
        assert_eq!(E::SHAPE.name, "Either");
        assert_eq!(E::SHAPE.constructors.len(), 2);
        assert_eq!(E::SHAPE.constructors[0].args, &["L"]);
        assert_eq!(E::SHAPE.validate(), Ok(()));
    }

    #[test]
    fn test_accessors() {
        assert!(E::Left(1).is_left());
        assert_eq!(E::Right("r".into()).right(), Some("r".to_string()));
        assert_eq!(E::Right("r".into()).left(), None);
        assert_eq!(Either::from_result(Err::<u8, i32>(4)), Either::<i32, u8>::Left(4));
    }
}
