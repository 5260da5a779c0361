//! Helper macro for port error enums.
//!
//! Each variant gets a snake-case constructor whose fields accept
//! `impl Into<T>`. Variants whose message is prefixed with `retry` describe
//! transient collaborator failures and report `true` from `is_retryable`.
//!
//! ```ignore
//! define_port_error! {
//!     /// Errors raised by wallet adapters.
//!     pub enum WalletRepositoryError {
//!         /// The debit would make the balance negative.
//!         InsufficientFunds { balance: Money, requested: Money } =>
//!             "insufficient funds: balance {balance}, requested {requested}",
//!         /// The backing store failed.
//!         Connection { message: String } => retry "wallet store failed: {message}",
//!     }
//! }
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $($retry:ident)? $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant [] [] $( $($field : $ty,)* )?);
            )*

            /// Whether the failure is transient and the call may succeed later.
            pub fn is_retryable(&self) -> bool {
                match self {
                    $( Self::$variant { .. } => define_port_error!(@retry $($retry)?), )*
                }
            }
        }
    };

    (@retry retry) => { true };
    (@retry) => { false };

    // Accumulates `field: impl Into<T>` parameters and `field.into()` inits.
    (@constructor $variant:ident [$($params:tt)*] [$($inits:tt)*]
        $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @constructor $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

    (@constructor $variant:ident [] []) => {
        ::paste::paste! {
            #[doc = concat!("Builds [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident [$($params:tt)+] [$($inits:tt)+]) => {
        ::paste::paste! {
            #[doc = concat!("Builds [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($params)+) -> Self {
                Self::$variant { $($inits)+ }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor and retry classification coverage.

    use rstest::rstest;

    define_port_error! {
        pub enum StockPortError {
            Connection { message: String } => retry "stock service down: {message}",
            SoldOut => "stock exhausted",
            OutOfStock { requested: u32 } => "{requested} accounts requested",
            Partial { message: String, requested: u32 } => "{message} ({requested})",
        }
    }

    #[rstest]
    fn string_fields_accept_str() {
        let err = StockPortError::connection("timeout");
        assert_eq!(err.to_string(), "stock service down: timeout");
    }

    #[rstest]
    fn unit_variants_get_constructors() {
        assert_eq!(StockPortError::sold_out(), StockPortError::SoldOut);
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = StockPortError::partial("short", 10_u32);
        assert_eq!(err.to_string(), "short (10)");
        assert_eq!(
            StockPortError::out_of_stock(20_u32).to_string(),
            "20 accounts requested"
        );
    }

    #[rstest]
    #[case(StockPortError::connection("timeout"), true)]
    #[case(StockPortError::sold_out(), false)]
    #[case(StockPortError::out_of_stock(3_u32), false)]
    #[case(StockPortError::partial("short", 1_u32), false)]
    fn only_marked_variants_are_retryable(#[case] err: StockPortError, #[case] expected: bool) {
        assert_eq!(err.is_retryable(), expected);
    }
}
