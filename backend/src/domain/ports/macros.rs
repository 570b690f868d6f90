//! Helper macro for declaring port error enums.
//!
//! Each variant names its display message and the [`Error`] constructor it
//! converts into, so services can use `?` on port results and still surface
//! the right error category.
//!
//! [`Error`]: crate::domain::Error

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[allow(dead_code, reason = "constructors are generated for every variant")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[allow(dead_code, reason = "constructors are generated for every variant")]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr ; $into:ident
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
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }

        impl From<$name> for crate::domain::Error {
            fn from(err: $name) -> Self {
                let message = err.to_string();
                match err {
                    $( $name::$variant { .. } => crate::domain::Error::$into(message), )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;
