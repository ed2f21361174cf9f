#![forbid(unsafe_code)]

pub mod history;

pub use history::*;

pub mod ids {
    use thiserror::Error;

    /// Opaque, stable identifier the primary database assigns to an object.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Handle(String);

    impl Handle {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, HandleError> {
            let value = value.into();
            validate_handle(&value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for Handle {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Error)]
    pub enum HandleError {
        #[error("handle must not be empty")]
        Empty,
        #[error("handle is too long")]
        TooLong,
        #[error("handle contains control characters")]
        ContainsControl,
    }

    fn validate_handle(value: &str) -> Result<(), HandleError> {
        if value.is_empty() {
            return Err(HandleError::Empty);
        }
        if value.len() > 256 {
            return Err(HandleError::TooLong);
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(HandleError::ContainsControl);
        }
        Ok(())
    }

    /// Handle of a changed row: a plain object, or an (object, referenced object) pair
    /// for reference-table mutations.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub enum ChangeHandle {
        Object(Handle),
        Reference { obj: Handle, reference: Handle },
    }

    impl ChangeHandle {
        pub fn obj_handle(&self) -> &Handle {
            match self {
                Self::Object(obj) => obj,
                Self::Reference { obj, .. } => obj,
            }
        }

        pub fn ref_handle(&self) -> Option<&Handle> {
            match self {
                Self::Object(_) => None,
                Self::Reference { reference, .. } => Some(reference),
            }
        }

        pub fn from_parts(obj: Handle, reference: Option<Handle>) -> Self {
            match reference {
                Some(reference) => Self::Reference { obj, reference },
                None => Self::Object(obj),
            }
        }
    }
}
